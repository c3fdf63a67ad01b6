use std::sync::Arc;
use time::Duration;

use crate::clock::{self, Clock};
use crate::schema::{AdminSession, AdminUser};
use crate::store::{ADMIN_SESSION_KEY, KeyValueStore};

const SESSION_TTL: Duration = Duration::hours(24);

/// Credential check behind the session lifecycle, so a real identity
/// provider can be swapped in without touching the state machine.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, email: &str, secret: &str) -> bool;
}

/// Single fixed account, compared in plain text. A development
/// placeholder, not an authentication model.
pub struct FixedCredentials {
    email: String,
    secret: String,
}

impl FixedCredentials {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }
}

impl Default for FixedCredentials {
    fn default() -> Self {
        Self::new("admin@helpdesk.local", "123456")
    }
}

impl CredentialVerifier for FixedCredentials {
    fn verify(&self, email: &str, secret: &str) -> bool {
        email == self.email && secret == self.secret
    }
}

/// One implicit admin session record: anonymous until a successful
/// `authenticate`, back to anonymous on `logout` or when a read finds
/// the record expired. Expiry is lazy; there is no background timer.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    verifier: Box<dyn CredentialVerifier>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        verifier: Box<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            store,
            clock,
            verifier,
        }
    }

    /// A credential mismatch is a plain `false`, never an error.
    pub fn authenticate(&self, email: &str, secret: &str) -> bool {
        if !self.verifier.verify(email, secret) {
            return false;
        }
        let now = self.clock.now();
        let session = AdminSession {
            is_authenticated: true,
            user: Some(AdminUser {
                email: email.to_string(),
                role: "admin".to_string(),
                login_time: clock::to_rfc3339(now),
            }),
            expires_at: clock::to_rfc3339(now + SESSION_TTL),
        };
        self.write(&session)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session()
            .map(|session| session.is_authenticated)
            .unwrap_or(false)
    }

    /// Returns the valid session, clearing it first when it has
    /// expired or can no longer be decoded.
    pub fn session(&self) -> Option<AdminSession> {
        let data = self.store.get(ADMIN_SESSION_KEY)?;
        let session: AdminSession = match serde_json::from_str(&data) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(%err, "stored session was malformed, clearing it");
                self.store.remove(ADMIN_SESSION_KEY);
                return None;
            }
        };
        let Some(expires_at) = clock::parse_rfc3339(&session.expires_at) else {
            self.store.remove(ADMIN_SESSION_KEY);
            return None;
        };
        if self.clock.now() > expires_at {
            self.store.remove(ADMIN_SESSION_KEY);
            return None;
        }
        Some(session)
    }

    pub fn logout(&self) -> bool {
        self.store.remove(ADMIN_SESSION_KEY)
    }

    /// Pushes the expiry of the current valid session another full TTL
    /// out; fails when no valid session exists.
    pub fn extend(&self) -> bool {
        let Some(mut session) = self.session() else {
            return false;
        };
        session.expires_at = clock::to_rfc3339(self.clock.now() + SESSION_TTL);
        self.write(&session)
    }

    fn write(&self, session: &AdminSession) -> bool {
        match serde_json::to_string(session) {
            Ok(json) => self.store.set(ADMIN_SESSION_KEY, &json),
            Err(err) => {
                tracing::error!(%err, "session serialization failed");
                false
            }
        }
    }
}
