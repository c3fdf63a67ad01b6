use std::sync::Arc;

use crate::clock::{self, Clock};
use crate::schema::{Ticket, TicketFilters};
use crate::store::{KeyValueStore, TICKETS_KEY};

/// Sole writer of the ticket collection. The full collection lives as
/// one JSON array under a single key; every operation is a full read
/// or a full write back.
pub struct TicketRepository {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl TicketRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Millisecond timestamp plus a random component. Collisions are
    /// treated as negligible, not defended against.
    pub fn generate_id(&self) -> String {
        let millis = self.clock.now().unix_timestamp_nanos() / 1_000_000;
        format!("{:x}-{:08x}", millis, rand::random::<u32>())
    }

    /// Reads the full collection. Absent or malformed data yields an
    /// empty collection; legacy category labels are rewritten by the
    /// decode boundary (see `schema::Category`).
    pub fn list(&self) -> Vec<Ticket> {
        let Some(data) = self.store.get(TICKETS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&data) {
            Ok(tickets) => tickets,
            Err(err) => {
                tracing::warn!(%err, "stored tickets were malformed, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<Ticket> {
        self.list().into_iter().find(|ticket| ticket.id == id)
    }

    /// Upsert by id. Every save stamps `updated_date`; callers never
    /// set it. A new record must carry its own `created_date`.
    pub fn save(&self, ticket: Ticket) -> bool {
        let stamped = Ticket {
            updated_date: Some(clock::to_rfc3339(self.clock.now())),
            ..ticket
        };
        let mut tickets = self.list();
        match tickets.iter().position(|existing| existing.id == stamped.id) {
            Some(index) => tickets[index] = stamped,
            None => tickets.push(stamped),
        }
        self.write_all(&tickets)
    }

    /// Removes the matching record and writes the remainder back.
    /// Deleting an id that is not present is a no-op, not an error.
    pub fn delete(&self, id: &str) -> bool {
        let mut tickets = self.list();
        tickets.retain(|ticket| ticket.id != id);
        self.write_all(&tickets)
    }

    fn write_all(&self, tickets: &[Ticket]) -> bool {
        match serde_json::to_string(tickets) {
            Ok(json) => self.store.set(TICKETS_KEY, &json),
            Err(err) => {
                tracing::error!(%err, "ticket serialization failed");
                false
            }
        }
    }
}

/// Case-insensitive title/description search plus exact enum matches,
/// all criteria ANDed together.
pub fn apply_filters(tickets: &[Ticket], filters: &TicketFilters) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|ticket| {
            if let Some(term) = &filters.search_term {
                let term = term.to_lowercase();
                let matches = ticket.title.to_lowercase().contains(&term)
                    || ticket.description.to_lowercase().contains(&term);
                if !matches {
                    return false;
                }
            }
            if let Some(status) = filters.status {
                if ticket.status != status {
                    return false;
                }
            }
            if let Some(priority) = filters.priority {
                if ticket.priority != priority {
                    return false;
                }
            }
            if let Some(category) = filters.category {
                if ticket.category != category {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}
