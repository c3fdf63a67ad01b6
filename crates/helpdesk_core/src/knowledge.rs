use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::schema::KnowledgeArticle;
use crate::store::{KNOWLEDGE_KEY, KeyValueStore};

/// Read-mostly article collection under a single key, populated with a
/// default set on first run.
pub struct KnowledgeRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KnowledgeRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Absent or malformed data falls back to the built-in defaults
    /// without writing anything.
    pub fn list(&self) -> Vec<KnowledgeArticle> {
        let Some(data) = self.store.get(KNOWLEDGE_KEY) else {
            return default_articles();
        };
        match serde_json::from_str(&data) {
            Ok(articles) => articles,
            Err(err) => {
                tracing::warn!(%err, "stored articles were malformed, using defaults");
                default_articles()
            }
        }
    }

    /// Populates the built-in defaults exactly once: only when the key
    /// is currently absent.
    pub fn ensure_seeded(&self) -> bool {
        self.ensure_seeded_with(&default_articles())
    }

    /// Seeding rule shared by all seed sources. A present key counts as
    /// already seeded even when its collection has since been emptied.
    pub fn ensure_seeded_with(&self, articles: &[KnowledgeArticle]) -> bool {
        if self.store.get(KNOWLEDGE_KEY).is_some() {
            return true;
        }
        match serde_json::to_string(articles) {
            Ok(json) => self.store.set(KNOWLEDGE_KEY, &json),
            Err(err) => {
                tracing::error!(%err, "article serialization failed");
                false
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    articles: Vec<KnowledgeArticle>,
}

/// Loads a replacement seed set from a YAML file with a top-level
/// `articles` list.
pub fn articles_from_yaml(path: &Path) -> Result<Vec<KnowledgeArticle>> {
    let raw = fs::read_to_string(path)?;
    let file: SeedFile = serde_yaml::from_str(&raw)?;
    Ok(file.articles)
}

/// Built-in FAQ set for the current category scheme.
pub fn default_articles() -> Vec<KnowledgeArticle> {
    let created = "2024-01-01T00:00:00Z".to_string();
    vec![
        KnowledgeArticle {
            id: "faq-1".to_string(),
            title: "How do I request access to an internal tool?".to_string(),
            content: "Create a new ticket with the category \"Access Request\" and name the \
                      tool you need. Include your team and a short business justification; \
                      requests are reviewed within 1-2 business days."
                .to_string(),
            category: "Access Request".to_string(),
            tags: vec![
                "access".to_string(),
                "tools".to_string(),
                "approval".to_string(),
            ],
            created_date: created.clone(),
            updated_date: None,
        },
        KnowledgeArticle {
            id: "faq-2".to_string(),
            title: "What should a good bug ticket contain?".to_string(),
            content: "File it under \"Bug Ticket\" with the steps to reproduce, what you \
                      expected, and what actually happened. Screenshots and the time the \
                      problem occurred speed up triage considerably."
                .to_string(),
            category: "Bug Ticket".to_string(),
            tags: vec![
                "bugs".to_string(),
                "reporting".to_string(),
                "triage".to_string(),
            ],
            created_date: created.clone(),
            updated_date: None,
        },
        KnowledgeArticle {
            id: "faq-3".to_string(),
            title: "How do I propose a new feature?".to_string(),
            content: "Use the \"Feature Request\" category and describe the problem you are \
                      trying to solve rather than a specific implementation. Requests are \
                      collected and reviewed in the monthly planning round."
                .to_string(),
            category: "Feature Request".to_string(),
            tags: vec!["features".to_string(), "planning".to_string()],
            created_date: created.clone(),
            updated_date: None,
        },
        KnowledgeArticle {
            id: "faq-4".to_string(),
            title: "How long until my ticket gets a response?".to_string(),
            content: "High priority tickets are looked at the same business day; everything \
                      else within two. You can check the current status of any ticket from \
                      the ticket list at any time."
                .to_string(),
            category: "General Support".to_string(),
            tags: vec![
                "response-time".to_string(),
                "status".to_string(),
                "priority".to_string(),
            ],
            created_date: created.clone(),
            updated_date: None,
        },
        KnowledgeArticle {
            id: "faq-5".to_string(),
            title: "My ticket was closed but the problem is back".to_string(),
            content: "Closed tickets are not reopened. File a new ticket and mention the old \
                      ticket id in the description so the history can be linked during \
                      triage."
                .to_string(),
            category: "General Support".to_string(),
            tags: vec!["closed".to_string(), "follow-up".to_string()],
            created_date: created,
            updated_date: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn list_falls_back_to_defaults_when_absent() {
        let store = Arc::new(MemoryStore::new());
        let repository = KnowledgeRepository::new(store.clone());

        assert_eq!(repository.list(), default_articles());
        // The fallback read does not write anything.
        assert_eq!(store.get(KNOWLEDGE_KEY), None);
    }

    #[test]
    fn seeding_populates_only_when_key_is_absent() {
        let store = Arc::new(MemoryStore::new());
        let repository = KnowledgeRepository::new(store.clone());

        assert!(repository.ensure_seeded());
        assert_eq!(repository.list().len(), default_articles().len());

        // Seeding again over existing data is a no-op.
        assert!(repository.ensure_seeded());
        assert_eq!(repository.list().len(), default_articles().len());
    }

    #[test]
    fn emptied_but_present_counts_as_seeded() {
        let store = Arc::new(MemoryStore::new());
        let repository = KnowledgeRepository::new(store.clone());

        store.set(KNOWLEDGE_KEY, "[]");
        assert!(repository.ensure_seeded());
        assert_eq!(store.get(KNOWLEDGE_KEY), Some("[]".to_string()));
    }

    #[test]
    fn malformed_articles_read_as_defaults() {
        let store = Arc::new(MemoryStore::new());
        let repository = KnowledgeRepository::new(store.clone());

        store.set(KNOWLEDGE_KEY, "not json at all");
        assert_eq!(repository.list(), default_articles());
    }

    #[test]
    fn yaml_seed_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.yaml");
        std::fs::write(
            &path,
            r#"
articles:
  - id: kb-1
    title: VPN setup
    content: Install the client and sign in with your staff account.
    category: General Support
    tags: [vpn, remote]
    createdDate: "2024-02-01T00:00:00Z"
"#,
        )
        .unwrap();

        let articles = articles_from_yaml(&path).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "kb-1");
        assert_eq!(articles[0].tags, vec!["vpn", "remote"]);
    }
}
