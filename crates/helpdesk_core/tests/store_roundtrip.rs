use std::sync::Arc;

use helpdesk_core::clock::FixedClock;
use helpdesk_core::schema::{Category, Priority, Status, Ticket};
use helpdesk_core::session::{FixedCredentials, SessionManager};
use helpdesk_core::store::SqliteStore;
use helpdesk_core::tickets::TicketRepository;
use time::macros::datetime;

fn sample_ticket(id: &str) -> Ticket {
    Ticket {
        id: id.to_string(),
        title: "Cannot reach the staging server".to_string(),
        description: "Connections to staging time out since this morning.".to_string(),
        priority: Priority::High,
        category: Category::TechnicalIssue,
        status: Status::Open,
        email: Some("reporter@example.com".to_string()),
        created_date: "2024-06-01T09:00:00Z".to_string(),
        updated_date: None,
    }
}

#[test]
fn tickets_survive_a_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("helpdesk.db");
    let db_path = db_path.to_str().unwrap();
    let clock = Arc::new(FixedClock(datetime!(2024-06-15 10:00:00 UTC)));

    {
        let store = Arc::new(SqliteStore::open(db_path).unwrap());
        let repository = TicketRepository::new(store, clock.clone());
        assert!(repository.save(sample_ticket("t1")));
        assert!(repository.save(sample_ticket("t2")));
        assert!(repository.delete("t2"));
    }

    let store = Arc::new(SqliteStore::open(db_path).unwrap());
    let repository = TicketRepository::new(store, clock);
    let tickets = repository.list();
    assert_eq!(tickets.len(), 1);
    assert_eq!(
        tickets[0],
        Ticket {
            updated_date: Some("2024-06-15T10:00:00Z".to_string()),
            ..sample_ticket("t1")
        }
    );
}

#[test]
fn session_survives_a_store_reopen_until_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("helpdesk.db");
    let db_path = db_path.to_str().unwrap();

    {
        let store = Arc::new(SqliteStore::open(db_path).unwrap());
        let manager = SessionManager::new(
            store,
            Arc::new(FixedClock(datetime!(2024-06-15 10:00:00 UTC))),
            Box::new(FixedCredentials::new("admin@example.com", "hunter2")),
        );
        assert!(manager.authenticate("admin@example.com", "hunter2"));
    }

    // Same day: still authenticated after reopening.
    let store = Arc::new(SqliteStore::open(db_path).unwrap());
    let manager = SessionManager::new(
        store,
        Arc::new(FixedClock(datetime!(2024-06-15 20:00:00 UTC))),
        Box::new(FixedCredentials::default()),
    );
    assert!(manager.is_authenticated());

    // Two days later: the read finds it expired and clears it.
    let store = Arc::new(SqliteStore::open(db_path).unwrap());
    let manager = SessionManager::new(
        store,
        Arc::new(FixedClock(datetime!(2024-06-17 10:00:00 UTC))),
        Box::new(FixedCredentials::default()),
    );
    assert!(!manager.is_authenticated());
    assert!(manager.session().is_none());
}
