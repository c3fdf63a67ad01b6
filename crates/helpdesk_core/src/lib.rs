//! Ticket store, knowledge base, admin sessions, and derived analytics
//! over a pluggable key-value persistence adapter.

pub mod analytics;
pub mod clock;
pub mod knowledge;
pub mod schema;
pub mod session;
pub mod store;
pub mod tickets;
