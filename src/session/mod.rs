//! Per-user answers, cursor and edit state, plus their store.

pub mod model;
pub mod store;

pub use model::{Answer, MULTI_SEPARATOR, Session, SummarySnapshot};
pub use store::{InMemorySessionStore, SessionLocks, SessionStore};
