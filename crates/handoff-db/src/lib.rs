//! Session store for cross-device upload handoffs
//!
//! The store is the only shared state of the handoff protocol. Two implementations
//! are provided behind the [`SessionStore`] trait: [`PgSessionStore`] for deployments
//! and [`InMemorySessionStore`] for local development and tests. Both enforce expiry
//! with the injected clock and append results atomically.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemorySessionStore;
pub use postgres::PgSessionStore;
pub use store::{SessionStore, StoreError, MAX_CREATE_ATTEMPTS};
