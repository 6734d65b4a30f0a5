//! # learnhub-store
//!
//! The durable side of the notification subsystem: the
//! [`NotificationStore`] trait every storage backend implements, an
//! in-memory reference implementation used pervasively in tests, and the
//! PostgreSQL implementation with its connection and migration plumbing.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::InMemoryNotificationStore;
pub use postgres::PgNotificationStore;
pub use store::NotificationStore;
