//! # learnhub-service
//!
//! Top-level orchestration for the LearnHub notification subsystem.
//!
//! [`NotificationService`] fronts one signed-in user's notifications: it
//! delegates durability to the store, hands push-eligible notifications
//! to the scheduler, and maintains the reactive surface (unread count,
//! new-notification flag, and the received/read/deleted event streams)
//! that interface layers observe.

pub mod events;
pub mod service;

pub use events::NotificationEvents;
pub use service::NotificationService;
