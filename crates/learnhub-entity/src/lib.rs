//! # learnhub-entity
//!
//! Domain entity models for the LearnHub notification subsystem. Every
//! struct in this crate is a value object: construction applies the
//! documented defaults, and the only behavior is small pure helpers
//! (read transitions, expiry checks, quiet-hour evaluation, template
//! rendering). Durability belongs to `learnhub-store`.

pub mod notification;

pub use notification::category::NotificationCategory;
pub use notification::filter::NotificationFilter;
pub use notification::model::{Notification, NotificationMetadata};
pub use notification::preference::{FrequencyLimit, NotificationPreferences};
pub use notification::quiet_hours::QuietHours;
pub use notification::template::NotificationTemplate;
pub use notification::token::{DevicePlatform, PushEnvironment, PushToken};
pub use notification::types::{NotificationChannel, NotificationPriority, NotificationType};
