//! Notification domain entities.

pub mod category;
pub mod filter;
pub mod model;
pub mod preference;
pub mod quiet_hours;
pub mod template;
pub mod token;
pub mod types;

pub use category::NotificationCategory;
pub use filter::NotificationFilter;
pub use model::{Notification, NotificationMetadata};
pub use preference::{FrequencyLimit, NotificationPreferences};
pub use quiet_hours::QuietHours;
pub use template::NotificationTemplate;
pub use token::{DevicePlatform, PushEnvironment, PushToken};
pub use types::{NotificationChannel, NotificationPriority, NotificationType};
