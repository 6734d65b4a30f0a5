//! # learnhub-delivery
//!
//! Local delivery scheduling for the LearnHub notification subsystem.
//!
//! The OS notification facility sits behind the [`PlatformScheduler`]
//! trait; [`NotificationScheduler`] decides *whether* and *when* a
//! notification is handed to it, applying the recipient's master switch
//! and quiet-hours window, and owns the push token lifecycle for the
//! local device.

pub mod content;
pub mod memory;
pub mod platform;
pub mod scheduler;

pub use content::DeliveryContent;
pub use memory::{ArmedDelivery, InMemoryPlatformScheduler};
pub use platform::PlatformScheduler;
pub use scheduler::{DeviceIdentity, NotificationScheduler};
