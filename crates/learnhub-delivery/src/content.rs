//! Rich delivery content handed to the platform scheduler.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use learnhub_entity::{Notification, NotificationCategory};

/// Everything the platform needs to present one notification.
///
/// Built from a [`Notification`] by flattening its metadata: the badge,
/// sound, and image come from the rich-content bundle; the category and
/// thread key come from the type, so the platform can group related
/// deliveries; the payload carries the id, the type, and the deep-link
/// data for whoever handles the tap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryContent {
    /// Presented title.
    pub title: String,
    /// Presented body text.
    pub body: String,
    /// Badge value to apply, if any.
    pub badge: Option<u32>,
    /// Sound identifier, if any. `None` leaves the platform default.
    pub sound: Option<String>,
    /// Interaction category of the underlying type.
    pub category: NotificationCategory,
    /// Grouping key. Deliveries of the same type thread together.
    pub thread_key: String,
    /// Attachment image, if any.
    pub image_url: Option<String>,
    /// Opaque payload: deep-link data plus `notification_id` and `kind`.
    pub payload: HashMap<String, String>,
}

impl DeliveryContent {
    /// Flatten a notification into platform-ready content.
    pub fn from_notification(notification: &Notification) -> Self {
        let mut payload = notification.data.clone().unwrap_or_default();
        payload.insert("notification_id".to_string(), notification.id.to_string());
        payload.insert("kind".to_string(), notification.kind.as_str().to_string());

        let metadata = notification.metadata.as_ref();
        Self {
            title: notification.title.clone(),
            body: notification.body.clone(),
            badge: metadata.and_then(|m| m.badge),
            sound: metadata.and_then(|m| m.sound.clone()),
            category: notification.kind.category(),
            thread_key: notification.kind.as_str().to_string(),
            image_url: metadata.and_then(|m| m.image_url.clone()),
            payload,
        }
    }
}
