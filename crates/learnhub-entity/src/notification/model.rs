//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::notification::types::{
    NotificationChannel, NotificationPriority, NotificationType,
};

/// A notification to be delivered to a user.
///
/// Invariant: `is_read == true` always coincides with a non-`None`
/// `read_at`, and `read_at` is set exactly once, on the first transition
/// to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient user.
    pub user_id: Uuid,
    /// The kind of event this notification reports.
    pub kind: NotificationType,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Deep-link payload, opaque to this subsystem.
    #[serde(default)]
    pub data: Option<HashMap<String, String>>,
    /// Delivery channels for this notification.
    #[serde(default = "default_channels")]
    pub channels: HashSet<NotificationChannel>,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Whether the user has read this notification.
    #[serde(default)]
    pub is_read: bool,
    /// When the notification was first read.
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification expires. `None` means never.
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional rich-content bundle.
    #[serde(default)]
    pub metadata: Option<NotificationMetadata>,
}

impl Notification {
    /// Create a notification with the documented defaults: a fresh id,
    /// channels `{in_app}`, the type's default priority, unread, created
    /// now, never expiring.
    pub fn new(
        user_id: Uuid,
        kind: NotificationType,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            data: None,
            channels: default_channels(),
            priority: kind.default_priority(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
            expires_at: None,
            metadata: None,
        }
    }

    /// Replace the delivery channel set.
    pub fn with_channels(
        mut self,
        channels: impl IntoIterator<Item = NotificationChannel>,
    ) -> Self {
        self.channels = channels.into_iter().collect();
        self
    }

    /// Override the default priority.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a deep-link payload.
    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach rich-content metadata.
    pub fn with_metadata(mut self, metadata: NotificationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set an expiry instant.
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Transition to read. Idempotent: a second call leaves `read_at`
    /// at the instant of the first.
    pub fn mark_read(&mut self) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(Utc::now());
        }
    }

    /// Check if the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Check if the notification has expired. Notifications without an
    /// `expires_at` never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp < Utc::now()).unwrap_or(false)
    }
}

/// Optional rich-content bundle attached to a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationMetadata {
    /// URL of an image to display with the notification.
    pub image_url: Option<String>,
    /// Deep-link URL opened by the notification's action.
    pub action_url: Option<String>,
    /// Label for the notification's action button.
    pub action_title: Option<String>,
    /// Application badge value to apply on delivery.
    pub badge: Option<u32>,
    /// Sound identifier to play on delivery.
    pub sound: Option<String>,
}

fn default_channels() -> HashSet<NotificationChannel> {
    HashSet::from([NotificationChannel::InApp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Notification {
        Notification::new(
            Uuid::new_v4(),
            NotificationType::CourseAssigned,
            "Новый курс",
            "Вам назначен курс",
        )
    }

    #[test]
    fn test_defaults_on_construction() {
        let n = sample();
        assert_eq!(n.channels, HashSet::from([NotificationChannel::InApp]));
        assert_eq!(n.priority, NotificationPriority::Medium);
        assert!(!n.is_read);
        assert!(n.read_at.is_none());
        assert!(n.expires_at.is_none());
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut n = sample();
        n.mark_read();
        let first = n.read_at;
        assert!(n.is_read);
        assert!(first.is_some());

        n.mark_read();
        assert_eq!(n.read_at, first);
    }

    #[test]
    fn test_expiry() {
        let mut n = sample();
        assert!(!n.is_expired());

        n = n.with_expires_at(Utc::now() - Duration::minutes(1));
        assert!(n.is_expired());

        n = n.with_expires_at(Utc::now() + Duration::hours(1));
        assert!(!n.is_expired());
    }

    #[test]
    fn test_builder_overrides() {
        let n = sample()
            .with_priority(NotificationPriority::Urgent)
            .with_channels([NotificationChannel::Push, NotificationChannel::InApp])
            .with_data(HashMap::from([("course_id".to_string(), "42".to_string())]));
        assert_eq!(n.priority, NotificationPriority::Urgent);
        assert!(n.channels.contains(&NotificationChannel::Push));
        assert_eq!(n.data.unwrap()["course_id"], "42");
    }
}
