//! Query filter for notification lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::notification::model::Notification;
use crate::notification::types::{NotificationPriority, NotificationType};

/// Filter for notification queries. Every store implementation applies
/// the semantics of [`NotificationFilter::matches`].
///
/// All criteria are conjunctive. In particular, when both `priorities`
/// and `min_priority` are set a notification must satisfy both: its
/// priority is in the set AND at least the minimum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFilter {
    /// Restrict to these types.
    pub types: Option<HashSet<NotificationType>>,
    /// Restrict to these exact priorities.
    pub priorities: Option<HashSet<NotificationPriority>>,
    /// Restrict to priorities at or above this one.
    pub min_priority: Option<NotificationPriority>,
    /// Require this exact read state.
    pub is_read: Option<bool>,
    /// When false, read notifications are excluded.
    #[serde(default = "default_true")]
    pub show_read: bool,
    /// Restrict to notifications created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Restrict to notifications created at or before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

impl NotificationFilter {
    /// Filter matching the given types only.
    pub fn for_types(types: impl IntoIterator<Item = NotificationType>) -> Self {
        Self {
            types: Some(types.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Shortcut: course-related notifications.
    pub fn courses() -> Self {
        Self::for_types([
            NotificationType::CourseAssigned,
            NotificationType::CourseCompleted,
        ])
    }

    /// Shortcut: test-related notifications.
    pub fn tests() -> Self {
        Self::for_types([
            NotificationType::TestAvailable,
            NotificationType::TestDeadline,
            NotificationType::TestCompleted,
        ])
    }

    /// Shortcut: unread notifications only.
    pub fn unread_only() -> Self {
        Self {
            show_read: false,
            ..Default::default()
        }
    }

    /// Whether a notification satisfies every populated criterion.
    pub fn matches(&self, n: &Notification) -> bool {
        if let Some(types) = &self.types {
            if !types.contains(&n.kind) {
                return false;
            }
        }
        if let Some(priorities) = &self.priorities {
            if !priorities.contains(&n.priority) {
                return false;
            }
        }
        if let Some(min) = self.min_priority {
            if n.priority < min {
                return false;
            }
        }
        if let Some(is_read) = self.is_read {
            if n.is_read != is_read {
                return false;
            }
        }
        if !self.show_read && n.is_read {
            return false;
        }
        if let Some(after) = self.created_after {
            if n.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if n.created_at > before {
                return false;
            }
        }
        true
    }
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            types: None,
            priorities: None,
            min_priority: None,
            is_read: None,
            show_read: true,
            created_after: None,
            created_before: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn notification(kind: NotificationType) -> Notification {
        Notification::new(Uuid::new_v4(), kind, "t", "b")
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let f = NotificationFilter::default();
        assert!(f.matches(&notification(NotificationType::CourseAssigned)));
        let mut read = notification(NotificationType::SystemMessage);
        read.mark_read();
        assert!(f.matches(&read));
    }

    #[test]
    fn test_type_filter() {
        let f = NotificationFilter::courses();
        assert!(f.matches(&notification(NotificationType::CourseAssigned)));
        assert!(!f.matches(&notification(NotificationType::TestAvailable)));
    }

    #[test]
    fn test_min_priority() {
        let f = NotificationFilter {
            min_priority: Some(NotificationPriority::High),
            ..Default::default()
        };
        let high = notification(NotificationType::TestDeadline); // defaults to high
        let low = notification(NotificationType::FeedActivity); // defaults to low
        assert!(f.matches(&high));
        assert!(!f.matches(&low));
    }

    #[test]
    fn test_priorities_and_min_priority_are_conjunctive() {
        let f = NotificationFilter {
            priorities: Some(HashSet::from([
                NotificationPriority::Low,
                NotificationPriority::Urgent,
            ])),
            min_priority: Some(NotificationPriority::High),
            ..Default::default()
        };
        // In the set but below the minimum.
        assert!(!f.matches(&notification(NotificationType::FeedActivity)));
        // Above the minimum but not in the set.
        assert!(!f.matches(&notification(NotificationType::TestDeadline)));
        // Both.
        let urgent = notification(NotificationType::SystemMessage)
            .with_priority(NotificationPriority::Urgent);
        assert!(f.matches(&urgent));
    }

    #[test]
    fn test_show_read_excludes_read() {
        let f = NotificationFilter::unread_only();
        let mut n = notification(NotificationType::AdminMessage);
        assert!(f.matches(&n));
        n.mark_read();
        assert!(!f.matches(&n));
    }

    #[test]
    fn test_exact_read_state() {
        let f = NotificationFilter {
            is_read: Some(true),
            ..Default::default()
        };
        let mut n = notification(NotificationType::AdminMessage);
        assert!(!f.matches(&n));
        n.mark_read();
        assert!(f.matches(&n));
    }
}
