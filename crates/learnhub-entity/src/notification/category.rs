//! Notification category enumeration.

use serde::{Deserialize, Serialize};

/// Category of a notification for platform grouping and filtering.
///
/// Every [`NotificationType`](crate::NotificationType) maps to exactly one
/// category via [`NotificationType::category`](crate::NotificationType::category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Course assignments and completions.
    Course,
    /// Test availability, deadlines, and results.
    Test,
    /// Onboarding and work tasks.
    Task,
    /// Admin and system messages.
    Message,
    /// Achievements and certificates.
    Achievement,
    /// Feed activity and mentions.
    Feed,
    /// Daily and weekly reminders.
    Reminder,
}

impl NotificationCategory {
    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Test => "test",
            Self::Task => "task",
            Self::Message => "message",
            Self::Achievement => "achievement",
            Self::Feed => "feed",
            Self::Reminder => "reminder",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
