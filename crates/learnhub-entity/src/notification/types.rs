//! Notification type, channel, and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::notification::category::NotificationCategory;

/// The kinds of notification the platform produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A course was assigned to the user.
    CourseAssigned,
    /// The user finished a course.
    CourseCompleted,
    /// A test became available for taking.
    TestAvailable,
    /// A test deadline is approaching.
    TestDeadline,
    /// The user finished a test.
    TestCompleted,
    /// An onboarding or work task was assigned.
    TaskAssigned,
    /// The user unlocked an achievement.
    AchievementUnlocked,
    /// A course certificate was issued.
    CertificateIssued,
    /// Activity in a followed feed thread.
    FeedActivity,
    /// The user was mentioned in a feed post.
    FeedMention,
    /// Platform-originated system message.
    SystemMessage,
    /// Message sent by an administrator.
    AdminMessage,
    /// Daily learning reminder.
    ReminderDaily,
    /// Weekly progress reminder.
    ReminderWeekly,
}

impl NotificationType {
    /// All notification types, for iteration.
    pub const ALL: [NotificationType; 14] = [
        Self::CourseAssigned,
        Self::CourseCompleted,
        Self::TestAvailable,
        Self::TestDeadline,
        Self::TestCompleted,
        Self::TaskAssigned,
        Self::AchievementUnlocked,
        Self::CertificateIssued,
        Self::FeedActivity,
        Self::FeedMention,
        Self::SystemMessage,
        Self::AdminMessage,
        Self::ReminderDaily,
        Self::ReminderWeekly,
    ];

    /// The priority a notification of this type gets when none is given
    /// explicitly.
    pub fn default_priority(&self) -> NotificationPriority {
        match self {
            Self::TestDeadline | Self::SystemMessage => NotificationPriority::High,
            Self::CourseAssigned | Self::TestAvailable | Self::AdminMessage => {
                NotificationPriority::Medium
            }
            _ => NotificationPriority::Low,
        }
    }

    /// Display icon identifier for this type.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::CourseAssigned => "book.circle",
            Self::CourseCompleted => "checkmark.circle",
            Self::TestAvailable => "doc.text",
            Self::TestDeadline => "clock.arrow.circlepath",
            Self::TestCompleted => "checkmark.seal.fill",
            Self::TaskAssigned => "square.and.pencil",
            Self::AchievementUnlocked => "star.circle",
            Self::CertificateIssued => "rosette",
            Self::FeedActivity => "bubble.left.and.bubble.right.fill",
            Self::FeedMention => "at.circle.fill",
            Self::SystemMessage => "gear",
            Self::AdminMessage => "person.circle",
            Self::ReminderDaily => "bell",
            Self::ReminderWeekly => "calendar",
        }
    }

    /// The delivery category this type groups under.
    ///
    /// The match is exhaustive so a new type cannot be added without
    /// choosing its category.
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::CourseAssigned | Self::CourseCompleted => NotificationCategory::Course,
            Self::TestAvailable | Self::TestDeadline | Self::TestCompleted => {
                NotificationCategory::Test
            }
            Self::TaskAssigned => NotificationCategory::Task,
            Self::AdminMessage | Self::SystemMessage => NotificationCategory::Message,
            Self::AchievementUnlocked | Self::CertificateIssued => {
                NotificationCategory::Achievement
            }
            Self::FeedActivity | Self::FeedMention => NotificationCategory::Feed,
            Self::ReminderDaily | Self::ReminderWeekly => NotificationCategory::Reminder,
        }
    }

    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CourseAssigned => "course_assigned",
            Self::CourseCompleted => "course_completed",
            Self::TestAvailable => "test_available",
            Self::TestDeadline => "test_deadline",
            Self::TestCompleted => "test_completed",
            Self::TaskAssigned => "task_assigned",
            Self::AchievementUnlocked => "achievement_unlocked",
            Self::CertificateIssued => "certificate_issued",
            Self::FeedActivity => "feed_activity",
            Self::FeedMention => "feed_mention",
            Self::SystemMessage => "system_message",
            Self::AdminMessage => "admin_message",
            Self::ReminderDaily => "reminder_daily",
            Self::ReminderWeekly => "reminder_weekly",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| {
                learnhub_core::AppError::validation(format!("Invalid notification type: '{s}'"))
            })
    }
}

/// Delivery medium for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Remote push notification.
    Push,
    /// Email delivery.
    Email,
    /// In-application notification center.
    InApp,
    /// SMS delivery.
    Sms,
}

impl NotificationChannel {
    /// Return the channel as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::InApp => "in_app",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification priority, ordered from least to most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    /// Informational, may be batched or dropped by the platform.
    Low,
    /// Regular delivery.
    Medium,
    /// Prominent delivery.
    High,
    /// Bypasses quiet hours when the user allows it.
    Urgent,
}

impl NotificationPriority {
    /// All priorities in ascending order.
    pub const ALL: [NotificationPriority; 4] =
        [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationPriority {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(learnhub_core::AppError::validation(format!(
                "Invalid notification priority: '{s}'. Expected one of: low, medium, high, urgent"
            ))),
        }
    }
}
