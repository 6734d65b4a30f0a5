//! Per-user notification delivery preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::notification::quiet_hours::QuietHours;
use crate::notification::types::{NotificationChannel, NotificationType};

/// Per-user delivery preferences: master switch, per-type channel sets,
/// quiet hours, and frequency caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// The user these preferences belong to.
    pub user_id: Uuid,
    /// Master switch. When false every channel check resolves to
    /// disabled, regardless of per-type settings.
    pub is_enabled: bool,
    /// Enabled channels per notification type. Types without an entry
    /// fall back to the default set `{in_app}`.
    #[serde(default)]
    pub channel_preferences: HashMap<NotificationType, HashSet<NotificationChannel>>,
    /// Optional quiet-hours window.
    pub quiet_hours: Option<QuietHours>,
    /// Frequency caps per notification type. Enforced only for
    /// synthetic/test sends.
    #[serde(default)]
    pub frequency_limits: HashMap<NotificationType, FrequencyLimit>,
    /// When preferences were last updated. Bumped on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    /// Create default preferences for a user: enabled, no explicit
    /// channel entries, no quiet hours, no frequency caps.
    pub fn default_for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_enabled: true,
            channel_preferences: HashMap::new(),
            quiet_hours: None,
            frequency_limits: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// The channel set for a type, falling back to `{in_app}` when the
    /// type has no explicit entry.
    pub fn channels_for(&self, kind: NotificationType) -> HashSet<NotificationChannel> {
        self.channel_preferences
            .get(&kind)
            .cloned()
            .unwrap_or_else(default_channel_set)
    }

    /// Whether `channel` is enabled for `kind`. Always false when the
    /// master switch is off.
    pub fn is_channel_enabled(
        &self,
        channel: NotificationChannel,
        kind: NotificationType,
    ) -> bool {
        self.is_enabled && self.channels_for(kind).contains(&channel)
    }

    /// Enable or disable one channel for a type. Creates the type's entry
    /// from the default set if absent.
    pub fn set_channel_enabled(
        &mut self,
        kind: NotificationType,
        channel: NotificationChannel,
        enabled: bool,
    ) {
        let channels = self
            .channel_preferences
            .entry(kind)
            .or_insert_with(default_channel_set);
        if enabled {
            channels.insert(channel);
        } else {
            channels.remove(&channel);
        }
        self.touch();
    }

    /// Replace the quiet-hours window.
    pub fn set_quiet_hours(&mut self, quiet_hours: Option<QuietHours>) {
        self.quiet_hours = quiet_hours;
        self.touch();
    }

    /// Set the frequency cap for a type.
    pub fn set_frequency_limit(&mut self, kind: NotificationType, limit: FrequencyLimit) {
        self.frequency_limits.insert(kind, limit);
        self.touch();
    }

    /// Whether an enabled quiet-hours window covers the given instant.
    pub fn is_in_quiet_hours(&self, at: DateTime<Utc>) -> bool {
        self.quiet_hours.map(|q| q.is_active(at)).unwrap_or(false)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Cap on how many notifications of one type may reach a user per period.
/// `None` fields are uncapped.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FrequencyLimit {
    /// Maximum sends in any trailing hour.
    pub max_per_hour: Option<u32>,
    /// Maximum sends in any trailing 24 hours.
    pub max_per_day: Option<u32>,
    /// Maximum sends in any trailing 7 days.
    pub max_per_week: Option<u32>,
}

fn default_channel_set() -> HashSet<NotificationChannel> {
    HashSet::from([NotificationChannel::InApp])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> NotificationPreferences {
        NotificationPreferences::default_for_user(Uuid::new_v4())
    }

    #[test]
    fn test_channel_default_fallback() {
        let p = prefs();
        // No explicit entry for any type: in_app on, push off.
        assert!(p.is_channel_enabled(NotificationChannel::InApp, NotificationType::FeedActivity));
        assert!(!p.is_channel_enabled(NotificationChannel::Push, NotificationType::FeedActivity));
    }

    #[test]
    fn test_master_switch_precedence() {
        let mut p = prefs();
        p.set_channel_enabled(
            NotificationType::CourseAssigned,
            NotificationChannel::Push,
            true,
        );
        assert!(p.is_channel_enabled(NotificationChannel::Push, NotificationType::CourseAssigned));

        p.is_enabled = false;
        assert!(!p.is_channel_enabled(NotificationChannel::Push, NotificationType::CourseAssigned));
        assert!(!p.is_channel_enabled(NotificationChannel::InApp, NotificationType::CourseAssigned));
    }

    #[test]
    fn test_disabling_a_channel_keeps_the_rest() {
        let mut p = prefs();
        p.set_channel_enabled(
            NotificationType::CourseAssigned,
            NotificationChannel::InApp,
            false,
        );
        assert!(!p.is_channel_enabled(NotificationChannel::InApp, NotificationType::CourseAssigned));
        // Other types still use the default set.
        assert!(p.is_channel_enabled(NotificationChannel::InApp, NotificationType::TestAvailable));
    }

    #[test]
    fn test_mutations_bump_updated_at() {
        let mut p = prefs();
        let initial = p.updated_at;
        p.set_frequency_limit(
            NotificationType::SystemMessage,
            FrequencyLimit {
                max_per_day: Some(5),
                ..Default::default()
            },
        );
        assert!(p.updated_at >= initial);
        assert_eq!(
            p.frequency_limits[&NotificationType::SystemMessage].max_per_day,
            Some(5)
        );
    }

    #[test]
    fn test_quiet_hours_lookup() {
        let noon = "2026-03-05T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mut p = prefs();
        assert!(!p.is_in_quiet_hours(noon));

        let all_day = QuietHours::new(
            chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            chrono::NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        );
        p.set_quiet_hours(Some(all_day));
        assert!(p.is_in_quiet_hours(noon));
    }
}
