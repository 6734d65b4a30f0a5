//! Quiet-hours window and its evaluator.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A recurring daily window during which non-urgent notifications are
/// suppressed or deferred.
///
/// Window semantics: when `start_time <= end_time` the window is
/// `[start, end)` within one day. When `start_time > end_time` the window
/// wraps past midnight and is active whenever the wall-clock time is
/// `>= start` or `< end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuietHours {
    /// Whether the window is in effect at all.
    pub is_enabled: bool,
    /// Daily start of the window (hour and minute, no date).
    pub start_time: NaiveTime,
    /// Daily end of the window (hour and minute, no date).
    pub end_time: NaiveTime,
    /// Whether urgent-priority notifications bypass the window.
    pub allow_urgent: bool,
}

impl QuietHours {
    /// Create an enabled window with the urgent bypass on.
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            is_enabled: true,
            start_time,
            end_time,
            allow_urgent: true,
        }
    }

    /// Whether the window covers the given instant. Always false when the
    /// window is disabled.
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.is_active_at_time(at.time())
    }

    /// Whether the window covers the given time of day.
    pub fn is_active_at_time(&self, t: NaiveTime) -> bool {
        if !self.is_enabled {
            return false;
        }
        if self.start_time <= self.end_time {
            self.start_time <= t && t < self.end_time
        } else {
            t >= self.start_time || t < self.end_time
        }
    }

    /// The next instant at or after `now` when the window closes. For an
    /// overnight window this lands on tomorrow's end time whenever today's
    /// has already passed.
    pub fn next_end_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today_end = now.date_naive().and_time(self.end_time).and_utc();
        if today_end <= now {
            today_end + Duration::days(1)
        } else {
            today_end
        }
    }
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            is_enabled: false,
            start_time: NaiveTime::MIN + Duration::hours(22),
            end_time: NaiveTime::MIN + Duration::hours(8),
            allow_urgent: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn window(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> QuietHours {
        QuietHours::new(at(start_h, start_m), at(end_h, end_m))
    }

    #[test]
    fn test_overnight_window_wraps_midnight() {
        let q = window(22, 0, 8, 0);
        assert!(q.is_active_at_time(at(23, 0)));
        assert!(q.is_active_at_time(at(7, 0)));
        assert!(!q.is_active_at_time(at(12, 0)));
    }

    #[test]
    fn test_same_day_window() {
        let q = window(14, 0, 16, 0);
        assert!(q.is_active_at_time(at(15, 0)));
        assert!(!q.is_active_at_time(at(13, 0)));
        assert!(!q.is_active_at_time(at(17, 0)));
    }

    #[test]
    fn test_window_boundaries() {
        let q = window(14, 0, 16, 0);
        // Start inclusive, end exclusive.
        assert!(q.is_active_at_time(at(14, 0)));
        assert!(!q.is_active_at_time(at(16, 0)));
    }

    #[test]
    fn test_disabled_window_is_never_active() {
        let mut q = window(0, 0, 23, 59);
        q.is_enabled = false;
        assert!(!q.is_active_at_time(at(12, 0)));
        assert!(!q.is_active(Utc::now()));
    }

    #[test]
    fn test_next_end_lands_today_or_tomorrow() {
        let q = window(22, 0, 8, 0);
        let morning = "2026-03-05T05:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let end = q.next_end_after(morning);
        assert_eq!(end, "2026-03-05T08:00:00Z".parse::<DateTime<Utc>>().unwrap());

        let night = "2026-03-05T23:10:00Z".parse::<DateTime<Utc>>().unwrap();
        let end = q.next_end_after(night);
        assert_eq!(end, "2026-03-06T08:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_default_window_is_disabled_overnight() {
        let q = QuietHours::default();
        assert!(!q.is_enabled);
        assert_eq!(q.start_time, at(22, 0));
        assert_eq!(q.end_time, at(8, 0));
        assert!(q.allow_urgent);
    }
}
