//! Notification subsystem configuration.

use serde::{Deserialize, Serialize};

/// Notification subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Buffer capacity for the received/read/deleted broadcast streams.
    /// A subscriber that lags by more than this many events loses the
    /// oldest ones.
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
    /// Number of days after which expired notifications are swept.
    #[serde(default = "default_cleanup_days")]
    pub cleanup_after_days: u32,
    /// Identity of this installation for push-token registration.
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Device identity used when registering push tokens.
///
/// `platform` and `environment` are parsed into their typed forms by the
/// delivery layer; invalid values surface as configuration errors there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Stable identifier for this device/installation.
    #[serde(default = "default_device_id")]
    pub device_id: String,
    /// Device platform: `"ios"`, `"android"`, or `"web"`.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Push environment: `"development"` or `"production"`.
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: default_event_buffer(),
            cleanup_after_days: default_cleanup_days(),
            device: DeviceConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            platform: default_platform(),
            environment: default_environment(),
        }
    }
}

fn default_event_buffer() -> usize {
    256
}

fn default_cleanup_days() -> u32 {
    30
}

fn default_device_id() -> String {
    "learnhub-device".to_string()
}

fn default_platform() -> String {
    "ios".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}
