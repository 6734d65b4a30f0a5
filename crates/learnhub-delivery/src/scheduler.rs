//! Notification scheduler.
//!
//! Sits between the service layer and the [`PlatformScheduler`]: applies
//! the recipient's master switch and quiet-hours window before arming
//! anything, and owns the push token lifecycle for the local device.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use learnhub_core::config::DeviceConfig;
use learnhub_core::error::AppError;
use learnhub_core::result::AppResult;
use learnhub_entity::{
    DevicePlatform, Notification, NotificationPreferences, NotificationPriority, PushEnvironment,
    PushToken,
};
use learnhub_store::NotificationStore;

use crate::content::DeliveryContent;
use crate::platform::PlatformScheduler;

/// Typed identity of the local device, parsed from configuration.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    /// Stable identifier for this device/installation.
    pub device_id: String,
    /// Device platform.
    pub platform: DevicePlatform,
    /// Push gateway environment.
    pub environment: PushEnvironment,
}

impl TryFrom<&DeviceConfig> for DeviceIdentity {
    type Error = AppError;

    fn try_from(config: &DeviceConfig) -> Result<Self, Self::Error> {
        let platform: DevicePlatform = config.platform.parse().map_err(|_| {
            AppError::configuration(format!(
                "Invalid device platform in config: '{}'",
                config.platform
            ))
        })?;
        let environment: PushEnvironment = config.environment.parse().map_err(|_| {
            AppError::configuration(format!(
                "Invalid push environment in config: '{}'",
                config.environment
            ))
        })?;
        Ok(Self {
            device_id: config.device_id.clone(),
            platform,
            environment,
        })
    }
}

/// Schedules local deliveries and manages the device push token.
pub struct NotificationScheduler {
    /// Store for push token persistence
    store: Arc<dyn NotificationStore>,
    /// OS collaborator
    platform: Arc<dyn PlatformScheduler>,
    /// The user this device belongs to
    user_id: Uuid,
    /// Local device identity
    device: DeviceIdentity,
    /// Hex form of the currently registered token
    current_token: Mutex<Option<String>>,
}

impl NotificationScheduler {
    /// Create a scheduler for one user on one device.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        platform: Arc<dyn PlatformScheduler>,
        user_id: Uuid,
        device: DeviceIdentity,
    ) -> Self {
        Self {
            store,
            platform,
            user_id,
            device,
            current_token: Mutex::new(None),
        }
    }

    /// Arm a local delivery for the notification. `fire_at = None`
    /// presents immediately. Returns the notification's id, which also
    /// keys the arm: scheduling the same notification again replaces the
    /// previous arm.
    pub async fn schedule_local(
        &self,
        notification: &Notification,
        fire_at: Option<DateTime<Utc>>,
    ) -> AppResult<Uuid> {
        let content = self.build_content(notification);
        self.platform.arm(notification.id, content, fire_at).await?;
        tracing::debug!(
            notification_id = %notification.id,
            deferred = fire_at.is_some(),
            "Armed local delivery"
        );
        Ok(notification.id)
    }

    /// Cancel a pending delivery. Unknown ids are a no-op.
    pub async fn cancel(&self, id: Uuid) -> AppResult<()> {
        self.platform.cancel(id).await
    }

    /// Cancel every pending delivery.
    pub async fn cancel_all(&self) -> AppResult<()> {
        self.platform.cancel_all().await
    }

    /// Whether the notification may be presented right now under the
    /// recipient's preferences.
    pub fn should_deliver(
        &self,
        notification: &Notification,
        preferences: &NotificationPreferences,
    ) -> bool {
        self.should_deliver_at(notification, preferences, Utc::now())
    }

    /// Whether the notification may be presented at `at`.
    ///
    /// The master switch suppresses everything. Inside an active quiet
    /// window only urgent notifications pass, and only when the window
    /// allows them.
    pub fn should_deliver_at(
        &self,
        notification: &Notification,
        preferences: &NotificationPreferences,
        at: DateTime<Utc>,
    ) -> bool {
        if !preferences.is_enabled {
            return false;
        }
        if let Some(quiet) = preferences.quiet_hours {
            if quiet.is_active(at) {
                return notification.priority == NotificationPriority::Urgent
                    && quiet.allow_urgent;
            }
        }
        true
    }

    /// Schedule the notification, deferring it past an active quiet
    /// window when necessary.
    ///
    /// Returns the armed id, or `Ok(None)` when the notification is
    /// suppressed outright (master switch off) and nothing was armed.
    pub async fn schedule_respecting_quiet_hours(
        &self,
        notification: &Notification,
        preferences: &NotificationPreferences,
    ) -> AppResult<Option<Uuid>> {
        let now = Utc::now();
        if self.should_deliver_at(notification, preferences, now) {
            return self.schedule_local(notification, None).await.map(Some);
        }
        if !preferences.is_enabled {
            tracing::debug!(
                notification_id = %notification.id,
                "Delivery suppressed: notifications disabled"
            );
            return Ok(None);
        }
        match preferences.quiet_hours.filter(|q| q.is_enabled) {
            Some(quiet) => {
                let fire_at = quiet.next_end_after(now);
                tracing::debug!(
                    notification_id = %notification.id,
                    fire_at = %fire_at,
                    "Deferring delivery until quiet hours end"
                );
                self.schedule_local(notification, Some(fire_at))
                    .await
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    /// Flatten a notification into platform-ready content.
    pub fn build_content(&self, notification: &Notification) -> DeliveryContent {
        DeliveryContent::from_notification(notification)
    }

    /// Set the application badge.
    pub async fn update_badge(&self, count: u32) -> AppResult<()> {
        self.platform.set_badge(count).await
    }

    /// Clear the application badge.
    pub async fn clear_badge(&self) -> AppResult<()> {
        self.platform.clear_badge().await
    }

    /// Register a raw device token.
    ///
    /// The token is hex-encoded, persisted through the store (which
    /// deactivates any other token for this device), forwarded raw to
    /// the platform, and recorded as the current token.
    pub async fn register_token(&self, raw: &[u8]) -> AppResult<PushToken> {
        let hex: String = raw.iter().map(|b| format!("{b:02x}")).collect();
        let token = PushToken::new(
            self.user_id,
            hex.clone(),
            self.device.device_id.clone(),
            self.device.platform,
            self.device.environment,
        );
        let saved = self.store.save_push_token(token).await?;
        self.platform.register_remote_token(raw).await?;

        let mut slot = self
            .current_token
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(hex);
        drop(slot);

        tracing::info!(
            user_id = %self.user_id,
            device_id = %self.device.device_id,
            "Registered push token"
        );
        Ok(saved)
    }

    /// Record a failed registration: log it and forget the current
    /// token so the next registration starts clean.
    pub fn handle_registration_error(&self, error: &AppError) {
        tracing::error!(error = %error, "Push token registration failed");
        let mut slot = self
            .current_token
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Hex form of the currently registered token, if any.
    pub fn current_token(&self) -> Option<String> {
        self.current_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
