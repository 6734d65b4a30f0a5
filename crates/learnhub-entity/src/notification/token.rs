//! Push token entity and device enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Platform a push token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    /// Apple devices (APNs).
    Ios,
    /// Android devices (FCM).
    Android,
    /// Browser push subscriptions.
    Web,
}

impl DevicePlatform {
    /// Return the platform as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DevicePlatform {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "web" => Ok(Self::Web),
            _ => Err(learnhub_core::AppError::validation(format!(
                "Invalid device platform: '{s}'. Expected one of: ios, android, web"
            ))),
        }
    }
}

/// Push gateway environment a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushEnvironment {
    /// Sandbox gateway used by development builds.
    Development,
    /// Production gateway.
    Production,
}

impl PushEnvironment {
    /// Return the environment as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for PushEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PushEnvironment {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            _ => Err(learnhub_core::AppError::validation(format!(
                "Invalid push environment: '{s}'. Expected one of: development, production"
            ))),
        }
    }
}

/// One registered device/channel endpoint for remote push delivery.
///
/// Tokens are never hard-deleted: a superseded or failed registration is
/// deactivated and kept for audit. Deactivation is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushToken {
    /// Unique token record identifier.
    pub id: Uuid,
    /// The user this token addresses.
    pub user_id: Uuid,
    /// Opaque token string issued by the push gateway.
    pub token: String,
    /// Stable identifier of the device the token was issued on.
    pub device_id: String,
    /// Device platform.
    pub platform: DevicePlatform,
    /// Push gateway environment.
    pub environment: PushEnvironment,
    /// Whether this token is still usable for sends.
    pub is_active: bool,
    /// When the token was registered.
    pub created_at: DateTime<Utc>,
    /// When the token was last used for a send. Never moves backwards.
    pub last_used_at: DateTime<Utc>,
}

impl PushToken {
    /// Register a new, active token.
    pub fn new(
        user_id: Uuid,
        token: impl Into<String>,
        device_id: impl Into<String>,
        platform: DevicePlatform,
        environment: PushEnvironment,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token: token.into(),
            device_id: device_id.into(),
            platform,
            environment,
            is_active: true,
            created_at: now,
            last_used_at: now,
        }
    }

    /// Deactivate this token. Nothing in the subsystem reactivates a
    /// deactivated token; a replacement gets a fresh record.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Record a use of this token. `last_used_at` is monotonically
    /// non-decreasing even under clock adjustment.
    pub fn update_last_used(&mut self) {
        self.last_used_at = self.last_used_at.max(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> PushToken {
        PushToken::new(
            Uuid::new_v4(),
            "a1b2c3",
            "device-1",
            DevicePlatform::Ios,
            PushEnvironment::Development,
        )
    }

    #[test]
    fn test_new_token_is_active() {
        let token = sample_token();
        assert!(token.is_active);
        assert_eq!(token.created_at, token.last_used_at);
    }

    #[test]
    fn test_deactivation_is_terminal() {
        let mut token = sample_token();
        token.deactivate();
        assert!(!token.is_active);

        // The only mutators are deactivate and update_last_used; neither
        // brings a token back.
        token.update_last_used();
        token.deactivate();
        assert!(!token.is_active);
    }

    #[test]
    fn test_last_used_never_decreases() {
        let mut token = sample_token();
        let before = token.last_used_at;
        token.update_last_used();
        assert!(token.last_used_at >= before);
    }

    #[test]
    fn test_platform_parsing() {
        assert_eq!("ios".parse::<DevicePlatform>().unwrap(), DevicePlatform::Ios);
        assert_eq!("WEB".parse::<DevicePlatform>().unwrap(), DevicePlatform::Web);
        assert!("symbian".parse::<DevicePlatform>().is_err());
    }
}
