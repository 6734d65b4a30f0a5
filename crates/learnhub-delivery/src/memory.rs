//! In-memory platform scheduler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use learnhub_core::result::AppResult;

use crate::content::DeliveryContent;
use crate::platform::PlatformScheduler;

/// One pending arm held by the in-memory scheduler.
#[derive(Debug, Clone)]
pub struct ArmedDelivery {
    /// Content that would be presented.
    pub content: DeliveryContent,
    /// Deferred fire instant. `None` means immediate.
    pub fire_at: Option<DateTime<Utc>>,
}

/// Reference [`PlatformScheduler`] that records arms instead of
/// presenting them. Used by tests and as the default collaborator where
/// no OS bridge is wired in.
#[derive(Debug, Default)]
pub struct InMemoryPlatformScheduler {
    /// Notification id → pending arm
    armed: DashMap<Uuid, ArmedDelivery>,
    /// Current badge value
    badge: AtomicU32,
    /// Last raw token handed to `register_remote_token`
    registered_token: Mutex<Option<Vec<u8>>>,
}

impl InMemoryPlatformScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a pending arm.
    pub fn armed(&self, id: Uuid) -> Option<ArmedDelivery> {
        self.armed.get(&id).map(|r| r.value().clone())
    }

    /// Number of pending arms.
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Current badge value.
    pub fn badge(&self) -> u32 {
        self.badge.load(Ordering::SeqCst)
    }

    /// The raw token most recently registered, if any.
    pub fn registered_token(&self) -> Option<Vec<u8>> {
        self.registered_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PlatformScheduler for InMemoryPlatformScheduler {
    async fn arm(
        &self,
        id: Uuid,
        content: DeliveryContent,
        fire_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.armed.insert(id, ArmedDelivery { content, fire_at });
        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> AppResult<()> {
        self.armed.remove(&id);
        Ok(())
    }

    async fn cancel_all(&self) -> AppResult<()> {
        self.armed.clear();
        Ok(())
    }

    async fn set_badge(&self, count: u32) -> AppResult<()> {
        self.badge.store(count, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_badge(&self) -> AppResult<()> {
        self.badge.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn register_remote_token(&self, raw: &[u8]) -> AppResult<()> {
        let mut slot = self
            .registered_token
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(raw.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use learnhub_entity::{Notification, NotificationType};

    fn content(title: &str) -> DeliveryContent {
        let n = Notification::new(Uuid::new_v4(), NotificationType::SystemMessage, title, "b");
        DeliveryContent::from_notification(&n)
    }

    #[tokio::test]
    async fn test_rearm_replaces() {
        let platform = InMemoryPlatformScheduler::new();
        let id = Uuid::new_v4();

        platform.arm(id, content("first"), None).await.unwrap();
        let fire_at = Utc::now() + Duration::hours(2);
        platform
            .arm(id, content("second"), Some(fire_at))
            .await
            .unwrap();

        assert_eq!(platform.armed_count(), 1);
        let armed = platform.armed(id).unwrap();
        assert_eq!(armed.content.title, "second");
        assert_eq!(armed.fire_at, Some(fire_at));
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let platform = InMemoryPlatformScheduler::new();
        let id = Uuid::new_v4();
        platform.arm(id, content("x"), None).await.unwrap();

        platform.cancel(id).await.unwrap();
        platform.cancel(id).await.unwrap();
        platform.cancel(Uuid::new_v4()).await.unwrap();
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let platform = InMemoryPlatformScheduler::new();
        for _ in 0..3 {
            platform
                .arm(Uuid::new_v4(), content("x"), None)
                .await
                .unwrap();
        }
        platform.cancel_all().await.unwrap();
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn test_badge_set_and_clear() {
        let platform = InMemoryPlatformScheduler::new();
        platform.set_badge(7).await.unwrap();
        assert_eq!(platform.badge(), 7);
        platform.clear_badge().await.unwrap();
        assert_eq!(platform.badge(), 0);
    }

    #[tokio::test]
    async fn test_register_remote_token_records_bytes() {
        let platform = InMemoryPlatformScheduler::new();
        platform.register_remote_token(&[0xde, 0xad]).await.unwrap();
        assert_eq!(platform.registered_token(), Some(vec![0xde, 0xad]));
    }
}
