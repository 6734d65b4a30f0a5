//! Platform scheduler boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use learnhub_core::result::AppResult;

use crate::content::DeliveryContent;

/// Boundary to the OS notification facility.
///
/// Implementations wrap whatever the platform offers for presenting
/// notifications, managing the application badge, and registering for
/// remote push. [`InMemoryPlatformScheduler`](crate::memory::InMemoryPlatformScheduler)
/// is the reference implementation used in tests.
#[async_trait]
pub trait PlatformScheduler: Send + Sync + 'static {
    /// Arm a delivery under `id`. `fire_at = None` requests immediate
    /// presentation; `Some` defers to that instant. Re-arming an id
    /// replaces the prior arm.
    async fn arm(
        &self,
        id: Uuid,
        content: DeliveryContent,
        fire_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Cancel a pending arm. Unknown ids are a no-op.
    async fn cancel(&self, id: Uuid) -> AppResult<()>;

    /// Cancel every pending arm. Best-effort: deliveries already
    /// presented are unaffected.
    async fn cancel_all(&self) -> AppResult<()>;

    /// Set the application badge value.
    async fn set_badge(&self, count: u32) -> AppResult<()>;

    /// Clear the application badge.
    async fn clear_badge(&self) -> AppResult<()>;

    /// Register the raw device token with the push gateway.
    async fn register_remote_token(&self, raw: &[u8]) -> AppResult<()>;
}
