//! The store trait the notification core consumes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use learnhub_core::result::AppResult;
use learnhub_core::types::pagination::{PageRequest, PageResponse};
use learnhub_entity::{
    Notification, NotificationFilter, NotificationPreferences, NotificationTemplate,
    NotificationType, PushToken,
};

/// Durable storage for notifications, push tokens, preferences, and
/// templates.
///
/// Every operation is an independent request/response call; no
/// cross-operation transaction is promised. Implementations guarantee
/// per-call atomicity and report failures as `ErrorKind::Database`
/// errors, which callers propagate unchanged.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Persist a new notification and echo back the stored record.
    async fn create_notification(&self, notification: Notification) -> AppResult<Notification>;

    /// Fetch a user's notifications, newest first, applying the filter
    /// semantics of [`NotificationFilter::matches`] before pagination.
    /// A missing page request returns all matches as a single page.
    async fn fetch_notifications(
        &self,
        user_id: Uuid,
        filter: Option<&NotificationFilter>,
        page: Option<&PageRequest>,
    ) -> AppResult<PageResponse<Notification>>;

    /// Look up one notification. Absence is `Ok(None)`, not an error.
    async fn get_notification(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Replace a stored notification. Unknown ids are a not-found error.
    async fn update_notification(&self, notification: Notification) -> AppResult<Notification>;

    /// Delete a notification. Deleting an unknown id is a no-op.
    async fn delete_notification(&self, id: Uuid) -> AppResult<()>;

    /// Transition a notification to read. Idempotent: `read_at` keeps the
    /// instant of the first transition. Unknown ids are a no-op.
    async fn mark_as_read(&self, id: Uuid) -> AppResult<()>;

    /// Transition every currently stored unread notification of the user
    /// to read. Returns the number of affected records.
    async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<u64>;

    /// Count the user's unread notifications.
    async fn count_unread(&self, user_id: Uuid) -> AppResult<u64>;

    /// Count the user's notifications of one type created at or after
    /// `since`. Backs frequency-cap enforcement.
    async fn count_created_since(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        since: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Delete every notification whose expiry lies before `now`. Returns
    /// the number of deleted records.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Persist a push token. Any other still-active token registered for
    /// the same device is deactivated (superseded), never deleted.
    async fn save_push_token(&self, token: PushToken) -> AppResult<PushToken>;

    /// All of a user's tokens, active and inactive. Callers filter.
    async fn get_push_tokens(&self, user_id: Uuid) -> AppResult<Vec<PushToken>>;

    /// The user's preferences, or a fresh default-enabled record when
    /// none is stored. Never a not-found error.
    async fn get_preferences(&self, user_id: Uuid) -> AppResult<NotificationPreferences>;

    /// Upsert the user's preferences. `updated_at` is bumped on store.
    async fn update_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> AppResult<NotificationPreferences>;

    /// Templates, optionally restricted to one type, newest first.
    async fn get_templates(
        &self,
        kind: Option<NotificationType>,
    ) -> AppResult<Vec<NotificationTemplate>>;

    /// Persist a new template.
    async fn create_template(
        &self,
        template: NotificationTemplate,
    ) -> AppResult<NotificationTemplate>;
}
