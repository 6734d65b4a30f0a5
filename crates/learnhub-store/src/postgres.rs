//! PostgreSQL notification store.
//!
//! Enum-valued columns are stored as their snake_case TEXT form and
//! set/map-valued columns as JSONB, so rows are decoded through private
//! row structs instead of deriving `FromRow` on the entities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_core::types::pagination::{PageRequest, PageResponse};
use learnhub_entity::{
    Notification, NotificationFilter, NotificationPreferences, NotificationPriority,
    NotificationTemplate, NotificationType, PushToken,
};

use crate::store::NotificationStore;

/// Store implementation backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a new PostgreSQL-backed store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Filter clause shared by the fetch and count queries. `$2`..`$7` are
/// the optional filter criteria; a NULL bind disables its criterion.
const FETCH_FILTER: &str = "user_id = $1 \
     AND ($2::text[] IS NULL OR kind = ANY($2)) \
     AND ($3::text[] IS NULL OR priority = ANY($3)) \
     AND ($4::boolean IS NULL OR is_read = $4) \
     AND ($5::boolean OR is_read = FALSE) \
     AND ($6::timestamptz IS NULL OR created_at >= $6) \
     AND ($7::timestamptz IS NULL OR created_at <= $7)";

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create_notification(&self, notification: Notification) -> AppResult<Notification> {
        let data = notification
            .data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let channels = serde_json::to_value(&notification.channels)?;
        let metadata = notification
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query_as::<_, NotificationRow>(
            "INSERT INTO notifications \
             (id, user_id, kind, title, body, data, channels, priority, is_read, read_at, created_at, expires_at, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(data)
        .bind(channels)
        .bind(notification.priority.as_str())
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .bind(notification.expires_at)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))?;

        row.try_into()
    }

    async fn fetch_notifications(
        &self,
        user_id: Uuid,
        filter: Option<&NotificationFilter>,
        page: Option<&PageRequest>,
    ) -> AppResult<PageResponse<Notification>> {
        let kinds: Option<Vec<String>> = filter
            .and_then(|f| f.types.as_ref())
            .map(|set| set.iter().map(|t| t.as_str().to_string()).collect());
        let priorities = filter.and_then(allowed_priorities);
        let is_read = filter.and_then(|f| f.is_read);
        let show_read = filter.map(|f| f.show_read).unwrap_or(true);
        let created_after = filter.and_then(|f| f.created_after);
        let created_before = filter.and_then(|f| f.created_before);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications WHERE {FETCH_FILTER}"
        ))
        .bind(user_id)
        .bind(&kinds)
        .bind(&priorities)
        .bind(is_read)
        .bind(show_read)
        .bind(created_after)
        .bind(created_before)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count notifications", e))?;

        // LIMIT NULL means no limit, which covers the "all as one page"
        // contract for a missing page request.
        let limit: Option<i64> = page.map(|p| p.limit() as i64);
        let offset: i64 = page.map(|p| p.offset() as i64).unwrap_or(0);

        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT * FROM notifications WHERE {FETCH_FILTER} \
             ORDER BY created_at DESC LIMIT $8 OFFSET $9"
        ))
        .bind(user_id)
        .bind(&kinds)
        .bind(&priorities)
        .bind(is_read)
        .bind(show_read)
        .bind(created_after)
        .bind(created_before)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        let items: Vec<Notification> = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<AppResult<_>>()?;

        Ok(match page {
            Some(p) => PageResponse::new(items, p.page, p.page_size, total as u64),
            None => {
                let total = total as u64;
                PageResponse::new(items, 1, total.max(1), total)
            }
        })
    }

    async fn get_notification(&self, id: Uuid) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to get notification", e))?;

        row.map(Notification::try_from).transpose()
    }

    async fn update_notification(&self, notification: Notification) -> AppResult<Notification> {
        let data = notification
            .data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let channels = serde_json::to_value(&notification.channels)?;
        let metadata = notification
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET \
             kind = $2, title = $3, body = $4, data = $5, channels = $6, priority = $7, \
             is_read = $8, read_at = $9, expires_at = $10, metadata = $11 \
             WHERE id = $1 RETURNING *",
        )
        .bind(notification.id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(data)
        .bind(channels)
        .bind(notification.priority.as_str())
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.expires_at)
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update notification", e))?;

        match row {
            Some(row) => row.try_into(),
            None => Err(AppError::not_found(format!(
                "Notification {} does not exist",
                notification.id
            ))),
        }
    }

    async fn delete_notification(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete notification", e)
            })?;
        Ok(())
    }

    async fn mark_as_read(&self, id: Uuid) -> AppResult<()> {
        // COALESCE keeps the first read instant across repeated marks.
        sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))?;
        Ok(count as u64)
    }

    async fn count_created_since(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND kind = $2 AND created_at >= $3",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count by type", e))?;
        Ok(count as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete expired notifications", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn save_push_token(&self, token: PushToken) -> AppResult<PushToken> {
        sqlx::query(
            "UPDATE push_tokens SET is_active = FALSE \
             WHERE device_id = $1 AND id <> $2 AND is_active = TRUE",
        )
        .bind(&token.device_id)
        .bind(token.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to supersede device tokens", e)
        })?;

        let row = sqlx::query_as::<_, PushTokenRow>(
            "INSERT INTO push_tokens \
             (id, user_id, token, device_id, platform, environment, is_active, created_at, last_used_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
             token = EXCLUDED.token, is_active = EXCLUDED.is_active, last_used_at = EXCLUDED.last_used_at \
             RETURNING *",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token)
        .bind(&token.device_id)
        .bind(token.platform.as_str())
        .bind(token.environment.as_str())
        .bind(token.is_active)
        .bind(token.created_at)
        .bind(token.last_used_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save push token", e))?;

        row.try_into()
    }

    async fn get_push_tokens(&self, user_id: Uuid) -> AppResult<Vec<PushToken>> {
        let rows = sqlx::query_as::<_, PushTokenRow>(
            "SELECT * FROM push_tokens WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list push tokens", e))?;

        rows.into_iter().map(PushToken::try_from).collect()
    }

    async fn get_preferences(&self, user_id: Uuid) -> AppResult<NotificationPreferences> {
        let row = sqlx::query_as::<_, PreferencesRow>(
            "SELECT * FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to get preferences", e))?;

        match row {
            Some(row) => row.try_into(),
            None => Ok(NotificationPreferences::default_for_user(user_id)),
        }
    }

    async fn update_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> AppResult<NotificationPreferences> {
        let channel_preferences = serde_json::to_value(&preferences.channel_preferences)?;
        let quiet_hours = preferences
            .quiet_hours
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let frequency_limits = serde_json::to_value(&preferences.frequency_limits)?;

        let row = sqlx::query_as::<_, PreferencesRow>(
            "INSERT INTO notification_preferences \
             (user_id, is_enabled, channel_preferences, quiet_hours, frequency_limits, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET \
             is_enabled = $2, channel_preferences = $3, quiet_hours = $4, \
             frequency_limits = $5, updated_at = NOW() \
             RETURNING *",
        )
        .bind(preferences.user_id)
        .bind(preferences.is_enabled)
        .bind(channel_preferences)
        .bind(quiet_hours)
        .bind(frequency_limits)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert preferences", e))?;

        row.try_into()
    }

    async fn get_templates(
        &self,
        kind: Option<NotificationType>,
    ) -> AppResult<Vec<NotificationTemplate>> {
        let kind: Option<&str> = kind.map(|k| k.as_str());
        let rows = sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM notification_templates \
             WHERE ($1::text IS NULL OR kind = $1) ORDER BY created_at DESC",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list templates", e))?;

        rows.into_iter().map(NotificationTemplate::try_from).collect()
    }

    async fn create_template(
        &self,
        template: NotificationTemplate,
    ) -> AppResult<NotificationTemplate> {
        let channels = serde_json::to_value(&template.default_channels)?;
        let row = sqlx::query_as::<_, TemplateRow>(
            "INSERT INTO notification_templates \
             (id, kind, title_template, body_template, default_channels, default_priority, default_expiry_seconds, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(template.id)
        .bind(template.kind.as_str())
        .bind(&template.title_template)
        .bind(&template.body_template)
        .bind(channels)
        .bind(template.default_priority.as_str())
        .bind(template.default_expiry_seconds)
        .bind(template.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create template", e))?;

        row.try_into()
    }
}

/// Expand the filter's priority criteria into the allowed TEXT values.
/// Returns `None` when the filter does not constrain priority. When both
/// the exact set and the minimum are given, a priority must satisfy both.
fn allowed_priorities(filter: &NotificationFilter) -> Option<Vec<String>> {
    if filter.priorities.is_none() && filter.min_priority.is_none() {
        return None;
    }
    let allowed = NotificationPriority::ALL
        .iter()
        .copied()
        .filter(|p| {
            filter
                .priorities
                .as_ref()
                .map(|set| set.contains(p))
                .unwrap_or(true)
        })
        .filter(|p| filter.min_priority.map(|min| *p >= min).unwrap_or(true))
        .map(|p| p.as_str().to_string())
        .collect();
    Some(allowed)
}

/// Decode a snake_case TEXT column into its enum form.
fn decode<T>(value: &str, what: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    value.parse().map_err(|_| {
        AppError::new(
            ErrorKind::Serialization,
            format!("Unknown {what} in row: '{value}'"),
        )
    })
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    body: String,
    data: Option<serde_json::Value>,
    channels: serde_json::Value,
    priority: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    metadata: Option<serde_json::Value>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            kind: decode(&row.kind, "notification type")?,
            title: row.title,
            body: row.body,
            data: row.data.map(serde_json::from_value).transpose()?,
            channels: serde_json::from_value(row.channels)?,
            priority: decode(&row.priority, "notification priority")?,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
            expires_at: row.expires_at,
            metadata: row.metadata.map(serde_json::from_value).transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PushTokenRow {
    id: Uuid,
    user_id: Uuid,
    token: String,
    device_id: String,
    platform: String,
    environment: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
}

impl TryFrom<PushTokenRow> for PushToken {
    type Error = AppError;

    fn try_from(row: PushTokenRow) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            device_id: row.device_id,
            platform: decode(&row.platform, "device platform")?,
            environment: decode(&row.environment, "push environment")?,
            is_active: row.is_active,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PreferencesRow {
    user_id: Uuid,
    is_enabled: bool,
    channel_preferences: serde_json::Value,
    quiet_hours: Option<serde_json::Value>,
    frequency_limits: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PreferencesRow> for NotificationPreferences {
    type Error = AppError;

    fn try_from(row: PreferencesRow) -> AppResult<Self> {
        Ok(Self {
            user_id: row.user_id,
            is_enabled: row.is_enabled,
            channel_preferences: serde_json::from_value(row.channel_preferences)?,
            quiet_hours: row.quiet_hours.map(serde_json::from_value).transpose()?,
            frequency_limits: serde_json::from_value(row.frequency_limits)?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    kind: String,
    title_template: String,
    body_template: String,
    default_channels: serde_json::Value,
    default_priority: String,
    default_expiry_seconds: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for NotificationTemplate {
    type Error = AppError;

    fn try_from(row: TemplateRow) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            kind: decode(&row.kind, "notification type")?,
            title_template: row.title_template,
            body_template: row.body_template,
            default_channels: serde_json::from_value(row.default_channels)?,
            default_priority: decode(&row.default_priority, "notification priority")?,
            default_expiry_seconds: row.default_expiry_seconds,
            created_at: row.created_at,
        })
    }
}
