//! Notification orchestration for one signed-in user.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use learnhub_core::config::NotificationsConfig;
use learnhub_core::error::AppError;
use learnhub_core::result::AppResult;
use learnhub_core::types::pagination::{PageRequest, PageResponse};
use learnhub_delivery::NotificationScheduler;
use learnhub_entity::{
    FrequencyLimit, Notification, NotificationChannel, NotificationFilter, NotificationMetadata,
    NotificationPreferences, NotificationType,
};
use learnhub_store::NotificationStore;

use crate::events::NotificationEvents;

/// Orchestrates notifications for one signed-in user.
///
/// Delegates durability to the store and push delivery to the optional
/// scheduler, and owns the reactive surface: the unread count and the
/// new-notification flag (watch channels) plus the received/read/deleted
/// event streams.
///
/// `refresh_unread_count` is the only writer of the count; read
/// transitions do not touch it until a refresh is requested.
pub struct NotificationService {
    /// Durability collaborator
    store: Arc<dyn NotificationStore>,
    /// Push scheduling collaborator. `None` disables push entirely.
    scheduler: Option<Arc<NotificationScheduler>>,
    /// The signed-in user
    user_id: Uuid,
    /// Subsystem configuration
    config: NotificationsConfig,
    /// Lifecycle event streams
    events: NotificationEvents,
    /// Reactive unread count
    unread_count: watch::Sender<u64>,
    /// Latched flag: a notification arrived since the last clear
    has_new: watch::Sender<bool>,
}

impl NotificationService {
    /// Create a service for one user.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        scheduler: Option<Arc<NotificationScheduler>>,
        user_id: Uuid,
        config: &NotificationsConfig,
    ) -> Self {
        let (unread_count, _) = watch::channel(0);
        let (has_new, _) = watch::channel(false);
        Self {
            store,
            scheduler,
            user_id,
            config: config.clone(),
            events: NotificationEvents::new(config.event_buffer_size),
            unread_count,
            has_new,
        }
    }

    /// List this user's notifications, newest first.
    pub async fn fetch_notifications(
        &self,
        filter: Option<&NotificationFilter>,
        page: Option<&PageRequest>,
    ) -> AppResult<PageResponse<Notification>> {
        self.store
            .fetch_notifications(self.user_id, filter, page)
            .await
    }

    /// Look up one notification.
    pub async fn get_notification(&self, id: Uuid) -> AppResult<Option<Notification>> {
        self.store.get_notification(id).await
    }

    /// Mark a notification read and emit the post-transition record on
    /// the read stream. Unknown ids and already-read notifications are
    /// quietly accepted; the unread count is not refreshed here.
    pub async fn mark_as_read(&self, id: Uuid) -> AppResult<()> {
        self.store.mark_as_read(id).await?;
        if let Some(notification) = self.store.get_notification(id).await? {
            self.events.emit_read(notification);
        }
        Ok(())
    }

    /// Mark every unread notification of this user read. Returns how
    /// many flipped.
    pub async fn mark_all_as_read(&self) -> AppResult<u64> {
        let affected = self.store.mark_all_as_read(self.user_id).await?;
        tracing::debug!(user_id = %self.user_id, affected, "Marked all notifications read");
        Ok(affected)
    }

    /// Delete a notification and emit it on the deleted stream. Unknown
    /// ids complete silently with no event.
    pub async fn delete_notification(&self, id: Uuid) -> AppResult<()> {
        let existing = self.store.get_notification(id).await?;
        self.store.delete_notification(id).await?;
        if let Some(notification) = existing {
            self.events.emit_deleted(notification);
        }
        Ok(())
    }

    /// Persist and deliver a notification.
    ///
    /// Push scheduling happens only when the stored record's channels
    /// include `push` and a scheduler is attached; a scheduling failure
    /// is logged and swallowed, since the notification is already
    /// persisted. When the recipient is this service's own user, the
    /// new-notification flag latches and the received stream fires.
    pub async fn send(&self, notification: Notification) -> AppResult<Notification> {
        let stored = self.store.create_notification(notification).await?;
        tracing::debug!(
            notification_id = %stored.id,
            kind = %stored.kind,
            recipient = %stored.user_id,
            "Notification stored"
        );

        if stored.channels.contains(&NotificationChannel::Push) {
            if let Some(scheduler) = self.scheduler.as_ref() {
                if let Err(e) = self.schedule_push(scheduler, &stored).await {
                    tracing::warn!(
                        notification_id = %stored.id,
                        error = %e,
                        "Push scheduling failed; notification persisted"
                    );
                }
            }
        }

        if stored.user_id == self.user_id {
            self.has_new.send_replace(true);
            self.events.emit_received(stored.clone());
        }
        Ok(stored)
    }

    async fn schedule_push(
        &self,
        scheduler: &NotificationScheduler,
        notification: &Notification,
    ) -> AppResult<()> {
        let preferences = self.store.get_preferences(notification.user_id).await?;
        let armed = scheduler
            .schedule_respecting_quiet_hours(notification, &preferences)
            .await?;
        if armed.is_none() {
            tracing::debug!(
                notification_id = %notification.id,
                "Push suppressed by recipient preferences"
            );
        }
        Ok(())
    }

    /// Send the same notification content to several recipients,
    /// concurrently. Fails on the first store error.
    pub async fn send_to_many(
        &self,
        user_ids: &[Uuid],
        kind: NotificationType,
        title: impl Into<String>,
        body: impl Into<String>,
        data: Option<HashMap<String, String>>,
    ) -> AppResult<Vec<Notification>> {
        let title = title.into();
        let body = body.into();
        let sends = user_ids.iter().map(|&user_id| {
            let mut notification = Notification::new(user_id, kind, title.clone(), body.clone());
            if let Some(data) = data.clone() {
                notification = notification.with_data(data);
            }
            self.send(notification)
        });
        try_join_all(sends).await
    }

    /// Render the newest template for `kind` and send the result to each
    /// recipient, applying the template's default channels, priority,
    /// and expiry. Errors with `NotFound` when no template exists.
    pub async fn send_templated(
        &self,
        user_ids: &[Uuid],
        kind: NotificationType,
        parameters: &HashMap<String, String>,
    ) -> AppResult<Vec<Notification>> {
        let template = self
            .store
            .get_templates(Some(kind))
            .await?
            .into_iter()
            .max_by_key(|t| t.created_at)
            .ok_or_else(|| {
                AppError::not_found(format!("No template for notification type '{kind}'"))
            })?;

        let (title, body) = template.render(parameters);
        let sends = user_ids.iter().map(|&user_id| {
            let mut notification = Notification::new(user_id, kind, title.clone(), body.clone())
                .with_channels(template.default_channels.iter().copied())
                .with_priority(template.default_priority);
            if let Some(seconds) = template.default_expiry_seconds {
                notification = notification.with_expires_at(Utc::now() + Duration::seconds(seconds));
            }
            if !parameters.is_empty() {
                notification = notification.with_data(parameters.clone());
            }
            self.send(notification)
        });
        try_join_all(sends).await
    }

    /// Send a synthetic notification of `kind` to this user, with the
    /// demo content for the type.
    ///
    /// Frequency caps from the user's preferences are enforced first
    /// against rolling windows; a violated cap fails with `RateLimit`
    /// and nothing is stored.
    pub async fn send_test_notification(&self, kind: NotificationType) -> AppResult<Notification> {
        let preferences = self.store.get_preferences(self.user_id).await?;
        if let Some(limit) = preferences.frequency_limits.get(&kind) {
            self.enforce_frequency_limit(kind, limit).await?;
        }

        let (title, body) = demo_content(kind);
        let notification = Notification::new(self.user_id, kind, title, body)
            .with_channels([NotificationChannel::InApp, NotificationChannel::Push])
            .with_data(HashMap::from([("test".to_string(), "true".to_string())]));
        self.send(notification).await
    }

    async fn enforce_frequency_limit(
        &self,
        kind: NotificationType,
        limit: &FrequencyLimit,
    ) -> AppResult<()> {
        let now = Utc::now();
        let windows = [
            (limit.max_per_hour, Duration::hours(1), "hour"),
            (limit.max_per_day, Duration::hours(24), "24 hours"),
            (limit.max_per_week, Duration::days(7), "7 days"),
        ];
        for (cap, window, label) in windows {
            let Some(cap) = cap else { continue };
            let sent = self
                .store
                .count_created_since(self.user_id, kind, now - window)
                .await?;
            if sent >= u64::from(cap) {
                return Err(AppError::rate_limit(format!(
                    "Frequency limit reached for '{kind}': {sent} in the last {label} (cap {cap})"
                )));
            }
        }
        Ok(())
    }

    /// Notify a user about a newly assigned course.
    pub async fn notify_course_assigned(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        course_name: &str,
        deadline: Option<DateTime<Utc>>,
    ) -> AppResult<Notification> {
        let body = match deadline {
            Some(deadline) => format!(
                "Вам назначен курс '{course_name}'. Срок прохождения: {}",
                deadline.format("%d.%m.%Y")
            ),
            None => format!("Вам назначен курс '{course_name}'"),
        };
        let notification = Notification::new(
            user_id,
            NotificationType::CourseAssigned,
            format!("Новый курс: {course_name}"),
            body,
        )
        .with_channels([NotificationChannel::InApp, NotificationChannel::Push])
        .with_data(HashMap::from([(
            "course_id".to_string(),
            course_id.to_string(),
        )]));
        self.send(notification).await
    }

    /// Remind a user about a test deadline. The notification expires at
    /// the deadline, since it is pointless afterwards.
    pub async fn notify_test_reminder(
        &self,
        user_id: Uuid,
        test_id: Uuid,
        test_name: &str,
        deadline: DateTime<Utc>,
    ) -> AppResult<Notification> {
        let hours_left = (deadline - Utc::now()).num_hours().max(0);
        let notification = Notification::new(
            user_id,
            NotificationType::TestDeadline,
            "Приближается дедлайн",
            format!("До окончания теста '{test_name}' осталось {hours_left} ч."),
        )
        .with_channels([NotificationChannel::InApp, NotificationChannel::Push])
        .with_data(HashMap::from([("test_id".to_string(), test_id.to_string())]))
        .with_expires_at(deadline);
        self.send(notification).await
    }

    /// Congratulate a user on an unlocked achievement.
    pub async fn notify_achievement_unlocked(
        &self,
        user_id: Uuid,
        achievement_name: &str,
        image_url: Option<String>,
    ) -> AppResult<Notification> {
        let mut notification = Notification::new(
            user_id,
            NotificationType::AchievementUnlocked,
            "Новое достижение!",
            format!("Вы получили достижение '{achievement_name}'"),
        )
        .with_channels([NotificationChannel::InApp, NotificationChannel::Push]);
        if image_url.is_some() {
            notification = notification.with_metadata(NotificationMetadata {
                image_url,
                ..Default::default()
            });
        }
        self.send(notification).await
    }

    /// Recount unread notifications and publish the result. This is the
    /// only writer of the unread count.
    pub async fn refresh_unread_count(&self) -> AppResult<u64> {
        let count = self.store.count_unread(self.user_id).await?;
        self.unread_count.send_replace(count);
        Ok(count)
    }

    /// Delete notifications whose expiry passed at least
    /// `cleanup_after_days` ago. Returns how many were removed.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.config.cleanup_after_days));
        let deleted = self.store.delete_expired(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, "Swept expired notifications");
        }
        Ok(deleted)
    }

    /// Reset the new-notification flag.
    pub fn clear_new_notification_flag(&self) {
        self.has_new.send_replace(false);
    }

    /// Snapshot of the unread count as of the last refresh.
    pub fn unread_count(&self) -> u64 {
        *self.unread_count.borrow()
    }

    /// Whether a notification arrived since the last clear.
    pub fn has_new_notifications(&self) -> bool {
        *self.has_new.borrow()
    }

    /// Observe the unread count reactively.
    pub fn watch_unread_count(&self) -> watch::Receiver<u64> {
        self.unread_count.subscribe()
    }

    /// Observe the new-notification flag reactively.
    pub fn watch_has_new_notifications(&self) -> watch::Receiver<bool> {
        self.has_new.subscribe()
    }

    /// This user's delivery preferences.
    pub async fn get_preferences(&self) -> AppResult<NotificationPreferences> {
        self.store.get_preferences(self.user_id).await
    }

    /// Replace this user's delivery preferences.
    pub async fn update_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> AppResult<NotificationPreferences> {
        self.store.update_preferences(preferences).await
    }

    /// Subscribe to notifications received for this user.
    pub fn subscribe_received(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe_received()
    }

    /// Subscribe to read transitions.
    pub fn subscribe_read(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe_read()
    }

    /// Subscribe to deletions.
    pub fn subscribe_deleted(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe_deleted()
    }
}

/// Demo content for synthetic notifications, per type.
fn demo_content(kind: NotificationType) -> (String, String) {
    let (title, body) = match kind {
        NotificationType::CourseAssigned => (
            "Новый курс назначен",
            "Вам назначен курс 'iOS Development'. Начните обучение прямо сейчас!",
        ),
        NotificationType::TestAvailable => (
            "Доступен новый тест",
            "Тест по курсу 'Swift Basics' доступен для прохождения",
        ),
        NotificationType::TestDeadline => (
            "Приближается дедлайн",
            "До окончания теста 'iOS Architecture' осталось 2 часа",
        ),
        NotificationType::TaskAssigned => ("Новая задача", "Вам назначена задача онбординга"),
        NotificationType::AchievementUnlocked => {
            ("Новое достижение!", "Вы получили достижение 'Первые шаги'")
        }
        NotificationType::CertificateIssued => (
            "Сертификат получен",
            "Ваш сертификат по курсу 'SwiftUI' готов",
        ),
        NotificationType::SystemMessage => {
            ("Системное уведомление", "Запланировано обновление системы")
        }
        NotificationType::AdminMessage => (
            "Сообщение от администратора",
            "Проверьте обновлённое расписание занятий",
        ),
        _ => {
            return (
                "Тестовое уведомление".to_string(),
                format!("Тестовое уведомление типа '{kind}'"),
            );
        }
    };
    (title.to_string(), body.to_string())
}
