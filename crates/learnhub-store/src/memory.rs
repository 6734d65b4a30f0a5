//! In-memory notification store.
//!
//! Reference implementation of [`NotificationStore`] used by the test
//! suites and as the seed store for demo environments. State lives in a
//! single `RwLock`; every call locks for its own duration only, which
//! gives the per-call atomicity the trait asks for.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use learnhub_core::error::AppError;
use learnhub_core::result::AppResult;
use learnhub_core::types::pagination::{PageRequest, PageResponse};
use learnhub_entity::{
    Notification, NotificationFilter, NotificationPreferences, NotificationTemplate,
    NotificationType, PushToken,
};

use crate::store::NotificationStore;

#[derive(Default)]
struct StoreState {
    notifications: Vec<Notification>,
    tokens: Vec<PushToken>,
    preferences: HashMap<Uuid, NotificationPreferences>,
    templates: Vec<NotificationTemplate>,
}

/// In-memory [`NotificationStore`] implementation.
pub struct InMemoryNotificationStore {
    state: RwLock<StoreState>,
}

impl InMemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Create a store pre-seeded with the stock template set.
    pub fn with_default_templates() -> Self {
        Self {
            state: RwLock::new(StoreState {
                templates: default_templates(),
                ..StoreState::default()
            }),
        }
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The stock templates shipped with the platform.
fn default_templates() -> Vec<NotificationTemplate> {
    vec![
        NotificationTemplate::new(
            NotificationType::CourseAssigned,
            "Новый курс: {{courseName}}",
            "Вам назначен курс '{{courseName}}'. Срок прохождения: {{deadline}}",
        ),
        NotificationTemplate::new(
            NotificationType::TestDeadline,
            "Дедлайн теста приближается",
            "Тест '{{testName}}' необходимо пройти до {{deadline}}",
        ),
        NotificationTemplate::new(
            NotificationType::AchievementUnlocked,
            "Новое достижение!",
            "Вы получили достижение '{{achievementName}}'",
        ),
        NotificationTemplate::new(
            NotificationType::CertificateIssued,
            "Сертификат готов",
            "Ваш сертификат по курсу '{{courseName}}' готов к скачиванию",
        ),
    ]
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create_notification(&self, notification: Notification) -> AppResult<Notification> {
        let mut state = self.state.write().await;
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn fetch_notifications(
        &self,
        user_id: Uuid,
        filter: Option<&NotificationFilter>,
        page: Option<&PageRequest>,
    ) -> AppResult<PageResponse<Notification>> {
        let state = self.state.read().await;
        let mut matches: Vec<&Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| filter.map(|f| f.matches(n)).unwrap_or(true))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as u64;
        match page {
            Some(page) => {
                let start = page.offset() as usize;
                let items: Vec<Notification> = matches
                    .into_iter()
                    .skip(start)
                    .take(page.limit() as usize)
                    .cloned()
                    .collect();
                Ok(PageResponse::new(items, page.page, page.page_size, total))
            }
            None => {
                let items: Vec<Notification> = matches.into_iter().cloned().collect();
                let page_size = total.max(1);
                Ok(PageResponse::new(items, 1, page_size, total))
            }
        }
    }

    async fn get_notification(&self, id: Uuid) -> AppResult<Option<Notification>> {
        let state = self.state.read().await;
        Ok(state.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn update_notification(&self, notification: Notification) -> AppResult<Notification> {
        let mut state = self.state.write().await;
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification.id)
        {
            Some(stored) => {
                *stored = notification.clone();
                Ok(notification)
            }
            None => Err(AppError::not_found(format!(
                "Notification {} does not exist",
                notification.id
            ))),
        }
    }

    async fn delete_notification(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.notifications.retain(|n| n.id != id);
        Ok(())
    }

    async fn mark_as_read(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
            n.mark_read();
        }
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut affected = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.mark_read();
            affected += 1;
        }
        Ok(affected)
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn count_created_since(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && n.kind == kind && n.created_at >= since)
            .count() as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| n.expires_at.map(|exp| exp >= now).unwrap_or(true));
        Ok((before - state.notifications.len()) as u64)
    }

    async fn save_push_token(&self, token: PushToken) -> AppResult<PushToken> {
        let mut state = self.state.write().await;
        for existing in state
            .tokens
            .iter_mut()
            .filter(|t| t.device_id == token.device_id && t.id != token.id)
        {
            existing.deactivate();
        }
        match state.tokens.iter_mut().find(|t| t.id == token.id) {
            Some(stored) => *stored = token.clone(),
            None => state.tokens.push(token.clone()),
        }
        Ok(token)
    }

    async fn get_push_tokens(&self, user_id: Uuid) -> AppResult<Vec<PushToken>> {
        let state = self.state.read().await;
        Ok(state
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_preferences(&self, user_id: Uuid) -> AppResult<NotificationPreferences> {
        let state = self.state.read().await;
        Ok(state
            .preferences
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| NotificationPreferences::default_for_user(user_id)))
    }

    async fn update_preferences(
        &self,
        mut preferences: NotificationPreferences,
    ) -> AppResult<NotificationPreferences> {
        let mut state = self.state.write().await;
        preferences.updated_at = Utc::now();
        state
            .preferences
            .insert(preferences.user_id, preferences.clone());
        Ok(preferences)
    }

    async fn get_templates(
        &self,
        kind: Option<NotificationType>,
    ) -> AppResult<Vec<NotificationTemplate>> {
        let state = self.state.read().await;
        let mut templates: Vec<NotificationTemplate> = state
            .templates
            .iter()
            .filter(|t| kind.map(|k| t.kind == k).unwrap_or(true))
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    async fn create_template(
        &self,
        template: NotificationTemplate,
    ) -> AppResult<NotificationTemplate> {
        let mut state = self.state.write().await;
        state.templates.push(template.clone());
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use learnhub_core::error::ErrorKind;
    use learnhub_entity::{DevicePlatform, NotificationChannel, PushEnvironment};

    fn make_store() -> InMemoryNotificationStore {
        InMemoryNotificationStore::new()
    }

    fn notification_at(user_id: Uuid, minutes_ago: i64) -> Notification {
        let mut n = Notification::new(
            user_id,
            NotificationType::CourseAssigned,
            "Новый курс",
            "Вам назначен курс",
        );
        n.created_at = Utc::now() - Duration::minutes(minutes_ago);
        n
    }

    #[tokio::test]
    async fn test_fetch_is_newest_first() {
        let store = make_store();
        let user = Uuid::new_v4();
        let old = notification_at(user, 30);
        let fresh = notification_at(user, 1);
        store.create_notification(old.clone()).await.unwrap();
        store.create_notification(fresh.clone()).await.unwrap();

        let page = store.fetch_notifications(user, None, None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, fresh.id);
        assert_eq!(page.items[1].id, old.id);
    }

    #[tokio::test]
    async fn test_pagination_math_over_five_items() {
        let store = make_store();
        let user = Uuid::new_v4();
        for i in 0..5 {
            store
                .create_notification(notification_at(user, i))
                .await
                .unwrap();
        }

        let page = store
            .fetch_notifications(user, None, Some(&PageRequest::new(1, 2)))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(!page.has_previous_page);

        let last = store
            .fetch_notifications(user, None, Some(&PageRequest::new(3, 2)))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next_page);
        assert!(last.has_previous_page);
    }

    #[tokio::test]
    async fn test_page_beyond_end_is_empty() {
        let store = make_store();
        let user = Uuid::new_v4();
        store
            .create_notification(notification_at(user, 1))
            .await
            .unwrap();

        let page = store
            .fetch_notifications(user, None, Some(&PageRequest::new(5, 10)))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 1);
    }

    #[tokio::test]
    async fn test_filter_is_applied_before_pagination() {
        let store = make_store();
        let user = Uuid::new_v4();
        for i in 0..3 {
            store
                .create_notification(notification_at(user, i))
                .await
                .unwrap();
        }
        let mut urgent = Notification::new(
            user,
            NotificationType::SystemMessage,
            "Система",
            "Обновление",
        );
        urgent.priority = learnhub_entity::NotificationPriority::Urgent;
        store.create_notification(urgent.clone()).await.unwrap();

        let filter = NotificationFilter {
            min_priority: Some(learnhub_entity::NotificationPriority::High),
            ..Default::default()
        };
        let page = store
            .fetch_notifications(user, Some(&filter), Some(&PageRequest::new(1, 10)))
            .await
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].id, urgent.id);
    }

    #[tokio::test]
    async fn test_mark_as_read_is_idempotent() {
        let store = make_store();
        let user = Uuid::new_v4();
        let n = notification_at(user, 1);
        store.create_notification(n.clone()).await.unwrap();

        store.mark_as_read(n.id).await.unwrap();
        let first = store
            .get_notification(n.id)
            .await
            .unwrap()
            .unwrap()
            .read_at;
        assert!(first.is_some());

        store.mark_as_read(n.id).await.unwrap();
        let second = store
            .get_notification(n.id)
            .await
            .unwrap()
            .unwrap()
            .read_at;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mark_as_read_on_unknown_id_is_noop() {
        let store = make_store();
        store.mark_as_read(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_all_and_count_unread() {
        let store = make_store();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        for i in 0..3 {
            store
                .create_notification(notification_at(user, i))
                .await
                .unwrap();
        }
        store
            .create_notification(notification_at(other, 1))
            .await
            .unwrap();

        assert_eq!(store.count_unread(user).await.unwrap(), 3);
        let affected = store.mark_all_as_read(user).await.unwrap();
        assert_eq!(affected, 3);
        assert_eq!(store.count_unread(user).await.unwrap(), 0);
        // The other user's notifications are untouched.
        assert_eq!(store.count_unread(other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let store = make_store();
        store.delete_notification(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = make_store();
        let n = notification_at(Uuid::new_v4(), 1);
        let err = store.update_notification(n).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_unexpired() {
        let store = make_store();
        let user = Uuid::new_v4();
        let now = Utc::now();

        let mut expired = notification_at(user, 60);
        expired.expires_at = Some(now - Duration::minutes(5));
        let mut live = notification_at(user, 60);
        live.expires_at = Some(now + Duration::hours(1));
        let eternal = notification_at(user, 60);

        store.create_notification(expired).await.unwrap();
        store.create_notification(live).await.unwrap();
        store.create_notification(eternal).await.unwrap();

        let deleted = store.delete_expired(now).await.unwrap();
        assert_eq!(deleted, 1);
        let page = store.fetch_notifications(user, None, None).await.unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_save_push_token_supersedes_same_device() {
        let store = make_store();
        let user = Uuid::new_v4();
        let first = PushToken::new(
            user,
            "aaaa",
            "device-1",
            DevicePlatform::Ios,
            PushEnvironment::Development,
        );
        let replacement = PushToken::new(
            user,
            "bbbb",
            "device-1",
            DevicePlatform::Ios,
            PushEnvironment::Development,
        );
        let other_device = PushToken::new(
            user,
            "cccc",
            "device-2",
            DevicePlatform::Android,
            PushEnvironment::Development,
        );

        store.save_push_token(first.clone()).await.unwrap();
        store.save_push_token(other_device.clone()).await.unwrap();
        store.save_push_token(replacement.clone()).await.unwrap();

        let tokens = store.get_push_tokens(user).await.unwrap();
        assert_eq!(tokens.len(), 3);

        let by_id = |id: Uuid| tokens.iter().find(|t| t.id == id).unwrap();
        assert!(!by_id(first.id).is_active);
        assert!(by_id(replacement.id).is_active);
        assert!(by_id(other_device.id).is_active);
    }

    #[tokio::test]
    async fn test_get_push_tokens_returns_inactive_too() {
        let store = make_store();
        let user = Uuid::new_v4();
        let mut token = PushToken::new(
            user,
            "aaaa",
            "device-1",
            DevicePlatform::Web,
            PushEnvironment::Production,
        );
        token.deactivate();
        store.save_push_token(token).await.unwrap();

        let tokens = store.get_push_tokens(user).await.unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(!tokens[0].is_active);
    }

    #[tokio::test]
    async fn test_preferences_default_when_absent() {
        let store = make_store();
        let user = Uuid::new_v4();
        let prefs = store.get_preferences(user).await.unwrap();
        assert_eq!(prefs.user_id, user);
        assert!(prefs.is_enabled);
        assert!(prefs.channel_preferences.is_empty());
    }

    #[tokio::test]
    async fn test_preferences_round_trip() {
        let store = make_store();
        let user = Uuid::new_v4();
        let mut prefs = NotificationPreferences::default_for_user(user);
        prefs.set_channel_enabled(
            NotificationType::CourseAssigned,
            NotificationChannel::Push,
            true,
        );
        store.update_preferences(prefs).await.unwrap();

        let loaded = store.get_preferences(user).await.unwrap();
        assert!(loaded.is_channel_enabled(
            NotificationChannel::Push,
            NotificationType::CourseAssigned
        ));
    }

    #[tokio::test]
    async fn test_templates_filtered_by_kind() {
        let store = InMemoryNotificationStore::with_default_templates();
        let all = store.get_templates(None).await.unwrap();
        assert_eq!(all.len(), 4);

        let course = store
            .get_templates(Some(NotificationType::CourseAssigned))
            .await
            .unwrap();
        assert_eq!(course.len(), 1);
        assert_eq!(course[0].kind, NotificationType::CourseAssigned);
    }
}
