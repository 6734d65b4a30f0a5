//! Lifecycle event streams.

use tokio::sync::broadcast;

use learnhub_entity::Notification;

/// The three notification lifecycle streams: received, read, deleted.
///
/// Streams are independent; an event on one never appears on another.
/// There is no replay: a subscriber only sees events emitted after it
/// subscribed, and one that lags past the buffer capacity loses the
/// oldest events. Emitting with no subscribers is a no-op.
#[derive(Debug, Clone)]
pub struct NotificationEvents {
    /// A notification addressed to this user was stored
    received: broadcast::Sender<Notification>,
    /// A notification transitioned to read
    read: broadcast::Sender<Notification>,
    /// A notification was deleted
    deleted: broadcast::Sender<Notification>,
}

impl NotificationEvents {
    /// Create the streams with the given per-stream buffer capacity.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            received: broadcast::channel(buffer_size).0,
            read: broadcast::channel(buffer_size).0,
            deleted: broadcast::channel(buffer_size).0,
        }
    }

    /// Subscribe to notifications received for this user.
    pub fn subscribe_received(&self) -> broadcast::Receiver<Notification> {
        self.received.subscribe()
    }

    /// Subscribe to read transitions.
    pub fn subscribe_read(&self) -> broadcast::Receiver<Notification> {
        self.read.subscribe()
    }

    /// Subscribe to deletions.
    pub fn subscribe_deleted(&self) -> broadcast::Receiver<Notification> {
        self.deleted.subscribe()
    }

    pub(crate) fn emit_received(&self, notification: Notification) {
        let _ = self.received.send(notification);
    }

    pub(crate) fn emit_read(&self, notification: Notification) {
        let _ = self.read.send(notification);
    }

    pub(crate) fn emit_deleted(&self, notification: Notification) {
        let _ = self.deleted.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_entity::NotificationType;
    use uuid::Uuid;

    fn sample(title: &str) -> Notification {
        Notification::new(
            Uuid::new_v4(),
            NotificationType::SystemMessage,
            title,
            "body",
        )
    }

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let events = NotificationEvents::new(8);
        let mut rx = events.subscribe_received();

        events.emit_received(sample("hello"));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.title, "hello");
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let events = NotificationEvents::new(8);
        events.emit_read(sample("before"));

        let mut rx = events.subscribe_read();
        events.emit_read(sample("after"));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.title, "after");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_streams_are_independent() {
        let events = NotificationEvents::new(8);
        let mut received = events.subscribe_received();
        let mut deleted = events.subscribe_deleted();

        events.emit_deleted(sample("gone"));
        assert_eq!(deleted.recv().await.unwrap().title, "gone");
        assert!(received.try_recv().is_err());
    }

    #[test]
    fn test_emission_without_subscribers_is_a_noop() {
        let events = NotificationEvents::new(8);
        events.emit_received(sample("nobody listening"));
        events.emit_read(sample("nobody listening"));
        events.emit_deleted(sample("nobody listening"));
    }
}
