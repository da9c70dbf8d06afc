//! Broadcast change notifier.
//!
//! One broadcast channel per user, created lazily on first subscription.
//! Publishing is strictly fire-and-forget: a user with no connected
//! viewers, a lagged receiver, or a dropped connection never affects the
//! operation that emitted the event.

use dashmap::DashMap;
use taskbridge_core::tasks::ports::ChangeNotifier;
use taskbridge_domain::ChangeEvent;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Per-user broadcast fan-out implementing [`ChangeNotifier`].
pub struct BroadcastNotifier {
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
    capacity: usize,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { channels: DashMap::new(), capacity: capacity.max(1) }
    }

    /// Subscribe to one user's event stream. Only the route layer, which
    /// has already authenticated the connection as this user, may call
    /// this; the notifier itself never crosses users.
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<ChangeEvent> {
        self.channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of currently connected receivers for a user.
    pub fn receiver_count(&self, user_id: &str) -> usize {
        self.channels.get(user_id).map_or(0, |sender| sender.receiver_count())
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn publish(&self, user_id: &str, event: ChangeEvent) {
        let Some(sender) = self.channels.get(user_id) else {
            trace!(user_id, "no subscribers; event dropped");
            return;
        };
        // Send fails only when every receiver is gone; that is fine here
        let _ = sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use taskbridge_domain::{LogKind, UserLogEntry};

    use super::*;

    fn log_event(user_id: &str) -> ChangeEvent {
        ChangeEvent::LogAppended {
            entry: UserLogEntry::new(user_id, LogKind::Note, "hello", serde_json::Value::Null),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_their_own_events() {
        let notifier = BroadcastNotifier::new();
        let mut rx = notifier.subscribe("u1");

        notifier.publish("u1", log_event("u1"));

        let event = rx.recv().await.expect("event delivered");
        assert!(matches!(event, ChangeEvent::LogAppended { .. }));
    }

    #[tokio::test]
    async fn events_never_cross_users() {
        let notifier = BroadcastNotifier::new();
        let mut rx_other = notifier.subscribe("u2");

        notifier.publish("u1", log_event("u1"));

        assert!(
            matches!(rx_other.try_recv(), Err(broadcast::error::TryRecvError::Empty)),
            "u2 must not see u1's events"
        );
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let notifier = BroadcastNotifier::new();
        notifier.publish("nobody", log_event("nobody"));
        assert_eq!(notifier.receiver_count("nobody"), 0);
    }
}
