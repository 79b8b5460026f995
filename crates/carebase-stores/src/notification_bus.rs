//! BroadcastNotificationBus - delayed, kind-grouped notification fan-out.
//!
//! Each kind has its own lane task. A lane keeps pending messages ordered by
//! `(deadline, emission sequence)`, so messages of one kind are delivered in
//! deadline order and equal deadlines keep emission order. Lanes do not wait
//! on each other.
//!
//! Every subscriber gets an unbounded channel and a task running its handler.
//! A panicking handler takes down its own task only; the bus does not catch
//! it and simply stops delivering to that subscriber.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use carebase_core::{
    Notification, NotificationBus, NotificationHandler, NotificationId, NotificationKind,
    NotificationPayload, Subscription,
};

/// Deadline used when `now + delay` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

struct PendingNotification {
    deadline: Instant,
    sequence: u64,
    notification: Notification,
}

#[derive(Default)]
struct SubscriberRegistry {
    next_id: AtomicU64,
    senders: RwLock<BTreeMap<u64, mpsc::UnboundedSender<Notification>>>,
}

impl SubscriberRegistry {
    fn insert(&self, sender: mpsc::UnboundedSender<Notification>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
        id
    }

    fn remove(&self, id: u64) -> bool {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    fn len(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn deliver(&self, notification: &Notification) {
        let dead: Vec<u64> = self
            .senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|(id, sender)| sender.send(notification.clone()).err().map(|_| *id))
            .collect();
        for id in dead {
            tracing::debug!(subscription = id, "dropping subscriber whose handler exited");
            self.remove(id);
        }
    }
}

pub struct BroadcastNotificationBus {
    runtime: Handle,
    lanes: HashMap<NotificationKind, mpsc::UnboundedSender<PendingNotification>>,
    subscribers: Arc<SubscriberRegistry>,
    sequence: AtomicU64,
}

impl BroadcastNotificationBus {
    /// Create the bus and start one lane per kind.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        Self::with_runtime(Handle::current())
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        let subscribers = Arc::new(SubscriberRegistry::default());
        let lanes = NotificationKind::ALL
            .into_iter()
            .map(|kind| {
                let (tx, rx) = mpsc::unbounded_channel();
                runtime.spawn(run_lane(kind, rx, Arc::clone(&subscribers)));
                (kind, tx)
            })
            .collect();

        Self {
            runtime,
            lanes,
            subscribers,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for BroadcastNotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus for BroadcastNotificationBus {
    fn emit(
        &self,
        kind: NotificationKind,
        payload: NotificationPayload,
        delay: Duration,
    ) -> NotificationId {
        let notification = Notification::new(kind, payload, delay);
        let id = notification.id;
        let pending = PendingNotification {
            deadline: deadline_after(delay),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            notification,
        };

        match self.lanes.get(&kind) {
            Some(lane) => {
                if lane.send(pending).is_err() {
                    tracing::warn!(kind = %kind, "notification lane is closed");
                }
            }
            None => tracing::warn!(kind = %kind, "no notification lane for kind"),
        }
        id
    }

    fn subscribe(&self, handler: NotificationHandler) -> Subscription {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
        let id = self.subscribers.insert(tx);
        self.runtime.spawn(async move {
            while let Some(notification) = rx.recv().await {
                handler(&notification);
            }
        });

        let registry = Arc::downgrade(&self.subscribers);
        Subscription::new(
            id,
            Arc::new(move |id| {
                if let Some(registry) = registry.upgrade() {
                    registry.remove(id);
                }
            }),
        )
    }
}

fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

async fn run_lane(
    kind: NotificationKind,
    mut rx: mpsc::UnboundedReceiver<PendingNotification>,
    subscribers: Arc<SubscriberRegistry>,
) {
    let mut queue: BTreeMap<(Instant, u64), Notification> = BTreeMap::new();
    let mut open = true;

    while open || !queue.is_empty() {
        let next_deadline = queue.keys().next().map(|(deadline, _)| *deadline);

        tokio::select! {
            received = rx.recv(), if open => match received {
                Some(pending) => {
                    queue.insert((pending.deadline, pending.sequence), pending.notification);
                }
                None => open = false,
            },
            _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                if let Some((_, notification)) = queue.pop_first() {
                    tracing::trace!(kind = %kind, id = %notification.id, "delivering notification");
                    subscribers.deliver(&notification);
                }
            }
        }
    }
    tracing::debug!(kind = %kind, "notification lane stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn collecting_handler() -> (NotificationHandler, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: NotificationHandler = Arc::new(move |n: &Notification| {
            let _ = tx.send(n.clone());
        });
        (handler, rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("notification in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn test_round_trip_delivers_once_without_field_loss() {
        let bus = BroadcastNotificationBus::new();
        let (handler, mut rx) = collecting_handler();
        bus.subscribe(handler);

        let payload = NotificationPayload::new("Allergy saved")
            .with_description("Penicillin added")
            .with_closable(false);
        let id = bus.emit(NotificationKind::Success, payload.clone(), Duration::ZERO);

        let delivered = next(&mut rx).await;
        assert_eq!(delivered.id, id);
        assert_eq!(delivered.kind, NotificationKind::Success);
        assert_eq!(delivered.payload, payload);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_same_kind_keeps_deadline_then_emission_order() {
        let bus = BroadcastNotificationBus::new();
        let (handler, mut rx) = collecting_handler();
        bus.subscribe(handler);

        bus.emit(NotificationKind::Info, "a".into(), Duration::from_millis(40));
        bus.emit(NotificationKind::Info, "b".into(), Duration::from_millis(40));
        bus.emit(NotificationKind::Info, "c".into(), Duration::ZERO);

        let titles: Vec<String> = vec![
            next(&mut rx).await.payload.title,
            next(&mut rx).await.payload.title,
            next(&mut rx).await.payload.title,
        ];
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_short_delay_of_other_kind_delivers_first() {
        let bus = BroadcastNotificationBus::new();
        let (handler, mut rx) = collecting_handler();
        bus.subscribe(handler);

        bus.emit(
            NotificationKind::Warning,
            "slow".into(),
            Duration::from_millis(60),
        );
        bus.emit(NotificationKind::Error, "fast".into(), Duration::ZERO);

        assert_eq!(next(&mut rx).await.kind, NotificationKind::Error);
        assert_eq!(next(&mut rx).await.kind, NotificationKind::Warning);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_stops_delivery() {
        let bus = BroadcastNotificationBus::new();
        let (handler, mut rx) = collecting_handler();
        let subscription = bus.subscribe(handler);
        assert_eq!(bus.subscriber_count(), 1);

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);

        bus.emit(NotificationKind::Info, "ignored".into(), Duration::ZERO);
        let result = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(!matches!(result, Ok(Some(_))));
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_stop_other_subscribers() {
        let bus = BroadcastNotificationBus::new();
        bus.subscribe(Arc::new(|_: &Notification| panic!("handler bug")));
        let (handler, mut rx) = collecting_handler();
        bus.subscribe(handler);

        bus.emit(NotificationKind::Info, "one".into(), Duration::ZERO);
        assert_eq!(next(&mut rx).await.payload.title, "one");
        bus.emit(NotificationKind::Info, "two".into(), Duration::ZERO);
        assert_eq!(next(&mut rx).await.payload.title, "two");
    }

    #[tokio::test]
    async fn test_unrepresentable_delay_is_clamped_not_fatal() {
        let bus = BroadcastNotificationBus::new();
        let (handler, mut rx) = collecting_handler();
        bus.subscribe(handler);

        bus.emit(NotificationKind::Info, "far future".into(), Duration::MAX);
        bus.emit(
            NotificationKind::Info,
            "also far".into(),
            Duration::from_secs(u64::MAX),
        );
        bus.emit(NotificationKind::Info, "now".into(), Duration::ZERO);

        assert_eq!(next(&mut rx).await.payload.title, "now");
        assert!(deadline_after(Duration::MAX) > Instant::now());
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_ok() {
        let bus = BroadcastNotificationBus::new();
        bus.emit(NotificationKind::Warning, "nobody".into(), Duration::ZERO);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
