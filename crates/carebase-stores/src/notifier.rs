//! Notifier - producer-side convenience API over a NotificationBus.

use std::sync::Arc;
use std::time::Duration;

use carebase_core::{
    NotificationBus, NotificationHandler, NotificationId, NotificationKind, NotificationPayload,
    Subscription,
};

#[derive(Clone)]
pub struct Notifier {
    bus: Arc<dyn NotificationBus>,
}

impl Notifier {
    pub fn new(bus: Arc<dyn NotificationBus>) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &Arc<dyn NotificationBus> {
        &self.bus
    }

    /// Emit `payload` as `kind` after `delay`.
    pub fn open(
        &self,
        kind: NotificationKind,
        payload: impl Into<NotificationPayload>,
        delay: Duration,
    ) -> NotificationId {
        self.bus.emit(kind, payload.into(), delay)
    }

    pub fn info(&self, payload: impl Into<NotificationPayload>) -> NotificationId {
        self.open(NotificationKind::Info, payload, Duration::ZERO)
    }

    pub fn warning(&self, payload: impl Into<NotificationPayload>) -> NotificationId {
        self.open(NotificationKind::Warning, payload, Duration::ZERO)
    }

    pub fn error(&self, payload: impl Into<NotificationPayload>) -> NotificationId {
        self.open(NotificationKind::Error, payload, Duration::ZERO)
    }

    pub fn success(&self, payload: impl Into<NotificationPayload>) -> NotificationId {
        self.open(NotificationKind::Success, payload, Duration::ZERO)
    }

    pub fn subscribe(&self, handler: NotificationHandler) -> Subscription {
        self.bus.subscribe(handler)
    }
}
