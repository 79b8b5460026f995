//! Notification messages and the bus abstraction.
//!
//! Producers emit typed, optionally delayed messages; a rendering subscriber
//! near the application root consumes them. Implementations live in the
//! carebase-stores crate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type alias for Notification ID
pub type NotificationId = Uuid;

/// Notification severity. Delivery is grouped by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::Info,
        NotificationKind::Warning,
        NotificationKind::Error,
        NotificationKind::Success,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Success => "success",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closable: Option<bool>,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            closable: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_closable(mut self, closable: bool) -> Self {
        self.closable = Some(closable);
        self
    }

    /// Notifications are closable unless explicitly disabled.
    pub fn is_closable(&self) -> bool {
        self.closable.unwrap_or(true)
    }
}

impl From<&str> for NotificationPayload {
    fn from(title: &str) -> Self {
        Self::new(title)
    }
}

impl From<String> for NotificationPayload {
    fn from(title: String) -> Self {
        Self::new(title)
    }
}

/// A message on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub payload: NotificationPayload,
    /// Delay between emission and delivery.
    #[serde(with = "duration_millis")]
    pub delay: Duration,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, payload: NotificationPayload, delay: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload,
            delay,
            emitted_at: Utc::now(),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Handler invoked once per delivered message.
pub type NotificationHandler = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Capability returned by [`NotificationBus::subscribe`].
///
/// Dropping it keeps the handler registered; call [`Subscription::unsubscribe`]
/// to stop deliveries. Unsubscribing twice is a no-op.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    cancel: Arc<dyn Fn(u64) + Send + Sync>,
}

impl Subscription {
    pub fn new(id: u64, cancel: Arc<dyn Fn(u64) + Send + Sync>) -> Self {
        Self { id, cancel }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(&self) {
        (self.cancel)(self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// NotificationBus trait - decouples producers from rendering.
pub trait NotificationBus: Send + Sync {
    /// Enqueue a message for delivery after `delay`. Never blocks, never fails.
    fn emit(
        &self,
        kind: NotificationKind,
        payload: NotificationPayload,
        delay: Duration,
    ) -> NotificationId;

    /// Register a handler for every message delivered from now on.
    fn subscribe(&self, handler: NotificationHandler) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_closable_defaults_to_true() {
        let payload = NotificationPayload::new("Saved");
        assert!(payload.is_closable());
        assert!(!payload.with_closable(false).is_closable());
    }

    #[test]
    fn test_notification_serializes_delay_as_millis() {
        let n = Notification::new(
            NotificationKind::Warning,
            NotificationPayload::new("Session").with_description("expires soon"),
            Duration::from_millis(1500),
        );
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["kind"], json!("warning"));
        assert_eq!(value["delay"], json!(1500));
        assert_eq!(value["payload"]["description"], json!("expires soon"));
        assert!(value["payload"].get("closable").is_none());
    }
}
