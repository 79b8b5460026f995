//! Action status tracking.
//!
//! Every store operation ("getAll", "create", ...) carries exactly one
//! [`ActionStatus`] and one [`ErrorRecord`]. [`ActionState`] bundles both maps
//! with the data the operations produce so observers always see a consistent
//! snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Progress of one asynchronous store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Never invoked
    #[default]
    Initial,
    /// Invoked, waiting for the backend
    Pending,
    /// Last invocation succeeded
    Fulfilled,
    /// Last invocation failed
    Rejected,
}

impl ActionStatus {
    /// Check if the operation reached a terminal state
    pub fn is_settled(&self) -> bool {
        matches!(self, ActionStatus::Fulfilled | ActionStatus::Rejected)
    }

    /// Check if the operation is in flight
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionStatus::Pending)
    }
}

/// Error captured from a rejected operation.
///
/// Both fields are optional: a payload without a recognizable message yields
/// an empty record rather than a second failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErrorRecord {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

const MESSAGE_KEYS: [&str; 3] = ["message", "error", "detail"];
const ID_KEYS: [&str; 3] = ["id", "errorId", "code"];

impl ErrorRecord {
    /// Record with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            id: None,
        }
    }

    /// Extract a record from an error payload returned by the backend.
    ///
    /// Accepts `{"message": ..}`, `{"error": ..}`, `{"detail": ..}`,
    /// `{"error": {"message": ..}}` and a bare JSON string.
    pub fn from_payload(payload: &Value) -> Self {
        match payload {
            Value::String(text) => Self {
                message: non_empty(text),
                id: None,
            },
            Value::Object(map) => {
                let message = MESSAGE_KEYS
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .find_map(|value| match value {
                        Value::String(text) => non_empty(text),
                        Value::Object(nested) => nested
                            .get("message")
                            .and_then(Value::as_str)
                            .and_then(non_empty),
                        _ => None,
                    });
                let id = ID_KEYS
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .find_map(|value| match value {
                        Value::String(text) => non_empty(text),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    });
                Self { message, id }
            }
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.id.is_none()
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Observable state of a store: its data plus per-operation bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActionState<D> {
    pub data: D,
    #[serde(default)]
    pub status: BTreeMap<String, ActionStatus>,
    #[serde(default)]
    pub errors: BTreeMap<String, ErrorRecord>,
}

impl<D> ActionState<D> {
    pub fn new(data: D) -> Self {
        Self {
            data,
            status: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Status of an operation; operations never invoked are `Initial`.
    pub fn status(&self, operation: &str) -> ActionStatus {
        self.status.get(operation).copied().unwrap_or_default()
    }

    pub fn error(&self, operation: &str) -> Option<&ErrorRecord> {
        self.errors.get(operation).filter(|record| !record.is_empty())
    }

    pub fn error_message(&self, operation: &str) -> Option<&str> {
        self.errors
            .get(operation)
            .and_then(|record| record.message.as_deref())
    }

    /// Enter `Pending` and clear the previous error, whatever the prior state.
    pub fn begin(&mut self, operation: &str) {
        self.status.insert(operation.to_string(), ActionStatus::Pending);
        self.errors.insert(operation.to_string(), ErrorRecord::default());
    }

    pub fn fulfill(&mut self, operation: &str) {
        self.status.insert(operation.to_string(), ActionStatus::Fulfilled);
        self.errors.insert(operation.to_string(), ErrorRecord::default());
    }

    pub fn reject(&mut self, operation: &str, error: ErrorRecord) {
        self.status.insert(operation.to_string(), ActionStatus::Rejected);
        self.errors.insert(operation.to_string(), error);
    }
}
