use serde_json::Value;
use thiserror::Error;

use carebase_core::ErrorRecord;

/// Errors surfaced by the request pipeline.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}")]
    Status { status: u16, body: Option<Value> },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid request config: {0}")]
    InvalidConfig(String),
}

impl HttpError {
    /// Parsed response body of a non-2xx reply, when there was one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            HttpError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable record for store bookkeeping. Status errors only carry
    /// what the backend put in the body.
    pub fn error_record(&self) -> ErrorRecord {
        match self {
            HttpError::Status { body, .. } => body
                .as_ref()
                .map(ErrorRecord::from_payload)
                .unwrap_or_default(),
            HttpError::Network(message)
            | HttpError::Decode(message)
            | HttpError::InvalidConfig(message) => ErrorRecord::message(message.clone()),
        }
    }
}
