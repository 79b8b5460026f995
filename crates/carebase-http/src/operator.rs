//! Response operators.
//!
//! Operators are kept in registration order at stable slot indices. Ejecting
//! an operator empties its slot instead of shifting later entries, so handles
//! held by other registrants stay valid.

use std::sync::{Arc, PoisonError, RwLock};

use futures_util::stream::{BoxStream, StreamExt};
use serde_json::Value;

use crate::{HttpError, HttpResponse};

/// Stream of responses produced by one request.
pub type ResponseStream = BoxStream<'static, Result<HttpResponse, HttpError>>;

/// Maps one response stream to another.
pub trait ResponseOperator: Send + Sync {
    fn apply(&self, stream: ResponseStream) -> ResponseStream;
}

impl<F> ResponseOperator for F
where
    F: Fn(ResponseStream) -> ResponseStream + Send + Sync,
{
    fn apply(&self, stream: ResponseStream) -> ResponseStream {
        self(stream)
    }
}

/// Position of a registered operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorHandle(usize);

impl OperatorHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Default)]
pub struct OperatorChain {
    slots: RwLock<Vec<Option<Arc<dyn ResponseOperator>>>>,
}

impl OperatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operator; the returned handle never changes meaning.
    pub fn use_operator(&self, operator: Arc<dyn ResponseOperator>) -> OperatorHandle {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.push(Some(operator));
        OperatorHandle(slots.len() - 1)
    }

    /// Deactivate an operator. Ejecting twice, or ejecting an unknown handle,
    /// does nothing.
    pub fn eject(&self, handle: OperatorHandle) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(handle.0) {
            *slot = None;
        }
    }

    /// Active operators in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn ResponseOperator>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of slots, including ejected ones.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn is_active(&self, handle: OperatorHandle) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle.0)
            .is_some_and(Option::is_some)
    }
}

/// Transform the body of every successful response.
pub fn map_body<F>(f: F) -> Arc<dyn ResponseOperator>
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |stream: ResponseStream| -> ResponseStream {
        let f = Arc::clone(&f);
        stream
            .map(move |item| {
                item.map(|mut response| {
                    response.body = f(std::mem::take(&mut response.body));
                    response
                })
            })
            .boxed()
    })
}

/// Replace an object body with one of its fields, e.g. the `data` envelope.
/// Bodies without the field pass through untouched.
pub fn unwrap_field(field: impl Into<String>) -> Arc<dyn ResponseOperator> {
    let field = field.into();
    map_body(move |body| match body {
        Value::Object(mut map) => match map.remove(&field) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    })
}

/// Log every item passing through the stream.
pub fn log_responses(label: impl Into<String>) -> Arc<dyn ResponseOperator> {
    let label = label.into();
    Arc::new(move |stream: ResponseStream| -> ResponseStream {
        let label = label.clone();
        stream
            .inspect(move |item| match item {
                Ok(response) => {
                    tracing::debug!(label = %label, status = response.status, "response received")
                }
                Err(err) => tracing::debug!(label = %label, error = %err, "response failed"),
            })
            .boxed()
    })
}
