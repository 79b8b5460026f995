//! ActionStore - observable state driven by tracked async operations.
//!
//! Every operation walks `Initial -> Pending -> Fulfilled | Rejected`. The
//! Pending transition and the settle transition are each a single watch
//! update, so observers never see data changed without its status.
//!
//! Invocations are not serialized and superseded calls are not cancelled:
//! when two calls overlap, whichever settles last decides the final data.

use std::future::Future;

use tokio::sync::watch;

use carebase_core::{ActionState, ActionStatus, ErrorRecord};
use carebase_http::HttpError;

/// Errors that can be recorded against an operation.
pub trait ErrorPayload {
    fn error_record(&self) -> ErrorRecord;
}

impl ErrorPayload for HttpError {
    fn error_record(&self) -> ErrorRecord {
        HttpError::error_record(self)
    }
}

pub struct ActionStore<D> {
    name: &'static str,
    state: watch::Sender<ActionState<D>>,
}

impl<D> ActionStore<D>
where
    D: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, data: D) -> Self {
        let (state, _) = watch::channel(ActionState::new(data));
        Self { name, state }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `future` as `operation`; on success hand its value to `apply`.
    ///
    /// Failures are converted to state and never returned to the caller.
    pub async fn run<T, E, Fut, A>(&self, operation: &str, future: Fut, apply: A) -> ActionStatus
    where
        Fut: Future<Output = Result<T, E>>,
        E: ErrorPayload + std::fmt::Display,
        A: FnOnce(&mut D, T),
    {
        self.state.send_modify(|state| state.begin(operation));
        tracing::debug!(store = self.name, operation, "action pending");

        match future.await {
            Ok(value) => {
                self.state.send_modify(|state| {
                    apply(&mut state.data, value);
                    state.fulfill(operation);
                });
                tracing::debug!(store = self.name, operation, "action fulfilled");
                ActionStatus::Fulfilled
            }
            Err(err) => {
                let record = err.error_record();
                tracing::warn!(
                    store = self.name,
                    operation,
                    error = %err,
                    error_id = record.id.as_deref().unwrap_or_default(),
                    "action rejected"
                );
                self.state.send_modify(|state| state.reject(operation, record));
                ActionStatus::Rejected
            }
        }
    }

    /// Replace the data wholesale with the operation's result.
    pub async fn replace_with<E, Fut>(&self, operation: &str, future: Fut) -> ActionStatus
    where
        Fut: Future<Output = Result<D, E>>,
        E: ErrorPayload + std::fmt::Display,
    {
        self.run(operation, future, |data, value| *data = value).await
    }

    pub fn snapshot(&self) -> ActionState<D> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> D {
        self.state.borrow().data.clone()
    }

    pub fn status(&self, operation: &str) -> ActionStatus {
        self.state.borrow().status(operation)
    }

    pub fn error(&self, operation: &str) -> Option<ErrorRecord> {
        self.state.borrow().error(operation).cloned()
    }

    pub fn error_message(&self, operation: &str) -> Option<String> {
        self.state
            .borrow()
            .error_message(operation)
            .map(str::to_string)
    }

    /// Observe every state change.
    pub fn subscribe(&self) -> watch::Receiver<ActionState<D>> {
        self.state.subscribe()
    }
}
