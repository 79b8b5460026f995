//! ErrorBoundary - turns render panics into a fallback view.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Outcome of a guarded render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    View(T),
    /// Render failed; show `message` with a retry action.
    Fallback { message: String },
}

impl<T> Rendered<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Rendered::Fallback { .. })
    }

    pub fn view(self) -> Option<T> {
        match self {
            Rendered::View(view) => Some(view),
            Rendered::Fallback { .. } => None,
        }
    }
}

#[derive(Default)]
pub struct ErrorBoundary {
    failures: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

impl ErrorBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `render`, catching any panic it raises.
    pub fn render<T, F>(&self, render: F) -> Rendered<T>
    where
        F: FnOnce() -> T,
    {
        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(view) => {
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
                Rendered::View(view)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::error!(error = %message, failures, "render failed, showing fallback");
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(message.clone());
                Rendered::Fallback { message }
            }
        }
    }

    /// The fallback's retry action: render again from scratch.
    pub fn retry<T, F>(&self, render: F) -> Rendered<T>
    where
        F: FnOnce() -> T,
    {
        tracing::info!("retrying render after failure");
        self.render(render)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown render error".to_string()
    }
}
