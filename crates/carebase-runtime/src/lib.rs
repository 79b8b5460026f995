//! # Carebase Runtime
//!
//! Wires the Carebase core together at startup:
//! - tracing initialization
//! - request pipeline with process-wide defaults
//! - ordered provider composition (locale, theme, notifications, stores)
//! - error boundary for render failures
//! - notification tray as the rendering subscriber

mod app;
mod boundary;
mod observability;
mod providers;
mod tray;

pub use app::{default_request_config, BootstrapError, CarebaseApp};
pub use boundary::{ErrorBoundary, Rendered};
pub use observability::init_tracing_if_needed;
pub use providers::{
    ContextRegistry, Locale, LocaleProvider, NotificationProvider, Provider, ProviderError,
    ProviderStack, StoreProvider, Theme, ThemeProvider,
};
pub use tray::NotificationTray;
