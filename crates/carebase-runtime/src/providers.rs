//! Provider composition.
//!
//! Providers install shared context into a [`ContextRegistry`] in a fixed
//! order. A provider may depend on anything installed before it; asking for
//! something installed later is a [`ProviderError::Missing`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use carebase_config::{AppConfig, ThemeMode};
use carebase_http::{RequestPipeline, ResourceCatalog};
use carebase_stores::{BroadcastNotificationBus, Notifier, StoreBundle};

use crate::NotificationTray;

type SharedContext = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} requires {dependency}, which no earlier provider installed")]
    Missing {
        provider: &'static str,
        dependency: &'static str,
    },
    #[error("provider failed: {0}")]
    Failed(String),
}

/// Type-keyed shared context.
#[derive(Default)]
pub struct ContextRegistry {
    entries: HashMap<TypeId, SharedContext>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `value`, replacing any earlier value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: Arc<T>) -> Option<Arc<T>> {
        self.entries
            .insert(TypeId::of::<T>(), value)
            .and_then(|previous| previous.downcast::<T>().ok())
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    pub fn require<T: Any + Send + Sync>(
        &self,
        provider: &'static str,
    ) -> Result<Arc<T>, ProviderError> {
        self.get::<T>().ok_or(ProviderError::Missing {
            provider,
            dependency: std::any::type_name::<T>(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    fn provide(&self, registry: &mut ContextRegistry) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub mode: ThemeMode,
}

pub struct LocaleProvider {
    tag: String,
}

impl LocaleProvider {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Provider for LocaleProvider {
    fn name(&self) -> &'static str {
        "locale"
    }

    fn provide(&self, registry: &mut ContextRegistry) -> Result<(), ProviderError> {
        registry.insert(Arc::new(Locale {
            tag: self.tag.clone(),
        }));
        Ok(())
    }
}

pub struct ThemeProvider {
    mode: ThemeMode,
}

impl ThemeProvider {
    pub fn new(mode: ThemeMode) -> Self {
        Self { mode }
    }
}

impl Provider for ThemeProvider {
    fn name(&self) -> &'static str {
        "theme"
    }

    fn provide(&self, registry: &mut ContextRegistry) -> Result<(), ProviderError> {
        registry.insert(Arc::new(Theme { mode: self.mode }));
        Ok(())
    }
}

/// Installs the notification bus, a [`Notifier`] over it and the tray that
/// renders it. Needs a running Tokio runtime.
pub struct NotificationProvider {
    max_visible: usize,
}

impl NotificationProvider {
    pub fn new(max_visible: usize) -> Self {
        Self { max_visible }
    }
}

impl Provider for NotificationProvider {
    fn name(&self) -> &'static str {
        "notifications"
    }

    fn provide(&self, registry: &mut ContextRegistry) -> Result<(), ProviderError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ProviderError::Failed(format!("notification bus needs a runtime: {e}")))?;
        let notifier = Notifier::new(Arc::new(BroadcastNotificationBus::with_runtime(runtime)));
        let tray = Arc::new(NotificationTray::new(self.max_visible));
        tray.attach(&notifier);

        registry.insert(Arc::new(notifier));
        registry.insert(tray);
        Ok(())
    }
}

/// Installs the resource catalog and builds every feature store over it.
pub struct StoreProvider {
    resources: ResourceCatalog,
}

impl StoreProvider {
    pub fn new(resources: ResourceCatalog) -> Self {
        Self { resources }
    }
}

impl Provider for StoreProvider {
    fn name(&self) -> &'static str {
        "stores"
    }

    fn provide(&self, registry: &mut ContextRegistry) -> Result<(), ProviderError> {
        let notifier = registry.require::<Notifier>(self.name())?;
        let stores = StoreBundle::new(self.resources.clone(), Some(notifier.as_ref().clone()));
        registry.insert(Arc::new(self.resources.clone()));
        registry.insert(Arc::new(stores));
        Ok(())
    }
}

/// Providers applied in insertion order.
#[derive(Default)]
pub struct ProviderStack {
    providers: Vec<Box<dyn Provider>>,
}

impl ProviderStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locale, theme, notifications, then stores.
    pub fn standard(config: &AppConfig, pipeline: Arc<RequestPipeline>) -> Self {
        let resources =
            ResourceCatalog::new(pipeline).with_files_url(config.api.files_url.clone());
        Self::new()
            .push(LocaleProvider::new(config.ui.locale.clone()))
            .push(ThemeProvider::new(config.ui.theme))
            .push(NotificationProvider::new(config.notifications.max_visible))
            .push(StoreProvider::new(resources))
    }

    pub fn push(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn compose(&self) -> Result<ContextRegistry, ProviderError> {
        let mut registry = ContextRegistry::new();
        for provider in &self.providers {
            provider.provide(&mut registry)?;
            tracing::debug!(provider = provider.name(), "provider installed");
        }
        Ok(registry)
    }
}
