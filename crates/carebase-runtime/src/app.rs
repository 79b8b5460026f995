//! Startup: configuration, request defaults, providers.

use std::sync::Arc;

use thiserror::Error;

use carebase_config::{ApiConfig, AppConfig, ConfigError};
use carebase_http::{
    log_responses, HttpError, HttpTransport, RequestConfig, RequestPipeline, ResourceCatalog,
    ReqwestTransport,
};
use carebase_stores::{Notifier, StoreBundle};

use crate::providers::{ContextRegistry, Locale, ProviderError, ProviderStack, Theme};
use crate::{init_tracing_if_needed, ErrorBoundary, NotificationTray};

/// Runtime bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client error: {0}")]
    Http(#[from] HttpError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Process-wide request defaults derived from the API config.
pub fn default_request_config(api: &ApiConfig) -> RequestConfig {
    let config = RequestConfig::new()
        .base_url(api.base_url.clone())
        .header("x-api-key", api.api_key.clone())
        .header("Accept", "application/json");
    match api.timeout {
        Some(timeout) => config.timeout(timeout),
        None => config,
    }
}

/// Running app bundle created from configuration.
pub struct CarebaseApp {
    config: AppConfig,
    pipeline: Arc<RequestPipeline>,
    registry: ContextRegistry,
    notifier: Arc<Notifier>,
    tray: Arc<NotificationTray>,
    resources: Arc<ResourceCatalog>,
    stores: Arc<StoreBundle>,
    boundary: ErrorBoundary,
}

impl CarebaseApp {
    /// Boot from the process environment.
    pub fn from_env() -> Result<Self, BootstrapError> {
        Self::from_config(AppConfig::from_env()?)
    }

    pub fn from_config(config: AppConfig) -> Result<Self, BootstrapError> {
        init_tracing_if_needed(&config.observability);
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(config, transport)
    }

    /// Boot over an explicit transport. Must be called inside a Tokio runtime.
    pub fn with_transport(
        config: AppConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, BootstrapError> {
        let pipeline = Arc::new(RequestPipeline::with_defaults(
            transport,
            default_request_config(&config.api),
        ));
        pipeline.use_operator(log_responses("api"));

        let registry = ProviderStack::standard(&config, Arc::clone(&pipeline)).compose()?;
        let notifier = registry.require::<Notifier>("app")?;
        let tray = registry.require::<NotificationTray>("app")?;
        let resources = registry.require::<ResourceCatalog>("app")?;
        let stores = registry.require::<StoreBundle>("app")?;

        tracing::info!(
            run_mode = %config.run_mode,
            api = %config.api.base_url,
            locale = %config.ui.locale,
            "carebase runtime started"
        );

        Ok(Self {
            config,
            pipeline,
            registry,
            notifier,
            tray,
            resources,
            stores,
            boundary: ErrorBoundary::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn tray(&self) -> &Arc<NotificationTray> {
        &self.tray
    }

    /// Every REST collection, including the file service.
    pub fn resources(&self) -> &ResourceCatalog {
        &self.resources
    }

    pub fn stores(&self) -> &StoreBundle {
        &self.stores
    }

    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    pub fn locale(&self) -> Option<Arc<Locale>> {
        self.registry.get::<Locale>()
    }

    pub fn theme(&self) -> Option<Arc<Theme>> {
        self.registry.get::<Theme>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carebase_core::ActionStatus;
    use carebase_http::{decode_first, HttpResponse};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CapturingTransport {
        seen: Mutex<Vec<RequestConfig>>,
    }

    #[async_trait]
    impl HttpTransport for CapturingTransport {
        async fn send(&self, config: &RequestConfig) -> Result<HttpResponse, HttpError> {
            self.seen.lock().unwrap().push(config.clone());
            Ok(HttpResponse::ok(json!([
                {"id": "u1", "email": "ada@carebase.test", "firstName": "Ada", "lastName": "Byron", "role": "admin"}
            ])))
        }
    }

    fn config(timeout: Option<&str>) -> AppConfig {
        let timeout = timeout.map(str::to_string);
        AppConfig::from_lookup(move |name| match name {
            "CAREBASE_API_URL" => Some("https://api.carebase.test/v1".into()),
            "CAREBASE_FILES_URL" => Some("https://files.carebase.test".into()),
            "CAREBASE_API_KEY" => Some("secret-key".into()),
            "CAREBASE_RUN_MODE" => Some("test".into()),
            "CAREBASE_REQUEST_TIMEOUT_SECS" => timeout.clone(),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_default_request_config_carries_key_and_base() {
        let defaults = default_request_config(&config(None).api);
        assert_eq!(defaults.base_url.as_deref(), Some("https://api.carebase.test/v1"));
        assert_eq!(defaults.headers["x-api-key"], "secret-key");
        assert_eq!(defaults.headers["Accept"], "application/json");
        assert!(defaults.timeout.is_none());

        let with_timeout = default_request_config(&config(Some("15")).api);
        assert_eq!(with_timeout.timeout, Some(Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn test_app_boots_and_stores_use_shared_defaults() {
        let transport = Arc::new(CapturingTransport::default());
        let app = CarebaseApp::with_transport(config(None), transport.clone()).unwrap();

        assert_eq!(app.locale().unwrap().tag, "en");
        assert_eq!(app.pipeline().operators().active_len(), 1);
        assert_eq!(app.tray().max_visible(), 5);

        assert_eq!(app.stores().users.get_all().await, ActionStatus::Fulfilled);
        assert_eq!(app.stores().users.users()[0].display_name(), "Ada Byron");

        let _: serde_json::Value = decode_first(app.resources().files().get("scan 1"))
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].headers["x-api-key"], "secret-key");
        assert_eq!(seen[0].full_url().unwrap(), "https://api.carebase.test/v1/users");
        assert_eq!(
            seen[1].full_url().unwrap(),
            "https://files.carebase.test/files/scan%201"
        );
        assert_eq!(seen[1].headers["x-api-key"], "secret-key");
    }
}
