//! # Carebase Config
//!
//! Startup configuration for Carebase. Required values come from the process
//! environment and are validated once at boot; an optional YAML file tunes
//! observability, UI defaults and notification display.

mod loader;

pub use loader::{
    load_overlay, ConfigError, ENV_API_KEY, ENV_API_URL, ENV_CONFIG_PATH, ENV_FILES_URL,
    ENV_LOCALE, ENV_REQUEST_TIMEOUT_SECS, ENV_RUN_MODE, ENV_THEME,
};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration assembled at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub run_mode: RunMode,
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub observability: ObservabilityConfig,
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    /// Read configuration from the process environment. Missing required
    /// values abort with [`ConfigError::MissingEnv`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        loader::build_config(lookup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
    Test,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RunMode::Development),
            "production" | "prod" => Ok(RunMode::Production),
            "test" => Ok(RunMode::Test),
            other => Err(ConfigError::Invalid(format!(
                "{ENV_RUN_MODE} must be development, production or test (got '{other}')"
            ))),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
            RunMode::Test => "test",
        };
        f.write_str(name)
    }
}

/// Backend endpoints and credentials.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub files_url: String,
    pub api_key: String,
    /// Client-level request timeout. Unset means requests may hang.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("files_url", &self.files_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl FromStr for ThemeMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(ConfigError::Invalid(format!(
                "{ENV_THEME} must be light or dark (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub theme: ThemeMode,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            theme: ThemeMode::default(),
        }
    }
}

fn default_locale() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub traces_enabled: bool,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            traces_enabled: false,
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// How many notifications the tray shows at once.
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_visible: default_max_visible(),
        }
    }
}

fn default_max_visible() -> usize {
    5
}

/// Optional YAML file layered over the defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileOverlay {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}
