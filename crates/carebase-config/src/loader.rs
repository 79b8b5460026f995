//! Configuration loading and validation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::{ApiConfig, AppConfig, FileOverlay, RunMode, ThemeMode};

pub const ENV_API_URL: &str = "CAREBASE_API_URL";
pub const ENV_FILES_URL: &str = "CAREBASE_FILES_URL";
pub const ENV_API_KEY: &str = "CAREBASE_API_KEY";
pub const ENV_RUN_MODE: &str = "CAREBASE_RUN_MODE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CAREBASE_REQUEST_TIMEOUT_SECS";
pub const ENV_LOCALE: &str = "CAREBASE_LOCALE";
pub const ENV_THEME: &str = "CAREBASE_THEME";
pub const ENV_CONFIG_PATH: &str = "CAREBASE_CONFIG";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load the optional YAML overlay.
pub fn load_overlay(path: &Path) -> Result<FileOverlay, ConfigError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(FileOverlay::default());
    }
    let overlay: FileOverlay = serde_yaml::from_str(&content)?;
    Ok(overlay)
}

pub(crate) fn build_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &str| -> Result<String, ConfigError> {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
    };
    let optional = |name: &str| -> Option<String> {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let base_url = required(ENV_API_URL)?;
    let files_url = required(ENV_FILES_URL)?;
    let api_key = required(ENV_API_KEY)?;
    let run_mode: RunMode = required(ENV_RUN_MODE)?.parse()?;

    let timeout = match optional(ENV_REQUEST_TIMEOUT_SECS) {
        Some(raw) => {
            let secs: u64 = raw.parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds"
                ))
            })?;
            Some(Duration::from_secs(secs))
        }
        None => None,
    };

    let mut overlay = match optional(ENV_CONFIG_PATH) {
        Some(path) => load_overlay(Path::new(&path))?,
        None => FileOverlay::default(),
    };
    if let Some(locale) = optional(ENV_LOCALE) {
        overlay.ui.locale = locale;
    }
    if let Some(theme) = optional(ENV_THEME) {
        overlay.ui.theme = theme.parse::<ThemeMode>()?;
    }

    let config = AppConfig {
        run_mode,
        api: ApiConfig {
            base_url,
            files_url,
            api_key,
            timeout,
        },
        ui: overlay.ui,
        observability: overlay.observability,
        notifications: overlay.notifications,
    };
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    for (name, url) in [
        (ENV_API_URL, &config.api.base_url),
        (ENV_FILES_URL, &config.api.files_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "{name} must be an http(s) URL (got '{url}')"
            )));
        }
    }

    if config.api.timeout == Some(Duration::ZERO) {
        return Err(ConfigError::Invalid(format!(
            "{ENV_REQUEST_TIMEOUT_SECS} must be > 0"
        )));
    }

    if config.ui.locale.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "ui.locale must not be empty".to_string(),
        ));
    }

    if config.notifications.max_visible == 0 {
        return Err(ConfigError::Invalid(
            "notifications.max_visible must be > 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn base_env() -> HashMap<String, String> {
        HashMap::from([
            (ENV_API_URL.to_string(), "https://api.clinic.test".to_string()),
            (
                ENV_FILES_URL.to_string(),
                "https://files.clinic.test".to_string(),
            ),
            (ENV_API_KEY.to_string(), "secret".to_string()),
            (ENV_RUN_MODE.to_string(), "production".to_string()),
        ])
    }

    fn build(env: &HashMap<String, String>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_complete_environment_loads() {
        let config = build(&base_env()).unwrap();
        assert_eq!(config.run_mode, RunMode::Production);
        assert_eq!(config.api.base_url, "https://api.clinic.test");
        assert!(config.api.timeout.is_none());
        assert_eq!(config.ui.locale, "en");
        assert_eq!(config.notifications.max_visible, 5);
    }

    #[test]
    fn test_missing_required_value_fails_fast() {
        for name in [ENV_API_URL, ENV_FILES_URL, ENV_API_KEY, ENV_RUN_MODE] {
            let mut env = base_env();
            env.remove(name);
            match build(&env) {
                Err(ConfigError::MissingEnv(missing)) => assert_eq!(missing, name),
                other => panic!("expected MissingEnv for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut env = base_env();
        env.insert(ENV_API_KEY.to_string(), "   ".to_string());
        assert!(matches!(build(&env), Err(ConfigError::MissingEnv(_))));
    }

    #[test]
    fn test_unknown_run_mode_is_invalid() {
        let mut env = base_env();
        env.insert(ENV_RUN_MODE.to_string(), "staging".to_string());
        assert!(matches!(build(&env), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_timeout_and_ui_overrides() {
        let mut env = base_env();
        env.insert(ENV_REQUEST_TIMEOUT_SECS.to_string(), "15".to_string());
        env.insert(ENV_LOCALE.to_string(), "fr".to_string());
        env.insert(ENV_THEME.to_string(), "dark".to_string());
        let config = build(&env).unwrap();
        assert_eq!(config.api.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.ui.locale, "fr");
        assert_eq!(config.ui.theme, ThemeMode::Dark);
    }

    #[test]
    fn test_yaml_overlay_is_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "observability:\n  log_level: debug\n  log_file: logs/carebase.log\n\
             notifications:\n  max_visible: 3\nui:\n  locale: de"
        )
        .unwrap();

        let mut env = base_env();
        env.insert(
            ENV_CONFIG_PATH.to_string(),
            file.path().to_string_lossy().to_string(),
        );
        let config = build(&env).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(
            config.observability.log_file.as_deref(),
            Some("logs/carebase.log")
        );
        assert_eq!(config.notifications.max_visible, 3);
        assert_eq!(config.ui.locale, "de");
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let mut env = base_env();
        env.insert(ENV_API_URL.to_string(), "api.clinic.test".to_string());
        assert!(matches!(build(&env), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_api_key_is_redacted_in_debug() {
        let config = build(&base_env()).unwrap();
        let rendered = format!("{:?}", config.api);
        assert!(!rendered.contains("secret"));
    }
}
