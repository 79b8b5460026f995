use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::HttpError;

/// Per-request configuration. The pipeline holds one as process-wide
/// defaults and merges each call's config on top of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub method: Option<Method>,
    pub base_url: Option<String>,
    pub url: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::with_method(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::with_method(Method::POST, url).body(body)
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::with_method(Method::PUT, url).body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::with_method(Method::DELETE, url)
    }

    pub fn with_method(method: Method, url: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Layer `call` over `self`. Call values win; headers and params merge
    /// key by key.
    pub fn merge(&self, call: RequestConfig) -> RequestConfig {
        let mut headers = self.headers.clone();
        headers.extend(call.headers);
        let mut params = self.params.clone();
        params.extend(call.params);

        RequestConfig {
            method: call.method.or_else(|| self.method.clone()),
            base_url: call.base_url.or_else(|| self.base_url.clone()),
            url: call.url.or_else(|| self.url.clone()),
            headers,
            params,
            body: call.body.or_else(|| self.body.clone()),
            timeout: call.timeout.or(self.timeout),
        }
    }

    pub fn method_or_default(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// Resolve the target URL. Absolute urls ignore `base_url`.
    pub fn full_url(&self) -> Result<String, HttpError> {
        let path = self
            .url
            .as_deref()
            .ok_or_else(|| HttpError::InvalidConfig("request url is missing".to_string()))?;

        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }

        match &self.base_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            )),
            None => Err(HttpError::InvalidConfig(format!(
                "relative url '{path}' requires a base_url"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_call_values_win() {
        let defaults = RequestConfig::new()
            .base_url("https://api.clinic.test")
            .header("accept", "application/json")
            .header("x-api-key", "default-key")
            .param("locale", "en")
            .timeout(Duration::from_secs(30));

        let call = RequestConfig::post("/allergies", json!({"allergen": "Latex"}))
            .header("x-api-key", "override")
            .param("page", "2");

        let merged = defaults.merge(call);
        assert_eq!(merged.method, Some(Method::POST));
        assert_eq!(merged.base_url.as_deref(), Some("https://api.clinic.test"));
        assert_eq!(merged.headers["accept"], "application/json");
        assert_eq!(merged.headers["x-api-key"], "override");
        assert_eq!(merged.params["locale"], "en");
        assert_eq!(merged.params["page"], "2");
        assert_eq!(merged.timeout, Some(Duration::from_secs(30)));
        assert_eq!(merged.body, Some(json!({"allergen": "Latex"})));
    }

    #[test]
    fn test_full_url_joins_with_single_slash() {
        let config = RequestConfig::get("/patients/1").base_url("https://api.clinic.test/");
        assert_eq!(
            config.full_url().unwrap(),
            "https://api.clinic.test/patients/1"
        );
    }

    #[test]
    fn test_absolute_url_ignores_base() {
        let config =
            RequestConfig::get("https://files.clinic.test/doc").base_url("https://api.clinic.test");
        assert_eq!(config.full_url().unwrap(), "https://files.clinic.test/doc");
    }

    #[test]
    fn test_missing_url_is_invalid() {
        assert!(matches!(
            RequestConfig::new().full_url(),
            Err(HttpError::InvalidConfig(_))
        ));
        assert!(matches!(
            RequestConfig::get("relative").full_url(),
            Err(HttpError::InvalidConfig(_))
        ));
    }
}
