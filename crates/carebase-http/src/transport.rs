//! HTTP transport seam.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::{HttpError, RequestConfig};

/// A decoded HTTP reply.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl HttpResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body,
        }
    }
}

/// Performs one HTTP exchange for a fully merged config.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, config: &RequestConfig) -> Result<HttpResponse, HttpError>;
}

/// reqwest-backed transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HttpError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    fn build_headers(config: &RequestConfig) -> Result<HeaderMap, HttpError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::InvalidConfig(format!("header '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::InvalidConfig(format!("header '{name}' value: {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, config: &RequestConfig) -> Result<HttpResponse, HttpError> {
        let url = config.full_url()?;
        let method = config.method_or_default();
        tracing::debug!(method = %method, url = %url, "sending request");

        let mut builder = self
            .client
            .request(method, &url)
            .headers(Self::build_headers(config)?);
        if !config.params.is_empty() {
            builder = builder.query(&config.params);
        }
        if let Some(body) = &config.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;
        let body = parse_body(&text);

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %url, "non-success response");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body: body.unwrap_or(Value::Null),
        })
    }
}

/// JSON when possible, raw text otherwise, nothing for an empty body.
fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}
