//! RequestPipeline - single funnel for backend calls.

use std::sync::{Arc, PoisonError, RwLock};

use futures_util::stream::{self, StreamExt};
use serde::de::DeserializeOwned;

use crate::{
    HttpError, HttpTransport, OperatorChain, OperatorHandle, RequestConfig, ResponseOperator,
    ResponseStream,
};

/// Shared request pipeline: default config + operator chain + transport.
///
/// One instance is built at startup and handed around as
/// `Arc<RequestPipeline>`. Changing defaults or operators affects every
/// request issued afterwards; streams already returned keep the operator set
/// captured when [`RequestPipeline::request`] was called.
pub struct RequestPipeline {
    transport: Arc<dyn HttpTransport>,
    defaults: RwLock<RequestConfig>,
    operators: OperatorChain,
}

impl RequestPipeline {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_defaults(transport, RequestConfig::default())
    }

    pub fn with_defaults(transport: Arc<dyn HttpTransport>, defaults: RequestConfig) -> Self {
        Self {
            transport,
            defaults: RwLock::new(defaults),
            operators: OperatorChain::new(),
        }
    }

    pub fn defaults(&self) -> RequestConfig {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_defaults(&self, defaults: RequestConfig) {
        *self.defaults.write().unwrap_or_else(PoisonError::into_inner) = defaults;
    }

    pub fn use_operator(&self, operator: Arc<dyn ResponseOperator>) -> OperatorHandle {
        self.operators.use_operator(operator)
    }

    pub fn eject(&self, handle: OperatorHandle) {
        self.operators.eject(handle)
    }

    pub fn operators(&self) -> &OperatorChain {
        &self.operators
    }

    /// Build the response stream for one request.
    ///
    /// The transport is not invoked until the stream is polled. No retries.
    pub fn request(&self, config: RequestConfig) -> ResponseStream {
        let merged = self.defaults().merge(config);
        let transport = Arc::clone(&self.transport);

        let source: ResponseStream = stream::once(async move {
            let result = transport.send(&merged).await;
            if let Err(err) = &result {
                tracing::debug!(
                    method = %merged.method_or_default(),
                    url = merged.url.as_deref().unwrap_or_default(),
                    error = %err,
                    "request failed"
                );
            }
            result
        })
        .boxed();

        self.operators
            .snapshot()
            .into_iter()
            .fold(source, |stream, operator| operator.apply(stream))
    }

    /// Issue a request and decode the first body.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
    ) -> Result<T, HttpError> {
        decode_first(self.request(config)).await
    }
}

/// Drive a stream to its first item and deserialize the body.
pub async fn decode_first<T: DeserializeOwned>(mut stream: ResponseStream) -> Result<T, HttpError> {
    match stream.next().await {
        Some(Ok(response)) => {
            serde_json::from_value(response.body).map_err(|e| HttpError::Decode(e.to_string()))
        }
        Some(Err(err)) => Err(err),
        None => Err(HttpError::Network(
            "response stream ended without a value".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{map_body, HttpResponse};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Echoes the merged config back and counts calls.
    #[derive(Default)]
    struct EchoTransport {
        calls: AtomicUsize,
        seen: Mutex<Vec<RequestConfig>>,
    }

    #[async_trait]
    impl HttpTransport for EchoTransport {
        async fn send(&self, config: &RequestConfig) -> Result<HttpResponse, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(config.clone());
            match config.url.as_deref() {
                Some("/fail") => Err(HttpError::Status {
                    status: 500,
                    body: Some(json!({"message": "down"})),
                }),
                url => Ok(HttpResponse::ok(json!({ "url": url }))),
            }
        }
    }

    #[tokio::test]
    async fn test_request_is_lazy_until_polled() {
        let transport = Arc::new(EchoTransport::default());
        let pipeline = RequestPipeline::new(transport.clone());

        let stream = pipeline.request(RequestConfig::get("/x"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

        let body: Value = decode_first(stream).await.unwrap();
        assert_eq!(body, json!({"url": "/x"}));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transform_then_eject() {
        let pipeline = RequestPipeline::new(Arc::new(EchoTransport::default()));
        let handle = pipeline.use_operator(map_body(|body| json!({ "transformed": body })));

        let first: Value = pipeline.fetch_json(RequestConfig::get("/x")).await.unwrap();
        assert_eq!(first, json!({"transformed": {"url": "/x"}}));

        pipeline.eject(handle);
        pipeline.eject(handle);
        let second: Value = pipeline.fetch_json(RequestConfig::get("/x")).await.unwrap();
        assert_eq!(second, json!({"url": "/x"}));
    }

    #[tokio::test]
    async fn test_stream_keeps_operators_captured_at_request_time() {
        let pipeline = RequestPipeline::new(Arc::new(EchoTransport::default()));
        let handle = pipeline.use_operator(map_body(|_| json!("captured")));

        let stream = pipeline.request(RequestConfig::get("/x"));
        pipeline.eject(handle);

        let body: Value = decode_first(stream).await.unwrap();
        assert_eq!(body, json!("captured"));
    }

    #[tokio::test]
    async fn test_defaults_merge_under_call_config() {
        let transport = Arc::new(EchoTransport::default());
        let pipeline = RequestPipeline::with_defaults(
            transport.clone(),
            RequestConfig::new()
                .base_url("https://api.clinic.test")
                .header("x-api-key", "k1"),
        );

        let _: Value = pipeline
            .fetch_json(RequestConfig::get("/x").header("x-trace", "t"))
            .await
            .unwrap();
        pipeline.set_defaults(RequestConfig::new().header("x-api-key", "k2"));
        let _: Value = pipeline.fetch_json(RequestConfig::get("/y")).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].base_url.as_deref(), Some("https://api.clinic.test"));
        assert_eq!(seen[0].headers["x-api-key"], "k1");
        assert_eq!(seen[0].headers["x-trace"], "t");
        assert_eq!(seen[1].headers["x-api-key"], "k2");
        assert!(seen[1].base_url.is_none());
    }

    #[tokio::test]
    async fn test_error_passes_through_without_retry() {
        let transport = Arc::new(EchoTransport::default());
        let pipeline = RequestPipeline::new(transport.clone());

        let err = pipeline
            .fetch_json::<Value>(RequestConfig::get("/fail"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decode_mismatch_is_decode_error() {
        let pipeline = RequestPipeline::new(Arc::new(EchoTransport::default()));
        let err = pipeline
            .fetch_json::<Vec<u32>>(RequestConfig::get("/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Decode(_)));
    }
}
