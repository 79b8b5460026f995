//! Scripted transport for store tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use carebase_http::{
    HttpError, HttpResponse, HttpTransport, Method, RequestConfig, RequestPipeline,
    ResourceCatalog,
};

use crate::{BroadcastNotificationBus, Notifier};

struct Reply {
    delay: Duration,
    result: Result<Value, HttpError>,
}

/// Answers `"METHOD /path"` with queued replies, first in first out.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RequestConfig>>,
}

impl ScriptedTransport {
    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry(format!("{method} {path}"))
            .or_default()
            .push_back(reply);
    }

    pub fn reply(&self, method: Method, path: &str, body: Value) -> &Self {
        self.reply_after(method, path, Duration::ZERO, body)
    }

    pub fn reply_after(&self, method: Method, path: &str, delay: Duration, body: Value) -> &Self {
        self.push(
            method,
            path,
            Reply {
                delay,
                result: Ok(body),
            },
        );
        self
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, body: Option<Value>) -> &Self {
        self.push(
            method,
            path,
            Reply {
                delay: Duration::ZERO,
                result: Err(HttpError::Status { status, body }),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<RequestConfig> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, config: &RequestConfig) -> Result<HttpResponse, HttpError> {
        self.calls.lock().unwrap().push(config.clone());
        let key = format!(
            "{} {}",
            config.method_or_default(),
            config.url.as_deref().unwrap_or_default()
        );
        let reply = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let Some(reply) = reply else {
            return Err(HttpError::Status {
                status: 404,
                body: Some(json!({ "message": format!("no scripted reply for {key}") })),
            });
        };
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result.map(HttpResponse::ok)
    }
}

pub(crate) fn catalog(transport: &Arc<ScriptedTransport>) -> ResourceCatalog {
    let transport: Arc<dyn HttpTransport> = transport.clone();
    ResourceCatalog::new(Arc::new(RequestPipeline::new(transport)))
}

/// Notifier whose deliveries land in the returned receiver.
pub(crate) fn notifier() -> (
    Notifier,
    tokio::sync::mpsc::UnboundedReceiver<carebase_core::Notification>,
) {
    let bus = Arc::new(BroadcastNotificationBus::new());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let notifier = Notifier::new(bus);
    notifier.subscribe(Arc::new(move |n: &carebase_core::Notification| {
        let _ = tx.send(n.clone());
    }));
    (notifier, rx)
}
