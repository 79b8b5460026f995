//! Resource functions.
//!
//! A [`Resource`] names one REST collection. Each method returns a lazy
//! [`ResponseStream`]; the request is only sent once the stream is polled.
//! Ids are percent-encoded into a single path segment.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use crate::{HttpError, HttpResponse, RequestConfig, RequestPipeline, ResponseStream};

#[derive(Clone)]
pub struct Resource {
    pipeline: Arc<RequestPipeline>,
    base_url: Option<String>,
    path: String,
    invalid: Option<HttpError>,
}

impl Resource {
    pub fn new(pipeline: Arc<RequestPipeline>, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = format!("/{}", path.trim_matches('/'));
        Self {
            pipeline,
            base_url: None,
            path,
            invalid: None,
        }
    }

    /// Send this resource's requests to `base_url` instead of the pipeline default.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sub-collection under one member, e.g. `patients/{id}/allergies`.
    ///
    /// An id that cannot be a single segment makes every request of the
    /// returned resource fail with [`HttpError::InvalidConfig`].
    pub fn nested(&self, id: &str, child: &str) -> Resource {
        let mut nested = self.clone();
        match encode_segment(id) {
            Ok(segment) => {
                nested.path = format!("{}/{}/{}", self.path, segment, child.trim_matches('/'));
            }
            Err(err) => {
                nested.path = format!("{}/{{invalid}}/{}", self.path, child.trim_matches('/'));
                nested.invalid = Some(err);
            }
        }
        nested
    }

    fn member(&self, id: &str) -> Result<String, HttpError> {
        Ok(format!("{}/{}", self.path, encode_segment(id)?))
    }

    fn send(&self, config: RequestConfig) -> ResponseStream {
        if let Some(err) = &self.invalid {
            return failed(err.clone());
        }
        let config = match &self.base_url {
            Some(base_url) => config.base_url(base_url.clone()),
            None => config,
        };
        self.pipeline.request(config)
    }

    pub fn all(&self) -> ResponseStream {
        self.send(RequestConfig::get(self.path.clone()))
    }

    pub fn list<I, K, V>(&self, params: I) -> ResponseStream
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config = params
            .into_iter()
            .fold(RequestConfig::get(self.path.clone()), |config, (k, v)| {
                config.param(k, v)
            });
        self.send(config)
    }

    pub fn get(&self, id: &str) -> ResponseStream {
        match self.member(id) {
            Ok(url) => self.send(RequestConfig::get(url)),
            Err(err) => failed(err),
        }
    }

    pub fn create<B: Serialize>(&self, body: &B) -> ResponseStream {
        match to_body(body, &self.path) {
            Ok(body) => self.send(RequestConfig::post(self.path.clone(), body)),
            Err(err) => failed(err),
        }
    }

    pub fn update<B: Serialize>(&self, id: &str, body: &B) -> ResponseStream {
        let request = self.member(id).and_then(|url| {
            let body = to_body(body, &url)?;
            Ok(RequestConfig::put(url, body))
        });
        match request {
            Ok(config) => self.send(config),
            Err(err) => failed(err),
        }
    }

    /// PUT to the collection itself, for singleton resources like settings.
    pub fn replace<B: Serialize>(&self, body: &B) -> ResponseStream {
        match to_body(body, &self.path) {
            Ok(body) => self.send(RequestConfig::put(self.path.clone(), body)),
            Err(err) => failed(err),
        }
    }

    pub fn remove(&self, id: &str) -> ResponseStream {
        match self.member(id) {
            Ok(url) => self.send(RequestConfig::delete(url)),
            Err(err) => failed(err),
        }
    }
}

/// Percent-encode `id` as exactly one path segment. Dot segments are
/// rejected because URL parsing collapses them even when encoded.
fn encode_segment(id: &str) -> Result<String, HttpError> {
    match id {
        "" | "." | ".." => Err(HttpError::InvalidConfig(format!(
            "'{id}' is not a valid resource id"
        ))),
        _ => Ok(urlencoding::encode(id).into_owned()),
    }
}

fn to_body<B: Serialize>(body: &B, path: &str) -> Result<serde_json::Value, HttpError> {
    serde_json::to_value(body)
        .map_err(|err| HttpError::InvalidConfig(format!("request body for {path}: {err}")))
}

fn failed(err: HttpError) -> ResponseStream {
    stream::once(async move { Err::<HttpResponse, _>(err) }).boxed()
}

/// Collections used by the feature stores.
#[derive(Clone)]
pub struct ResourceCatalog {
    pipeline: Arc<RequestPipeline>,
    files_url: Option<String>,
}

impl ResourceCatalog {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self {
            pipeline,
            files_url: None,
        }
    }

    /// Serve [`ResourceCatalog::files`] from the file service at `files_url`.
    pub fn with_files_url(mut self, files_url: impl Into<String>) -> Self {
        self.files_url = Some(files_url.into());
        self
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn patients(&self) -> Resource {
        Resource::new(Arc::clone(&self.pipeline), "patients")
    }

    pub fn allergies(&self, patient_id: &str) -> Resource {
        self.patients().nested(patient_id, "allergies")
    }

    pub fn vitals(&self, patient_id: &str) -> Resource {
        self.patients().nested(patient_id, "vitals")
    }

    pub fn education(&self, patient_id: &str) -> Resource {
        self.patients().nested(patient_id, "education")
    }

    pub fn prescriptions(&self, patient_id: &str) -> Resource {
        self.patients().nested(patient_id, "prescriptions")
    }

    pub fn practices(&self) -> Resource {
        Resource::new(Arc::clone(&self.pipeline), "practices")
    }

    pub fn settings(&self) -> Resource {
        Resource::new(Arc::clone(&self.pipeline), "settings")
    }

    pub fn messages(&self) -> Resource {
        Resource::new(Arc::clone(&self.pipeline), "messages")
    }

    pub fn users(&self) -> Resource {
        Resource::new(Arc::clone(&self.pipeline), "users")
    }

    /// Uploaded documents. Uses the API base when no files url is set.
    pub fn files(&self) -> Resource {
        let files = Resource::new(Arc::clone(&self.pipeline), "files");
        match &self.files_url {
            Some(files_url) => files.with_base_url(files_url.clone()),
            None => files,
        }
    }
}
