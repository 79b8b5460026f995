//! # Carebase HTTP
//!
//! Every backend call funnels through [`RequestPipeline`]:
//! - a process-wide default [`RequestConfig`] merged under each call
//! - an [`OperatorChain`] of response transforms addressed by stable handles
//! - an [`HttpTransport`] seam, [`ReqwestTransport`] in production
//!
//! Responses are lazy [`ResponseStream`]s: nothing touches the network until
//! the stream is polled.

mod config;
mod error;
mod operator;
mod pipeline;
mod resource;
mod transport;

pub use config::RequestConfig;
pub use error::HttpError;
pub use operator::{
    log_responses, map_body, unwrap_field, OperatorChain, OperatorHandle, ResponseOperator,
    ResponseStream,
};
pub use pipeline::{decode_first, RequestPipeline};
pub use reqwest::Method;
pub use resource::{Resource, ResourceCatalog};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
