//! Blocking execution of an `HttpRequest`.
//!
//! # Design
//! `Transport` is the seam between the pure build/parse core and the network.
//! `UreqTransport` is the default implementation; tests and embedders can
//! supply their own. A transport returns every response it receives,
//! including 4xx/5xx, as data: the service reports request problems inside a
//! JSON body, so status interpretation belongs to the parser.

use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes exactly one HTTP round trip and reads the whole body as bytes.
pub trait Transport {
    fn execute(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a fresh `ureq` agent per call.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses reach the parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, ApiError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();

        let mut builder = agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder.send(request.body.as_bytes())?;

        let status = response.status().as_u16();
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
        // No size cap: the whole body is handed to the decoder.
        let body = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
