//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `Client::build_*` produces an
//! `HttpRequest`, something implementing [`Transport`] performs the GET, and
//! `Client::parse_*` consumes the `HttpResponse`. The service only ever sees
//! GETs with everything in the query string, so a request is a URL plus
//! headers.
//!
//! [`UreqTransport`] is the stock blocking implementation; tests swap in
//! in-memory transports that record what was sent.

use std::io;

use tracing::debug;

use crate::context::Context;
use crate::error::TransportError;

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes exactly one GET per call. No retries.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a shared `ureq` agent.
///
/// Non-2xx statuses come back as data so the parse step decides what they
/// mean. The context's remaining time becomes the request's global timeout.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError> {
        let remaining = ctx.remaining()?;

        let mut builder = self.agent.get(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let builder = builder.config().timeout_global(remaining).build();

        let mut response = builder.call().map_err(from_ureq)?;
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
        let body = response.body_mut().read_to_string().map_err(from_ureq)?;

        // The agent cannot be interrupted mid-call; a cancel that landed
        // while we were blocked still wins over the response.
        if ctx.cancel_token().is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn from_ureq(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => TransportError::Timeout,
        other => TransportError::Network(other.to_string()),
    }
}
