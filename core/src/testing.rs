//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::context::Context;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

pub(crate) fn ok_response(body: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<HttpResponse>,
    requests: Vec<HttpRequest>,
}

/// Replays queued responses in order and records every request.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_ok(&self, body: &str) {
        self.script.lock().unwrap().responses.push_back(ok_response(body));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError> {
        ctx.remaining()?;
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script
            .responses
            .pop_front()
            .ok_or_else(|| TransportError::Network("script exhausted".to_string()))
    }
}
