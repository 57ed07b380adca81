//! Signed request builder and response parser for the REST API.
//!
//! # Design
//! `Client` holds the credentials, the two base URLs and a [`Transport`]
//! behind an `Arc`, and carries no mutable state between calls. Each API
//! method is split into a `build_*` method producing an `HttpRequest` and a
//! `parse_*` method consuming an `HttpResponse`, so hosts that do their own
//! I/O can drive the protocol without the bundled transport. The
//! un-prefixed methods (`frob`, `echo`, ...) run the whole round-trip.
//!
//! Sessions only keep a weak handle on the client internals; see
//! [`crate::session`].

use std::fmt;
use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::context::Context;
use crate::credentials::Credentials;
use crate::envelope::parse_envelope;
use crate::error::{ConfigError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::request::{build_url, parse_base_url, Format, PARAM_AUTH_TOKEN, PARAM_METHOD};
use crate::session::Session;
use crate::sign::Params;
use crate::types::{AuthInfo, Echo, Frob, Login, TimelineCreated};

/// Browser-facing authorization endpoint.
pub const AUTH_SERVICES_URL: &str = "https://www.rememberthemilk.com/services/auth/";

/// JSON REST endpoint.
pub const REST_ENDPOINT_URL: &str = "https://api.rememberthemilk.com/services/rest/";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const METHOD_GET_FROB: &str = "rtm.auth.getFrob";
pub const METHOD_GET_TOKEN: &str = "rtm.auth.getToken";
pub const METHOD_CHECK_TOKEN: &str = "rtm.auth.checkToken";
pub const METHOD_ECHO: &str = "rtm.test.echo";
pub const METHOD_LOGIN: &str = "rtm.test.login";
pub const METHOD_CREATE_TIMELINE: &str = "rtm.timelines.create";

pub(crate) struct ClientInner {
    credentials: Credentials,
    auth_url: Url,
    rest_url: Url,
    user_agent: String,
    transport: Box<dyn Transport>,
}

/// Entry point for unauthenticated calls and for the auth handshake.
///
/// Cheap to clone; clones share credentials and transport.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.inner.credentials)
            .field("auth_url", &self.inner.auth_url.as_str())
            .field("rest_url", &self.inner.rest_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Configures a [`Client`]. Base URLs are validated in [`build`](Self::build).
pub struct ClientBuilder {
    api_key: String,
    secret: String,
    auth_url: String,
    rest_url: String,
    user_agent: String,
    transport: Option<Box<dyn Transport>>,
}

impl ClientBuilder {
    pub fn credentials(mut self, api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self.secret = secret.into();
        self
    }

    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn rest_url(mut self, url: impl Into<String>) -> Self {
        self.rest_url = url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self) -> Result<Client, ConfigError> {
        let credentials = Credentials::new(self.api_key, self.secret)?;
        let auth_url = parse_base_url(&self.auth_url)?;
        let rest_url = parse_base_url(&self.rest_url)?;
        let transport = self
            .transport
            .unwrap_or_else(|| Box::new(UreqTransport::new()));
        Ok(Client {
            inner: Arc::new(ClientInner {
                credentials,
                auth_url,
                rest_url,
                user_agent: self.user_agent,
                transport,
            }),
        })
    }
}

impl Client {
    /// Client against the public endpoints using the bundled transport.
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder().credentials(api_key, secret).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder {
            api_key: String::new(),
            secret: String::new(),
            auth_url: AUTH_SERVICES_URL.to_string(),
            rest_url: REST_ENDPOINT_URL.to_string(),
            user_agent: format!("rtm-core/{VERSION}"),
            transport: None,
        }
    }

    pub fn api_key(&self) -> &str {
        self.inner.credentials.api_key()
    }

    pub fn auth_base_url(&self) -> &Url {
        &self.inner.auth_url
    }

    pub fn rest_base_url(&self) -> &Url {
        &self.inner.rest_url
    }

    pub(crate) fn downgrade(&self) -> Weak<ClientInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<ClientInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Client { inner })
    }

    /// Signed GET for `method` against the REST endpoint, `format=json` forced.
    pub fn build_request(&self, method: &str, mut params: Params) -> HttpRequest {
        params.insert(PARAM_METHOD.to_string(), method.to_string());
        let url = build_url(&self.inner.rest_url, &self.inner.credentials, &params, Format::Json);
        HttpRequest {
            url: url.into(),
            headers: vec![("user-agent".to_string(), self.inner.user_agent.clone())],
        }
    }

    /// Signed authorization page URL for the user to visit. No `format`.
    pub fn auth_url(&self, params: &Params) -> Url {
        build_url(&self.inner.auth_url, &self.inner.credentials, params, Format::Unspecified)
    }

    pub fn build_frob(&self) -> HttpRequest {
        self.build_request(METHOD_GET_FROB, Params::new())
    }

    pub fn build_token(&self, frob: &str) -> HttpRequest {
        self.build_request(METHOD_GET_TOKEN, Params::from([("frob".to_string(), frob.to_string())]))
    }

    pub fn build_echo(&self, ping: &str) -> HttpRequest {
        self.build_request(METHOD_ECHO, Params::from([("ping".to_string(), ping.to_string())]))
    }

    pub fn build_check_token(&self, auth_token: &str) -> HttpRequest {
        self.build_request(METHOD_CHECK_TOKEN, token_params(auth_token))
    }

    pub fn build_login(&self, auth_token: &str) -> HttpRequest {
        self.build_request(METHOD_LOGIN, token_params(auth_token))
    }

    pub fn build_create_timeline(&self, auth_token: &str) -> HttpRequest {
        self.build_request(METHOD_CREATE_TIMELINE, token_params(auth_token))
    }

    pub fn parse_frob(&self, response: HttpResponse) -> Result<Frob> {
        parse_envelope(&response)
    }

    pub fn parse_token(&self, response: HttpResponse) -> Result<AuthInfo> {
        parse_envelope(&response)
    }

    pub fn parse_echo(&self, response: HttpResponse) -> Result<Echo> {
        parse_envelope(&response)
    }

    pub fn parse_check_token(&self, response: HttpResponse) -> Result<AuthInfo> {
        parse_envelope(&response)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Login> {
        parse_envelope(&response)
    }

    pub fn parse_create_timeline(&self, response: HttpResponse) -> Result<TimelineCreated> {
        parse_envelope(&response)
    }

    /// Execute `request` once through the configured transport.
    pub fn execute(&self, ctx: &Context, request: &HttpRequest) -> Result<HttpResponse> {
        Ok(self.inner.transport.execute(request, ctx)?)
    }

    pub(crate) fn call<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        method: &str,
        request: HttpRequest,
    ) -> Result<T> {
        debug!(
            method,
            host = self.inner.rest_url.host_str().unwrap_or_default(),
            "calling"
        );
        let response = self.execute(ctx, &request)?;
        parse_envelope(&response)
    }

    /// Ask for a new frob; the first step of the auth handshake.
    pub fn frob(&self, ctx: &Context) -> Result<Frob> {
        self.call(ctx, METHOD_GET_FROB, self.build_frob())
    }

    /// Exchange an approved frob for an auth token.
    pub fn token(&self, ctx: &Context, frob: &str) -> Result<AuthInfo> {
        self.call(ctx, METHOD_GET_TOKEN, self.build_token(frob))
    }

    pub fn echo(&self, ctx: &Context, ping: &str) -> Result<Echo> {
        self.call(ctx, METHOD_ECHO, self.build_echo(ping))
    }

    /// Rebuild a session from a token persisted by the caller.
    pub fn resume_session(&self, auth_token: impl Into<String>) -> Session {
        info!("session resumed from a stored token");
        Session::new(self, auth_token.into())
    }
}

fn token_params(auth_token: &str) -> Params {
    Params::from([(PARAM_AUTH_TOKEN.to_string(), auth_token.to_string())])
}
