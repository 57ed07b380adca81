//! Blocking client core for the Remember The Milk REST API.
//!
//! # Overview
//! Every call is a signed GET: parameters plus `api_key` (and `format=json`)
//! are signed with the shared secret and sent as a query string; the answer
//! is a JSON `rsp` envelope. On top of that sit the frob → approval → token
//! handshake, sessions carrying the token, and lazily created timelines.
//!
//! # Design
//! - `Client` splits each method into `build_*` (produces an `HttpRequest`)
//!   and `parse_*` (consumes an `HttpResponse`); a [`Transport`] runs the
//!   round-trip in between. [`UreqTransport`] is the stock one.
//! - Parameter sets and signatures are built fresh per call, so a `Client`
//!   can be shared across threads without locking.
//! - Each call takes a [`Context`] carrying an optional deadline and a
//!   cancel flag.
//! - `Session` holds only a weak handle on the client; `Timeline` lives in
//!   the session that created it.

pub mod auth;
pub mod client;
pub mod context;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod http;
pub mod request;
pub mod session;
pub mod sign;
pub mod timeline;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{BrowserLauncher, ManualApproval, PendingAuth, RetryPolicy, SystemBrowser};
pub use client::{Client, ClientBuilder, AUTH_SERVICES_URL, REST_ENDPOINT_URL, VERSION};
pub use context::{CancelToken, Context};
pub use credentials::Credentials;
pub use envelope::parse_envelope;
pub use error::{ConfigError, Error, RemoteError, Result, TransportError, CODE_FROB_NOT_AUTHORIZED};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use request::{build_url, parse_base_url, Format};
pub use session::Session;
pub use sign::{sign, Params};
pub use timeline::Timeline;
pub use types::{Auth, AuthInfo, Echo, Frob, Login, Perms, TimelineCreated, User};
