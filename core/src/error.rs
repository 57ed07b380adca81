//! Error types for the Remember The Milk client.
//!
//! # Design
//! Four families, matching where a call can fail: building the client
//! (`Config`), moving bytes (`Transport`), understanding the bytes
//! (`Protocol`), and the service saying no (`Remote`). Every failure carries
//! enough context to diagnose it: raw bodies for transport and protocol
//! failures, the verbatim code and message for remote ones.

use thiserror::Error;

/// Remote error code for "Invalid frob - did you authenticate?".
///
/// During the auth handshake this means the user has not approved the frob
/// yet, so it is the one remote error worth polling on.
pub const CODE_FROB_NOT_AUTHORIZED: &str = "101";

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by client, session, and parse operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body arrived but does not have the shape the method expects.
    #[error("unexpected response ({reason}): {body}")]
    Protocol { reason: String, body: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl Error {
    /// Whether this is the "frob not yet authorized" answer to a token
    /// exchange.
    pub fn is_frob_pending(&self) -> bool {
        matches!(self, Error::Remote(e) if e.code == CODE_FROB_NOT_AUTHORIZED)
    }

    pub(crate) fn protocol(reason: impl Into<String>, body: &str) -> Self {
        Error::Protocol {
            reason: reason.into(),
            body: body.to_string(),
        }
    }
}

/// Fatal setup problems. None of these go away by retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API key undefined")]
    MissingApiKey,

    #[error("shared secret undefined")]
    MissingSecret,

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The browser launcher could not open the authorization URL.
    #[error("cannot open browser for {url}: {reason}")]
    BrowserUnavailable { url: String, reason: String },

    /// Every `Client` handle was dropped while a session built from it was
    /// still in use.
    #[error("client was dropped; session is no longer usable")]
    ClientDropped,
}

/// Failures moving the request or response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with something other than 200.
    #[error("bad status code {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out")]
    Timeout,
}

/// A `stat: "fail"` envelope, carried verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("code {code}, message {message}")]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}
