//! Authenticated calls.
//!
//! A `Session` pairs an auth token with a weak handle on the client that
//! produced it. The client can be dropped independently; once every
//! `Client` handle is gone, session calls fail with
//! [`ConfigError::ClientDropped`].

use std::fmt;
use std::sync::Weak;

use crate::client::{Client, ClientInner, METHOD_CHECK_TOKEN, METHOD_LOGIN};
use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::timeline::Timeline;
use crate::types::{AuthInfo, Login};

pub struct Session {
    client: Weak<ClientInner>,
    token: String,
    pub(crate) timeline: Option<Timeline>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("timeline", &self.timeline)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(client: &Client, token: String) -> Self {
        Self {
            client: client.downgrade(),
            token,
            timeline: None,
        }
    }

    /// The auth token. Persist it to skip the handshake next time.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn client(&self) -> Result<Client> {
        Ok(Client::upgrade(&self.client).ok_or(ConfigError::ClientDropped)?)
    }

    /// Which user, if any, the token is logged in as.
    pub fn login(&self, ctx: &Context) -> Result<Login> {
        let client = self.client()?;
        let request = client.build_login(&self.token);
        client.call(ctx, METHOD_LOGIN, request)
    }

    /// Validate the token and return what it grants.
    pub fn check_token(&self, ctx: &Context) -> Result<AuthInfo> {
        let client = self.client()?;
        let request = client.build_check_token(&self.token);
        client.call(ctx, METHOD_CHECK_TOKEN, request)
    }
}
