//! Out-of-band authorization handshake.
//!
//! # Overview
//! 1. [`Client::begin_auth`] asks for a frob and signs an authorization page
//!    URL for it.
//! 2. The user opens that URL (via a [`BrowserLauncher`]) and approves
//!    access. Nothing tells us when that happens.
//! 3. [`PendingAuth::complete`] exchanges the frob for a token, polling with
//!    exponential backoff while the service answers code 101 ("frob not yet
//!    authorized").
//!
//! [`Client::create_session`] runs all three steps. A frob is only good for
//! the attempt that produced it; `complete` consumes the `PendingAuth`.

use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::client::Client;
use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::session::Session;
use crate::sign::Params;
use crate::types::Perms;

/// Shows the authorization URL to the user.
pub trait BrowserLauncher {
    fn open(&self, url: &Url) -> Result<(), ConfigError>;
}

impl<F> BrowserLauncher for F
where
    F: Fn(&Url) -> Result<(), ConfigError>,
{
    fn open(&self, url: &Url) -> Result<(), ConfigError> {
        self(url)
    }
}

/// Opens the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &Url) -> Result<(), ConfigError> {
        webbrowser::open(url.as_str()).map_err(|e| ConfigError::BrowserUnavailable {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Leaves opening the URL to the caller; only logs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualApproval;

impl BrowserLauncher for ManualApproval {
    fn open(&self, url: &Url) -> Result<(), ConfigError> {
        info!(%url, "visit this URL to authorize the application");
        Ok(())
    }
}

/// Bounded exponential backoff for the token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total token requests, including the first. Zero behaves as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no polling.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Sum of every backoff the policy can sleep through. A deadline for the
    /// token exchange should leave at least this much room plus the time the
    /// requests themselves take.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.max(1) - 1)
            .map(|retry| self.backoff(retry))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// A frob waiting for the user's approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuth {
    frob: String,
    perms: Perms,
    url: Url,
}

impl PendingAuth {
    pub fn frob(&self) -> &str {
        &self.frob
    }

    pub fn perms(&self) -> Perms {
        self.perms
    }

    /// Authorization page the user must visit.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Exchange the frob for a token and open a session.
    ///
    /// Code 101 is retried per `policy`; the last 101 is returned once the
    /// attempts run out, or once the next backoff would pass the context's
    /// deadline. Any other failure aborts immediately.
    pub fn complete(self, client: &Client, ctx: &Context, policy: &RetryPolicy) -> Result<Session> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match client.token(ctx, &self.frob) {
                Ok(info) => {
                    info!(
                        user = %info.auth.user.username,
                        perms = ?info.auth.perms,
                        attempt,
                        "session established"
                    );
                    return Ok(Session::new(client, info.auth.token));
                }
                Err(err) if err.is_frob_pending() && attempt < max_attempts => {
                    let delay = policy.backoff(attempt - 1);
                    if !ctx.has_time_for(delay) {
                        warn!(attempt, ?delay, "deadline reached before the frob was authorized");
                        return Err(err);
                    }
                    warn!(attempt, max_attempts, ?delay, "frob not authorized yet, retrying");
                    ctx.sleep(delay)?;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Client {
    /// Signed authorization page URL for `frob` at `perms`.
    pub fn authorization_url(&self, frob: &str, perms: Perms) -> Url {
        let params = Params::from([
            ("frob".to_string(), frob.to_string()),
            ("perms".to_string(), perms.to_string()),
        ]);
        self.auth_url(&params)
    }

    /// First half of the handshake: obtain a frob and its authorization URL.
    pub fn begin_auth(&self, ctx: &Context, perms: Perms) -> Result<PendingAuth> {
        let frob = self.frob(ctx)?.frob;
        let url = self.authorization_url(&frob, perms);
        Ok(PendingAuth { frob, perms, url })
    }

    /// Full handshake: frob, user approval through `launcher`, token.
    pub fn create_session(
        &self,
        ctx: &Context,
        perms: Perms,
        launcher: &dyn BrowserLauncher,
        policy: &RetryPolicy,
    ) -> Result<Session> {
        let pending = self.begin_auth(ctx, perms)?;
        launcher.open(pending.url())?;
        pending.complete(self, ctx, policy)
    }
}
