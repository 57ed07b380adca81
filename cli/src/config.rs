//! Credentials and endpoint settings for the CLI.
//!
//! Values come from flags (or their environment variables) first, then from
//! an optional JSON secrets file of the form
//! `{"api_key": "...", "secret": "..."}`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use rtm_core::{Client, AUTH_SERVICES_URL, REST_ENDPOINT_URL};
use serde::Deserialize;

/// Contents of the secrets file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret: String,
}

impl Secrets {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading secrets file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing secrets file {}", path.display()))
    }
}

/// Everything needed to build a [`Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub secret: String,
    pub rest_url: String,
    pub auth_url: String,
}

impl Settings {
    /// Merge flag values over the secrets file. Missing credentials are an
    /// error here rather than at the first request.
    pub fn resolve(
        api_key: Option<String>,
        secret: Option<String>,
        secrets_file: Option<&Path>,
        rest_url: Option<String>,
        auth_url: Option<String>,
    ) -> Result<Self> {
        let file = match secrets_file {
            Some(path) => Secrets::load(path)?,
            None => Secrets::default(),
        };
        let api_key = api_key.filter(|k| !k.is_empty()).unwrap_or(file.api_key);
        let secret = secret.filter(|s| !s.is_empty()).unwrap_or(file.secret);
        if api_key.is_empty() {
            bail!("no API key: pass --api-key, set RTM_API_KEY, or use --secrets");
        }
        if secret.is_empty() {
            bail!("no shared secret: pass --secret, set RTM_SHARED_SECRET, or use --secrets");
        }
        Ok(Self {
            api_key,
            secret,
            rest_url: rest_url.unwrap_or_else(|| REST_ENDPOINT_URL.to_string()),
            auth_url: auth_url.unwrap_or_else(|| AUTH_SERVICES_URL.to_string()),
        })
    }

    pub fn client(&self) -> Result<Client> {
        Client::builder()
            .credentials(&self.api_key, &self.secret)
            .rest_url(&self.rest_url)
            .auth_url(&self.auth_url)
            .build()
            .context("configuring client")
    }
}
