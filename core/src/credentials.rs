//! API key and shared secret.
//!
//! Both are checked once when the client is built. The secret never leaves
//! this crate except as an input to [`crate::sign::sign`], and `Debug` output
//! redacts it.

use std::fmt;

use crate::error::ConfigError;

/// API key and shared secret issued by the service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let secret = secret.into();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self { api_key, secret })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

// Keep the secret out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}
