//! Request signatures.
//!
//! The service authenticates every call by an `api_sig` query parameter: the
//! MD5 of the shared secret followed by every other parameter as `key` then
//! `value`, keys in ascending byte order, no separators.

use std::collections::BTreeMap;

use md5::{Digest, Md5};

/// Parameters of a single call, keyed by name.
///
/// A `BTreeMap` keeps keys in ascending byte order, which is the order both
/// the signature and the emitted query string use.
pub type Params = BTreeMap<String, String>;

/// Compute the `api_sig` for `params` under `secret`.
///
/// `params` must already contain everything that will be sent (`api_key`,
/// `method`, `format` when forced) except `api_sig` itself.
pub fn sign(secret: &str, params: &Params) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    for (key, value) in params {
        hasher.update(key.as_bytes());
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}
