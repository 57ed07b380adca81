//! Payloads carried inside the `rsp` envelope.
//!
//! # Design
//! Fields the service may omit are `#[serde(default)]`, so an `ok` envelope
//! never fails to decode just because an optional sub-field is missing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission level requested during authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perms {
    Read,
    Write,
    #[default]
    Delete,
}

impl Perms {
    pub fn as_str(self) -> &'static str {
        match self {
            Perms::Read => "read",
            Perms::Write => "write",
            Perms::Delete => "delete",
        }
    }
}

impl fmt::Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Perms {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Perms::Read),
            "write" => Ok(Perms::Write),
            "delete" => Ok(Perms::Delete),
            other => Err(format!("unknown permission level: {other}")),
        }
    }
}

/// `rtm.auth.getFrob`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Frob {
    pub frob: String,
}

/// `rtm.auth.getToken` and `rtm.auth.checkToken`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthInfo {
    pub auth: Auth,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Auth {
    pub token: String,
    #[serde(default)]
    pub perms: Option<Perms>,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub fullname: String,
}

/// `rtm.test.echo` returns every parameter it was sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Echo {
    #[serde(default)]
    pub ping: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_json::Value>,
}

/// `rtm.test.login`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Login {
    #[serde(default)]
    pub user: User,
}

/// `rtm.timelines.create`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimelineCreated {
    pub timeline: String,
}
