//! Session authentication data.

use serde::{Deserialize, Serialize};

/// Self-asserted role of a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    /// Browser dashboard.
    Client,
    /// Feeder hardware.
    Iot,
}

impl AuthKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(AuthKind::Client),
            "iot" => Some(AuthKind::Iot),
            _ => None,
        }
    }
}

/// Set once per session by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthData {
    pub kind: AuthKind,
    /// Hardware id bound to the session, if one was given at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iot_hwid: Option<String>,
}
