//! Wire protocol between connected peers and the hub.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request payload object.
pub type Payload = Map<String, Value>;

/// A decoded inbound frame: `{"key": "/route", "data": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub key: String,
    pub data: Payload,
}

/// Outcome reported in an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Uniform response wrapper sent back for every inbound frame.
///
/// Exactly one of `data` and `error_message` is set, matching `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: ResponseStatus,
    /// HTTP-style status code.
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Route key the request was sent to.
    pub endpoint: String,
}

impl Envelope {
    pub fn success(code: u16, data: Value, endpoint: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            code,
            data: Some(data),
            error_message: None,
            endpoint: endpoint.into(),
        }
    }

    pub fn error(code: u16, message: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            code,
            data: None,
            error_message: Some(message.into()),
            endpoint: endpoint.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
