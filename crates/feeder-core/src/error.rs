//! Error types for the feeder hub.

use crate::SessionKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeederError {
    #[error("Client session already exists: {0}")]
    DuplicateSession(SessionKey),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionKey),

    /// Malformed inbound frame. The message doubles as the close reason.
    #[error("{0}")]
    ProtocolViolation(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FeederError {
    /// Whether the transport should close the connection on this error.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            FeederError::DuplicateSession(_)
                | FeederError::SessionNotFound(_)
                | FeederError::ProtocolViolation(_)
        )
    }
}
