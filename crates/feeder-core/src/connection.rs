//! Transport-independent handle to a peer connection.

use crate::{FeederError, Result};
use feeder_types::Envelope;
use tokio::sync::mpsc;

/// Close code used for malformed frames and rejected connections (unsupported data).
pub const CLOSE_UNSUPPORTED_DATA: u16 = 1003;

/// Frame sent after every response. The device firmware reads up to `\r`
/// and otherwise waits for a read timeout.
pub const RESPONSE_TERMINATOR: &str = "\r";

/// Frames queued for the transport's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Ping,
    Close { code: u16, reason: String },
}

/// Sending side of a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self { tx }
    }

    /// Create a handle together with the receiver the writer task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.tx
            .send(Outbound::Text(text.into()))
            .await
            .map_err(|_| FeederError::ConnectionClosed)
    }

    /// Send an envelope followed by the `\r` terminator frame.
    ///
    /// Returns the encoded JSON for logging.
    pub async fn send_envelope(&self, envelope: &Envelope) -> Result<String> {
        let json = serde_json::to_string(envelope)?;
        self.send_text(json.clone()).await?;
        self.send_text(RESPONSE_TERMINATOR).await?;
        Ok(json)
    }

    pub async fn close(&self, code: u16, reason: impl Into<String>) -> Result<()> {
        self.tx
            .send(Outbound::Close {
                code,
                reason: reason.into(),
            })
            .await
            .map_err(|_| FeederError::ConnectionClosed)
    }

    /// Queue a ping without waiting. Returns false if the queue is full or closed.
    pub fn try_ping(&self) -> bool {
        self.tx.try_send(Outbound::Ping).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_envelope_appends_terminator() {
        let (conn, mut rx) = ConnectionHandle::channel(4);
        let envelope = Envelope::success(200, json!({}), "/hello");

        let encoded = conn.send_envelope(&envelope).await.unwrap();

        assert_eq!(rx.recv().await, Some(Outbound::Text(encoded)));
        assert_eq!(rx.recv().await, Some(Outbound::Text("\r".to_string())));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (conn, rx) = ConnectionHandle::channel(4);
        drop(rx);

        assert!(conn.is_closed());
        assert!(matches!(
            conn.send_text("hi").await,
            Err(FeederError::ConnectionClosed)
        ));
        assert!(!conn.try_ping());
    }

    #[test]
    fn test_try_ping_full_queue() {
        let (conn, _rx) = ConnectionHandle::channel(1);
        assert!(conn.try_ping());
        assert!(!conn.try_ping());
    }
}
