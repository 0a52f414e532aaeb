//! Inbound frame decoding.

use crate::{FeederError, Result};
use feeder_types::{InboundFrame, Payload};
use serde_json::Value;

/// Decode a raw frame into `{key, data}`.
///
/// Any failure is a [`FeederError::ProtocolViolation`] whose message is the
/// reason sent with the close frame.
pub fn decode_frame(raw: &[u8]) -> Result<InboundFrame> {
    let text = std::str::from_utf8(raw).map_err(|_| {
        FeederError::ProtocolViolation(
            "Invalid message type, client must send binary encoded-string".into(),
        )
    })?;

    if text.is_empty() {
        return Err(FeederError::ProtocolViolation("Empty message received".into()));
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|_| FeederError::ProtocolViolation("Invalid JSON format".into()))?;

    let Value::Object(mut object) = value else {
        return Err(FeederError::ProtocolViolation(
            "Data must be a valid JSON-encoded object".into(),
        ));
    };

    let key = match object.remove("key") {
        Some(Value::String(key)) => key,
        _ => {
            return Err(FeederError::ProtocolViolation(
                "Data must contain a valid key (string) property".into(),
            ));
        }
    };

    let data = match object.remove("data") {
        Some(Value::Object(data)) => data,
        _ => Payload::new(),
    };

    Ok(InboundFrame { key, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(raw: &[u8]) -> String {
        match decode_frame(raw) {
            Err(FeederError::ProtocolViolation(reason)) => reason,
            other => panic!("expected protocol violation, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_with_data() {
        let frame = decode_frame(br#"{"key":"/login","data":{"kind":"client"}}"#).unwrap();
        assert_eq!(frame.key, "/login");
        assert_eq!(frame.data.get("kind").and_then(Value::as_str), Some("client"));
    }

    #[test]
    fn test_missing_or_non_object_data_defaults_to_empty() {
        let frame = decode_frame(br#"{"key":"/iot/get_data"}"#).unwrap();
        assert!(frame.data.is_empty());

        let frame = decode_frame(br#"{"key":"/hello","data":"oops"}"#).unwrap();
        assert!(frame.data.is_empty());

        let frame = decode_frame(br#"{"key":"/hello","data":[1,2]}"#).unwrap();
        assert!(frame.data.is_empty());
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            violation(&[0xff, 0xfe, 0x00]),
            "Invalid message type, client must send binary encoded-string"
        );
    }

    #[test]
    fn test_empty_frame() {
        assert_eq!(violation(b""), "Empty message received");
    }

    #[test]
    fn test_invalid_json() {
        assert_eq!(violation(b"{not json"), "Invalid JSON format");
    }

    #[test]
    fn test_non_object() {
        assert_eq!(violation(b"[1,2,3]"), "Data must be a valid JSON-encoded object");
        assert_eq!(violation(b"null"), "Data must be a valid JSON-encoded object");
    }

    #[test]
    fn test_missing_or_non_string_key() {
        let expected = "Data must contain a valid key (string) property";
        assert_eq!(violation(br#"{"data":{}}"#), expected);
        assert_eq!(violation(br#"{"key":42}"#), expected);
    }
}
