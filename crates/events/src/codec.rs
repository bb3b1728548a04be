//! Conversion between the wire event representation and [`StockEvent`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{LABEL_PUT, LABEL_TAKE, StockEvent};

/// Event as carried by the log: an operation label plus a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub label: String,
    pub payload: String,
}

#[derive(Debug, Error)]
pub enum CodecError {
    /// The wire label names no known operation.
    #[error("unknown event kind: {label:?}")]
    UnknownEventKind { label: String },

    /// The payload is not the expected `{object, quantity}` document.
    #[error("event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Payload shared by both operations: `{"object": ..., "quantity": ...}`.
#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    object: String,
    quantity: i64,
}

/// Decode a wire event into its typed form.
pub fn decode(raw: &RawEvent) -> Result<StockEvent, CodecError> {
    match raw.label.as_str() {
        LABEL_PUT => {
            let p: Payload = serde_json::from_str(&raw.payload)?;
            Ok(StockEvent::Put {
                object: p.object,
                quantity: p.quantity,
            })
        }
        LABEL_TAKE => {
            let p: Payload = serde_json::from_str(&raw.payload)?;
            Ok(StockEvent::Take {
                object: p.object,
                quantity: p.quantity,
            })
        }
        _ => Err(CodecError::UnknownEventKind {
            label: raw.label.clone(),
        }),
    }
}

/// Encode a typed event for the wire.
pub fn encode(event: &StockEvent) -> Result<RawEvent, CodecError> {
    let payload = serde_json::to_string(&Payload {
        object: event.object().to_string(),
        quantity: event.quantity(),
    })?;
    Ok(RawEvent {
        label: event.label().to_string(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, payload: &str) -> RawEvent {
        RawEvent {
            label: label.to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn decodes_put() {
        let event = decode(&raw("put", r#"{"object":"apple","quantity":5}"#)).unwrap();
        assert_eq!(event, StockEvent::put("apple", 5));
    }

    #[test]
    fn decodes_take() {
        let event = decode(&raw("take", r#"{"object":"apple","quantity":2}"#)).unwrap();
        assert_eq!(event, StockEvent::take("apple", 2));
    }

    #[test]
    fn rejects_unknown_label() {
        let err = decode(&raw("delete", r#"{"object":"apple","quantity":1}"#)).unwrap_err();
        match err {
            CodecError::UnknownEventKind { label } => assert_eq!(label, "delete"),
            other => panic!("expected UnknownEventKind, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_payload() {
        let err = decode(&raw("put", "not json")).unwrap_err();
        assert!(matches!(err, CodecError::Payload(_)));
    }

    #[test]
    fn encode_produces_label_and_payload() {
        let encoded = encode(&StockEvent::take("pear", 3)).unwrap();
        assert_eq!(encoded.label, "take");
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, StockEvent::take("pear", 3));
    }
}
