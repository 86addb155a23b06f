//! Binary request/response body wrapper.
//!
//! # Design Decisions
//! - Bodies are raw bytes internally and base64 across the wire boundary
//! - An empty byte sequence normalizes to "no body"
//! - `inputTruncated` is always false: this emulator never truncates

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Request body as it appears in the event wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WireBody {
    pub input_truncated: bool,
    pub action: String,
    pub encoding: String,
    pub data: String,
}

/// An in-memory body. Never empty; construction normalizes empty to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeBody {
    bytes: Vec<u8>,
}

impl EdgeBody {
    /// Wrap raw bytes, normalizing an empty sequence to absent.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self { bytes })
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_wire(&self) -> WireBody {
        WireBody {
            input_truncated: false,
            action: "read-only".to_string(),
            encoding: "base64".to_string(),
            data: BASE64.encode(&self.bytes),
        }
    }

    /// Decode a wire body. Data with `encoding = "base64"` is decoded;
    /// anything else is taken as literal text, matching the platform.
    pub fn from_wire(wire: &WireBody) -> Result<Option<Self>, base64::DecodeError> {
        let bytes = if wire.encoding == "base64" {
            BASE64.decode(&wire.data)?
        } else {
            wire.data.as_bytes().to_vec()
        };
        Ok(Self::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes_normalize_to_absent() {
        assert!(EdgeBody::from_bytes(Vec::new()).is_none());
    }

    #[test]
    fn test_binary_body_survives_wire_round_trip() {
        let payload: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
        let body = EdgeBody::from_bytes(payload.clone()).unwrap();

        let wire = body.to_wire();
        assert!(!wire.input_truncated);
        assert_eq!(wire.encoding, "base64");

        let back = EdgeBody::from_wire(&wire).unwrap().unwrap();
        assert_eq!(back.as_bytes(), payload.as_slice());
    }

    #[test]
    fn test_text_encoding_taken_literally() {
        let wire = WireBody {
            input_truncated: false,
            action: "read-only".to_string(),
            encoding: "text".to_string(),
            data: "hello".to_string(),
        };
        let body = EdgeBody::from_wire(&wire).unwrap().unwrap();
        assert_eq!(body.as_bytes(), b"hello");
    }
}
