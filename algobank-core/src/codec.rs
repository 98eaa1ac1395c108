//! Reversible transport encoding applied to submitted code payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::CoreError;

/// Text ↔ transport encoding.
pub trait TransportCodec: Send + Sync {
    /// Encodes plain text for transport.
    fn encode(&self, text: &str) -> String;

    /// Decodes a transport payload back into UTF-8 text.
    ///
    /// # Errors
    /// Returns [`CoreError::Decode`] if the payload is malformed or not UTF-8.
    fn decode(&self, payload: &str) -> Result<String, CoreError>;
}

/// Standard-alphabet, padded base64.
///
/// Whitespace inside the payload (line-wrapped base64) is ignored on decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl TransportCodec for Base64Codec {
    fn encode(&self, text: &str) -> String {
        STANDARD.encode(text.as_bytes())
    }

    fn decode(&self, payload: &str) -> Result<String, CoreError> {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| CoreError::Decode { reason: e.to_string() })?;
        String::from_utf8(bytes).map_err(|e| CoreError::Decode { reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_line_wrapped_payload() {
        let codec = Base64Codec;
        let encoded = codec.encode("import opalalgorithms\n");
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!("{head}\n{tail}\n");
        match codec.decode(&wrapped) {
            Ok(text) => assert_eq!(text, "import opalalgorithms\n"),
            Err(e) => panic!("wrapped payload must decode: {e}"),
        }
    }

    #[test]
    fn decode_rejects_non_base64() {
        let result = Base64Codec.decode("not base64!!");
        assert!(
            matches!(result, Err(CoreError::Decode { .. })),
            "garbage payload must be a decode error"
        );
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let payload = STANDARD.encode([0xff_u8, 0xfe, 0xfd]);
        assert!(
            matches!(Base64Codec.decode(&payload), Err(CoreError::Decode { .. })),
            "non UTF-8 bytes must be a decode error"
        );
    }
}
