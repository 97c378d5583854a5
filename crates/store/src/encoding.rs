//! Base64 transport encoding for file bodies
//!
//! The contents API carries every file body as base64 text inside JSON. Text
//! bodies are encoded from their UTF-8 bytes and decoded back into UTF-8, so
//! right-to-left scripts and emoji survive a write/read cycle unchanged.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::error::Result;

/// Encode UTF-8 text into transport base64.
pub fn encode_text(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

/// Encode raw bytes (images, video) into transport base64.
pub fn encode_bytes(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode transport base64 into raw bytes.
///
/// The provider wraps its base64 output at 60 columns, so embedded whitespace
/// is dropped before decoding.
pub fn decode_bytes(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64.decode(compact.as_bytes())?)
}

/// Decode transport base64 into text.
///
/// Decoded bytes are interpreted as UTF-8. Bodies that are not valid UTF-8
/// fall back to a single-byte decode where each byte maps to one character.
pub fn decode_text(encoded: &str) -> Result<String> {
    let bytes = decode_bytes(encoded)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => Ok(e.into_bytes().into_iter().map(char::from).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multibyte_round_trip() {
        let samples = [
            "plain ascii",
            "العلم نور",
            "emoji 🍰🎉 and accents é ñ ü",
            "mixed: Hello — مرحبا — 你好 — 👋🏽",
            "",
        ];
        for sample in samples {
            let encoded = encode_text(sample);
            assert_eq!(decode_text(&encoded).unwrap(), sample);
        }
    }

    #[test]
    fn test_encoding_is_over_utf8_bytes() {
        // "é" is two UTF-8 bytes (0xC3 0xA9)
        assert_eq!(encode_text("é"), "w6k=");
        assert_eq!(decode_text("w6k=").unwrap(), "é");
    }

    #[test]
    fn test_decode_ignores_line_wrapping() {
        let text = "It always seems impossible until it's done.";
        let encoded = encode_text(text);
        let (head, tail) = encoded.split_at(20);
        let wrapped = format!("{}\n{}\n", head, tail);
        assert_eq!(decode_text(&wrapped).unwrap(), text);
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_single_byte() {
        let encoded = encode_bytes(&[0x48, 0x69, 0xE9]);
        assert_eq!(decode_text(&encoded).unwrap(), "Hi\u{e9}");
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        assert!(decode_text("not base64!!").is_err());
        assert!(decode_bytes("%%%").is_err());
    }
}
