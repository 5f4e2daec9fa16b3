//! Base64 handling for content API payloads.

use base64::engine::general_purpose::STANDARD;
use base64::{DecodeError, Engine};

/// Whether `content` is already standard, padded base64 text.
///
/// Binary payloads (images) are commonly handed over pre-encoded; detecting
/// them here keeps them from being encoded a second time. JSON documents
/// never qualify since they start with `[` or `{`.
pub fn is_base64(content: &[u8]) -> bool {
    if content.is_empty() || content.len() % 4 != 0 {
        return false;
    }
    let body_end = content
        .iter()
        .rposition(|&b| b != b'=')
        .map_or(0, |i| i + 1);
    if content.len() - body_end > 2 {
        return false;
    }
    let alphabet_ok = content[..body_end]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
    alphabet_ok && STANDARD.decode(content).is_ok()
}

/// Encode `content` for the wire unless it is already base64.
pub fn encode_content(content: &[u8]) -> String {
    if is_base64(content) {
        // is_base64 only accepts ASCII.
        String::from_utf8_lossy(content).into_owned()
    } else {
        STANDARD.encode(content)
    }
}

/// Decode wire content, ignoring the line breaks the API inserts.
pub fn decode_content(wire: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = wire.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}
