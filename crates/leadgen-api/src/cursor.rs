// crates/leadgen-api/src/cursor.rs
// ============================================================================
// Module: Result Cursors
// Description: Opaque pagination tokens for the results listing endpoints.
// Purpose: Base64-encode the store's "after" key so clients never see or
// depend on the underlying offset/domain-name representation.
// Dependencies: base64
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Encodes a raw "after" key as an opaque cursor string.
#[must_use]
pub fn encode(raw: &str) -> String {
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a cursor produced by [`encode`] back into its raw key.
///
/// # Errors
///
/// Returns an error string when `cursor` is not valid base64 or UTF-8.
pub fn decode(cursor: &str) -> Result<String, String> {
    let bytes = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| "cursor is not valid base64".to_string())?;
    String::from_utf8(bytes).map_err(|_| "cursor is not valid utf-8".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_strings() {
        let raw = "example.com";
        assert_eq!(decode(&encode(raw)).expect("decode"), raw);
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(decode("not base64 at all!!").is_err());
    }
}
