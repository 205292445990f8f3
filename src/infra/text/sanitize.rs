//! The one place where extracted text is repaired.
//!
//! Contract: invalid bytes are dropped, not substituted. Replacement characters left by
//! upstream decoders, control characters other than line breaks and tabs, and byte-order
//! marks are removed as well. Both functions are idempotent.

const BYTE_ORDER_MARK: char = '\u{FEFF}';

pub fn sanitize_bytes(bytes: &[u8]) -> String {
    let mut decoded = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        decoded.push_str(chunk.valid());
    }
    sanitize_text(&decoded)
}

pub fn sanitize_text(text: &str) -> String {
    text.chars().filter(|ch| is_kept(*ch)).collect()
}

fn is_kept(ch: char) -> bool {
    match ch {
        '\n' | '\r' | '\t' => true,
        char::REPLACEMENT_CHARACTER | BYTE_ORDER_MARK => false,
        ch => !ch.is_control(),
    }
}
