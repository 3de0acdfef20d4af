//! Header and body encodings used when serializing a message.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Maximum length of an encoded body line (RFC 2045 section 6.8).
pub const BASE64_LINE_LENGTH: usize = 76;

/// Encodes `text` as an RFC 2047 encoded-word using the `B` encoding.
///
/// The text is always encoded, even when it is plain ASCII.
#[must_use]
pub fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

/// Encodes `data` as base64, breaking the output into CRLF separated lines of
/// at most [`BASE64_LINE_LENGTH`] characters.
///
/// No line terminator follows the final line.
#[must_use]
pub fn base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2);

    // base64 output is pure ASCII, so slicing on byte offsets is safe
    let mut rest = encoded.as_str();
    while rest.len() > BASE64_LINE_LENGTH {
        let (line, tail) = rest.split_at(BASE64_LINE_LENGTH);
        wrapped.push_str(line);
        wrapped.push_str("\r\n");
        rest = tail;
    }
    wrapped.push_str(rest);

    wrapped
}

/// Returns `true` if `name` can be written as an RFC 5322 quoted-string
/// without resorting to an encoded-word.
#[must_use]
pub fn is_printable_ascii(name: &str) -> bool {
    name.bytes().all(|b| b == b' ' || b == b'\t' || b.is_ascii_graphic())
}

/// Wraps `text` in double quotes, escaping `"` and `\`.
#[must_use]
pub fn quoted_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
