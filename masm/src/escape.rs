//! Escape-sequence codec for string literals.
//!
//! Recognized escapes: `\\ \" \' \n \r \t \0 \? \a \b \f \v`. Anything
//! else, including a lone trailing backslash, is an error.

use crate::error::Error;
use crate::Result;

/// Decodes a literal's body (without the surrounding quotes) into the
/// bytes it denotes.
pub fn unescape(text: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut iter = text.bytes();

    while let Some(byte) = iter.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match iter.next() {
            None => return Err(Error::BadEscape("\\".to_string())),
            Some(code) => bytes.push(match code {
                b'\\' => b'\\',
                b'"' => b'"',
                b'\'' => b'\'',
                b'n' => b'\n',
                b'r' => b'\r',
                b't' => b'\t',
                b'0' => 0x00,
                b'?' => b'?',
                b'a' => 0x07,
                b'b' => 0x08,
                b'f' => 0x0c,
                b'v' => 0x0b,
                other => return Err(Error::BadEscape(format!("\\{}", other as char))),
            }),
        }
    }

    Ok(bytes)
}

/// Encodes bytes back into literal text. Bytes with a canonical escape
/// are escaped; everything else passes through verbatim.
pub fn escape(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'\\' => text.push_str("\\\\"),
            b'"' => text.push_str("\\\""),
            b'\n' => text.push_str("\\n"),
            b'\r' => text.push_str("\\r"),
            b'\t' => text.push_str("\\t"),
            0x00 => text.push_str("\\0"),
            0x07 => text.push_str("\\a"),
            0x08 => text.push_str("\\b"),
            0x0c => text.push_str("\\f"),
            0x0b => text.push_str("\\v"),
            _ => text.push(byte as char),
        }
    }
    text
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_every_escape() {
        assert_eq!(
            unescape(r#"\\\"\'\n\r\t\0\?\a\b\f\v"#).unwrap(),
            vec![b'\\', b'"', b'\'', b'\n', b'\r', b'\t', 0x00, b'?', 0x07, 0x08, 0x0c, 0x0b]
        );
    }

    #[test]
    fn passes_plain_text_through() {
        assert_eq!(unescape("hi there").unwrap(), b"hi there".to_vec());
    }

    #[test]
    fn rejects_unknown_escape() {
        assert_eq!(
            unescape(r"\x41"),
            Err(Error::BadEscape("\\x".to_string()))
        );
    }

    #[test]
    fn rejects_trailing_backslash() {
        assert_eq!(unescape("oops\\"), Err(Error::BadEscape("\\".to_string())));
    }

    #[test]
    fn round_trip_over_canonical_escapes() {
        for input in &["hi\\n", "a\\tb", "\\\"quoted\\\"", "\\\\", "end\\0", "\\a\\b\\f\\v"] {
            assert_eq!(escape(&unescape(input).unwrap()), *input);
        }
    }

    #[test]
    fn round_trip_from_bytes() {
        let bytes = b"line\none\ttwo\"\\\x00".to_vec();
        assert_eq!(unescape(&escape(&bytes)).unwrap(), bytes);
    }
}
