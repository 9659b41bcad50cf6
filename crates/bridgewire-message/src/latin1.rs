//! JSON text in Latin-1 (ISO-8859-1).
//!
//! Frame 0 is Latin-1, not UTF-8: every code point up to U+00FF is one
//! byte. Anything above that has no Latin-1 byte and is written as a JSON
//! `\uXXXX` escape (a surrogate pair beyond the BMP), so the text stays
//! within the single-byte range and any JSON parser recovers the original
//! character.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;

use crate::error::Result;

/// Compact JSON formatter that emits Latin-1 bytes instead of UTF-8.
///
/// Only string contents differ from serde_json's compact output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1Formatter;

impl Formatter for Latin1Formatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        for ch in fragment.chars() {
            match u8::try_from(u32::from(ch)) {
                Ok(byte) => writer.write_all(&[byte])?,
                Err(_) => {
                    let mut units = [0u16; 2];
                    for unit in ch.encode_utf16(&mut units) {
                        write!(writer, "\\u{unit:04x}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Serialize `value` as compact Latin-1 JSON text.
pub fn encode_text(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, Latin1Formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Parse Latin-1 JSON text. Every byte maps to the code point of the same value.
pub fn decode_text(bytes: &[u8]) -> Result<Value> {
    let text: String = bytes.iter().copied().map(char::from).collect();
    Ok(serde_json::from_str(&text)?)
}
