use bytes::Bytes;
use serde_json::{Map, Value};

use crate::config::CodecConfig;
use crate::error::{MessageError, Result};
use crate::message::Message;
use crate::placeholder::{format_placeholder, is_reserved};

/// A message split into its JSON structure and its binary leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The message with every blob replaced by its placeholder.
    pub structure: Value,
    /// Extracted blobs; the blob at index `i` has tag `i`.
    pub blobs: Vec<Bytes>,
}

/// Pulls binary leaves out of a message.
///
/// Traversal is depth-first: children of an object (in key order) or array
/// (by index) are visited in turn, and a container child is fully walked
/// before its next sibling. Each blob met on the way gets the next tag,
/// starting from 0 for every call. The input is only borrowed; blobs are
/// reference-counted, so no payload bytes are copied.
#[derive(Debug, Clone, Default)]
pub struct BinaryExtractor {
    config: CodecConfig,
}

impl BinaryExtractor {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, message: &Message) -> Result<Extracted> {
        let mut blobs = Vec::new();
        let structure = self.visit(message, &mut blobs)?;
        Ok(Extracted { structure, blobs })
    }

    fn visit(&self, node: &Message, blobs: &mut Vec<Bytes>) -> Result<Value> {
        Ok(match node {
            Message::Binary(bytes) => {
                let tag = u32::try_from(blobs.len()).map_err(|_| MessageError::TooManyBlobs)?;
                blobs.push(bytes.clone());
                Value::String(format_placeholder(tag))
            }
            Message::Object(map) => {
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.visit(value, blobs)?);
                }
                Value::Object(out)
            }
            Message::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.visit(item, blobs))
                    .collect::<Result<_>>()?,
            ),
            Message::String(s) => {
                if self.config.reject_reserved_strings && is_reserved(s) {
                    return Err(MessageError::ReservedString { value: s.clone() });
                }
                Value::String(s.clone())
            }
            Message::Number(n) => Value::Number(n.clone()),
            Message::Bool(b) => Value::Bool(*b),
            Message::Null => Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn extract(message: &Message) -> Extracted {
        BinaryExtractor::default().extract(message).unwrap()
    }

    #[test]
    fn no_blobs_is_identity() {
        let value = json!({"cmd": "snap", "args": [1, 2.5, null, false]});
        let extracted = extract(&Message::from(value.clone()));
        assert_eq!(extracted.structure, value);
        assert!(extracted.blobs.is_empty());
    }

    #[test]
    fn top_level_blob_becomes_placeholder() {
        let message = Message::object([("pix", Message::binary(vec![7u8; 1024]))]);
        let extracted = extract(&message);
        assert_eq!(extracted.structure, json!({"pix": "@0"}));
        assert_eq!(extracted.blobs.len(), 1);
        assert_eq!(extracted.blobs[0].len(), 1024);
    }

    #[test]
    fn tags_follow_depth_first_order() {
        let message = Message::object([
            (
                "a",
                Message::object([
                    ("x", Message::binary(b"ax".to_vec())),
                    ("y", Message::array([Message::binary(b"ay0".to_vec()), Message::binary(b"ay1".to_vec())])),
                ]),
            ),
            ("b", Message::binary(b"b".to_vec())),
            ("c", Message::array([Message::from(1i64), Message::binary(b"c1".to_vec())])),
        ]);

        let extracted = extract(&message);
        assert_eq!(
            extracted.structure,
            json!({
                "a": {"x": "@0", "y": ["@1", "@2"]},
                "b": "@3",
                "c": [1, "@4"],
            })
        );
        let blobs: Vec<&[u8]> = extracted.blobs.iter().map(|b| b.as_ref()).collect();
        assert_eq!(blobs, vec![&b"ax"[..], b"ay0", b"ay1", b"b", b"c1"]);
    }

    #[test]
    fn identical_blobs_get_distinct_tags() {
        let message = Message::array((0..50).map(|_| Message::binary(vec![0u8; 64])));
        let extracted = extract(&message);

        let tags: Vec<_> = extracted
            .structure
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), 50);
        assert_eq!(tags[0], "@0");
        assert_eq!(tags[49], "@49");
    }

    #[test]
    fn root_blob_is_extracted() {
        let extracted = extract(&Message::binary(vec![1u8, 2]));
        assert_eq!(extracted.structure, json!("@0"));
        assert_eq!(extracted.blobs[0].as_ref(), &[1, 2]);
    }

    #[test]
    fn input_is_not_mutated() {
        let message = Message::object([("pix", Message::binary(vec![9u8; 3]))]);
        let before = message.clone();
        let _ = extract(&message);
        assert_eq!(message, before);
        assert!(message.get("pix").unwrap().is_binary());
    }

    #[test]
    fn tags_restart_per_call() {
        let extractor = BinaryExtractor::default();
        let message = Message::object([("p", Message::binary(vec![1u8]))]);
        let first = extractor.extract(&message).unwrap();
        let second = extractor.extract(&message).unwrap();
        assert_eq!(first.structure, json!({"p": "@0"}));
        assert_eq!(second.structure, json!({"p": "@0"}));
    }

    #[test]
    fn reserved_string_rejected_by_default() {
        let message = Message::object([("note", Message::from("@42"))]);
        let err = BinaryExtractor::default().extract(&message).unwrap_err();
        assert!(matches!(err, MessageError::ReservedString { ref value } if value == "@42"));
    }

    #[test]
    fn reserved_string_passes_when_allowed() {
        let extractor = BinaryExtractor::new(CodecConfig {
            reject_reserved_strings: false,
        });
        let message = Message::object([("note", Message::from("@42"))]);
        let extracted = extractor.extract(&message).unwrap();
        assert_eq!(extracted.structure, json!({"note": "@42"}));
    }

    #[test]
    fn lookalike_strings_are_ordinary() {
        let message = Message::object([
            ("email", Message::from("someone@example.com")),
            ("padded", Message::from("@007")),
            ("bare", Message::from("@")),
        ]);
        let extracted = extract(&message);
        assert_eq!(extracted.structure["padded"], json!("@007"));
        assert!(extracted.blobs.is_empty());
    }
}
