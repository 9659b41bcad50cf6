use bytes::Bytes;
use tracing::trace;

use crate::error::{MessageError, Result};
use crate::message::Message;
use crate::placeholder::parse_placeholder;

/// Puts received blobs back where their placeholders sit.
///
/// The search walks the tree in the same depth-first order the extractor
/// numbers blobs in, and replaces the first string equal to `@<tag>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryReinserter;

impl BinaryReinserter {
    pub fn new() -> Self {
        Self
    }

    /// Replace the first placeholder for `tag` with `blob`.
    ///
    /// Fails with [`MessageError::UnmatchedTag`] if no string in the tree is
    /// that placeholder. Each call replaces at most one node.
    pub fn reinsert(&self, message: &mut Message, tag: u32, blob: Bytes) -> Result<()> {
        let slot = find_placeholder(message, tag).ok_or(MessageError::UnmatchedTag(tag))?;
        trace!(tag, len = blob.len(), "blob reinserted");
        *slot = Message::Binary(blob);
        Ok(())
    }
}

fn find_placeholder(node: &mut Message, tag: u32) -> Option<&mut Message> {
    if matches!(&*node, Message::String(s) if parse_placeholder(s) == Some(tag)) {
        return Some(node);
    }
    match node {
        Message::Array(items) => items.iter_mut().find_map(|item| find_placeholder(item, tag)),
        Message::Object(map) => map.values_mut().find_map(|value| find_placeholder(value, tag)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn blob(bytes: &'static [u8]) -> Bytes {
        Bytes::from_static(bytes)
    }

    #[test]
    fn replaces_placeholder_in_object() {
        let mut message = Message::from(json!({"pix": "@0", "w": 32}));
        BinaryReinserter::new().reinsert(&mut message, 0, blob(b"px")).unwrap();

        assert_eq!(message.get("pix").and_then(Message::as_binary), Some(&blob(b"px")));
        assert_eq!(message.get("w"), Some(&Message::from(32i64)));
    }

    #[test]
    fn replaces_placeholder_in_nested_array() {
        let mut message = Message::from(json!({"frames": [{"d": "@0"}, {"d": "@1"}]}));
        let reinserter = BinaryReinserter::new();
        reinserter.reinsert(&mut message, 1, blob(b"second")).unwrap();
        reinserter.reinsert(&mut message, 0, blob(b"first")).unwrap();

        let frames = message.get("frames").and_then(Message::as_array).unwrap();
        assert_eq!(frames[0].get("d").and_then(Message::as_binary), Some(&blob(b"first")));
        assert_eq!(frames[1].get("d").and_then(Message::as_binary), Some(&blob(b"second")));
    }

    #[test]
    fn replaces_root_placeholder() {
        let mut message = Message::from(json!("@0"));
        BinaryReinserter::new().reinsert(&mut message, 0, blob(b"root")).unwrap();
        assert_eq!(message, Message::Binary(blob(b"root")));
    }

    #[test]
    fn unmatched_tag_is_error() {
        let mut message = Message::from(json!({"pix": "@0"}));
        let err = BinaryReinserter::new()
            .reinsert(&mut message, 3, blob(b"x"))
            .unwrap_err();
        assert!(matches!(err, MessageError::UnmatchedTag(3)));
        assert_eq!(message, Message::from(json!({"pix": "@0"})));
    }

    #[test]
    fn only_first_match_is_replaced() {
        let mut message = Message::from(json!(["@0", "@0"]));
        BinaryReinserter::new().reinsert(&mut message, 0, blob(b"b")).unwrap();

        let items = message.as_array().unwrap();
        assert!(items[0].is_binary());
        assert_eq!(items[1].as_str(), Some("@0"));
    }

    #[test]
    fn non_canonical_forms_are_skipped() {
        let mut message = Message::from(json!({"a": "@00", "b": "@0"}));
        BinaryReinserter::new().reinsert(&mut message, 0, blob(b"b")).unwrap();

        assert_eq!(message.get("a").and_then(Message::as_str), Some("@00"));
        assert!(message.get("b").unwrap().is_binary());
    }

    #[test]
    fn already_reinserted_blob_is_not_a_match() {
        let mut message = Message::from(json!({"a": "@0"}));
        let reinserter = BinaryReinserter::new();
        reinserter.reinsert(&mut message, 0, blob(b"@0")).unwrap();
        let err = reinserter.reinsert(&mut message, 0, blob(b"again")).unwrap_err();
        assert!(matches!(err, MessageError::UnmatchedTag(0)));
    }
}
