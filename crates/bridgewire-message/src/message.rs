use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Number, Value};

use crate::error::MessageError;

/// A JSON value that may also carry raw binary leaves.
///
/// Object keys iterate in sorted order. That order is the traversal order
/// used when numbering extracted blobs, and the key order of the JSON text.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Message {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Message>),
    Object(BTreeMap<String, Message>),
    /// Opaque bytes; never valid in JSON text.
    Binary(Bytes),
}

impl Message {
    /// An empty object.
    pub fn empty_object() -> Self {
        Message::Object(BTreeMap::new())
    }

    /// Build an object from key/value pairs.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Message>,
    {
        Message::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Build an array from values.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Message>,
    {
        Message::Array(items.into_iter().map(Into::into).collect())
    }

    /// Wrap bytes as a binary leaf.
    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Message::Binary(bytes.into())
    }

    /// Look up a key of an object. `None` for other kinds.
    pub fn get(&self, key: &str) -> Option<&Message> {
        match self {
            Message::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Mutable lookup of a key of an object.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Message> {
        match self {
            Message::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    /// Insert into an object, returning the previous value. `None` (and no
    /// insert) if this is not an object.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Message>) -> Option<Message> {
        match self {
            Message::Object(map) => map.insert(key.into(), value.into()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Message::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Message::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Message]> {
        match self {
            Message::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Message>> {
        match self {
            Message::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Message::Binary(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Message::Null)
    }

    /// Number of binary leaves anywhere in the tree.
    pub fn binary_count(&self) -> usize {
        match self {
            Message::Binary(_) => 1,
            Message::Array(items) => items.iter().map(Message::binary_count).sum(),
            Message::Object(map) => map.values().map(Message::binary_count).sum(),
            _ => 0,
        }
    }

    /// Total bytes held by binary leaves anywhere in the tree.
    pub fn binary_len(&self) -> usize {
        match self {
            Message::Binary(bytes) => bytes.len(),
            Message::Array(items) => items.iter().map(Message::binary_len).sum(),
            Message::Object(map) => map.values().map(Message::binary_len).sum(),
            _ => 0,
        }
    }

    /// Short name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Null => "null",
            Message::Bool(_) => "bool",
            Message::Number(_) => "number",
            Message::String(_) => "string",
            Message::Array(_) => "array",
            Message::Object(_) => "object",
            Message::Binary(_) => "binary",
        }
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Message::Null,
            Value::Bool(b) => Message::Bool(b),
            Value::Number(n) => Message::Number(n),
            Value::String(s) => Message::String(s),
            Value::Array(items) => Message::Array(items.into_iter().map(Message::from).collect()),
            Value::Object(map) => Message::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Message::from(value)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<Message> for Value {
    type Error = MessageError;

    /// Convert a blob-free message to plain JSON.
    fn try_from(message: Message) -> Result<Self, Self::Error> {
        Ok(match message {
            Message::Null => Value::Null,
            Message::Bool(b) => Value::Bool(b),
            Message::Number(n) => Value::Number(n),
            Message::String(s) => Value::String(s),
            Message::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Message::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| Ok((key, Value::try_from(value)?)))
                    .collect::<Result<_, MessageError>>()?,
            ),
            Message::Binary(_) => return Err(MessageError::BinaryInStructure),
        })
    }
}

impl From<bool> for Message {
    fn from(value: bool) -> Self {
        Message::Bool(value)
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message::String(value.to_string())
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Message::String(value)
    }
}

impl From<i64> for Message {
    fn from(value: i64) -> Self {
        Message::Number(value.into())
    }
}

impl From<u64> for Message {
    fn from(value: u64) -> Self {
        Message::Number(value.into())
    }
}

impl From<i32> for Message {
    fn from(value: i32) -> Self {
        Message::Number(value.into())
    }
}

impl From<u32> for Message {
    fn from(value: u32) -> Self {
        Message::Number(value.into())
    }
}

/// Non-finite floats have no JSON form and become `Null`.
impl From<f64> for Message {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Message::Null, Message::Number)
    }
}

impl From<Bytes> for Message {
    fn from(value: Bytes) -> Self {
        Message::Binary(value)
    }
}

impl From<Vec<u8>> for Message {
    fn from(value: Vec<u8>) -> Self {
        Message::Binary(Bytes::from(value))
    }
}

impl From<Vec<Message>> for Message {
    fn from(value: Vec<Message>) -> Self {
        Message::Array(value)
    }
}

impl From<BTreeMap<String, Message>> for Message {
    fn from(value: BTreeMap<String, Message>) -> Self {
        Message::Object(value)
    }
}

impl<K: Into<String>, V: Into<Message>> FromIterator<(K, V)> for Message {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Message::object(iter)
    }
}
