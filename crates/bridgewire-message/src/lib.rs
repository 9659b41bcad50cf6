//! Structured messages with binary leaves, and their multipart wire form.
//!
//! A [`Message`] is a JSON tree that may also hold raw byte blobs. Blobs
//! cannot live in JSON text, so encoding pulls each one out, leaves a
//! placeholder string `@<tag>` in its place, and ships the blob as its own
//! frame:
//!
//! ```text
//! frame 0      structure-only JSON, Latin-1 bytes
//! frame 2i+1   tag of blob i (4 bytes, native byte order)
//! frame 2i+2   raw bytes of blob i
//! ```
//!
//! Decoding parses frame 0 and puts every blob back where its placeholder is.
//! A message with `k` blobs always has `1 + 2k` frames.

pub mod codec;
pub mod config;
pub mod error;
pub mod extract;
pub mod latin1;
pub mod message;
pub mod placeholder;
pub mod reinsert;

pub use codec::{decode_tag, encode_tag, MessageCodec, TAG_FRAME_LEN};
pub use config::CodecConfig;
pub use error::{MessageError, Result};
pub use extract::{BinaryExtractor, Extracted};
pub use message::Message;
pub use placeholder::{format_placeholder, is_reserved, parse_placeholder, PLACEHOLDER_PREFIX};
pub use reinsert::BinaryReinserter;
