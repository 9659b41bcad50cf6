use bytes::Bytes;
use tracing::debug;

use crate::config::CodecConfig;
use crate::error::{MessageError, Result};
use crate::extract::{BinaryExtractor, Extracted};
use crate::latin1::{decode_text, encode_text};
use crate::message::Message;
use crate::reinsert::BinaryReinserter;

/// Length of a tag frame in bytes.
pub const TAG_FRAME_LEN: usize = 4;

/// Encode a tag as its frame: 4 bytes in the host's native byte order.
pub fn encode_tag(tag: u32) -> Bytes {
    Bytes::copy_from_slice(&tag.to_ne_bytes())
}

/// Decode a tag frame. Anything but exactly 4 bytes is rejected.
pub fn decode_tag(frame: &[u8]) -> Result<u32> {
    let bytes: [u8; TAG_FRAME_LEN] = frame
        .try_into()
        .map_err(|_| MessageError::InvalidTagFrame { len: frame.len() })?;
    Ok(u32::from_ne_bytes(bytes))
}

/// Converts messages to frame sequences and back.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    extractor: BinaryExtractor,
    reinserter: BinaryReinserter,
}

impl MessageCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            extractor: BinaryExtractor::new(config),
            reinserter: BinaryReinserter::new(),
        }
    }

    /// Encode a message into `1 + 2k` frames for `k` binary values.
    ///
    /// Blob frames share the message's buffers; only the text and tag
    /// frames are freshly allocated.
    pub fn encode(&self, message: &Message) -> Result<Vec<Bytes>> {
        let Extracted { structure, blobs } = self.extractor.extract(message)?;
        let text = encode_text(&structure)?;

        let mut frames = Vec::with_capacity(1 + 2 * blobs.len());
        frames.push(Bytes::from(text));
        for (tag, blob) in (0u32..).zip(blobs) {
            frames.push(encode_tag(tag));
            frames.push(blob);
        }
        debug!(frames = frames.len(), "message encoded");
        Ok(frames)
    }

    /// Decode a unit of frames back into a message.
    ///
    /// Frame 0 is parsed as the structure; the remaining frames are read as
    /// (tag, payload) pairs and reinserted in arrival order.
    pub fn decode<I>(&self, frames: I) -> Result<Message>
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mut frames = frames.into_iter();
        let text = frames.next().ok_or(MessageError::EmptyUnit)?;
        let continuation: Vec<Bytes> = frames.collect();
        if continuation.len() % 2 != 0 {
            return Err(MessageError::OddContinuation {
                continuation: continuation.len(),
            });
        }

        let mut message = Message::from(decode_text(&text)?);
        for pair in continuation.chunks_exact(2) {
            let tag = decode_tag(&pair[0])?;
            self.reinserter.reinsert(&mut message, tag, pair[1].clone())?;
        }
        debug!(blobs = continuation.len() / 2, "message decoded");
        Ok(message)
    }
}
