//! Length-prefixed multipart framing for bridgewire.
//!
//! A byte stream has no message boundaries, so every wire frame ("part")
//! is prefixed with:
//! - A 2-byte magic number ("BW") for stream synchronization
//! - A 4-byte little-endian payload length
//! - A 2-byte little-endian flag word; [`MORE`] marks that another part of
//!   the same unit follows
//!
//! A message unit is the run of parts up to and including the first part
//! without [`MORE`]. Readers always hand back whole parts or whole units.

pub mod codec;
pub mod error;
pub mod flags;
pub mod reader;
pub mod writer;

pub use codec::{decode_part, encode_part, FrameConfig, Part, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use flags::{KNOWN_FLAGS, MORE};
pub use reader::PartReader;
pub use writer::PartWriter;
