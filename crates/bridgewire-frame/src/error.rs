/// Errors that can occur during part encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The part header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x4257 \"BW\")")]
    InvalidMagic,

    /// The part header sets flag bits this version does not understand.
    #[error("unknown frame flags {0:#06x}")]
    UnknownFlags(u16),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A unit must contain at least one part.
    #[error("cannot send an empty unit")]
    EmptyUnit,

    /// An I/O error occurred while reading or writing parts.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete part was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The connection was closed after some parts of a unit had arrived.
    #[error("connection closed mid-unit after {parts} part(s)")]
    TruncatedUnit { parts: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
