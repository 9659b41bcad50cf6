/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Frame 0 is not valid JSON text (or the structure failed to serialize).
    #[error("malformed message text: {0}")]
    Json(#[from] serde_json::Error),

    /// A genuine string value reads like a placeholder and would be mistaken for one.
    #[error("string value {value:?} collides with the placeholder grammar")]
    ReservedString { value: String },

    /// Continuation frames must come in tag/payload pairs.
    #[error("odd number of continuation frames ({continuation}), expected tag/payload pairs")]
    OddContinuation { continuation: usize },

    /// A tag frame is not exactly four bytes long.
    #[error("tag frame must be 4 bytes, got {len}")]
    InvalidTagFrame { len: usize },

    /// A received tag has no matching placeholder in the structure.
    #[error("no placeholder for binary tag {0}")]
    UnmatchedTag(u32),

    /// A unit arrived with no frames at all.
    #[error("message unit has no frames")]
    EmptyUnit,

    /// The message holds more blobs than a 32-bit tag can number.
    #[error("message holds more binary values than a 32-bit tag can number")]
    TooManyBlobs,

    /// A binary value was found where plain JSON is required.
    #[error("binary value cannot be represented as JSON")]
    BinaryInStructure,
}

pub type Result<T> = std::result::Result<T, MessageError>;
