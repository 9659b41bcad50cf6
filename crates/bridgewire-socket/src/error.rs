use crate::pattern::SocketPattern;

/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] bridgewire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] bridgewire_frame::FrameError),

    /// Message encoding or decoding error.
    #[error("message error: {0}")]
    Message(#[from] bridgewire_message::MessageError),

    /// The peer closed the connection at a unit boundary.
    #[error("peer disconnected")]
    Disconnected,

    /// The pattern was used with the wrong constructor.
    #[error("{pattern} sockets must {}", .pattern.role().verb())]
    WrongRole { pattern: SocketPattern },

    /// The call breaks the pattern's send/receive alternation.
    #[error("{pattern} socket cannot {operation} now")]
    InvalidState {
        pattern: SocketPattern,
        operation: &'static str,
    },

    /// The pattern does not support this direction at all.
    #[error("{pattern} socket does not support {operation}")]
    Unsupported {
        pattern: SocketPattern,
        operation: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, SocketError>;
