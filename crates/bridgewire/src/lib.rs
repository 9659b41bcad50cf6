//! JSON messages with raw binary attachments, carried over multipart
//! loopback sockets.
//!
//! A [`Message`] is a JSON tree whose leaves may also be byte blobs. Sending
//! one pulls the blobs out, leaves `@<tag>` placeholders in a Latin-1 JSON
//! text frame, and ships each blob as a (tag, payload) frame pair after it.
//! The receiver parses the text and puts every blob back in place.
//!
//! # Crate Structure
//!
//! - [`transport`]: loopback TCP sockets and the port registry
//! - [`frame`]: multipart framing with a MORE flag per part
//! - [`message`]: the message model and its frame codec
//! - [`socket`]: pattern-typed endpoints (reply/request, push/pull, publish/subscribe)

/// Re-export transport types.
pub mod transport {
    pub use bridgewire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use bridgewire_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use bridgewire_message::*;
}

/// Re-export socket types.
pub mod socket {
    pub use bridgewire_socket::*;
}

pub use bridgewire_message::{Message, MessageCodec};
pub use bridgewire_socket::{EndpointConfig, SocketEndpoint, SocketPattern};
pub use bridgewire_transport::PortRegistry;
