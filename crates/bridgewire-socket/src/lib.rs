//! Socket endpoints for bridgewire messages.
//!
//! An endpoint owns one socket and, when it binds, one port claimed from a
//! [`PortRegistry`](bridgewire_transport::PortRegistry). The messaging
//! pattern chosen at construction decides whether it binds or connects and
//! which directions it may use.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod pattern;

pub use config::EndpointConfig;
pub use endpoint::SocketEndpoint;
pub use error::{Result, SocketError};
pub use pattern::{Role, SocketPattern};
