//! Loopback transport and port bookkeeping for bridgewire.
//!
//! Provides:
//! - [`IpcStream`], a connected blocking byte stream
//! - [`TcpSocket`], a bound listener that hands out [`IpcStream`]s
//! - [`PortRegistry`], the table of ports claimed by bound endpoints
//!
//! This is the lowest layer of bridgewire. Everything else builds on top of
//! the [`IpcStream`] type provided here.

pub mod error;
pub mod registry;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use registry::{PortOwner, PortRegistry, DEFAULT_BASE_PORT};
pub use tcp::TcpSocket;
pub use traits::IpcStream;
