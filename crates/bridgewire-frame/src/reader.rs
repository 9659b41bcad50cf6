use std::io::{ErrorKind, Read};

use bridgewire_transport::IpcStream;
use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::codec::{decode_part, FrameConfig, Part};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete parts and units from any `Read` stream.
///
/// Partial reads are buffered internally; callers only see complete parts.
/// A unit interrupted by an I/O error (typically a read timeout) is kept
/// and resumed by the next [`read_unit`](Self::read_unit), so its tail is
/// never handed out as a unit of its own.
pub struct PartReader<T> {
    inner: T,
    buf: BytesMut,
    pending: Vec<Bytes>,
    config: FrameConfig,
}

impl<T: Read> PartReader<T> {
    /// Create a new part reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new part reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            pending: Vec::new(),
            config,
        }
    }

    /// Read the next complete part (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_part(&mut self) -> Result<Part> {
        loop {
            if let Some(part) = decode_part(&mut self.buf, self.config.max_payload_size)? {
                return Ok(part);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read every part of the next unit (blocking).
    ///
    /// Keeps reading while the previous part carried the MORE flag. EOF
    /// before the first part is `ConnectionClosed`; EOF after it is
    /// `TruncatedUnit`. Any other error leaves the parts read so far in
    /// place for the next call.
    pub fn read_unit(&mut self) -> Result<Vec<Bytes>> {
        loop {
            let part = match self.read_part() {
                Ok(part) => part,
                Err(FrameError::ConnectionClosed) if !self.pending.is_empty() => {
                    let parts = std::mem::take(&mut self.pending).len();
                    return Err(FrameError::TruncatedUnit { parts });
                }
                Err(err) => {
                    if !self.pending.is_empty() {
                        trace!(parts = self.pending.len(), error = %err, "unit interrupted");
                    }
                    return Err(err);
                }
            };
            self.pending.push(part.payload);
            if !part.more {
                let unit = std::mem::take(&mut self.pending);
                trace!(parts = unit.len(), "unit received");
                return Ok(unit);
            }
        }
    }

    /// Whether a unit has been started but not yet completed.
    pub fn in_unit(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl PartReader<IpcStream> {
    /// Create a part reader for `IpcStream` and apply read timeout from config.
    pub fn with_config_ipc(inner: IpcStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: bridgewire_transport::TransportError) -> FrameError {
    match err {
        bridgewire_transport::TransportError::Io(io)
        | bridgewire_transport::TransportError::Accept(io) => FrameError::Io(io),
        bridgewire_transport::TransportError::Bind { source, .. }
        | bridgewire_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
