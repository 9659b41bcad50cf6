use std::io::{ErrorKind, Write};

use bridgewire_transport::IpcStream;
use tracing::trace;

use crate::codec::{FrameConfig, Part, HEADER_SIZE, MAGIC};
use crate::error::{FrameError, Result};
use crate::flags;
use crate::reader::transport_to_frame_error;

/// Writes complete parts and units to any `Write` stream.
///
/// Payloads are written straight from the caller's buffer after their
/// header, so large blobs are never copied into an intermediate buffer.
pub struct PartWriter<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Write> PartWriter<T> {
    /// Create a new part writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new part writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Write a complete part (blocking).
    pub fn write_part(&mut self, part: &Part) -> Result<()> {
        self.send_part(part.more, part.payload.as_ref())
    }

    /// Encode and send one part, then flush.
    pub fn send_part(&mut self, more: bool, payload: &[u8]) -> Result<()> {
        self.check_size(payload)?;
        self.put_part(more, payload)?;
        self.flush()
    }

    /// Send every part of a unit, setting MORE on all but the last, then flush.
    ///
    /// All sizes are validated before the first byte is written, so an
    /// oversized part never leaves a half-written unit on the stream.
    pub fn send_unit<P: AsRef<[u8]>>(&mut self, parts: &[P]) -> Result<()> {
        if parts.is_empty() {
            return Err(FrameError::EmptyUnit);
        }
        for part in parts {
            self.check_size(part.as_ref())?;
        }

        let last = parts.len() - 1;
        for (index, part) in parts.iter().enumerate() {
            self.put_part(index < last, part.as_ref())?;
        }
        trace!(parts = parts.len(), "unit sent");
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if self.should_retry(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn check_size(&self, payload: &[u8]) -> Result<()> {
        let max = self.config.max_payload_size.min(u32::MAX as usize);
        if payload.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }
        Ok(())
    }

    fn put_part(&mut self, more: bool, payload: &[u8]) -> Result<()> {
        let mut header = [0u8; HEADER_SIZE];
        header[..2].copy_from_slice(&MAGIC);
        header[2..6].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        header[6..].copy_from_slice(&flags::for_part(more).to_le_bytes());

        self.write_all(&header)?;
        self.write_all(payload)
    }

    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.inner.write(buf) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => buf = &buf[n..],
                Err(err) if self.should_retry(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    // With a write timeout set, WouldBlock is the expired timeout.
    fn should_retry(&self, err: &std::io::Error) -> bool {
        match err.kind() {
            ErrorKind::Interrupted => true,
            ErrorKind::WouldBlock => self.config.write_timeout.is_none(),
            _ => false,
        }
    }
}

impl PartWriter<IpcStream> {
    /// Create a part writer for `IpcStream` and apply write timeout from config.
    pub fn with_config_ipc(inner: IpcStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::{Bytes, BytesMut};

    use super::*;
    use crate::codec::decode_part;

    fn written(writer: PartWriter<Cursor<Vec<u8>>>) -> BytesMut {
        BytesMut::from(writer.into_inner().into_inner().as_slice())
    }

    #[test]
    fn write_single_part() {
        let mut writer = PartWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send_part(false, b"hello").unwrap();

        let mut wire = written(writer);
        let part = decode_part(&mut wire, usize::MAX).unwrap().unwrap();
        assert!(!part.more);
        assert_eq!(part.payload.as_ref(), b"hello");
        assert!(wire.is_empty());
    }

    #[test]
    fn unit_sets_more_on_all_but_last() {
        let mut writer = PartWriter::new(Cursor::new(Vec::<u8>::new()));

        writer
            .send_unit(&[
                Bytes::from_static(b"{\"a\":\"@0\",\"b\":\"@1\"}"),
                Bytes::from_static(&[0, 0, 0, 0]),
                Bytes::from_static(b"blob-a"),
                Bytes::from_static(&[1, 0, 0, 0]),
                Bytes::from_static(b"blob-b"),
            ])
            .unwrap();

        let mut wire = written(writer);
        let mut flags = Vec::new();
        while let Some(part) = decode_part(&mut wire, usize::MAX).unwrap() {
            flags.push(part.more);
        }
        assert_eq!(flags, vec![true, true, true, true, false]);
    }

    #[test]
    fn single_part_unit_has_no_more_flag() {
        let mut writer = PartWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_unit(&[b"{}".as_slice()]).unwrap();

        let mut wire = written(writer);
        let part = decode_part(&mut wire, usize::MAX).unwrap().unwrap();
        assert!(!part.more);
        assert_eq!(part.payload.as_ref(), b"{}");
    }

    #[test]
    fn empty_unit_rejected() {
        let mut writer = PartWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer.send_unit::<Bytes>(&[]).unwrap_err();
        assert!(matches!(err, FrameError::EmptyUnit));
    }

    #[test]
    fn oversized_part_rejected_before_any_write() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = PartWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer
            .send_unit(&[b"ok".as_slice(), b"oversized".as_slice()])
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));
        assert!(written(writer).is_empty());
    }

    #[test]
    fn write_part_method() {
        let mut writer = PartWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_part(&Part::new(true, "abc")).unwrap();

        let mut wire = written(writer);
        let decoded = decode_part(&mut wire, usize::MAX).unwrap().unwrap();
        assert!(decoded.more);
        assert_eq!(decoded.payload.as_ref(), b"abc");
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = PartWriter::new(sink);

        writer.send_unit(&[b"x".as_slice()]).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedOnce {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = PartWriter::new(writer_impl);
        writer.send_part(false, b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), HEADER_SIZE + 5);
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = PartWriter::new(ZeroWriter);
        let err = writer.send_part(false, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn written_bytes_decode_as_unit() {
        let mut writer = PartWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_unit(&[b"z".as_slice(), b"y".as_slice()]).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut framed = crate::reader::PartReader::new(Cursor::new(wire));
        let unit = framed.read_unit().unwrap();
        assert_eq!(unit, vec![Bytes::from_static(b"z"), Bytes::from_static(b"y")]);
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedOnce {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    #[test]
    fn would_block_retries_without_write_timeout() {
        let mut writer = PartWriter::new(StalledSink { stalls: 3, data: Vec::new() });
        writer.send_part(false, b"late").unwrap();
        assert_eq!(writer.into_inner().data.len(), HEADER_SIZE + 4);
    }

    #[test]
    fn would_block_is_timeout_when_write_timeout_set() {
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let sink = StalledSink {
            stalls: usize::MAX,
            data: Vec::new(),
        };
        let mut writer = PartWriter::with_config(sink, cfg);

        let err = writer.send_unit(&[b"{}".as_slice()]).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    /// Reports `WouldBlock` for the first `stalls` writes.
    struct StalledSink {
        stalls: usize,
        data: Vec<u8>,
    }

    impl Write for StalledSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.stalls > 0 {
                self.stalls -= 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
