use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected bridge stream. Implements `Read` and `Write`.
///
/// This is the fundamental I/O type returned by transport operations.
/// Bridge endpoints live on loopback TCP, so this wraps a `TcpStream`
/// with Nagle's algorithm disabled (tag frames are four bytes long and
/// must not wait for an ACK before the payload that follows them).
pub struct IpcStream(TcpStream);

impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl IpcStream {
    /// Create an IpcStream from a TCP stream.
    pub(crate) fn from_tcp(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self(stream))
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        Ok(self.0.set_read_timeout(timeout)?)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        Ok(self.0.set_write_timeout(timeout)?)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        Self::from_tcp(self.0.try_clone()?)
    }

    /// Address of the remote side.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.0.peer_addr()?)
    }

    /// Address of the local side.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.0.local_addr()?)
    }
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcStream")
            .field("peer", &self.0.peer_addr().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use crate::TcpSocket;

    use super::*;

    #[test]
    fn connected_streams_report_both_ends_and_clone() {
        let mut listener =
            TcpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).unwrap();
        let addr = listener.local_addr();

        let client = TcpSocket::connect(addr).unwrap();
        let mut server = listener.accept().unwrap();

        assert_eq!(client.peer_addr().unwrap(), addr);
        assert_eq!(server.peer_addr().unwrap(), client.local_addr().unwrap());

        let mut writer = client.try_clone().unwrap();
        writer.write_all(b"via clone").unwrap();
        let mut buf = [0u8; 9];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"via clone");
    }
}
