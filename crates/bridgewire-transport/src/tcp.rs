use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// Loopback TCP listener.
///
/// Provides bind/accept/connect for endpoints addressed by port number.
/// The listener is closed when the value is dropped.
pub struct TcpSocket {
    listener: TcpListener,
    addr: SocketAddr,
    nonblocking: bool,
}

impl TcpSocket {
    /// Bind and listen on `addr`.
    ///
    /// Binding port 0 lets the OS choose; [`TcpSocket::local_addr`] reports
    /// the resolved address.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%addr, "listening on tcp socket");

        Ok(Self {
            listener,
            addr,
            nonblocking: false,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&mut self) -> Result<IpcStream> {
        self.set_nonblocking(false)?;
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        IpcStream::from_tcp(stream)
    }

    /// Accept a pending connection without blocking.
    ///
    /// Returns `Ok(None)` when no connection is waiting in the backlog.
    pub fn try_accept(&mut self) -> Result<Option<IpcStream>> {
        self.set_nonblocking(true)?;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    // BSD-derived systems hand back sockets that inherit O_NONBLOCK.
                    stream.set_nonblocking(false)?;
                    debug!(%peer, "accepted pending connection");
                    return IpcStream::from_tcp(stream).map(Some);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
    }

    /// Connect to a listening socket (blocking).
    pub fn connect(addr: SocketAddr) -> Result<IpcStream> {
        let stream =
            TcpStream::connect(addr).map_err(|source| TransportError::Connect { addr, source })?;
        debug!(%addr, "connected to tcp socket");
        IpcStream::from_tcp(stream)
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        if self.nonblocking != nonblocking {
            self.listener.set_nonblocking(nonblocking)?;
            self.nonblocking = nonblocking;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TcpSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSocket").field("addr", &self.addr).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback_any() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[test]
    fn test_bind_accept_connect() {
        let mut listener = TcpSocket::bind(loopback_any()).unwrap();
        let addr = listener.local_addr();
        assert_ne!(addr.port(), 0);

        let handle = std::thread::spawn(move || {
            let mut client = TcpSocket::connect(addr).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_try_accept_empty_backlog() {
        let mut listener = TcpSocket::bind(loopback_any()).unwrap();
        assert!(listener.try_accept().unwrap().is_none());
    }

    #[test]
    fn test_try_accept_then_blocking_read() {
        let mut listener = TcpSocket::bind(loopback_any()).unwrap();
        let addr = listener.local_addr();

        let mut client = TcpSocket::connect(addr).unwrap();
        let mut server = listener
            .try_accept()
            .unwrap()
            .expect("connect returned, so the connection is in the backlog");

        client.write_all(b"ok").unwrap();
        let mut buf = [0u8; 2];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");

        // Switching back to blocking accept must still work.
        let handle = std::thread::spawn(move || TcpSocket::connect(addr).unwrap());
        let _second = listener.accept().unwrap();
        let _client2 = handle.join().unwrap();
    }

    #[test]
    fn test_bind_conflict_reports_address() {
        let first = TcpSocket::bind(loopback_any()).unwrap();
        let taken = first.local_addr();

        let result = TcpSocket::bind(taken);
        match result {
            Err(TransportError::Bind { addr, .. }) => assert_eq!(addr, taken),
            other => panic!("expected bind error, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_refused() {
        let addr = {
            let listener = TcpSocket::bind(loopback_any()).unwrap();
            listener.local_addr()
        };
        let result = TcpSocket::connect(addr);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
