use std::net::SocketAddr;
use std::sync::Arc;

use bridgewire_frame::{FrameConfig, FrameError, PartReader, PartWriter};
use bridgewire_message::{Message, MessageCodec};
use bridgewire_transport::{IpcStream, PortOwner, PortRegistry, TcpSocket};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::EndpointConfig;
use crate::error::{Result, SocketError};
use crate::pattern::{Role, SocketPattern};

/// A socket bound or connected for one messaging pattern.
///
/// Bound endpoints (Reply, Push, Publish) claim a port from a
/// [`PortRegistry`] and listen on it; connected endpoints (Request, Pull,
/// Subscribe) dial a port some bound endpoint holds. Sends and receives
/// block until the whole unit is written or read. An endpoint is not
/// `Sync`; callers serialize access to it.
///
/// [`close`](Self::close) consumes the endpoint. Dropping it has the same
/// effect: the socket is closed first, then the port is returned to the
/// registry.
pub struct SocketEndpoint {
    pattern: SocketPattern,
    port: u16,
    local_addr: SocketAddr,
    frame_config: FrameConfig,
    codec: MessageCodec,
    turn: Turn,
    // Fields drop in declaration order: the socket closes before the claim
    // gives its port back.
    socket: Socket,
    claim: Option<PortClaim>,
}

impl SocketEndpoint {
    /// Claim the lowest free port from `registry` and bind `host:port`.
    ///
    /// If the bind fails the port is released before the error is returned.
    pub fn bind(
        pattern: SocketPattern,
        registry: &Arc<PortRegistry>,
        config: EndpointConfig,
    ) -> Result<Self> {
        if pattern.role() != Role::Bind {
            return Err(SocketError::WrongRole { pattern });
        }

        let port = registry.allocate(PortOwner::new(pattern.name()))?;
        let claim = PortClaim {
            registry: Arc::clone(registry),
            port,
        };
        let listener = TcpSocket::bind(SocketAddr::new(config.host, port))?;
        let local_addr = listener.local_addr();

        let socket = match pattern {
            SocketPattern::Publish => Socket::Publishing {
                listener,
                subscribers: Vec::new(),
            },
            _ => Socket::Listening {
                listener,
                peer: None,
            },
        };
        info!(%pattern, %local_addr, "endpoint bound");

        Ok(Self::assemble(pattern, port, local_addr, socket, Some(claim), &config))
    }

    /// Connect to the endpoint bound on `host:port`.
    ///
    /// Connected endpoints claim no registry port; [`port`](Self::port)
    /// reports the remote port. This departs from ZeroMQ-style bridges,
    /// where every socket claims a registry port whether it binds or
    /// connects.
    pub fn connect(pattern: SocketPattern, port: u16, config: EndpointConfig) -> Result<Self> {
        if pattern.role() != Role::Connect {
            return Err(SocketError::WrongRole { pattern });
        }

        let remote = SocketAddr::new(config.host, port);
        let stream = TcpSocket::connect(remote)?;
        let local_addr = stream.local_addr()?;
        let connection = Connection::open(stream, &config.frame_config())?;
        debug!(%pattern, %remote, "endpoint connected");

        Ok(Self::assemble(
            pattern,
            port,
            local_addr,
            Socket::Connected(Some(connection)),
            None,
            &config,
        ))
    }

    fn assemble(
        pattern: SocketPattern,
        port: u16,
        local_addr: SocketAddr,
        socket: Socket,
        claim: Option<PortClaim>,
        config: &EndpointConfig,
    ) -> Self {
        Self {
            pattern,
            port,
            local_addr,
            frame_config: config.frame_config(),
            codec: MessageCodec::new(config.codec),
            turn: match pattern {
                SocketPattern::Reply => Turn::Receive,
                _ => Turn::Send,
            },
            socket,
            claim,
        }
    }

    /// Port this endpoint is bound to, or the remote port it connected to.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pattern(&self) -> SocketPattern {
        self.pattern
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether this endpoint holds a registry port.
    pub fn owns_port(&self) -> bool {
        self.claim.is_some()
    }

    /// Send one unit; every frame but the last carries the MORE flag.
    pub fn send_frames(&mut self, frames: &[Bytes]) -> Result<()> {
        self.check(Turn::Send, "send")?;
        let result = self
            .socket
            .send_unit(self.pattern, frames, &self.frame_config);
        match result {
            Ok(()) => {
                self.advance();
                debug!(pattern = %self.pattern, frames = frames.len(), "unit sent");
                Ok(())
            }
            Err(err) => {
                // A reply that cannot be delivered is abandoned with its peer.
                if self.pattern == SocketPattern::Reply {
                    self.turn = Turn::Receive;
                }
                Err(err)
            }
        }
    }

    /// Receive the next complete unit.
    pub fn receive_frames(&mut self) -> Result<Vec<Bytes>> {
        self.check(Turn::Receive, "receive")?;
        let frames = self.socket.receive_unit(&self.frame_config)?;
        self.advance();
        debug!(pattern = %self.pattern, frames = frames.len(), "unit received");
        Ok(frames)
    }

    /// Encode `message` and send it as one unit.
    pub fn send_message(&mut self, message: &Message) -> Result<()> {
        self.check(Turn::Send, "send")?;
        let frames = self.codec.encode(message)?;
        self.send_frames(&frames)
    }

    /// Receive one unit and decode it.
    ///
    /// A decode failure consumes the unit; the endpoint stays usable.
    pub fn receive_message(&mut self) -> Result<Message> {
        let frames = self.receive_frames()?;
        Ok(self.codec.decode(frames)?)
    }

    /// Close the socket, then release the claimed port.
    pub fn close(self) {
        debug!(pattern = %self.pattern, port = self.port, "endpoint closing");
    }

    fn check(&self, turn: Turn, operation: &'static str) -> Result<()> {
        let supported = match turn {
            Turn::Send => self.pattern.can_send(),
            Turn::Receive => self.pattern.can_receive(),
        };
        if !supported {
            return Err(SocketError::Unsupported {
                pattern: self.pattern,
                operation,
            });
        }
        if self.pattern.alternates() && self.turn != turn {
            return Err(SocketError::InvalidState {
                pattern: self.pattern,
                operation,
            });
        }
        Ok(())
    }

    fn advance(&mut self) {
        if self.pattern.alternates() {
            self.turn = match self.turn {
                Turn::Send => Turn::Receive,
                Turn::Receive => Turn::Send,
            };
        }
    }
}

impl std::fmt::Debug for SocketEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketEndpoint")
            .field("pattern", &self.pattern)
            .field("port", &self.port)
            .field("local_addr", &self.local_addr)
            .field("owns_port", &self.claim.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Send,
    Receive,
}

struct PortClaim {
    registry: Arc<PortRegistry>,
    port: u16,
}

impl Drop for PortClaim {
    fn drop(&mut self) {
        self.registry.release(self.port);
    }
}

struct Connection {
    reader: PartReader<IpcStream>,
    writer: PartWriter<IpcStream>,
}

impl Connection {
    fn open(stream: IpcStream, config: &FrameConfig) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        Ok(Self {
            reader: PartReader::with_config_ipc(reader_stream, config.clone())?,
            writer: PartWriter::with_config_ipc(stream, config.clone())?,
        })
    }

    fn accept(listener: &mut TcpSocket, config: &FrameConfig) -> Result<Self> {
        let stream = listener.accept()?;
        debug!(peer = ?stream.peer_addr().ok(), "peer accepted");
        Self::open(stream, config)
    }
}

enum Socket {
    /// Reply and Push: one accepted peer at a time.
    Listening {
        listener: TcpSocket,
        peer: Option<Connection>,
    },
    /// Publish: every subscriber accepted so far.
    Publishing {
        listener: TcpSocket,
        subscribers: Vec<PartWriter<IpcStream>>,
    },
    /// Request, Pull and Subscribe. `None` once a failed send or a corrupt
    /// stream has made the connection unusable.
    Connected(Option<Connection>),
}

impl Socket {
    fn send_unit(
        &mut self,
        pattern: SocketPattern,
        frames: &[Bytes],
        config: &FrameConfig,
    ) -> Result<()> {
        match self {
            Socket::Connected(slot) => {
                let connection = slot.as_mut().ok_or(SocketError::Disconnected)?;
                let result = connection.writer.send_unit(frames);
                if let Err(err) = &result {
                    if leaves_partial_write(err) {
                        *slot = None;
                    }
                }
                result.map_err(closed_as_disconnect)
            }
            Socket::Listening { listener, peer } => {
                let mut connection = match peer.take() {
                    Some(connection) => connection,
                    // Replies only go to the peer that asked.
                    None if pattern == SocketPattern::Reply => return Err(SocketError::Disconnected),
                    None => Connection::accept(listener, config)?,
                };
                match connection.writer.send_unit(frames) {
                    Ok(()) => {
                        *peer = Some(connection);
                        Ok(())
                    }
                    Err(err) => {
                        if !leaves_partial_write(&err) {
                            *peer = Some(connection);
                        }
                        Err(closed_as_disconnect(err))
                    }
                }
            }
            Socket::Publishing {
                listener,
                subscribers,
            } => {
                while let Some(stream) = listener.try_accept()? {
                    debug!(peer = ?stream.peer_addr().ok(), "subscriber joined");
                    subscribers.push(PartWriter::with_config_ipc(stream, config.clone())?);
                }
                if subscribers.is_empty() {
                    debug!("no subscribers, unit discarded");
                    return Ok(());
                }
                let mut rejected = None;
                subscribers.retain_mut(|writer| match writer.send_unit(frames) {
                    Ok(()) => true,
                    Err(err) if !leaves_partial_write(&err) => {
                        rejected = Some(err);
                        true
                    }
                    Err(err) => {
                        warn!(error = %err, "dropping subscriber");
                        false
                    }
                });
                match rejected {
                    Some(err) => Err(err.into()),
                    None => Ok(()),
                }
            }
        }
    }

    fn receive_unit(&mut self, config: &FrameConfig) -> Result<Vec<Bytes>> {
        match self {
            Socket::Connected(slot) => {
                let connection = slot.as_mut().ok_or(SocketError::Disconnected)?;
                let result = connection.reader.read_unit();
                if let Err(err) = &result {
                    if !is_resumable(err) {
                        *slot = None;
                    }
                }
                result.map_err(closed_as_disconnect)
            }
            Socket::Listening { listener, peer } => loop {
                let mut connection = match peer.take() {
                    Some(connection) => connection,
                    None => Connection::accept(listener, config)?,
                };
                match connection.reader.read_unit() {
                    Ok(unit) => {
                        *peer = Some(connection);
                        return Ok(unit);
                    }
                    Err(FrameError::ConnectionClosed) => {
                        debug!("peer disconnected between units, accepting next");
                    }
                    Err(err) => {
                        if is_resumable(&err) {
                            *peer = Some(connection);
                        }
                        return Err(err.into());
                    }
                }
            },
            Socket::Publishing { .. } => Err(SocketError::Unsupported {
                pattern: SocketPattern::Publish,
                operation: "receive",
            }),
        }
    }
}

/// Whether a failed send may have put part of a unit on the wire.
fn leaves_partial_write(err: &FrameError) -> bool {
    !matches!(err, FrameError::PayloadTooLarge { .. } | FrameError::EmptyUnit)
}

/// Whether a failed receive left the stream aligned, so the next receive
/// continues the same unit.
fn is_resumable(err: &FrameError) -> bool {
    matches!(err, FrameError::Io(_))
}

fn closed_as_disconnect(err: FrameError) -> SocketError {
    match err {
        FrameError::ConnectionClosed => SocketError::Disconnected,
        other => SocketError::Frame(other),
    }
}
