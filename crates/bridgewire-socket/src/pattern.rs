use std::fmt;
use std::str::FromStr;

/// Whether an endpoint listens on a claimed port or dials a peer's port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Bind,
    Connect,
}

impl Role {
    pub fn verb(self) -> &'static str {
        match self {
            Role::Bind => "bind",
            Role::Connect => "connect",
        }
    }
}

/// Messaging pattern of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketPattern {
    /// Answers requests, one peer at a time. Receive then send.
    Reply,
    /// Sends a request, then receives its reply.
    Request,
    /// Sends units to a single puller.
    Push,
    /// Receives units from a pusher.
    Pull,
    /// Sends every unit to all connected subscribers.
    Publish,
    /// Receives every unit a publisher sends. No topic filtering.
    Subscribe,
}

impl SocketPattern {
    pub const ALL: [SocketPattern; 6] = [
        SocketPattern::Reply,
        SocketPattern::Request,
        SocketPattern::Push,
        SocketPattern::Pull,
        SocketPattern::Publish,
        SocketPattern::Subscribe,
    ];

    pub fn role(self) -> Role {
        match self {
            SocketPattern::Reply | SocketPattern::Push | SocketPattern::Publish => Role::Bind,
            SocketPattern::Request | SocketPattern::Pull | SocketPattern::Subscribe => Role::Connect,
        }
    }

    pub fn can_send(self) -> bool {
        !matches!(self, SocketPattern::Pull | SocketPattern::Subscribe)
    }

    pub fn can_receive(self) -> bool {
        !matches!(self, SocketPattern::Push | SocketPattern::Publish)
    }

    /// Request and Reply must alternate sends and receives.
    pub fn alternates(self) -> bool {
        matches!(self, SocketPattern::Request | SocketPattern::Reply)
    }

    pub fn name(self) -> &'static str {
        match self {
            SocketPattern::Reply => "reply",
            SocketPattern::Request => "request",
            SocketPattern::Push => "push",
            SocketPattern::Pull => "pull",
            SocketPattern::Publish => "publish",
            SocketPattern::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for SocketPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SocketPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SocketPattern::ALL
            .into_iter()
            .find(|pattern| pattern.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown socket pattern: {s}"))
    }
}
