use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use bridgewire_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use bridgewire_message::CodecConfig;

/// Endpoint behavior configuration.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Address every port is bound or dialed on. Default: 127.0.0.1.
    pub host: IpAddr,
    /// Read timeout applied to every connection. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to every connection.
    pub write_timeout: Option<Duration>,
    /// Maximum size of a single frame. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Message codec settings.
    pub codec: CodecConfig,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            read_timeout: None,
            write_timeout: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            codec: CodecConfig::default(),
        }
    }
}

impl EndpointConfig {
    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }
}
