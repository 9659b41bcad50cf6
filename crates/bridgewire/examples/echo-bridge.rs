//! Minimal echo bridge: binds a reply endpoint and echoes messages back.
//!
//! Run with:
//!   cargo run --example echo-bridge
//!
//! In another terminal (use the port printed on startup):
//!   cargo run --features cli -- send --port 4827 \
//!     --json '{"cmd":"snap"}' --blob pix=/path/to/image.raw

use bridgewire::socket::SocketError;
use bridgewire::{EndpointConfig, PortRegistry, SocketEndpoint, SocketPattern};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = PortRegistry::global();
    let mut endpoint =
        SocketEndpoint::bind(SocketPattern::Reply, &registry, EndpointConfig::default())?;
    eprintln!("Listening on {}", endpoint.local_addr());

    loop {
        let message = match endpoint.receive_message() {
            Ok(message) => message,
            Err(SocketError::Message(e)) => {
                eprintln!("Undecodable message: {e}");
                endpoint.send_message(&bridgewire::Message::object([("error", e.to_string())]))?;
                continue;
            }
            Err(e) => {
                eprintln!("Receive failed: {e}");
                break;
            }
        };
        eprintln!(
            "Received {} blob(s), {} bytes",
            message.binary_count(),
            message.binary_len()
        );
        endpoint.send_message(&message)?;
    }

    endpoint.close();
    Ok(())
}
