//! Push/pull stream of camera frames: JSON metadata with raw pixel blobs.
//!
//! Run with:
//!   cargo run --example camera-stream

use std::sync::Arc;
use std::thread;

use bridgewire::{EndpointConfig, Message, PortRegistry, SocketEndpoint, SocketPattern};

const WIDTH: usize = 64;
const HEIGHT: usize = 48;
const FRAMES: u32 = 5;

fn frame(seq: u32) -> Message {
    let pixels: Vec<u8> = (0..WIDTH * HEIGHT)
        .map(|i| (i as u32 + seq) as u8)
        .collect();
    let thumb: Vec<u8> = pixels.iter().step_by(16).copied().collect();

    Message::object([
        ("seq", Message::from(seq)),
        (
            "meta",
            Message::object([
                ("width", Message::from(WIDTH as u64)),
                ("height", Message::from(HEIGHT as u64)),
                ("format", Message::from("gray8")),
            ]),
        ),
        ("pixels", Message::binary(pixels)),
        ("thumb", Message::binary(thumb)),
    ])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(PortRegistry::new());
    let mut push = SocketEndpoint::bind(SocketPattern::Push, &registry, EndpointConfig::default())?;
    let port = push.port();
    eprintln!("Camera pushing on {}", push.local_addr());

    let viewer = thread::spawn(move || -> Result<(), bridgewire::socket::SocketError> {
        let mut pull = SocketEndpoint::connect(SocketPattern::Pull, port, EndpointConfig::default())?;
        for _ in 0..FRAMES {
            let message = pull.receive_message()?;
            let seq = message.get("seq").cloned().unwrap_or_default();
            let pixels = message
                .get("pixels")
                .and_then(Message::as_binary)
                .map_or(0, |b| b.len());
            eprintln!("Viewer got frame {seq:?}: {pixels} pixel bytes");
        }
        Ok(())
    });

    for seq in 0..FRAMES {
        push.send_message(&frame(seq))?;
    }

    viewer
        .join()
        .map_err(|_| "viewer thread panicked")??;
    push.close();
    Ok(())
}
