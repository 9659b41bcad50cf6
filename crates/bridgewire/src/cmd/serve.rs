use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridgewire_message::{Message, MessageCodec};
use bridgewire_socket::{EndpointConfig, SocketEndpoint, SocketError, SocketPattern};
use bridgewire_transport::PortRegistry;

use crate::cmd::ServeArgs;
use crate::exit::{message_error, socket_error, CliError, CliResult, SUCCESS};
use crate::output::{print_listening, print_unit, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = EndpointConfig {
        host: args.host,
        codec: bridgewire_message::CodecConfig {
            reject_reserved_strings: !args.allow_reserved,
        },
        ..EndpointConfig::default()
    };
    let codec = MessageCodec::new(config.codec);
    let registry = Arc::new(PortRegistry::with_base(args.base_port));

    let mut endpoint = SocketEndpoint::bind(SocketPattern::Reply, &registry, config)
        .map_err(|err| socket_error("bind failed", err))?;
    print_listening(endpoint.pattern().name(), endpoint.local_addr(), format);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut served = 0usize;
    while running.load(Ordering::SeqCst) {
        let frames = endpoint
            .receive_frames()
            .map_err(|err| socket_error("receive failed", err))?;
        print_unit("received", &frames, format);

        let reply = codec.decode(frames).and_then(|message| {
            tracing::info!(
                blobs = message.binary_count(),
                blob_bytes = message.binary_len(),
                "echoing message"
            );
            codec.encode(&message)
        });
        let reply = match reply {
            Ok(frames) => frames,
            Err(err) => {
                tracing::warn!(error = %err, "cannot echo message, replying with error");
                codec
                    .encode(&error_reply(&err.to_string()))
                    .map_err(|err| message_error("error reply encode failed", err))?
            }
        };

        match endpoint.send_frames(&reply) {
            Ok(()) => {}
            Err(SocketError::Disconnected) => {
                tracing::warn!("requester left before the reply was sent");
                continue;
            }
            Err(err) => return Err(socket_error("reply failed", err)),
        }

        served = served.saturating_add(1);
        if args.count.is_some_and(|count| served >= count) {
            break;
        }
    }

    endpoint.close();
    Ok(SUCCESS)
}

/// Reply sent when a request cannot be echoed: `{"error": <reason>}`.
pub fn error_reply(reason: &str) -> Message {
    Message::object([("error", reason)])
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reply_carries_reason() {
        let reply = error_reply("no placeholder for binary tag 3");
        assert_eq!(
            reply.get("error").and_then(Message::as_str),
            Some("no placeholder for binary tag 3")
        );
        assert_eq!(reply.binary_count(), 0);
    }
}
