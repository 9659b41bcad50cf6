use bridgewire_message::{Message, MessageCodec};
use bridgewire_socket::{EndpointConfig, SocketEndpoint, SocketPattern};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{message_error, socket_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_unit, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let message = args.payload.build_message()?;
    let config = EndpointConfig {
        host: args.target.host,
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
        codec: args.payload.codec_config(),
        ..EndpointConfig::default()
    };
    let codec = MessageCodec::new(config.codec);

    let mut endpoint = SocketEndpoint::connect(SocketPattern::Request, args.target.port, config)
        .map_err(|err| socket_error("connect failed", err))?;
    endpoint
        .send_message(&message)
        .map_err(|err| socket_error("send failed", err))?;
    let frames = endpoint
        .receive_frames()
        .map_err(|err| socket_error("receive failed", err))?;
    endpoint.close();

    print_unit("reply", &frames, format);

    let reply = codec
        .decode(frames)
        .map_err(|err| message_error("reply decode failed", err))?;
    if let Some(reason) = rejection_reason(&reply) {
        return Err(CliError::new(
            DATA_INVALID,
            format!("server rejected message: {reason}"),
        ));
    }
    Ok(SUCCESS)
}

/// The reason carried by an error reply, a single-key `{"error": ...}` object.
fn rejection_reason(reply: &Message) -> Option<&str> {
    let object = reply.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get("error").and_then(Message::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::serve::error_reply;

    #[test]
    fn recognizes_error_replies() {
        assert_eq!(rejection_reason(&error_reply("bad tag")), Some("bad tag"));
    }

    #[test]
    fn echoed_error_field_is_not_a_rejection() {
        let echoed = Message::object([("error", "user data"), ("code", "7")]);
        assert_eq!(rejection_reason(&echoed), None);
        assert_eq!(rejection_reason(&Message::from("error")), None);
    }
}
