use bridgewire_message::MessageCodec;

use crate::cmd::FramesArgs;
use crate::exit::{message_error, CliResult, SUCCESS};
use crate::output::{print_unit, OutputFormat};

pub fn run(args: FramesArgs, format: OutputFormat) -> CliResult<i32> {
    let message = args.payload.build_message()?;
    let codec = MessageCodec::new(args.payload.codec_config());
    let frames = codec
        .encode(&message)
        .map_err(|err| message_error("encode failed", err))?;

    tracing::debug!(frames = frames.len(), "message encoded offline");
    print_unit("encoded", &frames, format);
    Ok(SUCCESS)
}
