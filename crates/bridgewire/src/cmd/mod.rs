use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use bridgewire_message::{CodecConfig, Message};
use bridgewire_transport::DEFAULT_BASE_PORT;
use clap::{Args, Subcommand};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod frames;
pub mod send;
pub mod serve;
pub mod version;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind a reply endpoint and echo every message back.
    Serve(ServeArgs),
    /// Send one message to a reply endpoint and print the reply.
    Send(SendArgs),
    /// Encode a message offline and print its wire frames.
    Frames(FramesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Frames(args) => frames::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Lowest port to claim; the first free port at or above it is bound.
    #[arg(long, env = "BRIDGEWIRE_BASE_PORT", default_value_t = DEFAULT_BASE_PORT)]
    pub base_port: u16,
    /// Address to bind.
    #[arg(long, env = "BRIDGEWIRE_HOST", default_value_t = DEFAULT_HOST)]
    pub host: IpAddr,
    /// Exit after replying to N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Send string values that read like placeholders instead of rejecting them.
    #[arg(long)]
    pub allow_reserved: bool,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Port of the reply endpoint.
    #[arg(long, env = "BRIDGEWIRE_PORT")]
    pub port: u16,
    /// Address of the reply endpoint.
    #[arg(long, env = "BRIDGEWIRE_HOST", default_value_t = DEFAULT_HOST)]
    pub host: IpAddr,
}

#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// JSON structure of the message.
    #[arg(long, default_value = "{}")]
    pub json: String,
    /// Attach a file's bytes as a binary value under a top-level key.
    #[arg(long = "blob", value_name = "KEY=PATH", value_parser = parse_blob)]
    pub blobs: Vec<BlobArg>,
    /// Send string values that read like placeholders instead of rejecting them.
    #[arg(long)]
    pub allow_reserved: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct FramesArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobArg {
    pub key: String,
    pub path: PathBuf,
}

fn parse_blob(input: &str) -> Result<BlobArg, String> {
    match input.split_once('=') {
        Some((key, path)) if !key.is_empty() && !path.is_empty() => Ok(BlobArg {
            key: key.to_string(),
            path: PathBuf::from(path),
        }),
        _ => Err(format!("expected KEY=PATH, got {input:?}")),
    }
}

impl PayloadArgs {
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            reject_reserved_strings: !self.allow_reserved,
        }
    }

    /// Parse `--json` and attach every `--blob` file under its key.
    pub fn build_message(&self) -> CliResult<Message> {
        let value: serde_json::Value = serde_json::from_str(&self.json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        let mut message = Message::from(value);

        if !self.blobs.is_empty() && message.as_object().is_none() {
            return Err(CliError::new(
                USAGE,
                format!("--blob needs a JSON object, got {}", message.kind()),
            ));
        }
        for blob in &self.blobs {
            let bytes = fs::read(&blob.path)
                .map_err(|err| io_error(&format!("failed reading {}", blob.path.display()), err))?;
            message.insert(blob.key.clone(), Message::binary(bytes));
        }
        Ok(message)
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
