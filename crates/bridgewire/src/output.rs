use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use bridgewire_message::decode_tag;
use bytes::Bytes;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

const PREVIEW_BYTES: usize = 16;
const PREVIEW_CHARS: usize = 64;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ListeningOutput<'a> {
    event: &'static str,
    pattern: &'a str,
    addr: String,
    port: u16,
    timestamp: String,
}

#[derive(Serialize)]
struct UnitOutput<'a> {
    event: &'a str,
    frame_count: usize,
    blob_count: usize,
    blob_bytes: usize,
    frames: Vec<FrameRow>,
    timestamp: String,
}

#[derive(Serialize)]
struct FrameRow {
    index: usize,
    kind: &'static str,
    size: usize,
    preview: String,
}

pub fn print_listening(pattern: &str, addr: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ListeningOutput {
                event: "listening",
                pattern,
                addr: addr.to_string(),
                port: addr.port(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("listening pattern={pattern} addr={addr}");
        }
    }
}

/// Print the frames of one unit: text, then (tag, blob) pairs.
pub fn print_unit(event: &str, frames: &[Bytes], format: OutputFormat) {
    let rows: Vec<FrameRow> = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| frame_row(index, frame))
        .collect();
    let blob_count = frames.len().saturating_sub(1) / 2;
    let blob_bytes: usize = frames.iter().skip(2).step_by(2).map(Bytes::len).sum();

    match format {
        OutputFormat::Json => {
            let out = UnitOutput {
                event,
                frame_count: frames.len(),
                blob_count,
                blob_bytes,
                frames: rows,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "KIND", "SIZE", "PREVIEW"]);
            for row in rows {
                table.add_row(vec![
                    row.index.to_string(),
                    row.kind.to_string(),
                    row.size.to_string(),
                    row.preview,
                ]);
            }
            println!("{event}: {} frame(s), {blob_count} blob(s)", frames.len());
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{event} frames={} blobs={blob_count} blob_bytes={blob_bytes}",
                frames.len()
            );
            for row in rows {
                println!(
                    "  [{}] {} size={} {}",
                    row.index, row.kind, row.size, row.preview
                );
            }
        }
    }
}

fn frame_row(index: usize, frame: &Bytes) -> FrameRow {
    let (kind, preview) = match index {
        0 => ("text", text_preview(frame)),
        i if i % 2 == 1 => (
            "tag",
            decode_tag(frame).map_or_else(|err| err.to_string(), |tag| format!("@{tag}")),
        ),
        _ => ("blob", hex_preview(frame)),
    };
    FrameRow {
        index,
        kind,
        size: frame.len(),
        preview,
    }
}

// Frame 0 is Latin-1: each byte is the code point of the same value.
fn text_preview(frame: &[u8]) -> String {
    let mut text: String = frame.iter().take(PREVIEW_CHARS).map(|&b| char::from(b)).collect();
    if frame.len() > PREVIEW_CHARS {
        text.push_str("...");
    }
    text
}

fn hex_preview(frame: &[u8]) -> String {
    let mut hex: String = frame
        .iter()
        .take(PREVIEW_BYTES)
        .map(|b| format!("{b:02x}"))
        .collect();
    if frame.len() > PREVIEW_BYTES {
        hex.push_str("...");
    }
    hex
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
