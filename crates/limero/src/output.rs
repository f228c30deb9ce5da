use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use limero_msg::{Body, LinkStats, Message};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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
struct MessageOutput<'a> {
    #[serde(flatten)]
    message: &'a Message,
    frame_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<String>,
}

/// Print one message; `frame` is included when the wire bytes are known.
pub fn print_message(msg: &Message, frame_size: usize, frame: Option<&[u8]>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                message: msg,
                frame_size,
                frame: frame.map(hex::encode),
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
                .set_header(vec!["KIND", "SRC", "DST", "MSG_ID", "SIZE", "BODY"])
                .add_row(vec![
                    msg.kind().to_string(),
                    opt_id(msg.header.src),
                    opt_id(msg.header.dst),
                    msg.header.msg_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                    frame_size.to_string(),
                    body_summary(&msg.body),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} src={} dst={} size={} {}",
                msg.kind(),
                opt_id(msg.header.src),
                opt_id(msg.header.dst),
                frame_size,
                body_summary(&msg.body)
            );
        }
        OutputFormat::Raw => match frame {
            Some(bytes) => print_raw(bytes),
            None => println!("{}", body_summary(&msg.body)),
        },
    }
}

pub fn print_stats(stats: &LinkStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec![
                    "SENT",
                    "RECEIVED",
                    "GARBLED",
                    "MALFORMED",
                    "OVERFLOWED",
                    "DROPPED",
                ])
                .add_row(vec![
                    stats.frames_sent.to_string(),
                    stats.frames_received.to_string(),
                    stats.garbled.to_string(),
                    stats.malformed.to_string(),
                    stats.overflowed.to_string(),
                    stats.dropped.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "sent={} received={} garbled={} malformed={} overflowed={} dropped={}",
                stats.frames_sent,
                stats.frames_received,
                stats.garbled,
                stats.malformed,
                stats.overflowed,
                stats.dropped
            );
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn opt_id(id: Option<u32>) -> String {
    id.map_or_else(|| "-".to_string(), |id| format!("0x{id:08X}"))
}

fn body_summary(body: &Body) -> String {
    match body {
        Body::Empty => String::new(),
        Body::Values(values) => values
            .iter()
            .map(|(id, value)| format!("{id}={value}"))
            .collect::<Vec<_>>()
            .join(" "),
        Body::Info(info) => {
            let mut out = format!("#{} {}", info.id, info.name);
            if let Some(description) = &info.description {
                out.push_str(&format!(" \"{description}\""));
            }
            if let Some(value_type) = info.value_type {
                out.push_str(&format!(" type={}", serde_label(&value_type)));
            }
            if let Some(mode) = info.mode {
                out.push_str(&format!(" mode={}", serde_label(&mode)));
            }
            out
        }
    }
}

fn serde_label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "?".to_string(),
    }
}
