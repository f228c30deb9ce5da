use clap::{Args, Subcommand, ValueEnum};
use limero_codec::DEFAULT_MAX_FRAME;
use limero_msg::{MsgKind, PropertyId, Value, ValueMode, ValueType};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod device;
pub mod encode;
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build one message and print its framed bytes.
    Encode(EncodeArgs),
    /// Decode frames given as hex or read from a file.
    Decode(DecodeArgs),
    /// Read a byte stream and print every decoded message.
    Listen(ListenArgs),
    /// Emit the transmit schedule of a simulated device.
    Device(DeviceArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Device(args) => device::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum KindArg {
    Alive,
    Publish,
    Subscribe,
    Info,
}

impl From<KindArg> for MsgKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Alive => MsgKind::Alive,
            KindArg::Publish => MsgKind::Publish,
            KindArg::Subscribe => MsgKind::Subscribe,
            KindArg::Info => MsgKind::Info,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum TypeArg {
    Uint,
    Int,
    Str,
    Bytes,
    Float,
}

impl From<TypeArg> for ValueType {
    fn from(value_type: TypeArg) -> Self {
        match value_type {
            TypeArg::Uint => ValueType::Uint,
            TypeArg::Int => ValueType::Int,
            TypeArg::Str => ValueType::Str,
            TypeArg::Bytes => ValueType::Bytes,
            TypeArg::Float => ValueType::Float,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ModeArg {
    Read,
    Write,
}

impl From<ModeArg> for ValueMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Read => ValueMode::Read,
            ModeArg::Write => ValueMode::Write,
        }
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message kind.
    #[arg(long, short = 'k', value_enum, default_value = "publish")]
    pub kind: KindArg,
    /// Source id (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_u32, conflicts_with = "src_name")]
    pub src: Option<u32>,
    /// Derive the source id from an object name (FNV-1a).
    #[arg(long)]
    pub src_name: Option<String>,
    /// Destination id (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_u32)]
    pub dst: Option<u32>,
    #[arg(long)]
    pub ret_code: Option<u32>,
    #[arg(long)]
    pub msg_id: Option<u16>,
    #[arg(long)]
    pub qos: Option<u8>,
    /// Publish value as ID=VALUE; repeatable.
    #[arg(long = "value", short = 'v', allow_hyphen_values = true, value_parser = parse_value_arg)]
    pub values: Vec<(PropertyId, Value)>,
    /// Info record property id (-1 describes the object).
    #[arg(long, allow_hyphen_values = true, requires = "info_name")]
    pub info_id: Option<PropertyId>,
    #[arg(long, requires = "info_id")]
    pub info_name: Option<String>,
    #[arg(long, requires = "info_id")]
    pub info_description: Option<String>,
    #[arg(long, value_enum, requires = "info_id")]
    pub info_type: Option<TypeArg>,
    #[arg(long, value_enum, requires = "info_id")]
    pub info_mode: Option<ModeArg>,
    /// Encoder buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME)]
    pub max_frame: usize,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded frames; whitespace is ignored.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Read raw frames from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Receive buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME)]
    pub max_frame: usize,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device node, FIFO or file. Reads stdin when omitted or "-".
    pub path: Option<PathBuf>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Print link counters on exit.
    #[arg(long)]
    pub stats: bool,
    /// Receive buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME)]
    pub max_frame: usize,
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// JSON property table.
    pub config: PathBuf,
    /// Number of frames to emit.
    #[arg(long, default_value = "2")]
    pub cycles: usize,
    /// Write frames here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Print one hex line per frame instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Pause between frames, in milliseconds.
    #[arg(long, default_value = "0")]
    pub interval_ms: u64,
    /// Encoder buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME)]
    pub max_frame: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|err| format!("invalid id {s:?}: {err}"))
}

/// Parse `ID=VALUE`.
///
/// Values: `true`, `false`, `null`, integers, decimals, `hex:0a0b` for
/// byte strings, anything else is text.
pub fn parse_value_arg(s: &str) -> Result<(PropertyId, Value), String> {
    let (id, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got {s:?}"))?;
    let id = id
        .trim()
        .parse::<PropertyId>()
        .map_err(|err| format!("invalid property id {id:?}: {err}"))?;
    Ok((id, parse_value(raw)?))
}

fn parse_value(raw: &str) -> Result<Value, String> {
    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Some(hex) = raw.strip_prefix("hex:") {
                let bytes = hex::decode(hex).map_err(|err| format!("invalid hex {hex:?}: {err}"))?;
                Value::Bytes(bytes)
            } else if let Ok(v) = raw.parse::<u32>() {
                Value::Uint(v)
            } else if let Ok(v) = raw.parse::<i32>() {
                Value::Int(v)
            } else if let Ok(v) = raw.parse::<f32>() {
                Value::Float(v)
            } else {
                Value::Str(raw.to_string())
            }
        }
    };
    Ok(value)
}
