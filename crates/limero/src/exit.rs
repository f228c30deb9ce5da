use std::fmt;
use std::io;

use limero_msg::MsgError;
use limero_serial::SerialError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Every message error is a data problem; the class goes into the text.
pub fn msg_error(context: &str, err: MsgError) -> CliError {
    CliError::new(
        DATA_INVALID,
        format!("{context}: {err} ({} error)", err.class()),
    )
}

pub fn serial_error(context: &str, err: SerialError) -> CliError {
    match err {
        SerialError::Io(source) => io_error(context, source),
        SerialError::Msg(err) => msg_error(context, err),
        SerialError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
