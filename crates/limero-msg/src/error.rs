use limero_codec::{CodecError, ErrorClass};

use crate::types::MsgKind;

/// Errors that can occur while encoding or interpreting messages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MsgError {
    /// Low-level codec failure (capacity, format or integrity).
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A map key that the record does not define.
    #[error("unknown {record} key {key}")]
    UnknownKey { record: &'static str, key: i64 },

    /// A map key that is not an integer.
    #[error("invalid {record} key with marker 0x{marker:02X}")]
    InvalidKey { record: &'static str, marker: u8 },

    /// A mandatory field was not present in the record.
    #[error("mandatory field {0} not found")]
    MissingField(&'static str),

    /// A field value outside its defined range or enumeration.
    #[error("invalid value {value} for {field}")]
    InvalidValue { field: &'static str, value: i64 },

    /// The body does not match the message kind.
    #[error("unexpected body for {0} message")]
    UnexpectedBody(MsgKind),

    /// The message kind requires a body that is absent.
    #[error("missing body for {0} message")]
    MissingBody(MsgKind),

    /// Bytes left over after the message body.
    #[error("trailing data at offset {offset}")]
    TrailingData { offset: usize },
}

impl MsgError {
    /// Error class; protocol violations are distinct from codec failures.
    pub fn class(&self) -> ErrorClass {
        match self {
            MsgError::Codec(err) => err.class(),
            _ => ErrorClass::Protocol,
        }
    }

    /// Stable numeric code for this error.
    pub fn code(&self) -> i32 {
        self.class().code()
    }
}

pub type Result<T> = std::result::Result<T, MsgError>;
