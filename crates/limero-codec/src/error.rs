use crate::marker::ValueKind;

/// Broad error classes, used to separate "garbled" from "wrong shape".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// A write or append would exceed the configured maximum.
    Capacity,
    /// Unexpected marker, truncated input or malformed framing.
    Format,
    /// Checksum mismatch.
    Integrity,
    /// Structurally valid values that break the message protocol.
    Protocol,
}

impl ErrorClass {
    /// Stable numeric code for the class (errno values on the original target).
    pub fn code(self) -> i32 {
        match self {
            ErrorClass::Capacity => 28,  // ENOSPC
            ErrorClass::Format => 22,    // EINVAL
            ErrorClass::Integrity => 14, // EFAULT
            ErrorClass::Protocol => 71,  // EPROTO
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Capacity => "capacity",
            ErrorClass::Format => "format",
            ErrorClass::Integrity => "integrity",
            ErrorClass::Protocol => "protocol",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while encoding, decoding or reassembling frames.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The operation would grow the buffer past its configured maximum.
    #[error("buffer capacity exceeded ({needed} bytes, max {max})")]
    Capacity { needed: usize, max: usize },

    /// The reassembler overflowed and must be cleared before reuse.
    #[error("frame overflowed ({max} bytes max), clear before reuse")]
    Overflowed { max: usize },

    /// The cursor reached the end of the readable data.
    #[error("unexpected end of buffer at offset {offset}")]
    EndOfBuffer { offset: usize },

    /// The next value is not of the requested kind.
    #[error("expected {expected}, found marker 0x{found:02X}")]
    TypeMismatch { expected: ValueKind, found: u8 },

    /// The marker byte does not belong to the supported value subset.
    #[error("unsupported marker 0x{0:02X}")]
    Unsupported(u8),

    /// A string or byte string exceeds the 31-byte short form.
    #[error("value too long for short form ({len} bytes, max {max})")]
    TooLong { len: usize, max: usize },

    /// A decoded integer does not fit the requested type.
    #[error("integer out of range for {target}")]
    OutOfRange { target: &'static str },

    /// A decoded text string is not valid UTF-8.
    #[error("text string is not valid UTF-8")]
    InvalidUtf8,

    /// The byte-stuffed frame is structurally invalid.
    #[error("malformed frame encoding")]
    Framing,

    /// The frame is too short to carry a checksum trailer.
    #[error("frame too short for checksum ({len} bytes)")]
    TooShort { len: usize },

    /// The checksum trailer does not match the payload.
    #[error("checksum mismatch (received 0x{received:04X}, computed 0x{computed:04X})")]
    Crc { received: u16, computed: u16 },

    /// No complete frame is available yet.
    #[error("no complete frame available")]
    Incomplete,
}

impl CodecError {
    /// The error class this failure belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            CodecError::Capacity { .. } | CodecError::Overflowed { .. } => ErrorClass::Capacity,
            CodecError::Crc { .. } => ErrorClass::Integrity,
            CodecError::EndOfBuffer { .. }
            | CodecError::TypeMismatch { .. }
            | CodecError::Unsupported(_)
            | CodecError::TooLong { .. }
            | CodecError::OutOfRange { .. }
            | CodecError::InvalidUtf8
            | CodecError::Framing
            | CodecError::TooShort { .. }
            | CodecError::Incomplete => ErrorClass::Format,
        }
    }

    /// Stable numeric code for this error.
    pub fn code(&self) -> i32 {
        self.class().code()
    }

    /// True when more input may turn this failure into a success.
    pub fn is_need_more(&self) -> bool {
        matches!(self, CodecError::EndOfBuffer { .. } | CodecError::Incomplete)
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
