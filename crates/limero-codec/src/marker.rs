//! Marker bytes of the supported value subset.
//!
//! The high three bits of a marker select the major type, the low five bits
//! carry either a short value/length or the width of a following argument.

/// Major type 0: unsigned integer.
pub const MAJOR_UINT: u8 = 0x00;
/// Major type 1: negative integer, encoded over `-(value + 1)`.
pub const MAJOR_NINT: u8 = 0x20;
/// Major type 2: byte string.
pub const MAJOR_BSTR: u8 = 0x40;
/// Major type 3: UTF-8 text string.
pub const MAJOR_STR: u8 = 0x60;

pub const MAJOR_MASK: u8 = 0xE0;
pub const INFO_MASK: u8 = 0x1F;

/// Largest value stored directly in the marker.
pub const MAX_INLINE: u32 = 23;
/// Argument width markers (low five bits).
pub const ARG_U8: u8 = 24;
pub const ARG_U16: u8 = 25;
pub const ARG_U32: u8 = 26;
pub const ARG_U64: u8 = 27;

/// Longest string or byte string expressible in the short form.
pub const MAX_SHORT_LEN: usize = 31;

pub const ARRAY_START: u8 = 0x9F;
pub const MAP_START: u8 = 0xBF;
pub const FALSE: u8 = 0xF4;
pub const TRUE: u8 = 0xF5;
pub const NULL: u8 = 0xF6;
pub const FLOAT32: u8 = 0xFA;
pub const FLOAT64: u8 = 0xFB;
/// Terminates indefinite-length arrays and maps.
pub const BREAK: u8 = 0xFF;

/// Kind of the next value, as classified from its marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Uint,
    Int,
    Bytes,
    Str,
    Array,
    Map,
    Float,
    Double,
    Bool,
    Null,
    Break,
}

impl ValueKind {
    /// Classify a marker byte, or `None` for markers outside the subset.
    pub fn classify(marker: u8) -> Option<Self> {
        let kind = match marker {
            ARRAY_START => ValueKind::Array,
            MAP_START => ValueKind::Map,
            FALSE | TRUE => ValueKind::Bool,
            NULL => ValueKind::Null,
            FLOAT32 => ValueKind::Float,
            FLOAT64 => ValueKind::Double,
            BREAK => ValueKind::Break,
            _ => match marker & MAJOR_MASK {
                MAJOR_UINT => ValueKind::Uint,
                MAJOR_NINT => ValueKind::Int,
                MAJOR_BSTR => ValueKind::Bytes,
                MAJOR_STR => ValueKind::Str,
                _ => return None,
            },
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Uint => "unsigned integer",
            ValueKind::Int => "negative integer",
            ValueKind::Bytes => "byte string",
            ValueKind::Str => "text string",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Float => "float32",
            ValueKind::Double => "float64",
            ValueKind::Bool => "boolean",
            ValueKind::Null => "null",
            ValueKind::Break => "break",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
