use std::fmt;

use tracing::trace;

use crate::buffer::BoundedBuf;
use crate::cobs;
use crate::config::CodecConfig;
use crate::crc::{crc16, CRC_SIZE};
use crate::error::{CodecError, Result};
use crate::marker::{
    ARG_U16, ARG_U32, ARG_U8, ARRAY_START, BREAK, FALSE, FLOAT32, MAJOR_BSTR, MAJOR_NINT,
    MAJOR_STR, MAJOR_UINT, MAP_START, MAX_INLINE, MAX_SHORT_LEN, NULL, TRUE,
};

/// Appends values to a capacity-bounded buffer.
///
/// Each `encode_*` call writes one complete value or nothing at all: the
/// encoded size is checked against the remaining capacity before the first
/// byte is written.
#[derive(Debug, Clone)]
pub struct Encoder {
    buf: BoundedBuf,
}

impl Encoder {
    /// Create an encoder that holds at most `max` bytes.
    pub fn new(max: usize) -> Self {
        Self {
            buf: BoundedBuf::new(max),
        }
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self::new(config.max_frame_size)
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.buf.push(byte)
    }

    pub fn encode_uint32(&mut self, value: u32) -> Result<()> {
        let (head, len) = head(MAJOR_UINT, value);
        self.buf.extend_from_slice(&head[..len])
    }

    /// Encode a signed integer; non-negative values use the unsigned form.
    pub fn encode_int32(&mut self, value: i32) -> Result<()> {
        if value >= 0 {
            return self.encode_uint32(value.unsigned_abs());
        }
        // -1 => 0, -2 => 1, ..., i32::MIN => 0x7FFF_FFFF
        let encoded = (-(value + 1)) as u32;
        let (head, len) = head(MAJOR_NINT, encoded);
        self.buf.extend_from_slice(&head[..len])
    }

    /// Encode a text string of at most 31 bytes.
    pub fn encode_str(&mut self, value: &str) -> Result<()> {
        self.encode_short(MAJOR_STR, value.as_bytes())
    }

    /// Encode a byte string of at most 31 bytes.
    pub fn encode_bstr(&mut self, value: &[u8]) -> Result<()> {
        self.encode_short(MAJOR_BSTR, value)
    }

    pub fn encode_float(&mut self, value: f32) -> Result<()> {
        let bits = value.to_bits().to_be_bytes();
        self.buf
            .extend_from_slice(&[FLOAT32, bits[0], bits[1], bits[2], bits[3]])
    }

    pub fn encode_bool(&mut self, value: bool) -> Result<()> {
        self.buf.push(if value { TRUE } else { FALSE })
    }

    pub fn encode_null(&mut self) -> Result<()> {
        self.buf.push(NULL)
    }

    /// Open an indefinite-length array; close it with [`Encoder::end_array`].
    pub fn begin_array(&mut self) -> Result<()> {
        self.buf.push(ARRAY_START)
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.buf.push(BREAK)
    }

    /// Open an indefinite-length map; close it with [`Encoder::end_map`].
    pub fn begin_map(&mut self) -> Result<()> {
        self.buf.push(MAP_START)
    }

    pub fn end_map(&mut self) -> Result<()> {
        self.buf.push(BREAK)
    }

    /// Write an integer key followed by an integer value, both or neither.
    pub fn add_map_entry(&mut self, key: i8, value: i32) -> Result<()> {
        let (key_head, key_len) = int_head(i32::from(key));
        let (value_head, value_len) = int_head(value);
        self.buf.ensure(key_len + value_len)?;
        self.buf.extend_from_slice(&key_head[..key_len])?;
        self.buf.extend_from_slice(&value_head[..value_len])
    }

    /// Append the big-endian CRC-16 of everything written so far.
    pub fn add_crc(&mut self) -> Result<()> {
        let crc = crc16(self.buf.as_slice());
        self.buf.ensure(CRC_SIZE)?;
        self.buf.extend_from_slice(&crc.to_be_bytes())
    }

    /// Replace the contents with their byte-stuffed form, terminator included.
    ///
    /// This must be the last operation before the bytes go to the transport.
    pub fn add_framing(&mut self) -> Result<()> {
        let framed = cobs::frame_encode(self.buf.as_slice());
        trace!(raw = self.buf.len(), framed = framed.len(), "framing payload");
        self.buf.replace(&framed)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn data(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn max_size(&self) -> usize {
        self.buf.max()
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn encode_short(&mut self, major: u8, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_SHORT_LEN {
            return Err(CodecError::TooLong {
                len: bytes.len(),
                max: MAX_SHORT_LEN,
            });
        }
        self.buf.ensure(1 + bytes.len())?;
        self.buf.push(major | bytes.len() as u8)?;
        self.buf.extend_from_slice(bytes)
    }
}

/// Hex dump of the buffer, e.g. `BF 02 01 FF`.
impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, self.data())
    }
}

pub(crate) fn write_hex(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{byte:02X}")?;
    }
    Ok(())
}

/// Marker plus big-endian argument for `value` under `major`.
fn head(major: u8, value: u32) -> ([u8; 5], usize) {
    let mut out = [0u8; 5];
    if value <= MAX_INLINE {
        out[0] = major | value as u8;
        (out, 1)
    } else if let Ok(v) = u8::try_from(value) {
        out[0] = major | ARG_U8;
        out[1] = v;
        (out, 2)
    } else if let Ok(v) = u16::try_from(value) {
        out[0] = major | ARG_U16;
        out[1..3].copy_from_slice(&v.to_be_bytes());
        (out, 3)
    } else {
        out[0] = major | ARG_U32;
        out[1..5].copy_from_slice(&value.to_be_bytes());
        (out, 5)
    }
}

fn int_head(value: i32) -> ([u8; 5], usize) {
    if value >= 0 {
        head(MAJOR_UINT, value.unsigned_abs())
    } else {
        head(MAJOR_NINT, (-(value + 1)) as u32)
    }
}
