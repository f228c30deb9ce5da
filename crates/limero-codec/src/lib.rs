//! Compact binary value codec with byte-stuffed, checksummed framing.
//!
//! Every frame on the wire is:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────┐
//! │ COBS( values ... │ CRC-16 (2B BE) )           │ 0x00 │
//! └──────────────────────────────────────────────┴──────┘
//! ```
//!
//! Values are a small self-describing subset: 32-bit integers, short
//! strings and byte strings (at most 31 bytes), float32, booleans, null and
//! indefinite-length arrays and maps. All buffers have a fixed maximum and
//! never grow past it.

pub mod buffer;
pub mod cobs;
pub mod config;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod marker;
pub mod reassembler;

pub use buffer::BoundedBuf;
pub use cobs::{frame_decode, frame_encode, max_encoded_len, TERMINATOR};
pub use config::{CodecConfig, DEFAULT_MAX_FRAME};
pub use crc::{crc16, CRC_SIZE};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CodecError, ErrorClass, Result};
pub use marker::{ValueKind, MAX_SHORT_LEN};
pub use reassembler::{FrameState, Reassembler};
