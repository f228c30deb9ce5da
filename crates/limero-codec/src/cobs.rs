//! Consistent overhead byte stuffing.
//!
//! Encoded frames contain no zero byte except the single terminator, so the
//! receiver can resynchronize on any `0x00` seen on the line.
//!
//! ```text
//! raw:     11 22 00 33
//! encoded: 03 11 22 02 33 00
//!          ^        ^     ^-- terminator
//!          |        '-- run of 1 byte, then end
//!          '-- run of 2 bytes, then an implicit zero
//! ```

use crate::error::{CodecError, Result};

/// Frame terminator on the wire.
pub const TERMINATOR: u8 = 0x00;

/// Longest run of non-zero bytes covered by one marker.
pub const MAX_RUN: usize = 254;

const MAX_RUN_MARKER: u8 = 0xFF;

/// Worst-case encoded size (terminator included) for `len` raw bytes.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / MAX_RUN + 2
}

/// Byte-stuff `input` and append the terminator.
pub fn frame_encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(max_encoded_len(input.len()));
    let mut marker_at = 0;
    let mut run: u8 = 1;
    out.push(0);

    for &byte in input {
        if byte == 0 {
            out[marker_at] = run;
            marker_at = out.len();
            out.push(0);
            run = 1;
            continue;
        }
        out.push(byte);
        run += 1;
        if run == MAX_RUN_MARKER {
            out[marker_at] = run;
            marker_at = out.len();
            out.push(0);
            run = 1;
        }
    }

    out[marker_at] = run;
    out.push(TERMINATOR);
    out
}

/// Undo byte stuffing.
///
/// The trailing terminator is optional. Structural violations (a marker
/// claiming more bytes than remain, or a zero before the end) fail with
/// [`CodecError::Framing`].
pub fn frame_decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = input.to_vec();
    let len = decode_in_place(&mut out)?;
    out.truncate(len);
    Ok(out)
}

/// Undo byte stuffing inside `buf`, returning the decoded length.
///
/// Decoding never writes ahead of the read position, so the decoded bytes
/// occupy `buf[..len]` and the remainder is left unspecified.
pub fn decode_in_place(buf: &mut [u8]) -> Result<usize> {
    let len = match buf.iter().position(|&b| b == TERMINATOR) {
        Some(pos) if pos + 1 == buf.len() => pos,
        Some(_) => return Err(CodecError::Framing),
        None => buf.len(),
    };

    let mut read = 0;
    let mut write = 0;
    while read < len {
        let run = usize::from(buf[read]);
        let end = read + run;
        if end > len {
            return Err(CodecError::Framing);
        }
        buf.copy_within(read + 1..end, write);
        write += run - 1;
        read = end;
        if run != usize::from(MAX_RUN_MARKER) && read < len {
            buf[write] = 0;
            write += 1;
        }
    }
    Ok(write)
}
