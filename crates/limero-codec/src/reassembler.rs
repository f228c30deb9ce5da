//! Incremental frame reassembly for byte-at-a-time receivers.
//!
//! ```text
//!            non-zero byte (fits)
//!           ┌──────────────┐
//!           v              │
//!   ┌──────────────┐ ──────┘      0x00      ┌──────────┐
//!   │ Accumulating │ ─────────────────────> │ Complete │
//!   └──────────────┘                        └──────────┘
//!           │ non-zero byte (does not fit)        │ process_frame / next byte
//!           v                                     v
//!   ┌────────────┐        clear()          Accumulating { len: 0 }
//!   │ Overflowed │ ──────────────────────> Accumulating { len: 0 }
//!   └────────────┘
//! ```

use tracing::{debug, trace};

use crate::cobs::TERMINATOR;
use crate::config::CodecConfig;
use crate::decoder::Decoder;
use crate::error::{CodecError, Result};

/// Observable reassembly state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// No terminator seen yet; `len` bytes buffered.
    Accumulating { len: usize },
    /// A terminator closed a non-empty frame.
    Complete,
    /// Capacity exceeded; terminal until [`Reassembler::clear`].
    Overflowed,
}

impl FrameState {
    pub fn is_complete(self) -> bool {
        matches!(self, FrameState::Complete)
    }
}

/// Accumulates framed bytes until a terminator arrives, then unstuffs and
/// verifies them before handing out a [`Decoder`].
#[derive(Debug, Clone)]
pub struct Reassembler {
    decoder: Decoder,
    state: FrameState,
}

impl Reassembler {
    /// Create a reassembler holding at most `max` framed bytes (terminator excluded).
    pub fn new(max: usize) -> Self {
        Self {
            decoder: Decoder::new(max),
            state: FrameState::Accumulating { len: 0 },
        }
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self::new(config.max_frame_size)
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn max_size(&self) -> usize {
        self.decoder.max_size()
    }

    /// Buffered bytes of the current candidate frame.
    pub fn len(&self) -> usize {
        self.decoder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoder.is_empty()
    }

    /// Feed one byte from the receiver.
    ///
    /// A terminator with nothing buffered is an idle line and is ignored. A
    /// byte arriving after `Complete` discards the unprocessed frame.
    pub fn add_byte(&mut self, byte: u8) -> Result<FrameState> {
        match self.state {
            FrameState::Overflowed => {
                return Err(CodecError::Overflowed {
                    max: self.max_size(),
                })
            }
            FrameState::Complete => {
                debug!(len = self.decoder.len(), "discarding unprocessed frame");
                self.clear();
            }
            FrameState::Accumulating { .. } => {}
        }

        if byte == TERMINATOR {
            if self.decoder.is_empty() {
                return Ok(self.state);
            }
            trace!(len = self.decoder.len(), "frame terminator");
            self.state = FrameState::Complete;
            return Ok(self.state);
        }

        if let Err(err) = self.decoder.push_byte(byte) {
            debug!(max = self.max_size(), "frame overflowed");
            self.state = FrameState::Overflowed;
            return Err(err);
        }
        self.state = FrameState::Accumulating {
            len: self.decoder.len(),
        };
        Ok(self.state)
    }

    /// Load a whole frame at once, for transports that deliver complete frames.
    ///
    /// A trailing terminator is optional. Inputs larger than the maximum are
    /// rejected before anything is copied.
    pub fn fill_buffer(&mut self, bytes: &[u8]) -> Result<FrameState> {
        let frame = match bytes.split_last() {
            Some((&TERMINATOR, rest)) => rest,
            _ => bytes,
        };
        self.clear();
        if frame.is_empty() {
            return Ok(self.state);
        }
        self.decoder.fill_buffer(frame)?;
        self.state = FrameState::Complete;
        Ok(self.state)
    }

    /// Unstuff and verify the completed frame, then run `f` over its payload.
    ///
    /// Steps run in fixed order: framing decode, checksum, then `f`. Whatever
    /// the outcome, the frame is discarded and the reassembler returns to
    /// accumulating.
    pub fn process_frame<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        E: From<CodecError>,
        F: FnOnce(&mut Decoder) -> std::result::Result<T, E>,
    {
        if !self.state.is_complete() {
            return Err(CodecError::Incomplete.into());
        }
        let result = self
            .decoder
            .decode_framing()
            .and_then(|()| self.decoder.check_crc())
            .map_err(E::from)
            .and_then(|()| f(&mut self.decoder));
        self.clear();
        result
    }

    /// Drop any buffered bytes and leave the overflowed state.
    pub fn clear(&mut self) {
        self.decoder.clear();
        self.state = FrameState::Accumulating { len: 0 };
    }
}
