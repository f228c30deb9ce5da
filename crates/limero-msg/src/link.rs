//! Transport boundary: messages in, framed bytes out, and the reverse.

use limero_codec::{
    CodecConfig, CodecError, Encoder, ErrorClass, FrameState, Reassembler, TERMINATOR,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{MsgError, Result};
use crate::message::Message;

/// Buffer limits for each direction of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkConfig {
    /// Outgoing frames, framing overhead included.
    pub tx: CodecConfig,
    /// Incoming frames, terminator excluded.
    pub rx: CodecConfig,
}

impl LinkConfig {
    /// Same limit in both directions.
    pub fn symmetric(max_frame_size: usize) -> Self {
        let codec = CodecConfig { max_frame_size };
        Self {
            tx: codec,
            rx: codec,
        }
    }
}

/// Per-link frame counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LinkStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    /// Checksum mismatches.
    pub garbled: u64,
    /// Framing, value format or protocol errors.
    pub malformed: u64,
    /// Frames dropped for exceeding the receive buffer.
    pub overflowed: u64,
    /// Complete frames discarded because more bytes arrived before
    /// [`Link::take_message`].
    pub dropped: u64,
}

impl LinkStats {
    fn record_failure(&mut self, class: ErrorClass) {
        match class {
            ErrorClass::Integrity => self.garbled += 1,
            ErrorClass::Capacity => self.overflowed += 1,
            ErrorClass::Format | ErrorClass::Protocol => self.malformed += 1,
        }
    }
}

/// One encoder and one reassembler bound to a single byte stream.
#[derive(Debug)]
pub struct Link {
    encoder: Encoder,
    reassembler: Reassembler,
    stats: LinkStats,
}

impl Default for Link {
    fn default() -> Self {
        Self::new(LinkConfig::default())
    }
}

impl Link {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            encoder: Encoder::with_config(&config.tx),
            reassembler: Reassembler::with_config(&config.rx),
            stats: LinkStats::default(),
        }
    }

    /// Encode `msg`, append the CRC and frame it.
    ///
    /// The returned bytes stay valid until the next call that mutates the link.
    pub fn produce_frame(&mut self, msg: &Message) -> Result<&[u8]> {
        self.encoder.clear();
        let encoded = msg
            .encode(&mut self.encoder)
            .and_then(|()| self.encoder.add_crc().map_err(MsgError::from))
            .and_then(|()| self.encoder.add_framing().map_err(MsgError::from));
        if let Err(err) = encoded {
            self.encoder.clear();
            debug!(kind = %msg.kind(), error = %err, "failed to produce frame");
            return Err(err);
        }
        self.stats.frames_sent += 1;
        trace!(kind = %msg.kind(), len = self.encoder.size(), "frame produced");
        Ok(self.encoder.data())
    }

    /// Feed one received byte.
    ///
    /// Only the first overflow of a frame is counted. Later bytes keep
    /// failing with [`CodecError::Overflowed`] until the terminator that
    /// ends the oversized frame, which resynchronizes the link.
    pub fn accept_byte(&mut self, byte: u8) -> Result<FrameState> {
        match self.reassembler.state() {
            FrameState::Overflowed if byte == TERMINATOR => {
                trace!("resynchronized after overflow");
                self.reassembler.clear();
                return Ok(self.reassembler.state());
            }
            FrameState::Complete => self.record_drop(),
            _ => {}
        }
        self.reassembler.add_byte(byte).map_err(|err| {
            if matches!(err, CodecError::Capacity { .. }) {
                self.stats.overflowed += 1;
            }
            err.into()
        })
    }

    /// Load a whole received frame, trailing terminator optional.
    pub fn accept_buffer(&mut self, bytes: &[u8]) -> Result<FrameState> {
        if self.reassembler.state().is_complete() {
            self.record_drop();
        }
        self.reassembler.fill_buffer(bytes).map_err(|err| {
            self.stats.overflowed += 1;
            err.into()
        })
    }

    /// Decode the completed frame.
    ///
    /// Success or failure, the frame is consumed and the link is ready for
    /// the next one.
    pub fn take_message(&mut self) -> Result<Message> {
        if !self.reassembler.state().is_complete() {
            return Err(CodecError::Incomplete.into());
        }
        let len = self.reassembler.len();
        let result = self.reassembler.process_frame(Message::decode);
        match &result {
            Ok(msg) => {
                self.stats.frames_received += 1;
                trace!(kind = %msg.kind(), len, "frame accepted");
            }
            Err(err) => {
                self.stats.record_failure(err.class());
                debug!(len, error = %err, class = %err.class(), "frame discarded");
            }
        }
        result
    }

    pub fn state(&self) -> FrameState {
        self.reassembler.state()
    }

    fn record_drop(&mut self) {
        self.stats.dropped += 1;
        debug!(len = self.reassembler.len(), "unprocessed frame dropped");
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Drop any partial or overflowed receive frame. Counters are kept.
    pub fn reset(&mut self) {
        self.reassembler.clear();
    }
}
