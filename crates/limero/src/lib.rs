//! Compact checksummed binary messages for serial links.
//!
//! limero carries small self-describing messages between a host and
//! resource-constrained devices over an unreliable byte stream such as a
//! UART.
//!
//! # Crate Structure
//!
//! - [`codec`]: value encoder/decoder, COBS framing, CRC-16, frame reassembly
//! - [`msg`]: message header, Info records, [`msg::Link`] and the device scheduler
//! - [`serial`]: blocking reader/writer over any `std::io` stream

/// Re-export codec types.
pub mod codec {
    pub use limero_codec::*;
}

/// Re-export message protocol types.
pub mod msg {
    pub use limero_msg::*;
}

/// Re-export stream adapters.
pub mod serial {
    pub use limero_serial::*;
}
