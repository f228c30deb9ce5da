//! Blocking adapters between `std::io` byte streams and limero messages.
//!
//! Works with anything that implements `Read`/`Write`: an opened serial
//! device node, a FIFO, a socket or an in-memory cursor.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{Result, SerialError};
pub use reader::FrameReader;
pub use writer::FrameWriter;
