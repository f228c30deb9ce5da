//! Message protocol for limero links.
//!
//! A message is a header map followed by an optional body, encoded with
//! [`limero_codec`] and sent as one checksummed frame:
//!
//! ```text
//! { 0: dst?, 1: src?, 2: kind, 3: ret_code?, 4: msg_id?, 5: qos? }  body?
//! ```
//!
//! [`Link`] owns the buffers for one byte stream and [`DeviceAgent`] drives
//! the transmit schedule of a device exposing a [`PropertyTable`].

pub mod device;
pub mod error;
pub mod fnv;
pub mod header;
pub mod info;
pub mod link;
pub mod message;
pub mod types;
pub mod value;

pub use device::{DeviceAgent, DeviceConfig, ObjectInfo, PropertyRecord, PropertyTable, StaticTable};
pub use error::{MsgError, Result};
pub use fnv::fnv1a_32;
pub use header::MsgHeader;
pub use info::PropertyInfo;
pub use link::{Link, LinkConfig, LinkStats};
pub use message::{Body, Message};
pub use types::{MsgKind, PropertyId, ValueMode, ValueType, OBJECT_PROPERTY_ID};
pub use value::Value;
