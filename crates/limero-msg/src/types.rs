//! Wire enumerations and map keys.

use std::fmt;

use limero_codec::{Decoder, ValueKind};
use serde::{Deserialize, Serialize};

use crate::error::{MsgError, Result};

/// Header map keys.
pub mod header_key {
    pub const DST: u32 = 0;
    pub const SRC: u32 = 1;
    pub const MSG_TYPE: u32 = 2;
    pub const RET_CODE: u32 = 3;
    pub const MSG_ID: u32 = 4;
    pub const QOS: u32 = 5;
}

/// Info record map keys.
pub mod info_key {
    pub const PROP_ID: u32 = 0;
    pub const NAME: u32 = 1;
    pub const DESCRIPTION: u32 = 2;
    pub const TYPE: u32 = 3;
    pub const MODE: u32 = 4;
}

/// Read a record key.
///
/// Anything other than an unsigned integer is reported as a bad key of
/// `record`, so every key failure carries the protocol class.
pub(crate) fn decode_key(dec: &mut Decoder, record: &'static str) -> Result<u32> {
    let marker = dec.peek_next()?;
    match ValueKind::classify(marker) {
        Some(ValueKind::Uint) => Ok(dec.decode_uint32()?),
        Some(ValueKind::Int) => {
            let key = dec
                .decode_int32()
                .map_err(|_| MsgError::InvalidKey { record, marker })?;
            Err(MsgError::UnknownKey {
                record,
                key: i64::from(key),
            })
        }
        _ => Err(MsgError::InvalidKey { record, marker }),
    }
}

/// Property id; negative ids are reserved for protocol metadata.
pub type PropertyId = i8;

/// Property id under which an object describes itself.
pub const OBJECT_PROPERTY_ID: PropertyId = -1;

/// Message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MsgKind {
    /// Keep-alive heartbeat, no body.
    Alive = 0,
    /// Data push. Broadcast without destination, directed ("set") with one.
    Publish = 1,
    /// Request future publishes from the destination; answered by a directed publish.
    Subscribe = 2,
    /// Self-description of an object or one of its properties.
    Info = 3,
}

impl MsgKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MsgKind::Alive => "alive",
            MsgKind::Publish => "publish",
            MsgKind::Subscribe => "subscribe",
            MsgKind::Info => "info",
        }
    }
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u32> for MsgKind {
    type Error = MsgError;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(MsgKind::Alive),
            1 => Ok(MsgKind::Publish),
            2 => Ok(MsgKind::Subscribe),
            3 => Ok(MsgKind::Info),
            other => Err(MsgError::InvalidValue {
                field: "msg_type",
                value: i64::from(other),
            }),
        }
    }
}

/// Value type advertised by an Info record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Uint = 0,
    Int = 1,
    Str = 2,
    Bytes = 3,
    Float = 4,
}

impl TryFrom<u32> for ValueType {
    type Error = MsgError;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(ValueType::Uint),
            1 => Ok(ValueType::Int),
            2 => Ok(ValueType::Str),
            3 => Ok(ValueType::Bytes),
            4 => Ok(ValueType::Float),
            other => Err(MsgError::InvalidValue {
                field: "value_type",
                value: i64::from(other),
            }),
        }
    }
}

/// Access mode advertised by an Info record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    Read = 0,
    Write = 1,
}

impl TryFrom<u32> for ValueMode {
    type Error = MsgError;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(ValueMode::Read),
            1 => Ok(ValueMode::Write),
            other => Err(MsgError::InvalidValue {
                field: "mode",
                value: i64::from(other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_wire_values() {
        for kind in [
            MsgKind::Alive,
            MsgKind::Publish,
            MsgKind::Subscribe,
            MsgKind::Info,
        ] {
            assert_eq!(MsgKind::try_from(kind as u32).unwrap(), kind);
        }
        assert!(matches!(
            MsgKind::try_from(4),
            Err(MsgError::InvalidValue {
                field: "msg_type",
                value: 4
            })
        ));
    }

    #[test]
    fn value_type_and_mode_reject_unknown() {
        assert_eq!(ValueType::try_from(4).unwrap(), ValueType::Float);
        assert!(ValueType::try_from(5).is_err());
        assert_eq!(ValueMode::try_from(1).unwrap(), ValueMode::Write);
        assert!(ValueMode::try_from(2).is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&MsgKind::Publish).unwrap();
        assert_eq!(json, "\"publish\"");
        let mode: ValueMode = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(mode, ValueMode::Write);
    }
}
