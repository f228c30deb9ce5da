use limero_codec::{Decoder, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::{MsgError, Result};
use crate::types::{decode_key, header_key, MsgKind};

/// Routing and correlation fields that open every message.
///
/// Only `kind` is mandatory; absent optionals are left out of the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<u32>,
    pub kind: MsgKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos: Option<u8>,
}

impl MsgHeader {
    pub fn new(kind: MsgKind) -> Self {
        Self {
            dst: None,
            src: None,
            kind,
            ret_code: None,
            msg_id: None,
            qos: None,
        }
    }

    /// True for a publish without a destination.
    pub fn is_broadcast(&self) -> bool {
        self.kind == MsgKind::Publish && self.dst.is_none()
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.begin_map()?;
        if let Some(dst) = self.dst {
            entry(enc, header_key::DST, dst)?;
        }
        if let Some(src) = self.src {
            entry(enc, header_key::SRC, src)?;
        }
        entry(enc, header_key::MSG_TYPE, self.kind as u32)?;
        if let Some(ret_code) = self.ret_code {
            entry(enc, header_key::RET_CODE, ret_code)?;
        }
        if let Some(msg_id) = self.msg_id {
            entry(enc, header_key::MSG_ID, u32::from(msg_id))?;
        }
        if let Some(qos) = self.qos {
            entry(enc, header_key::QOS, u32::from(qos))?;
        }
        enc.end_map()?;
        Ok(())
    }

    /// Decode a header map; unknown keys and a missing kind are errors.
    pub fn decode(dec: &mut Decoder) -> Result<Self> {
        let mut header = MsgHeader::new(MsgKind::Alive);
        let mut kind = None;

        dec.begin_map()?;
        while !dec.at_break()? {
            let key = decode_key(dec, "header")?;
            let value = dec.decode_uint32()?;
            match key {
                header_key::DST => header.dst = Some(value),
                header_key::SRC => header.src = Some(value),
                header_key::MSG_TYPE => kind = Some(MsgKind::try_from(value)?),
                header_key::RET_CODE => header.ret_code = Some(value),
                header_key::MSG_ID => header.msg_id = Some(narrow("msg_id", value)?),
                header_key::QOS => header.qos = Some(narrow("qos", value)?),
                key => {
                    return Err(MsgError::UnknownKey {
                        record: "header",
                        key: i64::from(key),
                    })
                }
            }
        }
        dec.end_map()?;

        header.kind = kind.ok_or(MsgError::MissingField("msg_type"))?;
        Ok(header)
    }
}

fn entry(enc: &mut Encoder, key: u32, value: u32) -> Result<()> {
    enc.encode_uint32(key)?;
    enc.encode_uint32(value)?;
    Ok(())
}

fn narrow<T: TryFrom<u32>>(field: &'static str, value: u32) -> Result<T> {
    T::try_from(value).map_err(|_| MsgError::InvalidValue {
        field,
        value: i64::from(value),
    })
}
