use limero_codec::{Decoder, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::{MsgError, Result};
use crate::types::{decode_key, info_key, PropertyId, ValueMode, ValueType};

/// Self-description of one property, or of the whole object when `id` is
/// [`OBJECT_PROPERTY_ID`](crate::types::OBJECT_PROPERTY_ID).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub id: PropertyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ValueMode>,
}

impl PropertyInfo {
    pub fn new(id: PropertyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            value_type: None,
            mode: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn with_mode(mut self, mode: ValueMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.begin_map()?;
        enc.encode_uint32(info_key::PROP_ID)?;
        enc.encode_int32(i32::from(self.id))?;
        enc.encode_uint32(info_key::NAME)?;
        enc.encode_str(&self.name)?;
        if let Some(description) = &self.description {
            enc.encode_uint32(info_key::DESCRIPTION)?;
            enc.encode_str(description)?;
        }
        if let Some(value_type) = self.value_type {
            enc.encode_uint32(info_key::TYPE)?;
            enc.encode_uint32(value_type as u32)?;
        }
        if let Some(mode) = self.mode {
            enc.encode_uint32(info_key::MODE)?;
            enc.encode_uint32(mode as u32)?;
        }
        enc.end_map()?;
        Ok(())
    }

    pub fn decode(dec: &mut Decoder) -> Result<Self> {
        let mut id = None;
        let mut name = None;
        let mut description = None;
        let mut value_type = None;
        let mut mode = None;

        dec.begin_map()?;
        while !dec.at_break()? {
            match decode_key(dec, "info")? {
                info_key::PROP_ID => {
                    let raw = dec.decode_int32()?;
                    let narrowed = PropertyId::try_from(raw).map_err(|_| MsgError::InvalidValue {
                        field: "prop_id",
                        value: i64::from(raw),
                    })?;
                    id = Some(narrowed);
                }
                info_key::NAME => name = Some(dec.decode_str()?),
                info_key::DESCRIPTION => description = Some(dec.decode_str()?),
                info_key::TYPE => value_type = Some(ValueType::try_from(dec.decode_uint32()?)?),
                info_key::MODE => mode = Some(ValueMode::try_from(dec.decode_uint32()?)?),
                key => {
                    return Err(MsgError::UnknownKey {
                        record: "info",
                        key: i64::from(key),
                    })
                }
            }
        }
        dec.end_map()?;

        Ok(Self {
            id: id.ok_or(MsgError::MissingField("prop_id"))?,
            name: name.ok_or(MsgError::MissingField("name"))?,
            description,
            value_type,
            mode,
        })
    }
}
