use std::fmt;

use limero_codec::{CodecError, Decoder, Encoder, ValueKind};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ValueType;

/// A single property value as carried in a publish body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Uint(u32),
    Int(i32),
    Str(String),
    Bytes(Vec<u8>),
    Float(f32),
    Bool(bool),
    Null,
}

impl Value {
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        match self {
            Value::Uint(v) => enc.encode_uint32(*v)?,
            Value::Int(v) => enc.encode_int32(*v)?,
            Value::Str(v) => enc.encode_str(v)?,
            Value::Bytes(v) => enc.encode_bstr(v)?,
            Value::Float(v) => enc.encode_float(*v)?,
            Value::Bool(v) => enc.encode_bool(*v)?,
            Value::Null => enc.encode_null()?,
        }
        Ok(())
    }

    /// Decode whichever value comes next.
    ///
    /// Non-negative integers always come back as [`Value::Uint`]; the wire
    /// does not distinguish them from signed ones.
    pub fn decode(dec: &mut Decoder) -> Result<Self> {
        let value = match dec.peek_type()? {
            ValueKind::Uint => Value::Uint(dec.decode_uint32()?),
            ValueKind::Int => Value::Int(dec.decode_int32()?),
            ValueKind::Str => Value::Str(dec.decode_str()?),
            ValueKind::Bytes => Value::Bytes(dec.decode_bstr()?),
            ValueKind::Float => Value::Float(dec.decode_float()?),
            ValueKind::Bool => Value::Bool(dec.decode_bool()?),
            ValueKind::Null => {
                dec.decode_null()?;
                Value::Null
            }
            ValueKind::Array | ValueKind::Map | ValueKind::Double | ValueKind::Break => {
                return Err(CodecError::Unsupported(dec.peek_next()?).into())
            }
        };
        Ok(value)
    }

    /// Advertised type, if the value has one in Info records.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Uint(_) => Some(ValueType::Uint),
            Value::Int(_) => Some(ValueType::Int),
            Value::Str(_) => Some(ValueType::Str),
            Value::Bytes(_) => Some(ValueType::Bytes),
            Value::Float(_) => Some(ValueType::Float),
            Value::Bool(_) | Value::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uint(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => {
                f.write_str("h'")?;
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}
