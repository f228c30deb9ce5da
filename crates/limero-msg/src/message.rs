use limero_codec::{Decoder, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::{MsgError, Result};
use crate::header::MsgHeader;
use crate::info::PropertyInfo;
use crate::types::{MsgKind, PropertyId};
use crate::value::Value;

/// What follows the header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    /// Nothing after the header.
    #[default]
    Empty,
    /// Publish payload: property id to value, in wire order.
    Values(Vec<(PropertyId, Value)>),
    /// Info record.
    Info(PropertyInfo),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    fn check(&self, kind: MsgKind) -> Result<()> {
        match (kind, self) {
            (MsgKind::Alive | MsgKind::Subscribe, Body::Empty) => Ok(()),
            (MsgKind::Publish, Body::Empty | Body::Values(_)) => Ok(()),
            (MsgKind::Info, Body::Info(_)) => Ok(()),
            (MsgKind::Info, Body::Empty) => Err(MsgError::MissingBody(kind)),
            (kind, _) => Err(MsgError::UnexpectedBody(kind)),
        }
    }
}

/// A header plus its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub header: MsgHeader,
    #[serde(default, skip_serializing_if = "Body::is_empty")]
    pub body: Body,
}

impl Message {
    pub fn new(header: MsgHeader, body: Body) -> Self {
        Self { header, body }
    }

    pub fn alive() -> Self {
        Self::new(MsgHeader::new(MsgKind::Alive), Body::Empty)
    }

    /// Broadcast publish; add a destination with [`Message::to`] for a "set".
    pub fn publish(values: Vec<(PropertyId, Value)>) -> Self {
        let body = if values.is_empty() {
            Body::Empty
        } else {
            Body::Values(values)
        };
        Self::new(MsgHeader::new(MsgKind::Publish), body)
    }

    pub fn subscribe(topic: u32) -> Self {
        Self::new(MsgHeader::new(MsgKind::Subscribe), Body::Empty).to(topic)
    }

    pub fn info(info: PropertyInfo) -> Self {
        Self::new(MsgHeader::new(MsgKind::Info), Body::Info(info))
    }

    pub fn from_src(mut self, src: u32) -> Self {
        self.header.src = Some(src);
        self
    }

    pub fn to(mut self, dst: u32) -> Self {
        self.header.dst = Some(dst);
        self
    }

    pub fn with_msg_id(mut self, msg_id: u16) -> Self {
        self.header.msg_id = Some(msg_id);
        self
    }

    pub fn with_ret_code(mut self, ret_code: u32) -> Self {
        self.header.ret_code = Some(ret_code);
        self
    }

    pub fn with_qos(mut self, qos: u8) -> Self {
        self.header.qos = Some(qos);
        self
    }

    pub fn kind(&self) -> MsgKind {
        self.header.kind
    }

    /// Append header and body to `enc`. No CRC, no framing.
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        self.body.check(self.header.kind)?;
        self.header.encode(enc)?;
        match &self.body {
            Body::Empty => {}
            Body::Values(values) => {
                enc.begin_map()?;
                for (id, value) in values {
                    enc.encode_int32(i32::from(*id))?;
                    value.encode(enc)?;
                }
                enc.end_map()?;
            }
            Body::Info(info) => info.encode(enc)?,
        }
        Ok(())
    }

    /// Decode a complete message; every byte up to the end must be consumed.
    pub fn decode(dec: &mut Decoder) -> Result<Self> {
        let header = MsgHeader::decode(dec)?;
        let body = if dec.is_at_end() {
            Body::Empty
        } else {
            match header.kind {
                MsgKind::Publish => Body::Values(decode_values(dec)?),
                MsgKind::Info => Body::Info(PropertyInfo::decode(dec)?),
                kind => return Err(MsgError::UnexpectedBody(kind)),
            }
        };
        if !dec.is_at_end() {
            return Err(MsgError::TrailingData {
                offset: dec.position(),
            });
        }
        body.check(header.kind)?;
        Ok(Self { header, body })
    }
}

fn decode_values(dec: &mut Decoder) -> Result<Vec<(PropertyId, Value)>> {
    let mut values = Vec::new();
    dec.begin_map()?;
    while !dec.at_break()? {
        let raw = dec.decode_int32()?;
        let id = PropertyId::try_from(raw).map_err(|_| MsgError::InvalidValue {
            field: "prop_id",
            value: i64::from(raw),
        })?;
        values.push((id, Value::decode(dec)?));
    }
    dec.end_map()?;
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ValueMode, ValueType, OBJECT_PROPERTY_ID};
    use limero_codec::ErrorClass;

    fn roundtrip(msg: &Message) -> Message {
        let mut enc = Encoder::new(128);
        msg.encode(&mut enc).unwrap();
        let mut dec = Decoder::new(128);
        dec.fill_buffer(enc.data()).unwrap();
        Message::decode(&mut dec).unwrap()
    }

    fn decode_bytes(bytes: &[u8]) -> Result<Message> {
        let mut dec = Decoder::new(64);
        dec.fill_buffer(bytes).unwrap();
        Message::decode(&mut dec)
    }

    #[test]
    fn publish_with_values_roundtrips() {
        let msg = Message::publish(vec![
            (0, Value::Uint(1500)),
            (1, Value::Int(-20)),
            (2, Value::Float(12.5)),
            (3, Value::Str("ok".into())),
        ])
        .from_src(0x6C6D31)
        .with_msg_id(9);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn empty_publish_is_header_only() {
        let msg = Message::publish(Vec::new()).from_src(0x6C6D31);
        let mut enc = Encoder::new(32);
        msg.encode(&mut enc).unwrap();
        assert_eq!(enc.size(), 10);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn directed_publish_is_a_set() {
        let msg = Message::publish(vec![(4, Value::Bool(true))]).to(0x1234);
        assert!(!msg.header.is_broadcast());
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn info_roundtrips() {
        let info = PropertyInfo::new(OBJECT_PROPERTY_ID, "hb")
            .with_description("Hoverboard motor driver")
            .with_type(ValueType::Uint)
            .with_mode(ValueMode::Read);
        let msg = Message::info(info).from_src(1);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn subscribe_carries_topic_in_dst() {
        let msg = Message::subscribe(77);
        assert_eq!(msg.header.dst, Some(77));
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn body_must_match_kind_on_encode() {
        let mut enc = Encoder::new(64);
        let alive = Message::new(MsgHeader::new(MsgKind::Alive), Body::Values(vec![]));
        assert_eq!(
            alive.encode(&mut enc).unwrap_err(),
            MsgError::UnexpectedBody(MsgKind::Alive)
        );
        let info = Message::new(MsgHeader::new(MsgKind::Info), Body::Empty);
        assert_eq!(
            info.encode(&mut enc).unwrap_err(),
            MsgError::MissingBody(MsgKind::Info)
        );
        assert_eq!(enc.size(), 0);
    }

    #[test]
    fn alive_with_body_is_rejected_on_decode() {
        let err = decode_bytes(&[0xBF, 0x02, 0x00, 0xFF, 0xBF, 0xFF]).unwrap_err();
        assert_eq!(err, MsgError::UnexpectedBody(MsgKind::Alive));
        assert_eq!(err.class(), ErrorClass::Protocol);
    }

    #[test]
    fn info_without_body_is_rejected_on_decode() {
        let err = decode_bytes(&[0xBF, 0x02, 0x03, 0xFF]).unwrap_err();
        assert_eq!(err, MsgError::MissingBody(MsgKind::Info));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = decode_bytes(&[0xBF, 0x02, 0x01, 0xFF, 0xBF, 0xFF, 0x01]).unwrap_err();
        assert_eq!(err, MsgError::TrailingData { offset: 6 });
    }

    #[test]
    fn json_omits_empty_body() {
        let json = serde_json::to_string(&Message::alive()).unwrap();
        assert_eq!(json, r#"{"header":{"kind":"alive"}}"#);
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Message::alive());
    }
}
