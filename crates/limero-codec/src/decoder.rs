use std::fmt;

use tracing::trace;

use crate::buffer::BoundedBuf;
use crate::cobs;
use crate::config::CodecConfig;
use crate::crc::{crc16, CRC_SIZE};
use crate::encoder::write_hex;
use crate::error::{CodecError, Result};
use crate::marker::{
    ValueKind, ARG_U16, ARG_U32, ARG_U8, ARRAY_START, BREAK, INFO_MASK, MAP_START, MAX_INLINE,
    TRUE,
};

/// Reads values back out of a capacity-bounded buffer.
///
/// Every `decode_*` call validates the marker before consuming anything and
/// restores the cursor if the value turns out to be truncated, so a failed
/// call never leaves the decoder half-way through a value.
#[derive(Debug, Clone)]
pub struct Decoder {
    buf: BoundedBuf,
    pos: usize,
    /// End of the readable window; excludes a verified checksum trailer.
    end: usize,
}

impl Decoder {
    /// Create a decoder that accepts at most `max` bytes.
    pub fn new(max: usize) -> Self {
        Self {
            buf: BoundedBuf::new(max),
            pos: 0,
            end: 0,
        }
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self::new(config.max_frame_size)
    }

    /// Replace the contents with `bytes` and rewind.
    ///
    /// Inputs larger than the configured maximum are rejected up front.
    pub fn fill_buffer(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.replace(bytes)?;
        self.pos = 0;
        self.end = self.buf.len();
        Ok(())
    }

    pub(crate) fn push_byte(&mut self, byte: u8) -> Result<()> {
        self.buf.push(byte)?;
        self.end = self.buf.len();
        Ok(())
    }

    pub fn peek_next(&self) -> Result<u8> {
        if self.pos >= self.end {
            return Err(CodecError::EndOfBuffer { offset: self.pos });
        }
        Ok(self.buf.as_slice()[self.pos])
    }

    pub fn read_next(&mut self) -> Result<u8> {
        let byte = self.peek_next()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Classify the next value without consuming it.
    pub fn peek_type(&self) -> Result<ValueKind> {
        let marker = self.peek_next()?;
        ValueKind::classify(marker).ok_or(CodecError::Unsupported(marker))
    }

    /// True when the next byte closes the current array or map.
    pub fn at_break(&self) -> Result<bool> {
        Ok(self.peek_next()? == BREAK)
    }

    pub fn decode_uint32(&mut self) -> Result<u32> {
        self.atomically(|dec| {
            let marker = dec.expect(ValueKind::Uint)?;
            dec.read_argument(marker)
        })
    }

    /// Decode a signed integer written in either the unsigned or negative form.
    pub fn decode_int32(&mut self) -> Result<i32> {
        self.atomically(|dec| {
            let marker = dec.peek_next()?;
            match ValueKind::classify(marker) {
                Some(ValueKind::Uint) => {
                    dec.pos += 1;
                    let value = dec.read_argument(marker)?;
                    i32::try_from(value).map_err(|_| CodecError::OutOfRange { target: "i32" })
                }
                Some(ValueKind::Int) => {
                    dec.pos += 1;
                    let encoded = dec.read_argument(marker)?;
                    let encoded = i32::try_from(encoded)
                        .map_err(|_| CodecError::OutOfRange { target: "i32" })?;
                    // -(n + 1) without overflow at i32::MIN
                    Ok(-1 - encoded)
                }
                _ => Err(CodecError::TypeMismatch {
                    expected: ValueKind::Int,
                    found: marker,
                }),
            }
        })
    }

    pub fn decode_uint8(&mut self) -> Result<u8> {
        self.atomically(|dec| {
            let value = dec.decode_uint32()?;
            u8::try_from(value).map_err(|_| CodecError::OutOfRange { target: "u8" })
        })
    }

    /// Signed counterpart of [`Decoder::decode_uint8`], as used for property ids.
    pub fn decode_int8(&mut self) -> Result<i8> {
        self.atomically(|dec| {
            let value = dec.decode_int32()?;
            i8::try_from(value).map_err(|_| CodecError::OutOfRange { target: "i8" })
        })
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        let marker = self.expect(ValueKind::Bool)?;
        self.pos += 1;
        Ok(marker == TRUE)
    }

    pub fn decode_null(&mut self) -> Result<()> {
        self.expect(ValueKind::Null)?;
        self.pos += 1;
        Ok(())
    }

    pub fn decode_float(&mut self) -> Result<f32> {
        self.atomically(|dec| {
            dec.expect(ValueKind::Float)?;
            dec.pos += 1;
            let bytes = dec.take(4)?;
            let bits = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            Ok(f32::from_bits(bits))
        })
    }

    pub fn decode_str(&mut self) -> Result<String> {
        self.atomically(|dec| {
            let bytes = dec.short_payload(ValueKind::Str)?;
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| CodecError::InvalidUtf8)
        })
    }

    pub fn decode_bstr(&mut self) -> Result<Vec<u8>> {
        self.atomically(|dec| dec.short_payload(ValueKind::Bytes).map(<[u8]>::to_vec))
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.expect_exact(ValueKind::Array, ARRAY_START)
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.expect_exact(ValueKind::Break, BREAK)
    }

    pub fn begin_map(&mut self) -> Result<()> {
        self.expect_exact(ValueKind::Map, MAP_START)
    }

    pub fn end_map(&mut self) -> Result<()> {
        self.expect_exact(ValueKind::Break, BREAK)
    }

    /// Verify the big-endian CRC-16 trailer over the rest of the buffer.
    ///
    /// On success the readable window shrinks so that value decoding stops
    /// before the trailer.
    pub fn check_crc(&mut self) -> Result<()> {
        let data = self.buf.as_slice();
        if data.len() < CRC_SIZE {
            return Err(CodecError::TooShort { len: data.len() });
        }
        let split = data.len() - CRC_SIZE;
        let received = u16::from_be_bytes([data[split], data[split + 1]]);
        let computed = crc16(&data[..split]);
        if received != computed {
            return Err(CodecError::Crc { received, computed });
        }
        self.end = split;
        self.pos = self.pos.min(split);
        Ok(())
    }

    /// Undo byte stuffing in place and rewind.
    ///
    /// An empty result is a framing error, never an empty frame. On failure
    /// the buffer is cleared.
    pub fn decode_framing(&mut self) -> Result<()> {
        let framed = self.buf.len();
        match cobs::decode_in_place(self.buf.as_mut_slice()) {
            Ok(len) if len > 0 => {
                self.buf.truncate(len);
                self.pos = 0;
                self.end = len;
                trace!(framed, len, "frame unstuffed");
                Ok(())
            }
            _ => {
                self.clear();
                Err(CodecError::Framing)
            }
        }
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.pos = 0;
        self.end = 0;
    }

    /// True once every readable byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.buf.max()
    }

    /// The whole buffer, including any checksum trailer.
    pub fn data(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// The readable window (payload without a verified trailer).
    pub fn payload(&self) -> &[u8] {
        &self.buf.as_slice()[..self.end]
    }

    fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.pos;
        let result = f(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// Peek the marker and check its kind without consuming it.
    fn expect(&self, expected: ValueKind) -> Result<u8> {
        let marker = self.peek_next()?;
        match ValueKind::classify(marker) {
            Some(kind) if kind == expected => Ok(marker),
            _ => Err(CodecError::TypeMismatch {
                expected,
                found: marker,
            }),
        }
    }

    fn expect_exact(&mut self, expected: ValueKind, marker: u8) -> Result<()> {
        let found = self.peek_next()?;
        if found != marker {
            return Err(CodecError::TypeMismatch { expected, found });
        }
        self.pos += 1;
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let start = self.pos;
        let stop = start + len;
        if stop > self.end {
            return Err(CodecError::EndOfBuffer { offset: self.end });
        }
        self.pos = stop;
        Ok(&self.buf.as_slice()[start..stop])
    }

    /// Argument of an integer marker that has already been consumed.
    fn read_argument(&mut self, marker: u8) -> Result<u32> {
        let info = marker & INFO_MASK;
        let value = match info {
            _ if u32::from(info) <= MAX_INLINE => u32::from(info),
            ARG_U8 => u32::from(self.take(1)?[0]),
            ARG_U16 => {
                let b = self.take(2)?;
                u32::from(u16::from_be_bytes([b[0], b[1]]))
            }
            ARG_U32 => {
                let b = self.take(4)?;
                u32::from_be_bytes([b[0], b[1], b[2], b[3]])
            }
            _ => return Err(CodecError::Unsupported(marker)),
        };
        Ok(value)
    }

    /// Consume a short-form string marker of `kind` and return its bytes.
    fn short_payload(&mut self, kind: ValueKind) -> Result<&[u8]> {
        let marker = self.expect(kind)?;
        self.pos += 1;
        let len = usize::from(marker & INFO_MASK);
        self.take(len)
    }
}

/// Hex dump of the buffer.
impl fmt::Display for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, self.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use proptest::prelude::*;

    fn decoder_for(bytes: &[u8]) -> Decoder {
        let mut dec = Decoder::new(256);
        dec.fill_buffer(bytes).unwrap();
        dec
    }

    fn encode_with(f: impl FnOnce(&mut Encoder) -> Result<()>) -> Decoder {
        let mut enc = Encoder::new(256);
        f(&mut enc).unwrap();
        decoder_for(enc.data())
    }

    #[test]
    fn narrow_integers_are_range_checked() {
        let mut dec = encode_with(|enc| {
            enc.encode_uint32(255)?;
            enc.encode_uint32(256)?;
            enc.encode_int32(-128)?;
            enc.encode_int32(-129)?;
            enc.encode_int32(127)
        });
        assert_eq!(dec.decode_uint8().unwrap(), 255);

        let err = dec.decode_uint8().unwrap_err();
        assert_eq!(err, CodecError::OutOfRange { target: "u8" });
        assert_eq!(dec.decode_uint32().unwrap(), 256);

        assert_eq!(dec.decode_int8().unwrap(), -128);
        assert!(dec.decode_int8().is_err());
        assert_eq!(dec.decode_int32().unwrap(), -129);
        assert_eq!(dec.decode_int8().unwrap(), 127);
        assert!(dec.is_at_end());
    }

    #[test]
    fn peek_type_classifies_without_consuming() {
        let dec = decoder_for(&[0x62, b'h', b'b']);
        assert_eq!(dec.peek_type().unwrap(), ValueKind::Str);
        assert_eq!(dec.position(), 0);
    }

    #[test]
    fn peek_type_rejects_unknown_marker() {
        let dec = decoder_for(&[0xC1]);
        assert!(matches!(dec.peek_type(), Err(CodecError::Unsupported(0xC1))));
    }

    #[test]
    fn read_past_end_reports_end_of_buffer() {
        let mut dec = decoder_for(&[0x01]);
        assert_eq!(dec.read_next().unwrap(), 0x01);
        let err = dec.read_next().unwrap_err();
        assert!(matches!(err, CodecError::EndOfBuffer { offset: 1 }));
        assert!(err.is_need_more());
    }

    #[test]
    fn type_mismatch_consumes_nothing() {
        let mut dec = decoder_for(&[0x62, b'h', b'b']);
        let err = dec.decode_uint32().unwrap_err();
        assert!(matches!(
            err,
            CodecError::TypeMismatch {
                expected: ValueKind::Uint,
                found: 0x62
            }
        ));
        assert_eq!(dec.position(), 0);
        assert_eq!(dec.decode_str().unwrap(), "hb");
        assert!(dec.is_at_end());
    }

    #[test]
    fn truncated_value_restores_cursor() {
        let mut dec = decoder_for(&[0x1A, 0x00, 0x01]);
        assert!(matches!(
            dec.decode_uint32(),
            Err(CodecError::EndOfBuffer { .. })
        ));
        assert_eq!(dec.position(), 0);

        let mut dec = decoder_for(&[0x65, b'a', b'b']);
        assert!(dec.decode_str().is_err());
        assert_eq!(dec.position(), 0);
    }

    #[test]
    fn eight_byte_integers_are_unsupported() {
        let mut dec = decoder_for(&[0x1B, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert!(matches!(dec.decode_uint32(), Err(CodecError::Unsupported(0x1B))));
        let mut dec = decoder_for(&[0x3B, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert!(matches!(dec.decode_int32(), Err(CodecError::Unsupported(0x3B))));
    }

    #[test]
    fn int32_boundaries_roundtrip() {
        let values = [
            0,
            1,
            23,
            24,
            -1,
            -24,
            -25,
            -256,
            -257,
            -65536,
            -65537,
            i32::MIN,
            i32::MAX,
        ];
        for value in values {
            let mut dec = encode_with(|e| e.encode_int32(value));
            assert_eq!(dec.decode_int32().unwrap(), value, "value {value}");
            assert!(dec.is_at_end());
        }
    }

    #[test]
    fn int32_rejects_values_outside_range() {
        let mut dec = encode_with(|e| e.encode_uint32(u32::MAX));
        assert!(matches!(
            dec.decode_int32(),
            Err(CodecError::OutOfRange { target: "i32" })
        ));
        assert_eq!(dec.position(), 0);

        let mut dec = decoder_for(&[0x3A, 0x80, 0x00, 0x00, 0x00]);
        assert!(matches!(dec.decode_int32(), Err(CodecError::OutOfRange { .. })));
    }

    #[test]
    fn simple_values_roundtrip() {
        let mut dec = encode_with(|e| {
            e.encode_bool(true)?;
            e.encode_bool(false)?;
            e.encode_null()?;
            e.encode_float(-0.25)?;
            e.encode_bstr(&[0, 1, 2])
        });
        assert!(dec.decode_bool().unwrap());
        assert!(!dec.decode_bool().unwrap());
        dec.decode_null().unwrap();
        assert_eq!(dec.decode_float().unwrap(), -0.25);
        assert_eq!(dec.decode_bstr().unwrap(), vec![0, 1, 2]);
        assert!(dec.is_at_end());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut dec = decoder_for(&[0x62, 0xC3, 0x28]);
        assert!(matches!(dec.decode_str(), Err(CodecError::InvalidUtf8)));
        assert_eq!(dec.position(), 0);
    }

    #[test]
    fn containers_detect_break_by_peeking() {
        let mut dec = encode_with(|e| {
            e.begin_map()?;
            e.add_map_entry(1, 2)?;
            e.add_map_entry(3, -4)?;
            e.end_map()?;
            e.begin_array()?;
            e.encode_str("x")?;
            e.end_array()
        });

        dec.begin_map().unwrap();
        let mut entries = Vec::new();
        while !dec.at_break().unwrap() {
            entries.push((dec.decode_int32().unwrap(), dec.decode_int32().unwrap()));
        }
        dec.end_map().unwrap();
        assert_eq!(entries, vec![(1, 2), (3, -4)]);

        dec.begin_array().unwrap();
        assert_eq!(dec.decode_str().unwrap(), "x");
        dec.end_array().unwrap();
        assert!(dec.is_at_end());
    }

    #[test]
    fn missing_break_surfaces_as_end_of_buffer() {
        let mut dec = decoder_for(&[0xBF, 0x01, 0x02]);
        dec.begin_map().unwrap();
        assert_eq!(dec.decode_uint32().unwrap(), 1);
        assert_eq!(dec.decode_uint32().unwrap(), 2);
        assert!(matches!(dec.at_break(), Err(CodecError::EndOfBuffer { .. })));
    }

    #[test]
    fn begin_map_rejects_array() {
        let mut dec = decoder_for(&[0x9F, 0xFF]);
        assert!(matches!(
            dec.begin_map(),
            Err(CodecError::TypeMismatch {
                expected: ValueKind::Map,
                found: 0x9F
            })
        ));
    }

    #[test]
    fn check_crc_accepts_and_hides_trailer() {
        let mut enc = Encoder::new(32);
        enc.encode_uint32(7).unwrap();
        enc.add_crc().unwrap();

        let mut dec = decoder_for(enc.data());
        dec.check_crc().unwrap();
        assert_eq!(dec.payload(), &[0x07]);
        assert_eq!(dec.decode_uint32().unwrap(), 7);
        assert!(dec.is_at_end());
        assert!(matches!(dec.read_next(), Err(CodecError::EndOfBuffer { .. })));
    }

    #[test]
    fn check_crc_detects_every_single_bit_flip() {
        let mut enc = Encoder::new(64);
        enc.begin_map().unwrap();
        enc.add_map_entry(1, 0x6C6D31).unwrap();
        enc.end_map().unwrap();
        enc.add_crc().unwrap();
        let frame = enc.data().to_vec();

        for byte in 0..frame.len() {
            for bit in 0..8 {
                let mut mutated = frame.clone();
                mutated[byte] ^= 1 << bit;
                let mut dec = decoder_for(&mutated);
                let err = dec.check_crc().unwrap_err();
                assert!(matches!(err, CodecError::Crc { .. }), "byte {byte} bit {bit}");
                assert_eq!(err.class(), crate::ErrorClass::Integrity);
            }
        }
    }

    #[test]
    fn check_crc_needs_two_bytes() {
        let mut dec = decoder_for(&[0x01]);
        assert!(matches!(dec.check_crc(), Err(CodecError::TooShort { len: 1 })));
    }

    #[test]
    fn decode_framing_in_place() {
        let mut enc = Encoder::new(32);
        enc.encode_uint32(0).unwrap();
        enc.encode_str("ok").unwrap();
        let raw = enc.data().to_vec();
        enc.add_framing().unwrap();

        let framed = enc.data();
        let mut dec = decoder_for(&framed[..framed.len() - 1]);
        dec.decode_framing().unwrap();
        assert_eq!(dec.data(), raw.as_slice());
        assert_eq!(dec.decode_uint32().unwrap(), 0);
        assert_eq!(dec.decode_str().unwrap(), "ok");
    }

    #[test]
    fn decode_framing_rejects_empty_and_malformed() {
        let mut dec = decoder_for(&[0x01]);
        assert!(matches!(dec.decode_framing(), Err(CodecError::Framing)));
        assert!(dec.is_empty());

        let mut dec = decoder_for(&[0x09, 0x11]);
        assert!(matches!(dec.decode_framing(), Err(CodecError::Framing)));
    }

    #[test]
    fn fill_buffer_rejects_oversized_input() {
        let mut dec = Decoder::new(2);
        let err = dec.fill_buffer(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CodecError::Capacity { needed: 3, max: 2 }));
    }

    #[test]
    fn rewind_and_clear() {
        let mut dec = decoder_for(&[0x05]);
        assert_eq!(dec.decode_uint32().unwrap(), 5);
        dec.rewind();
        assert_eq!(dec.decode_uint32().unwrap(), 5);
        dec.clear();
        assert!(dec.is_empty());
        assert!(dec.is_at_end());
    }

    proptest! {
        #[test]
        fn uint32_roundtrip(value in any::<u32>()) {
            let mut dec = encode_with(|e| e.encode_uint32(value));
            prop_assert_eq!(dec.decode_uint32().unwrap(), value);
            prop_assert!(dec.is_at_end());
        }

        #[test]
        fn int32_roundtrip(value in any::<i32>()) {
            let mut dec = encode_with(|e| e.encode_int32(value));
            prop_assert_eq!(dec.decode_int32().unwrap(), value);
        }

        #[test]
        fn float_roundtrip(value in any::<f32>().prop_filter("finite", |v| v.is_finite())) {
            let mut dec = encode_with(|e| e.encode_float(value));
            prop_assert_eq!(dec.decode_float().unwrap().to_bits(), value.to_bits());
        }

        #[test]
        fn str_roundtrip(value in "[a-zA-Z0-9 /_.-]{0,31}") {
            let mut dec = encode_with(|e| e.encode_str(&value));
            prop_assert_eq!(dec.decode_str().unwrap(), value);
        }

        #[test]
        fn bstr_roundtrip(value in proptest::collection::vec(any::<u8>(), 0..=31)) {
            let mut dec = encode_with(|e| e.encode_bstr(&value));
            prop_assert_eq!(dec.decode_bstr().unwrap(), value);
        }
    }
}
