use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use limero_codec::{CodecError, TERMINATOR};
use limero_msg::{Link, LinkConfig, LinkStats, Message, MsgError};
use tracing::debug;

use crate::error::{Result, SerialError};

const READ_CHUNK_SIZE: usize = 512;

/// Reads complete messages from any `Read` stream.
///
/// Frames that fail to decode are counted and skipped; callers only ever
/// see valid messages or stream errors.
pub struct FrameReader<T> {
    inner: T,
    pending: BytesMut,
    link: Link,
    frame_len: usize,
    last_frame_len: usize,
}

impl<T: Read> FrameReader<T> {
    /// Create a new reader with default buffer limits.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, LinkConfig::default())
    }

    pub fn with_config(inner: T, config: LinkConfig) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
            link: Link::new(config),
            frame_len: 0,
            last_frame_len: 0,
        }
    }

    /// Read the next valid message (blocking).
    ///
    /// Returns `Err(SerialError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(msg) = self.drain_pending() {
                return Ok(msg);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SerialError::Io(err)),
            };

            if read == 0 {
                return Err(SerialError::ConnectionClosed);
            }

            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    fn drain_pending(&mut self) -> Option<Message> {
        while self.pending.has_remaining() {
            let byte = self.pending.get_u8();
            self.frame_len += 1;
            if byte == TERMINATOR {
                self.last_frame_len = std::mem::take(&mut self.frame_len);
            }
            match self.link.accept_byte(byte) {
                Ok(state) if state.is_complete() => match self.link.take_message() {
                    Ok(msg) => return Some(msg),
                    Err(err) => debug!(error = %err, class = %err.class(), "skipping frame"),
                },
                Ok(_) => {}
                // the link skips ahead to the terminator that ends this frame
                Err(MsgError::Codec(CodecError::Capacity { max, .. })) => {
                    debug!(max, "frame overflowed, waiting for terminator");
                }
                Err(_) => {}
            }
        }
        None
    }

    /// Wire size of the last frame, terminator included.
    pub fn last_frame_len(&self) -> usize {
        self.last_frame_len
    }

    /// Frame counters for this stream.
    pub fn stats(&self) -> LinkStats {
        self.link.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use limero_codec::{frame_encode, Encoder};
    use limero_msg::{MsgKind, PropertyInfo, Value};

    use super::*;

    fn wire(messages: &[Message]) -> Vec<u8> {
        let mut link = Link::default();
        let mut out = Vec::new();
        for msg in messages {
            out.extend_from_slice(link.produce_frame(msg).unwrap());
        }
        out
    }

    #[test]
    fn read_single_message() {
        let msg = Message::alive().from_src(1);
        let bytes = wire(&[msg.clone()]);
        let mut reader = FrameReader::new(Cursor::new(bytes.clone()));
        assert_eq!(reader.read_message().unwrap(), msg);
        assert_eq!(reader.last_frame_len(), bytes.len());
    }

    #[test]
    fn read_multiple_messages() {
        let msgs = vec![
            Message::alive(),
            Message::publish(vec![(0, Value::Uint(7))]),
            Message::info(PropertyInfo::new(0, "BATV")),
        ];
        let mut reader = FrameReader::new(Cursor::new(wire(&msgs)));
        for expected in &msgs {
            assert_eq!(&reader.read_message().unwrap(), expected);
        }
        assert!(matches!(
            reader.read_message().unwrap_err(),
            SerialError::ConnectionClosed
        ));
    }

    #[test]
    fn partial_read_handling() {
        let msg = Message::subscribe(9);
        let byte_reader = ByteByByteReader {
            bytes: wire(&[msg.clone()]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);
        assert_eq!(reader.read_message().unwrap(), msg);
    }

    #[test]
    fn leading_idle_bytes_are_ignored() {
        let mut bytes = vec![0, 0, 0];
        bytes.extend(wire(&[Message::alive()]));
        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_message().unwrap().kind(), MsgKind::Alive);
    }

    #[test]
    fn garbled_frame_is_skipped() {
        let mut enc = Encoder::new(64);
        Message::alive().encode(&mut enc).unwrap();
        enc.add_crc().unwrap();
        let mut raw = enc.data().to_vec();
        raw[2] ^= 0x80;

        let mut bytes = frame_encode(&raw);
        bytes.extend(wire(&[Message::publish(Vec::new())]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_message().unwrap().kind(), MsgKind::Publish);
        assert_eq!(reader.stats().garbled, 1);
        assert_eq!(reader.stats().frames_received, 1);
    }

    #[test]
    fn overflowed_frame_resynchronizes() {
        let mut bytes = vec![0x55; 64];
        bytes.push(TERMINATOR);
        bytes.extend(wire(&[Message::alive()]));

        let mut reader = FrameReader::with_config(Cursor::new(bytes), LinkConfig::symmetric(32));
        assert_eq!(reader.read_message().unwrap(), Message::alive());
        assert_eq!(reader.stats().overflowed, 1);
    }

    #[test]
    fn connection_closed_mid_frame() {
        let full = wire(&[Message::alive()]);
        let partial = full[..full.len() - 1].to_vec();
        let mut reader = FrameReader::new(Cursor::new(partial));
        assert!(matches!(
            reader.read_message().unwrap_err(),
            SerialError::ConnectionClosed
        ));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: wire(&[Message::alive()]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        assert_eq!(framed.read_message().unwrap(), Message::alive());
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut framed = FrameReader::new(FailingReader);
        let err = framed.read_message().unwrap_err();
        assert!(matches!(err, SerialError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let msg = Message::publish(vec![(1, Value::Int(-40))]).from_src(3);
        writer.send(&msg).unwrap();
        assert_eq!(reader.read_message().unwrap(), msg);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}
