use std::io::{ErrorKind, Write};

use limero_msg::{DeviceAgent, Link, LinkConfig, LinkStats, Message, PropertyTable};
use tracing::trace;

use crate::error::{Result, SerialError};

/// Writes framed messages to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    link: Link,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new writer with default buffer limits.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, LinkConfig::default())
    }

    pub fn with_config(inner: T, config: LinkConfig) -> Self {
        Self {
            inner,
            link: Link::new(config),
        }
    }

    /// Encode, frame and write one message (blocking).
    pub fn send(&mut self, msg: &Message) -> Result<()> {
        let frame = self.link.produce_frame(msg)?;
        write_all(&mut self.inner, frame)?;
        self.flush()
    }

    /// Write the next message scheduled by `agent`.
    pub fn send_next<P: PropertyTable>(&mut self, agent: &mut DeviceAgent<P>) -> Result<Message> {
        let msg = agent.next_message();
        self.send(&msg)?;
        trace!(kind = %msg.kind(), "device message sent");
        Ok(msg)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(SerialError::Io(err)),
            }
        }
    }

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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn write_all<T: Write>(inner: &mut T, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(SerialError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(SerialError::Io(err)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use limero_codec::{ErrorClass, TERMINATOR};
    use limero_msg::{Body, MsgKind, ObjectInfo, PropertyInfo, StaticTable, Value};

    use super::*;
    use crate::reader::FrameReader;

    fn written(writer: FrameWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.send(&Message::alive()).unwrap();

        let bytes = written(writer);
        assert_eq!(bytes.last(), Some(&TERMINATOR));
        assert_eq!(bytes.iter().filter(|&&b| b == TERMINATOR).count(), 1);
    }

    #[test]
    fn written_bytes_decode() {
        let msgs = [
            Message::alive().with_msg_id(1),
            Message::publish(vec![(2, Value::Str("on".into()))]).to(5),
        ];
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        for msg in &msgs {
            writer.send(msg).unwrap();
        }
        assert_eq!(writer.stats().frames_sent, 2);

        let mut reader = FrameReader::new(Cursor::new(written(writer)));
        for msg in &msgs {
            assert_eq!(&reader.read_message().unwrap(), msg);
        }
    }

    #[test]
    fn oversized_message_rejected() {
        let mut writer =
            FrameWriter::with_config(Cursor::new(Vec::new()), LinkConfig::symmetric(8));
        let msg = Message::info(PropertyInfo::new(0, "a-rather-long-name"));
        let err = writer.send(&msg).unwrap_err();
        assert_eq!(err.class(), Some(ErrorClass::Capacity));
        assert!(written(writer).is_empty());
    }

    #[test]
    fn send_next_follows_device_schedule() {
        let table = StaticTable::new(ObjectInfo::new("lm1/hb"))
            .with_property(PropertyInfo::new(0, "BATV"), Value::Uint(3600));
        let mut agent = DeviceAgent::new(table);
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));

        assert_eq!(writer.send_next(&mut agent).unwrap().kind(), MsgKind::Info);
        assert_eq!(writer.send_next(&mut agent).unwrap().kind(), MsgKind::Publish);

        let mut reader = FrameReader::new(Cursor::new(written(writer)));
        let first = reader.read_message().unwrap();
        assert!(matches!(first.body, Body::Info(ref info) if info.name == "BATV"));
        let second = reader.read_message().unwrap();
        assert_eq!(second.body, Body::Values(vec![(0, Value::Uint(3600))]));
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(&Message::alive()).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let mut writer = FrameWriter::new(FlakyWriter::new(ErrorKind::Interrupted));
        writer.send(&Message::alive()).unwrap();
        assert!(!writer.into_inner().data.is_empty());
    }

    #[test]
    fn handles_would_block_write_and_flush() {
        let mut writer = FrameWriter::new(FlakyWriter::new(ErrorKind::WouldBlock));
        writer.send(&Message::alive()).unwrap();
        assert!(!writer.into_inner().data.is_empty());
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(&Message::alive()).unwrap_err();
        assert!(matches!(err, SerialError::ConnectionClosed));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails the first write and the first flush with `kind`.
    struct FlakyWriter {
        kind: ErrorKind,
        wrote_once: bool,
        flushed_once: bool,
        data: Vec<u8>,
    }

    impl FlakyWriter {
        fn new(kind: ErrorKind) -> Self {
            Self {
                kind,
                wrote_once: false,
                flushed_once: false,
                data: Vec::new(),
            }
        }
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(self.kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flushed_once {
                self.flushed_once = true;
                return Err(std::io::Error::from(self.kind));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
