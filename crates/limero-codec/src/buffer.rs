use bytes::{BufMut, BytesMut};

use crate::error::{CodecError, Result};

/// Byte buffer that never grows past a fixed maximum.
///
/// Every mutating operation either completes fully or fails with
/// [`CodecError::Capacity`] and leaves the contents untouched. The backing
/// storage is reserved once, up front.
#[derive(Debug, Clone)]
pub struct BoundedBuf {
    buf: BytesMut,
    max: usize,
}

impl BoundedBuf {
    pub fn new(max: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max),
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured maximum length.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.max - self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Fail unless `additional` more bytes fit.
    pub fn ensure(&self, additional: usize) -> Result<()> {
        let needed = self.buf.len().saturating_add(additional);
        if needed > self.max {
            return Err(CodecError::Capacity {
                needed,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.ensure(1)?;
        self.buf.put_u8(byte);
        Ok(())
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Replace the whole contents with `bytes`.
    pub fn replace(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.max {
            return Err(CodecError::Capacity {
                needed: bytes.len(),
                max: self.max,
            });
        }
        self.buf.clear();
        self.buf.put_slice(bytes);
        Ok(())
    }
}

impl AsRef<[u8]> for BoundedBuf {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
