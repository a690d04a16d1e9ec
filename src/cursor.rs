//! A minimal synchronous cursor over an in-memory `Bytes` buffer.
//!
//! All record parsing happens synchronously once the necessary range of
//! bytes has been fetched from the (possibly async) byte source. This
//! cursor is how record headers, data sections, index entries, and
//! chunk-info entries get walked once that buffer is in hand.

use byteorder::{ByteOrder, LE};
use bytes::Bytes;

use crate::error::{Result, RosbagError};
use crate::time::Time;

#[derive(Clone)]
pub(crate) struct Cursor {
    buf: Bytes,
    pos: usize,
    base_offset: u64,
}

impl Cursor {
    pub(crate) fn new(buf: Bytes, base_offset: u64) -> Self {
        Self {
            buf,
            pos: 0,
            base_offset,
        }
    }

    pub(crate) fn left(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Absolute file offset of the cursor's current position.
    pub(crate) fn offset(&self) -> u64 {
        self.base_offset + self.pos as u64
    }

    fn take(&mut self, n: usize) -> Result<Bytes> {
        if self.left() < n {
            return Err(RosbagError::UnexpectedEof {
                offset: self.offset(),
            });
        }
        let slice = self.buf.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn next_bytes(&mut self, n: u64) -> Result<Bytes> {
        self.take(n as usize)
    }

    pub(crate) fn next_u32(&mut self) -> Result<u32> {
        Ok(LE::read_u32(&self.take(4)?))
    }

    pub(crate) fn next_time(&mut self) -> Result<Time> {
        let sec = self.next_u32()?;
        let nsec = self.next_u32()?;
        Ok(Time { sec, nsec })
    }

    /// Read a `[len: u32][bytes]` block, as used for record headers and
    /// data sections alike.
    pub(crate) fn next_chunk(&mut self) -> Result<Bytes> {
        let n = self.next_u32()? as u64;
        self.next_bytes(n)
    }

    /// Jump to an absolute file offset within this cursor's buffer.
    pub(crate) fn seek(&mut self, pos: u64) -> Result<()> {
        if pos < self.base_offset {
            return Err(RosbagError::UnexpectedEof { offset: pos });
        }
        let rel = (pos - self.base_offset) as usize;
        if rel > self.buf.len() {
            return Err(RosbagError::UnexpectedEof { offset: pos });
        }
        self.pos = rel;
        Ok(())
    }
}
