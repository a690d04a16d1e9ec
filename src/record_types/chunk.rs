//! `Chunk` (opcode 5): bulk, optionally compressed storage for `MessageData`
//! and `Connection` records.

use bytes::{Bytes, BytesMut};

use super::utils::{set_field_u32, unknown_field, write_u32};
use super::{HeaderGen, RecordGen};
use crate::collaborators::Decompressor;
use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::fields::compose_fields;
use crate::msg_iter::MessageRecordsIterator;

/// Compression codec tagging a `Chunk`'s data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Compression {
    /// Bzip2 compression.
    Bzip2,
    /// Lz4 compression.
    Lz4,
    /// No compression.
    None,
}

impl Compression {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Bzip2 => "bz2",
            Compression::Lz4 => "lz4",
        }
    }

    fn from_bytes(val: &Bytes, offset: u64) -> Result<Self> {
        match &val[..] {
            b"none" => Ok(Compression::None),
            b"bz2" => Ok(Compression::Bzip2),
            b"lz4" => Ok(Compression::Lz4),
            _ => Err(RosbagError::Corrupt {
                offset,
                reason: format!("unknown compression codec {:?}", String::from_utf8_lossy(val)),
            }),
        }
    }
}

/// Bulk storage with optional compression for `MessageData` and
/// `Connection` records.
///
/// Parsing never decompresses eagerly (spec.md §4.3): `data` holds exactly
/// the bytes that were on disk. Call [`Chunk::decompress`] with a
/// [`Decompressor`] to obtain the uncompressed payload.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Compression codec for `data`.
    pub compression: Compression,
    /// Declared uncompressed size in bytes.
    pub size: u32,
    data: Bytes,
}

impl Chunk {
    /// Decompress this chunk's data section, checking the result against
    /// the declared `size`.
    pub fn decompress(&self, decompressor: &dyn Decompressor) -> Result<Bytes> {
        let out = decompressor.decompress(self.compression.as_str(), self.data.clone(), Some(self.size))?;
        if out.len() != self.size as usize {
            return Err(RosbagError::Corrupt {
                offset: 0,
                reason: format!(
                    "chunk declared size {} but decompressed to {} bytes",
                    self.size,
                    out.len()
                ),
            });
        }
        Ok(out)
    }

    /// Decompress and iterate over the `MessageData`/`Connection` records
    /// stored inside.
    pub fn messages(&self, decompressor: &dyn Decompressor) -> Result<MessageRecordsIterator> {
        Ok(MessageRecordsIterator::new(self.decompress(decompressor)?))
    }

    /// The raw (possibly compressed) data section, as read from disk.
    pub(crate) fn raw_data(&self) -> &Bytes {
        &self.data
    }

    /// Construct a `Chunk` directly from already-encoded bytes, e.g. from
    /// [`crate::composer::create_chunk`].
    pub(crate) fn new(compression: Compression, size: u32, data: Bytes) -> Self {
        Self {
            compression,
            size,
            data,
        }
    }

    pub(crate) fn compose(&self) -> BytesMut {
        let header = compose_fields([
            ("compression", self.compression.as_str().as_bytes().to_vec()),
            ("size", self.size.to_le_bytes().to_vec()),
            ("op", vec![ChunkHeader::OP]),
        ]);
        let mut out = BytesMut::with_capacity(4 + header.len() + 4 + self.data.len());
        write_u32(&mut out, header.len() as u32);
        out.extend_from_slice(&header);
        write_u32(&mut out, self.data.len() as u32);
        out.extend_from_slice(&self.data);
        out
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ChunkHeader {
    compression: Option<Compression>,
    size: Option<u32>,
}

impl RecordGen for Chunk {
    type Header = ChunkHeader;

    fn read_data(c: &mut Cursor, header: Self::Header) -> Result<Self> {
        let offset = c.offset();
        let compression = header.compression.ok_or(RosbagError::Corrupt {
            offset,
            reason: "Chunk missing compression field".into(),
        })?;
        let size = header.size.ok_or(RosbagError::Corrupt {
            offset,
            reason: "Chunk missing size field".into(),
        })?;
        let data = c.next_chunk()?;
        Ok(Self {
            compression,
            size,
            data,
        })
    }
}

impl HeaderGen for ChunkHeader {
    const OP: u8 = 0x05;

    fn process_field(&mut self, name: &str, val: &Bytes, base_offset: u64) -> Result<()> {
        match name {
            "compression" => {
                if self.compression.is_some() {
                    return Err(RosbagError::Corrupt {
                        offset: base_offset,
                        reason: "duplicate compression field".into(),
                    });
                }
                self.compression = Some(Compression::from_bytes(val, base_offset)?);
            }
            "size" => set_field_u32(&mut self.size, val, base_offset)?,
            _ => unknown_field(name, val),
        }
        Ok(())
    }
}
