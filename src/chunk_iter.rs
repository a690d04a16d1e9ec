//! Iterator over the chunk section of a bag file (`Chunk`/`IndexData`
//! groups), read directly from an in-memory buffer.
//!
//! Superseded for normal use by [`crate::reader::BagReader::read_chunk`],
//! which fetches each chunk's bytes from a [`crate::collaborators::Filelike`]
//! source on demand; this iterator remains useful when the whole chunk
//! section has already been loaded into memory.

use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::record::Record;
use crate::record_types::{Chunk, IndexData};

/// A record kind that can appear in the chunk section.
#[derive(Debug, Clone)]
pub enum ChunkSectionRecord {
    /// [`Chunk`] record.
    Chunk(Chunk),
    /// [`IndexData`] record.
    IndexData(IndexData),
}

/// Iterator over records stored in the chunk section of a bag file.
pub struct ChunkSectionIterator {
    cursor: Cursor,
}

impl ChunkSectionIterator {
    pub(crate) fn new(cursor: Cursor) -> Self {
        Self { cursor }
    }

    /// Jump to the given absolute file offset.
    ///
    /// Only record-start offsets (e.g. a `ChunkInfo.chunk_pos`) are safe
    /// targets; anything else fails on the next call to `next`.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.cursor.seek(pos)
    }
}

impl Iterator for ChunkSectionIterator {
    type Item = Result<ChunkSectionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.left() == 0 {
            return None;
        }
        let res = match Record::next_record(&mut self.cursor) {
            Ok(Record::Chunk(v)) => Ok(ChunkSectionRecord::Chunk(v)),
            Ok(Record::IndexData(v)) => Ok(ChunkSectionRecord::IndexData(v)),
            Ok(v) => Err(RosbagError::UnexpectedOpcode {
                offset: self.cursor.offset(),
                opcode: match v {
                    Record::Connection(_) => 7,
                    Record::MessageData(_) => 2,
                    Record::ChunkInfo(_) => 6,
                    _ => unreachable!(),
                },
            }),
            Err(e) => Err(e),
        };
        Some(res)
    }
}
