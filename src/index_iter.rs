//! Iterator over the index section of a bag file (`Connection` and
//! `ChunkInfo` records), read directly from an in-memory buffer.
//!
//! Superseded for normal use by
//! [`crate::reader::BagReader::read_connections_and_chunk_infos`]; kept for
//! callers that have already loaded the index section into memory.

use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::record::Record;
use crate::record_types::{ChunkInfo, Connection};

/// A record kind that can appear in the index section.
#[derive(Debug, Clone)]
pub enum IndexSectionRecord {
    /// [`Connection`] record.
    Connection(Connection),
    /// [`ChunkInfo`] record.
    ChunkInfo(ChunkInfo),
}

/// Iterator over records stored in the index section of a bag file.
pub struct IndexSectionIterator {
    cursor: Cursor,
}

impl IndexSectionIterator {
    pub(crate) fn new(cursor: Cursor) -> Self {
        Self { cursor }
    }

    /// Jump to the given absolute file offset.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.cursor.seek(pos)
    }
}

impl Iterator for IndexSectionIterator {
    type Item = Result<IndexSectionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.left() == 0 {
            return None;
        }
        let res = match Record::next_record(&mut self.cursor) {
            Ok(Record::Connection(v)) => Ok(IndexSectionRecord::Connection(v)),
            Ok(Record::ChunkInfo(v)) => Ok(IndexSectionRecord::ChunkInfo(v)),
            Ok(v) => Err(RosbagError::UnexpectedOpcode {
                offset: self.cursor.offset(),
                opcode: match v {
                    Record::Chunk(_) => 5,
                    Record::MessageData(_) => 2,
                    Record::IndexData(_) => 4,
                    _ => unreachable!(),
                },
            }),
            Err(e) => Err(e),
        };
        Some(res)
    }
}
