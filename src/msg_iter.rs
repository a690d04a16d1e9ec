//! Iterator over the `MessageData`/`Connection` records packed inside a
//! decompressed [`Chunk`][crate::record_types::Chunk].

use bytes::Bytes;

use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::record::Record;
use crate::record_types::{Connection, MessageData};

/// A record kind that can appear inside a chunk's data section.
#[derive(Debug, Clone)]
pub enum MessageRecord {
    /// [`MessageData`] record.
    MessageData(MessageData),
    /// [`Connection`] record.
    Connection(Connection),
}

/// Iterator over records stored in a decompressed chunk's data section.
pub struct MessageRecordsIterator {
    pub(crate) cursor: Cursor,
}

impl MessageRecordsIterator {
    pub(crate) fn new(data: Bytes) -> Self {
        assert!(
            data.len() <= 1 << 32,
            "chunk length must not be bigger than 2^32"
        );
        Self {
            cursor: Cursor::new(data, 0),
        }
    }

    /// Seek to a byte offset within the chunk's uncompressed data, as given
    /// by an [`IndexData`][crate::record_types::IndexData] entry.
    pub fn seek(&mut self, offset: u32) -> Result<()> {
        self.cursor.seek(offset as u64)
    }
}

impl Iterator for MessageRecordsIterator {
    type Item = Result<MessageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.left() == 0 {
            return None;
        }
        let res = match Record::next_record(&mut self.cursor) {
            Ok(Record::MessageData(v)) => Ok(MessageRecord::MessageData(v)),
            Ok(Record::Connection(v)) => Ok(MessageRecord::Connection(v)),
            Ok(v) => Err(RosbagError::UnexpectedOpcode {
                offset: self.cursor.offset(),
                opcode: match v {
                    Record::Chunk(_) => 5,
                    Record::IndexData(_) => 4,
                    Record::ChunkInfo(_) => 6,
                    _ => unreachable!(),
                },
            }),
            Err(e) => Err(e),
        };
        Some(res)
    }
}
