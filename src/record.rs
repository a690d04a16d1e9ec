//! The dispatcher over all record kinds a reader can encounter mid-stream.
//!
//! `BagHeader` is parsed separately (see [`crate::record_types::bag_header`])
//! since it only ever appears once, at a fixed offset; it never shows up
//! while walking the chunk or index sections, so it has no place in this
//! enum.

use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::fields::extract_fields;
use crate::record_types::{Chunk, ChunkInfo, Connection, IndexData, MessageData, RecordGen};

/// One record read from the chunk or index section of a bag.
#[derive(Debug, Clone)]
pub(crate) enum Record {
    Chunk(Chunk),
    Connection(Connection),
    MessageData(MessageData),
    IndexData(IndexData),
    ChunkInfo(ChunkInfo),
}

impl Record {
    pub(crate) fn next_record(c: &mut Cursor) -> Result<Self> {
        let record_offset = c.offset();
        let header = c.next_chunk()?;
        let header_offset = record_offset + 4;

        let mut op = None;
        for (name, val) in extract_fields(header.clone(), header_offset)? {
            if name == "op" {
                if val.len() == 1 {
                    op = Some(val[0]);
                    break;
                } else {
                    return Err(RosbagError::Corrupt {
                        offset: header_offset,
                        reason: "op field must be exactly one byte".into(),
                    });
                }
            }
        }

        Ok(match op {
            Some(IndexData::OP) => Record::IndexData(IndexData::read(header, header_offset, c)?),
            Some(Chunk::OP) => Record::Chunk(Chunk::read(header, header_offset, c)?),
            Some(ChunkInfo::OP) => Record::ChunkInfo(ChunkInfo::read(header, header_offset, c)?),
            Some(Connection::OP) => Record::Connection(Connection::read(header, header_offset, c)?),
            Some(MessageData::OP) => Record::MessageData(MessageData::read(header, header_offset, c)?),
            Some(opcode) => {
                return Err(RosbagError::UnexpectedOpcode {
                    offset: header_offset,
                    opcode,
                })
            }
            None => {
                return Err(RosbagError::MissingOp {
                    offset: header_offset,
                })
            }
        })
    }

    /// Name of the stored record's kind, for diagnostics.
    pub fn get_type(&self) -> &'static str {
        match self {
            Record::Chunk(_) => "Chunk",
            Record::Connection(_) => "Connection",
            Record::MessageData(_) => "MessageData",
            Record::IndexData(_) => "IndexData",
            Record::ChunkInfo(_) => "ChunkInfo",
        }
    }
}
