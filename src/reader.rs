//! C5: the Reader, turns a random-access byte source into a [`Bag`] model,
//! and fetches individual chunks on demand.

use std::collections::HashMap;

use bytes::Bytes;

use crate::collaborators::{Decompressor, Filelike};
use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::model::Bag;
use crate::record::Record;
use crate::record_types::bag_header;
use crate::record_types::{BagHeader, Chunk, ChunkInfo, Connection, IndexData};

const MAGIC: &[u8] = b"#ROSBAG V2.0\n";

/// Options threaded through chunk reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// When `true`, an unexpected record kind encountered while scanning
    /// the records that follow a chunk is logged and skipped instead of
    /// failing the read with [`RosbagError::UnexpectedOpcode`].
    pub lenient: bool,
}

/// Reads a ROS bag out of a [`Filelike`] byte source.
pub struct BagReader<F: Filelike> {
    file: F,
}

impl<F: Filelike> BagReader<F> {
    /// Open a bag, checking the 13-byte magic line.
    pub async fn open(file: F) -> Result<Self> {
        let magic = file.read(0, MAGIC.len() as u64).await?;
        if &magic[..] != MAGIC {
            return Err(RosbagError::BadMagic);
        }
        Ok(Self { file })
    }

    /// Parse the fixed-position `BagHeader` immediately following the magic
    /// line.
    pub async fn read_header(&self) -> Result<BagHeader> {
        let buf = self
            .file
            .read(MAGIC.len() as u64, bag_header::RECORD_SIZE as u64)
            .await?;
        BagHeader::parse(buf, MAGIC.len() as u64)
    }

    /// Read every `Connection` and `ChunkInfo` record in the index section,
    /// starting at `header.index_pos`.
    pub async fn read_connections_and_chunk_infos(
        &self,
        header: &BagHeader,
    ) -> Result<(HashMap<u32, Connection>, Vec<ChunkInfo>)> {
        let size = self.file.size().await?;
        let len = size.checked_sub(header.index_pos).ok_or(RosbagError::Truncated {
            offset: header.index_pos,
        })?;
        let buf = self.file.read(header.index_pos, len).await?;
        let mut cursor = Cursor::new(buf, header.index_pos);

        let mut connections = HashMap::with_capacity(header.conn_count as usize);
        for _ in 0..header.conn_count {
            match Record::next_record(&mut cursor)? {
                Record::Connection(c) => {
                    connections.insert(c.id, c);
                }
                other => {
                    return Err(RosbagError::UnexpectedOpcode {
                        offset: cursor.offset(),
                        opcode: opcode_of(&other),
                    })
                }
            }
        }

        let mut chunk_infos = Vec::with_capacity(header.chunk_count as usize);
        for _ in 0..header.chunk_count {
            match Record::next_record(&mut cursor)? {
                Record::ChunkInfo(c) => chunk_infos.push(c),
                other => {
                    return Err(RosbagError::UnexpectedOpcode {
                        offset: cursor.offset(),
                        opcode: opcode_of(&other),
                    })
                }
            }
        }

        Ok((connections, chunk_infos))
    }

    /// Parse the full bag index: header, connections, and chunk infos.
    pub async fn read_bag(&self) -> Result<Bag> {
        let bag_header = self.read_header().await?;
        let (connections, chunk_infos) = self.read_connections_and_chunk_infos(&bag_header).await?;
        Ok(Bag::new(bag_header, connections, chunk_infos))
    }

    /// Read one chunk and the `IndexData` records immediately following it
    /// on disk.
    ///
    /// `next_boundary` is the absolute offset at which the next record that
    /// is *not* part of this chunk's trailing index begins: the next
    /// `ChunkInfo.chunk_pos` in file order, or `header.index_pos` for the
    /// last chunk. The spec's simpler reader contract ("keep reading
    /// IndexData records until the file offset reaches the next chunk or
    /// the index section") needs this boundary made explicit since the
    /// crate has no mutable cursor of its own between calls.
    pub async fn read_chunk(
        &self,
        chunk_info: &ChunkInfo,
        next_boundary: u64,
        options: &ReadOptions,
    ) -> Result<(Chunk, Vec<IndexData>)> {
        let len = next_boundary
            .checked_sub(chunk_info.chunk_pos)
            .ok_or(RosbagError::Corrupt {
                offset: chunk_info.chunk_pos,
                reason: "chunk boundary precedes chunk_pos".into(),
            })?;
        let buf = self.file.read(chunk_info.chunk_pos, len).await?;
        let mut cursor = Cursor::new(buf, chunk_info.chunk_pos);

        let chunk = match Record::next_record(&mut cursor)? {
            Record::Chunk(c) => c,
            other => {
                return Err(RosbagError::UnexpectedOpcode {
                    offset: chunk_info.chunk_pos,
                    opcode: opcode_of(&other),
                })
            }
        };

        let mut index_data = Vec::new();
        while cursor.left() > 0 {
            let offset = cursor.offset();
            match Record::next_record(&mut cursor) {
                Ok(Record::IndexData(idx)) => index_data.push(idx),
                Ok(other) if options.lenient => {
                    log::warn!(
                        "skipping unexpected {} record at offset {offset} following chunk at {}",
                        other.get_type(),
                        chunk_info.chunk_pos
                    );
                }
                Ok(other) => {
                    return Err(RosbagError::UnexpectedOpcode {
                        offset,
                        opcode: opcode_of(&other),
                    })
                }
                Err(e) => return Err(e),
            }
        }

        Ok((chunk, index_data))
    }

    /// Convenience over [`read_chunk`][Self::read_chunk] that also
    /// decompresses the chunk's data.
    pub async fn read_chunk_decompressed(
        &self,
        chunk_info: &ChunkInfo,
        next_boundary: u64,
        decompressor: &dyn Decompressor,
        options: &ReadOptions,
    ) -> Result<(Bytes, Vec<IndexData>)> {
        let (chunk, index_data) = self.read_chunk(chunk_info, next_boundary, options).await?;
        let data = chunk.decompress(decompressor)?;
        Ok((data, index_data))
    }
}

fn opcode_of(record: &Record) -> u8 {
    match record {
        Record::MessageData(_) => 2,
        Record::Connection(_) => 7,
        Record::Chunk(_) => 5,
        Record::IndexData(_) => 4,
        Record::ChunkInfo(_) => 6,
    }
}
