//! `ChunkInfo` (opcode 6): a trailer record locating a `Chunk` on disk,
//! with its time range and per-connection message counts.

use bytes::{Bytes, BytesMut};

use super::utils::{
    set_field_time, set_field_u32, set_field_u64, time_bytes, u32_bytes, u64_bytes, unknown_field,
    write_u32,
};
use super::{HeaderGen, RecordGen};
use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::fields::compose_fields;
use crate::time::Time;

/// High-level index of `Chunk` records.
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    /// Record version; only version 1 is currently supported.
    pub ver: u32,
    /// Offset of the `Chunk` record relative to the start of the file.
    pub chunk_pos: u64,
    /// Timestamp of the earliest message in the chunk.
    pub start_time: Time,
    /// Timestamp of the latest message in the chunk.
    pub end_time: Time,
    entries: Vec<ChunkInfoEntry>,
}

impl ChunkInfo {
    /// Construct a `ChunkInfo` directly from its entries, e.g. from
    /// [`crate::composer::create_chunk`].
    pub(crate) fn new(chunk_pos: u64, start_time: Time, end_time: Time, entries: Vec<ChunkInfoEntry>) -> Self {
        Self {
            ver: 1,
            chunk_pos,
            start_time,
            end_time,
            entries,
        }
    }

    /// Per-connection message counts recorded for this chunk.
    pub fn entries(&self) -> &[ChunkInfoEntry] {
        &self.entries
    }

    pub(crate) fn compose(&self) -> BytesMut {
        let count = self.entries.len() as u32;
        let header = compose_fields([
            ("ver", u32_bytes(self.ver).to_vec()),
            ("chunk_pos", u64_bytes(self.chunk_pos).to_vec()),
            ("start_time", time_bytes(self.start_time).to_vec()),
            ("end_time", time_bytes(self.end_time).to_vec()),
            ("count", u32_bytes(count).to_vec()),
            ("op", vec![ChunkInfoHeader::OP]),
        ]);
        let data_len = self.entries.len() * 8;
        let mut out = BytesMut::with_capacity(4 + header.len() + 4 + data_len);
        write_u32(&mut out, header.len() as u32);
        out.extend_from_slice(&header);
        write_u32(&mut out, data_len as u32);
        for entry in &self.entries {
            write_u32(&mut out, entry.conn_id);
            write_u32(&mut out, entry.count);
        }
        out
    }
}

#[derive(Default)]
pub(crate) struct ChunkInfoHeader {
    pub ver: Option<u32>,
    pub chunk_pos: Option<u64>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub count: Option<u32>,
}

impl RecordGen for ChunkInfo {
    type Header = ChunkInfoHeader;

    fn read_data(c: &mut Cursor, header: Self::Header) -> Result<Self> {
        let offset = c.offset();
        let ver = header.ver.ok_or(RosbagError::Corrupt {
            offset,
            reason: "ChunkInfo missing ver field".into(),
        })?;
        let chunk_pos = header.chunk_pos.ok_or(RosbagError::Corrupt {
            offset,
            reason: "ChunkInfo missing chunk_pos field".into(),
        })?;
        let start_time = header.start_time.ok_or(RosbagError::Corrupt {
            offset,
            reason: "ChunkInfo missing start_time field".into(),
        })?;
        let end_time = header.end_time.ok_or(RosbagError::Corrupt {
            offset,
            reason: "ChunkInfo missing end_time field".into(),
        })?;
        let count = header.count.ok_or(RosbagError::Corrupt {
            offset,
            reason: "ChunkInfo missing count field".into(),
        })?;

        if ver != 1 {
            return Err(RosbagError::Corrupt {
                offset,
                reason: format!("unsupported ChunkInfo version {ver}"),
            });
        }
        let n = c.next_u32()?;
        if n % 8 != 0 || n / 8 != count {
            return Err(RosbagError::CorruptChunkInfo { offset });
        }
        let data = c.next_bytes(n as u64)?;
        let mut entry_cursor = Cursor::new(data, offset);
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let conn_id = entry_cursor.next_u32()?;
            let count = entry_cursor.next_u32()?;
            entries.push(ChunkInfoEntry { conn_id, count });
        }

        Ok(Self {
            ver,
            chunk_pos,
            start_time,
            end_time,
            entries,
        })
    }
}

impl HeaderGen for ChunkInfoHeader {
    const OP: u8 = 0x06;

    fn process_field(&mut self, name: &str, val: &Bytes, base_offset: u64) -> Result<()> {
        match name {
            "ver" => set_field_u32(&mut self.ver, val, base_offset)?,
            "chunk_pos" => set_field_u64(&mut self.chunk_pos, val, base_offset)?,
            "start_time" => set_field_time(&mut self.start_time, val, base_offset)?,
            "end_time" => set_field_time(&mut self.end_time, val, base_offset)?,
            "count" => set_field_u32(&mut self.count, val, base_offset)?,
            _ => unknown_field(name, val),
        }
        Ok(())
    }
}

/// One `ChunkInfo` entry: the number of messages in the chunk that arrived
/// on a given connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkInfoEntry {
    /// Connection id.
    pub conn_id: u32,
    /// Number of messages on this connection within the chunk.
    pub count: u32,
}

/// Iterator type returned by [`ChunkInfo::entries`].
pub type ChunkInfoEntriesIterator<'a> = std::slice::Iter<'a, ChunkInfoEntry>;
