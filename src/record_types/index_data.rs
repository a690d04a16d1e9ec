//! `IndexData` (opcode 4): per-connection message offsets within the
//! preceding `Chunk`'s uncompressed data.

use bytes::{Bytes, BytesMut};

use super::utils::{set_field_u32, time_bytes, u32_bytes, unknown_field, write_u32};
use super::{HeaderGen, RecordGen};
use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::fields::compose_fields;
use crate::time::Time;

/// Per-connection index into the chunk that precedes this record: for
/// connection `conn_id`, the `(time, offset)` of each message.
#[derive(Debug, Clone)]
pub struct IndexData {
    /// Record version; only version 1 is currently supported.
    pub ver: u32,
    /// Connection id this index covers.
    pub conn_id: u32,
    entries: Vec<IndexDataEntry>,
}

impl IndexData {
    /// Construct an `IndexData` record directly from its entries, e.g. from
    /// [`crate::composer::create_chunk`].
    pub(crate) fn new(conn_id: u32, entries: Vec<IndexDataEntry>) -> Self {
        Self {
            ver: 1,
            conn_id,
            entries,
        }
    }

    /// The `(time, offset)` entries for this connection, in file order.
    pub fn entries(&self) -> &[IndexDataEntry] {
        &self.entries
    }

    pub(crate) fn compose(&self) -> BytesMut {
        let count = self.entries.len() as u32;
        let header = compose_fields([
            ("ver", u32_bytes(self.ver).to_vec()),
            ("conn", u32_bytes(self.conn_id).to_vec()),
            ("count", u32_bytes(count).to_vec()),
            ("op", vec![IndexDataHeader::OP]),
        ]);
        let data_len = self.entries.len() * 12;
        let mut out = BytesMut::with_capacity(4 + header.len() + 4 + data_len);
        write_u32(&mut out, header.len() as u32);
        out.extend_from_slice(&header);
        write_u32(&mut out, data_len as u32);
        for entry in &self.entries {
            out.extend_from_slice(&time_bytes(entry.time));
            write_u32(&mut out, entry.offset);
        }
        out
    }
}

#[derive(Default)]
pub(crate) struct IndexDataHeader {
    pub ver: Option<u32>,
    pub conn_id: Option<u32>,
    pub count: Option<u32>,
}

impl RecordGen for IndexData {
    type Header = IndexDataHeader;

    fn read_data(c: &mut Cursor, header: Self::Header) -> Result<Self> {
        let offset = c.offset();
        let ver = header.ver.ok_or(RosbagError::Corrupt {
            offset,
            reason: "IndexData missing ver field".into(),
        })?;
        let conn_id = header.conn_id.ok_or(RosbagError::Corrupt {
            offset,
            reason: "IndexData missing conn field".into(),
        })?;
        let count = header.count.ok_or(RosbagError::Corrupt {
            offset,
            reason: "IndexData missing count field".into(),
        })?;

        if ver != 1 {
            return Err(RosbagError::Corrupt {
                offset,
                reason: format!("unsupported IndexData version {ver}"),
            });
        }
        let n = c.next_u32()?;
        if n % 12 != 0 || n / 12 != count {
            return Err(RosbagError::CorruptIndex { offset });
        }
        let data = c.next_bytes(n as u64)?;
        let mut entry_cursor = Cursor::new(data, offset);
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let time = entry_cursor.next_time()?;
            let offset = entry_cursor.next_u32()?;
            entries.push(IndexDataEntry { time, offset });
        }

        Ok(Self {
            ver,
            conn_id,
            entries,
        })
    }
}

impl HeaderGen for IndexDataHeader {
    const OP: u8 = 0x04;

    fn process_field(&mut self, name: &str, val: &Bytes, base_offset: u64) -> Result<()> {
        match name {
            "ver" => set_field_u32(&mut self.ver, val, base_offset)?,
            "conn" => set_field_u32(&mut self.conn_id, val, base_offset)?,
            "count" => set_field_u32(&mut self.count, val, base_offset)?,
            _ => unknown_field(name, val),
        }
        Ok(())
    }
}

/// One message's time and within-chunk byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexDataEntry {
    /// Time at which the message was received.
    pub time: Time,
    /// Byte offset of the `MessageData` record within the owning chunk's
    /// uncompressed data.
    pub offset: u32,
}

/// Iterator type returned by [`IndexData::entries`].
pub type IndexDataEntriesIterator<'a> = std::slice::Iter<'a, IndexDataEntry>;
