//! `BagHeader` (opcode 3): the fixed-position global header.
//!
//! Unlike every other record kind, `BagHeader` never appears inside the
//! chunk or index sections. It is read once, at a fixed offset
//! immediately following the magic line, so it sits outside the
//! [`crate::record::Record`] dispatch enum and has no [`super::RecordGen`]
//! impl of its own.

use bytes::{Bytes, BytesMut};

use crate::error::{Result, RosbagError};
use crate::header::{compose_header, extract_header};

use super::utils::{u32_bytes, u64_bytes};

/// Opcode tagging a `BagHeader` record.
pub const OP: u8 = 0x03;

/// Total on-disk size of a composed `BagHeader` record: its 4-byte header
/// length prefix, `H` header-field bytes, a 4-byte data length prefix, and
/// `4096 - H` bytes of padding, always `4104` regardless of field values,
/// since every `BagHeader` field is fixed-width.
pub const RECORD_SIZE: usize = 4104;

const PADDED_SIZE: usize = 4096;

/// The bag's global header: pointer to the index plus the two record
/// counts that let a reader size its connection/chunk-info tables up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BagHeader {
    /// Absolute file offset of the first `Connection` record in the index
    /// section (equivalently, the end of the chunk section).
    pub index_pos: u64,
    /// Number of `Connection` records following `index_pos`.
    pub conn_count: u32,
    /// Number of `ChunkInfo` records following the connection section.
    pub chunk_count: u32,
}

impl BagHeader {
    /// Parse a `BagHeader` from the buffer starting at `base_offset`
    /// (immediately after the magic line). `buf` only needs to cover the
    /// record's header section; the data section's padding is discarded
    /// without being read in full.
    pub(crate) fn parse(buf: Bytes, base_offset: u64) -> Result<Self> {
        let (fields, _rest) = extract_header(buf, base_offset)?;

        let mut op_seen = false;
        let mut index_pos = None;
        let mut conn_count = None;
        let mut chunk_count = None;

        for (name, val) in &fields {
            match name.as_str() {
                "op" => {
                    super::utils::check_op(val, OP, base_offset)?;
                    op_seen = true;
                }
                "index_pos" => super::utils::set_field_u64(&mut index_pos, val, base_offset)?,
                "conn_count" => super::utils::set_field_u32(&mut conn_count, val, base_offset)?,
                "chunk_count" => super::utils::set_field_u32(&mut chunk_count, val, base_offset)?,
                other => super::utils::unknown_field(other, val),
            }
        }

        if !op_seen {
            return Err(RosbagError::MissingOp {
                offset: base_offset,
            });
        }
        let index_pos = index_pos.ok_or(RosbagError::Corrupt {
            offset: base_offset,
            reason: "BagHeader missing index_pos".into(),
        })?;
        let conn_count = conn_count.ok_or(RosbagError::Corrupt {
            offset: base_offset,
            reason: "BagHeader missing conn_count".into(),
        })?;
        let chunk_count = chunk_count.ok_or(RosbagError::Corrupt {
            offset: base_offset,
            reason: "BagHeader missing chunk_count".into(),
        })?;

        Ok(Self {
            index_pos,
            conn_count,
            chunk_count,
        })
    }

    /// Compose the fixed-size `BagHeader` record: header fields, then
    /// space-padding out to exactly [`RECORD_SIZE`] total bytes.
    pub(crate) fn compose(&self) -> Result<BytesMut> {
        let header_bytes = compose_header([
            ("index_pos", u64_bytes(self.index_pos).to_vec()),
            ("conn_count", u32_bytes(self.conn_count).to_vec()),
            ("chunk_count", u32_bytes(self.chunk_count).to_vec()),
            ("op", vec![OP]),
        ])?;

        // `header_bytes` already carries its own 4-byte length prefix; only
        // the field block itself (`header_bytes.len() - 4`) counts against
        // the 4096-byte padded budget.
        let field_block_len = header_bytes.len() - 4;
        let data_len = PADDED_SIZE.checked_sub(field_block_len).ok_or_else(|| {
            RosbagError::Corrupt {
                offset: 0,
                reason: "BagHeader field block exceeds the fixed 4096-byte budget".into(),
            }
        })?;

        let mut out = BytesMut::with_capacity(header_bytes.len() + 4 + data_len);
        out.extend_from_slice(&header_bytes);
        out.extend_from_slice(&(data_len as u32).to_le_bytes());
        out.extend(std::iter::repeat(b' ').take(data_len));
        debug_assert_eq!(out.len(), RECORD_SIZE);
        Ok(out)
    }
}
