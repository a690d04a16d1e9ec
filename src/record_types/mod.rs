//! C3: per-record-kind parsing and composition.
//!
//! Every record kind splits into a `*Header` type (the fixed header-field
//! set, parsed via [`HeaderGen`]) and the record type itself (header plus
//! data section, parsed via [`RecordGen`]). `BagHeader` is the one exception:
//! it has no data section and is only ever found at a fixed file offset, so
//! it does not participate in [`crate::record::Record`] dispatch.

pub mod bag_header;
pub mod chunk;
pub mod chunk_info;
pub mod connection;
pub mod index_data;
pub mod message_data;
pub(crate) mod utils;

pub use bag_header::BagHeader;
pub use chunk::{Chunk, Compression};
pub use chunk_info::{ChunkInfo, ChunkInfoEntriesIterator, ChunkInfoEntry};
pub use connection::Connection;
pub use index_data::{IndexData, IndexDataEntriesIterator, IndexDataEntry};
pub use message_data::MessageData;

use bytes::Bytes;

use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::fields::extract_fields;

/// Parses the header-field block shared by every record kind.
///
/// Implementors only need [`process_field`][HeaderGen::process_field] for
/// their kind-specific fields; `op` is handled by the default
/// [`read_header`][HeaderGen::read_header] implementation.
pub(crate) trait HeaderGen: Default + Sized {
    /// The opcode this header kind is tagged with.
    const OP: u8;

    fn read_header(header: Bytes, base_offset: u64) -> Result<Self> {
        let mut rec = Self::default();
        let mut seen_op = false;
        for (name, val) in extract_fields(header, base_offset)? {
            if name == "op" {
                utils::check_op(&val, Self::OP, base_offset)?;
                seen_op = true;
            } else {
                rec.process_field(&name, &val, base_offset)?;
            }
        }
        if !seen_op {
            return Err(RosbagError::MissingOp {
                offset: base_offset,
            });
        }
        Ok(rec)
    }

    /// Handle one non-`op` header field. `base_offset` is the record's
    /// absolute file offset, used to annotate errors for this field.
    fn process_field(&mut self, name: &str, val: &Bytes, base_offset: u64) -> Result<()>;
}

/// Parses a complete record: header fields plus data section.
pub(crate) trait RecordGen: Sized {
    type Header: HeaderGen;

    /// The opcode for this record kind, inherited from its header type.
    const OP: u8 = <Self::Header as HeaderGen>::OP;

    fn read(header: Bytes, base_offset: u64, c: &mut Cursor) -> Result<Self> {
        let header = Self::Header::read_header(header, base_offset)?;
        Self::read_data(c, header)
    }

    /// Parse the data section, given the already-decoded header.
    fn read_data(c: &mut Cursor, header: Self::Header) -> Result<Self>;
}
