//! Error taxonomy for the bag codec.
//!
//! Every fallible operation in this crate returns one of these variants.
//! Offsets are byte positions relative to the start of the file (or, inside
//! a chunk, relative to the start of the chunk's decompressed data), and are
//! populated whenever the caller would otherwise have to recompute them.

use thiserror::Error;

/// Errors produced while decoding or composing a bag.
#[derive(Error, Debug)]
pub enum RosbagError {
    /// The 13-byte version line did not match `#ROSBAG V2.0\n`.
    #[error("bad magic: file does not start with the ROSBAG V2.0 version line")]
    BadMagic,

    /// A field or record claimed more bytes than remain in the buffer.
    #[error("truncated record at offset {offset}")]
    Truncated {
        /// Offset at which the truncated read began.
        offset: u64,
    },

    /// A length-prefixed value overruns its containing buffer.
    #[error("corrupt record at offset {offset}: {reason}")]
    Corrupt {
        /// Offset of the field or section that failed to parse.
        offset: u64,
        /// Human-readable reason.
        reason: String,
    },

    /// A header field had no `=` separator.
    #[error("malformed header field at offset {offset}")]
    Malformed {
        /// Offset of the offending field.
        offset: u64,
    },

    /// A record's header fields never included `op`.
    #[error("missing op field at offset {offset}")]
    MissingOp {
        /// Offset of the record header.
        offset: u64,
    },

    /// A record's `op` field did not match the opcode expected for the kind
    /// being parsed.
    #[error("opcode mismatch at offset {offset}: expected {expected:#x}, found {found:#x}")]
    OpcodeMismatch {
        /// Offset of the record header.
        offset: u64,
        /// Opcode the caller expected.
        expected: u8,
        /// Opcode actually present.
        found: u8,
    },

    /// An `IndexData` data section was not exactly `count * 12` bytes.
    #[error("corrupt index data at offset {offset}")]
    CorruptIndex {
        /// Offset of the `IndexData` record.
        offset: u64,
    },

    /// A `ChunkInfo` data section was not exactly `count * 8` bytes.
    #[error("corrupt chunk info at offset {offset}")]
    CorruptChunkInfo {
        /// Offset of the `ChunkInfo` record.
        offset: u64,
    },

    /// The byte source returned fewer bytes than requested.
    #[error("unexpected end of file at offset {offset}")]
    UnexpectedEof {
        /// Offset at which the short read occurred.
        offset: u64,
    },

    /// An unknown or out-of-context opcode was encountered in strict mode.
    #[error("unexpected opcode {opcode:#x} at offset {offset}")]
    UnexpectedOpcode {
        /// Offset of the offending record.
        offset: u64,
        /// The opcode byte encountered.
        opcode: u8,
    },

    /// A header was composed from zero fields.
    #[error("cannot compose an empty header")]
    EmptyHeader,

    /// `connections_to_datatypes` found a connection with no `type` header
    /// field (and it is the first descriptor for that connection).
    #[error("connection {conn_id} has no declared type")]
    NoType {
        /// The offending connection id.
        conn_id: u32,
    },

    /// Two connections share a topic but disagree on datatype.
    #[error("topic {topic:?} has conflicting datatypes")]
    TopicTypeConflict {
        /// The topic with conflicting connections.
        topic: String,
    },

    /// Propagated I/O failure from a `Filelike`/`Writer` implementation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Propagated failure from a caller-supplied `Decompressor`/`Compressor`.
    #[error("decompression error: {0}")]
    Decompress(String),

    /// Catch-all for external-collaborator errors (message definition
    /// parser, compression table) that don't map onto a taxonomy entry.
    #[error("{0}")]
    Collaborator(String),
}

impl From<anyhow::Error> for RosbagError {
    fn from(err: anyhow::Error) -> Self {
        RosbagError::Collaborator(format!("{err:#}"))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RosbagError>;
