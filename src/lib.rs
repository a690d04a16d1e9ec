//! Record codec and bag layout engine for ROS bag files.
//!
//! A bag groups time-stamped messages by topic ("connection"), batches
//! them into optionally-compressed chunks, and maintains a trailing index
//! so a reader can seek by topic and time without rescanning the whole
//! file. This crate handles the bidirectional transformation between that
//! on-disk layout and an in-memory [`model::Bag`]: parsing
//! ([`reader::BagReader`]) and composing ([`composer::Composer`]) a bag
//! are each other's inverse, modulo `BagHeader` padding.
//!
//! Everything outside that core, the byte source, compression codecs, and
//! the ROS message-definition grammar, is an external collaborator the
//! caller supplies; see [`collaborators`].
#![warn(missing_docs, rust_2018_idioms)]

mod collaborators;
mod composer;
mod cursor;
mod derive;
mod error;
mod fields;
mod header;
mod model;
mod reader;
mod record;
mod record_types;
mod time;

mod chunk_iter;
mod index_iter;
mod msg_iter;

pub use chunk_iter::{ChunkSectionIterator, ChunkSectionRecord};
pub use collaborators::{
    Compressor, Decompressor, FieldDescriptor, Filelike, MessageDefinitionParser, MessageTypeDescriptor,
    StandardCodec, Writer,
};
pub use composer::{create_chunk, Composer};
pub use derive::{connections_to_datatypes, connections_to_topics, message_counts, TopicMessageCount};
pub use error::{Result, RosbagError};
pub use index_iter::{IndexSectionIterator, IndexSectionRecord};
pub use model::Bag;
pub use msg_iter::{MessageRecord, MessageRecordsIterator};
pub use reader::{BagReader, ReadOptions};
pub use record_types::{
    BagHeader, Chunk, ChunkInfo, ChunkInfoEntriesIterator, ChunkInfoEntry, Compression, Connection,
    IndexData, IndexDataEntriesIterator, IndexDataEntry, MessageData,
};
pub use time::Time;
