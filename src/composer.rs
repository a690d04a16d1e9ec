//! C6: the Composer, serializes a [`Bag`] index model, re-fetching chunk
//! contents through a [`BagReader`], back into a bag-shaped byte stream.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};

use crate::collaborators::Filelike;
use crate::error::Result;
use crate::model::Bag;
use crate::reader::{BagReader, ReadOptions};
use crate::record_types::{
    bag_header::RECORD_SIZE, BagHeader, Chunk, Compression, IndexData, IndexDataEntry, MessageData,
};

const MAGIC: &[u8] = b"#ROSBAG V2.0\n";

/// Serializes a [`Bag`] back into bytes.
///
/// Chunk contents are re-fetched from `reader` rather than stored on the
/// model itself, matching spec.md §4.6's input ("a Reader, so chunk
/// contents can be re-fetched"). The output is built in one pass:
/// `index_pos` is derived from precomputed section lengths instead of a
/// seek-and-patch, per spec.md §9's forward-patching note.
pub struct Composer<'a, F: Filelike> {
    reader: &'a BagReader<F>,
    bag: &'a Bag,
}

impl<'a, F: Filelike> Composer<'a, F> {
    /// Build a composer over `bag`'s chunk infos and connections, re-reading
    /// chunk bytes through `reader`.
    pub fn new(reader: &'a BagReader<F>, bag: &'a Bag) -> Self {
        Self { reader, bag }
    }

    /// Serialize the bag into a single contiguous byte buffer.
    pub async fn compose(&self, options: &ReadOptions) -> Result<Vec<u8>> {
        let mut chunk_section = BytesMut::new();
        for (i, chunk_info) in self.bag.chunk_infos.iter().enumerate() {
            let next_boundary = self
                .bag
                .chunk_infos
                .get(i + 1)
                .map(|next| next.chunk_pos)
                .unwrap_or(self.bag.bag_header.index_pos);
            let (chunk, index_data_list) = self
                .reader
                .read_chunk(chunk_info, next_boundary, options)
                .await?;
            chunk_section.extend_from_slice(&chunk.compose());
            for idx in &index_data_list {
                chunk_section.extend_from_slice(&idx.compose());
            }
        }

        let mut connection_ids: Vec<&u32> = self.bag.connections.keys().collect();
        connection_ids.sort_unstable();
        let mut connection_section = BytesMut::new();
        for id in &connection_ids {
            connection_section.extend_from_slice(&self.bag.connections[*id].compose());
        }

        let mut chunk_info_section = BytesMut::new();
        for chunk_info in &self.bag.chunk_infos {
            chunk_info_section.extend_from_slice(&chunk_info.compose());
        }

        let index_pos = MAGIC.len() as u64
            + RECORD_SIZE as u64
            + chunk_section.len() as u64
            + connection_section.len() as u64;
        let header = BagHeader {
            index_pos,
            conn_count: self.bag.connections.len() as u32,
            chunk_count: self.bag.chunk_infos.len() as u32,
        };

        let mut out = Vec::with_capacity(
            MAGIC.len()
                + RECORD_SIZE
                + chunk_section.len()
                + connection_section.len()
                + chunk_info_section.len(),
        );
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&header.compose()?);
        out.extend_from_slice(&chunk_section);
        out.extend_from_slice(&connection_section);
        out.extend_from_slice(&chunk_info_section);
        Ok(out)
    }
}

/// Compose a `(Chunk, IndexData[])` pair from freshly-authored messages.
///
/// Per-connection index entries are built in the order messages are
/// supplied; the chunk is uncompressed (`compression = "none"`); one
/// `IndexData` record is produced per distinct `conn_id`, in order of first
/// appearance.
pub fn create_chunk(messages: &[MessageData]) -> (Chunk, Vec<IndexData>) {
    let mut order: Vec<u32> = Vec::new();
    let mut per_conn: HashMap<u32, Vec<IndexDataEntry>> = HashMap::new();
    let mut data = BytesMut::new();

    for msg in messages {
        let composed = msg.compose();
        let offset = data.len() as u32;
        data.extend_from_slice(&composed);
        per_conn
            .entry(msg.conn_id)
            .or_insert_with(|| {
                order.push(msg.conn_id);
                Vec::new()
            })
            .push(IndexDataEntry {
                time: msg.time,
                offset,
            });
    }

    let data: Bytes = data.freeze();
    let size = data.len() as u32;
    let chunk = Chunk::new(Compression::None, size, data);
    let index_data = order
        .into_iter()
        .map(|conn_id| IndexData::new(conn_id, per_conn.remove(&conn_id).unwrap()))
        .collect();
    (chunk, index_data)
}
