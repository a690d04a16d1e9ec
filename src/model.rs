//! C4: the in-memory bag index model.

use std::collections::HashMap;

use crate::record_types::{BagHeader, ChunkInfo, Connection};

/// A fully-indexed bag: its global header, connection table, and the
/// ordered list of chunk trailers.
///
/// Owns all of its records outright: [`Connection`] and [`ChunkInfo`] are
/// never aliased elsewhere; callers that need to relate a `MessageData` or
/// an index entry back to its connection do so by looking up `conn_id` in
/// `connections`, not through an owning back-reference.
#[derive(Debug, Clone)]
pub struct Bag {
    /// The bag's global header.
    pub bag_header: BagHeader,
    /// All declared connections, keyed by connection id.
    pub connections: HashMap<u32, Connection>,
    /// All chunk trailers, in file order.
    pub chunk_infos: Vec<ChunkInfo>,
}

impl Bag {
    /// Construct a bag model from its three parsed pieces.
    pub fn new(bag_header: BagHeader, connections: HashMap<u32, Connection>, chunk_infos: Vec<ChunkInfo>) -> Self {
        Self {
            bag_header,
            connections,
            chunk_infos,
        }
    }
}
