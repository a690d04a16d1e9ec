//! C7: pure derivation helpers over a parsed bag.

use std::collections::HashMap;

use crate::collaborators::{FieldDescriptor, MessageDefinitionParser};
use crate::error::{Result, RosbagError};
use crate::record_types::{ChunkInfo, Connection};

/// For each connection, parse its message definition into field
/// descriptors, keyed by datatype name.
///
/// `parser` returns one descriptor per message type referenced in the
/// definition text, primary type first. The first is keyed by
/// `connection.tp` (fails [`RosbagError::NoType`] if `tp` is empty); any
/// further descriptors are keyed by their own `name`. Later connections
/// silently overwrite earlier ones that produce the same datatype name.
pub fn connections_to_datatypes(
    connections: &HashMap<u32, Connection>,
    parser: &MessageDefinitionParser,
) -> Result<HashMap<String, Vec<FieldDescriptor>>> {
    let mut out = HashMap::new();

    let mut sorted: Vec<&Connection> = connections.values().collect();
    sorted.sort_unstable_by_key(|c| c.id);

    for connection in sorted {
        if connection.tp.is_empty() {
            return Err(RosbagError::NoType {
                conn_id: connection.id,
            });
        }
        let descriptors = parser(&connection.message_definition)?;
        let mut descriptors = descriptors.into_iter();
        if let Some(primary) = descriptors.next() {
            out.insert(connection.tp.clone(), primary.fields);
        }
        for descriptor in descriptors {
            out.insert(descriptor.name, descriptor.fields);
        }
    }
    Ok(out)
}

/// Deduplicate connections by topic, returning `(topic, datatype)` pairs in
/// order of first appearance.
///
/// Fails [`RosbagError::TopicTypeConflict`] if two connections report the
/// same topic with different datatypes.
pub fn connections_to_topics(connections: &HashMap<u32, Connection>) -> Result<Vec<(String, String)>> {
    let mut order = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    let mut sorted: Vec<&Connection> = connections.values().collect();
    sorted.sort_unstable_by_key(|c| c.id);

    for connection in sorted {
        match seen.get(&connection.topic) {
            Some(existing_type) if existing_type != &connection.tp => {
                return Err(RosbagError::TopicTypeConflict {
                    topic: connection.topic.clone(),
                })
            }
            Some(_) => {}
            None => {
                seen.insert(connection.topic.clone(), connection.tp.clone());
                order.push((connection.topic.clone(), connection.tp.clone()));
            }
        }
    }
    Ok(order)
}

/// Per-topic message count, with total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessageCount {
    /// Message datatype for this topic.
    pub datatype: String,
    /// Number of messages recorded on this topic across all chunks.
    pub count: u64,
}

/// Sum `ChunkInfo` per-connection counts, grouped by topic.
///
/// Applies the same topic/datatype conflict rule as
/// [`connections_to_topics`]. The source algorithm's `message_counts` has a
/// write with no observable effect (`topics[topicName] += connection.count`
/// on an already-discarded accumulator); this implementation follows only
/// the documented summation, not that artifact.
pub fn message_counts(
    chunk_infos: &[ChunkInfo],
    connections: &HashMap<u32, Connection>,
) -> Result<(HashMap<String, TopicMessageCount>, u64)> {
    let mut per_conn_counts: HashMap<u32, u64> = HashMap::new();
    for chunk_info in chunk_infos {
        for entry in chunk_info.entries() {
            *per_conn_counts.entry(entry.conn_id).or_insert(0) += entry.count as u64;
        }
    }

    let mut by_topic: HashMap<String, TopicMessageCount> = HashMap::new();
    let mut total = 0u64;

    let mut sorted: Vec<&Connection> = connections.values().collect();
    sorted.sort_unstable_by_key(|c| c.id);

    for connection in sorted {
        let count = per_conn_counts.get(&connection.id).copied().unwrap_or(0);
        total += count;
        match by_topic.get_mut(&connection.topic) {
            Some(existing) if existing.datatype != connection.tp => {
                return Err(RosbagError::TopicTypeConflict {
                    topic: connection.topic.clone(),
                })
            }
            Some(existing) => existing.count += count,
            None => {
                by_topic.insert(
                    connection.topic.clone(),
                    TopicMessageCount {
                        datatype: connection.tp.clone(),
                        count,
                    },
                );
            }
        }
    }

    Ok((by_topic, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_types::Connection;

    fn conn(id: u32, topic: &str, tp: &str) -> Connection {
        Connection {
            id,
            storage_topic: topic.to_string(),
            topic: topic.to_string(),
            tp: tp.to_string(),
            md5sum: "0".repeat(32),
            message_definition: String::new(),
            caller_id: String::new(),
            latching: false,
        }
    }

    #[test]
    fn topics_conflict_on_mismatched_datatype() {
        let mut connections = HashMap::new();
        connections.insert(0, conn(0, "/t", "A"));
        connections.insert(1, conn(1, "/t", "B"));
        let err = connections_to_topics(&connections).unwrap_err();
        assert!(matches!(err, RosbagError::TopicTypeConflict { .. }));
    }

    #[test]
    fn topics_dedupe_matching_datatype() {
        let mut connections = HashMap::new();
        connections.insert(0, conn(0, "/t", "A"));
        connections.insert(1, conn(1, "/t", "A"));
        let topics = connections_to_topics(&connections).unwrap();
        assert_eq!(topics, vec![("/t".to_string(), "A".to_string())]);
    }

    #[test]
    fn message_counts_sums_across_chunks() {
        let mut connections = HashMap::new();
        connections.insert(0, conn(0, "/t", "A"));
        let chunk_infos = vec![
            ChunkInfo::new(
                0,
                crate::time::Time::default(),
                crate::time::Time::default(),
                vec![crate::record_types::chunk_info::ChunkInfoEntry { conn_id: 0, count: 3 }],
            ),
            ChunkInfo::new(
                100,
                crate::time::Time::default(),
                crate::time::Time::default(),
                vec![crate::record_types::chunk_info::ChunkInfoEntry { conn_id: 0, count: 4 }],
            ),
        ];
        let (by_topic, total) = message_counts(&chunk_infos, &connections).unwrap();
        assert_eq!(total, 7);
        assert_eq!(by_topic["/t"].count, 7);
    }
}
