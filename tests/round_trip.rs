//! Byte-level round-trip tests against an in-memory [`Filelike`].
//!
//! These build raw bag bytes by hand (mirroring the wire format's own
//! length-prefixed field/record encoding) rather than going through the
//! crate's private `compose` methods, since only the public surface is
//! reachable from here.

use std::collections::HashMap;

use bytes::Bytes;
use rosbag_codec::{
    connections_to_topics, message_counts, BagReader, ChunkInfoEntry, Compression, Composer,
    Connection, Filelike, MessageRecord, ReadOptions, Result, RosbagError, StandardCodec, Time,
};

const MAGIC: &[u8] = b"#ROSBAG V2.0\n";

struct MemFile {
    data: Bytes,
}

impl MemFile {
    fn new(data: Vec<u8>) -> Self {
        Self { data: Bytes::from(data) }
    }
}

impl Filelike for MemFile {
    async fn size(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn read(&self, offset: u64, len: u64) -> Result<Bytes> {
        let start = offset as usize;
        let end = start + len as usize;
        if end > self.data.len() {
            return Err(RosbagError::UnexpectedEof { offset });
        }
        Ok(self.data.slice(start..end))
    }
}

// --- Hand-rolled wire encoding helpers, mirroring the field/record codec. ---

fn field(name: &str, value: &[u8]) -> Vec<u8> {
    let field_len = name.len() + 1 + value.len();
    let mut out = Vec::with_capacity(4 + field_len);
    out.extend_from_slice(&(field_len as u32).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.push(b'=');
    out.extend_from_slice(value);
    out
}

fn fields(entries: &[Vec<u8>]) -> Vec<u8> {
    entries.concat()
}

fn record(header: &[u8], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + header.len() + 4 + data.len());
    out.extend_from_slice(&(header.len() as u32).to_le_bytes());
    out.extend_from_slice(header);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

fn time_bytes(t: Time) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&t.sec.to_le_bytes());
    out[4..].copy_from_slice(&t.nsec.to_le_bytes());
    out
}

fn bag_header_bytes(index_pos: u64, conn_count: u32, chunk_count: u32) -> Vec<u8> {
    let header = fields(&[
        field("index_pos", &index_pos.to_le_bytes()),
        field("conn_count", &conn_count.to_le_bytes()),
        field("chunk_count", &chunk_count.to_le_bytes()),
        field("op", &[0x03]),
    ]);
    let data_len = 4096 - header.len();
    let mut out = Vec::with_capacity(4 + header.len() + 4 + data_len);
    out.extend_from_slice(&(header.len() as u32).to_le_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    out.extend(std::iter::repeat(b' ').take(data_len));
    out
}

fn message_data_record(conn_id: u32, time: Time, payload: &[u8]) -> Vec<u8> {
    let header = fields(&[
        field("conn", &conn_id.to_le_bytes()),
        field("time", &time_bytes(time)),
        field("op", &[0x02]),
    ]);
    record(&header, payload)
}

fn chunk_record(data: &[u8]) -> Vec<u8> {
    let header = fields(&[
        field("compression", b"none"),
        field("size", &(data.len() as u32).to_le_bytes()),
        field("op", &[0x05]),
    ]);
    record(&header, data)
}

fn index_data_record(conn_id: u32, entries: &[(Time, u32)]) -> Vec<u8> {
    let header = fields(&[
        field("ver", &1u32.to_le_bytes()),
        field("conn", &conn_id.to_le_bytes()),
        field("count", &(entries.len() as u32).to_le_bytes()),
        field("op", &[0x04]),
    ]);
    let mut data = Vec::with_capacity(entries.len() * 12);
    for (time, offset) in entries {
        data.extend_from_slice(&time_bytes(*time));
        data.extend_from_slice(&offset.to_le_bytes());
    }
    record(&header, &data)
}

fn connection_record(id: u32, storage_topic: &str, topic: &str, tp: &str, md5sum: &str, message_definition: &str) -> Vec<u8> {
    let outer = fields(&[
        field("topic", storage_topic.as_bytes()),
        field("conn", &id.to_le_bytes()),
        field("op", &[0x07]),
    ]);
    let inner = fields(&[
        field("topic", topic.as_bytes()),
        field("type", tp.as_bytes()),
        field("md5sum", md5sum.as_bytes()),
        field("message_definition", message_definition.as_bytes()),
        field("latching", b"0"),
    ]);
    record(&outer, &inner)
}

fn chunk_info_record(chunk_pos: u64, start: Time, end: Time, entries: &[ChunkInfoEntry]) -> Vec<u8> {
    let header = fields(&[
        field("ver", &1u32.to_le_bytes()),
        field("chunk_pos", &chunk_pos.to_le_bytes()),
        field("start_time", &time_bytes(start)),
        field("end_time", &time_bytes(end)),
        field("count", &(entries.len() as u32).to_le_bytes()),
        field("op", &[0x06]),
    ]);
    let mut data = Vec::with_capacity(entries.len() * 8);
    for entry in entries {
        data.extend_from_slice(&entry.conn_id.to_le_bytes());
        data.extend_from_slice(&entry.count.to_le_bytes());
    }
    record(&header, &data)
}

// === S1: empty bag === //

#[tokio::test]
async fn empty_bag_has_fixed_size_header() {
    let bytes = {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&bag_header_bytes(MAGIC.len() as u64 + 4104, 0, 0));
        out
    };
    assert_eq!(bytes.len(), 4117);

    let reader = BagReader::open(MemFile::new(bytes)).await.unwrap();
    let bag = reader.read_bag().await.unwrap();
    assert_eq!(bag.bag_header.index_pos, 4117);
    assert_eq!(bag.bag_header.conn_count, 0);
    assert_eq!(bag.bag_header.chunk_count, 0);
    assert!(bag.connections.is_empty());
    assert!(bag.chunk_infos.is_empty());
}

#[tokio::test]
async fn bad_magic_is_rejected() {
    let err = BagReader::open(MemFile::new(b"not a rosbag!".to_vec())).await.unwrap_err();
    assert!(matches!(err, RosbagError::BadMagic));
}

#[tokio::test]
async fn empty_bag_composes_back_to_itself() {
    let source_bytes = {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&bag_header_bytes(4117, 0, 0));
        out
    };
    let reader = BagReader::open(MemFile::new(source_bytes.clone())).await.unwrap();
    let bag = reader.read_bag().await.unwrap();
    let composed = Composer::new(&reader, &bag).compose(&ReadOptions::default()).await.unwrap();
    assert_eq!(composed, source_bytes);
}

// === S2: one connection, one chunk, one message === //

fn sample_bag_bytes() -> (Vec<u8>, Time, &'static [u8]) {
    let time = Time { sec: 7, nsec: 42 };
    let payload: &[u8] = b"hello";

    let msg_record = message_data_record(0, time, payload);
    let chunk_rec = chunk_record(&msg_record);
    let index_rec = index_data_record(0, &[(time, 0)]);
    let chunk_section = [chunk_rec, index_rec].concat();

    let conn_rec = connection_record(0, "/topic", "/topic", "std_msgs/String", &"a".repeat(32), "string data\n");
    let connection_section = conn_rec;

    let chunk_pos = MAGIC.len() as u64 + 4104;
    let chunk_info_rec = chunk_info_record(
        chunk_pos,
        time,
        time,
        &[ChunkInfoEntry { conn_id: 0, count: 1 }],
    );
    let chunk_info_section = chunk_info_rec;

    let index_pos =
        chunk_pos + chunk_section.len() as u64 + connection_section.len() as u64;
    let header = bag_header_bytes(index_pos, 1, 1);

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&header);
    out.extend_from_slice(&chunk_section);
    out.extend_from_slice(&connection_section);
    out.extend_from_slice(&chunk_info_section);
    (out, time, payload)
}

#[tokio::test]
async fn reads_connection_chunk_and_message() {
    let (bytes, time, payload) = sample_bag_bytes();
    let reader = BagReader::open(MemFile::new(bytes)).await.unwrap();
    let bag = reader.read_bag().await.unwrap();

    assert_eq!(bag.bag_header.conn_count, 1);
    assert_eq!(bag.bag_header.chunk_count, 1);
    assert_eq!(bag.connections.len(), 1);
    assert_eq!(bag.chunk_infos.len(), 1);

    let conn = &bag.connections[&0];
    assert_eq!(conn.topic, "/topic");
    assert_eq!(conn.tp, "std_msgs/String");
    assert_eq!(conn.md5sum, "a".repeat(32));
    assert!(!conn.latching);

    let chunk_info = &bag.chunk_infos[0];
    assert_eq!(chunk_info.entries(), &[ChunkInfoEntry { conn_id: 0, count: 1 }]);

    let (chunk, index_data) = reader
        .read_chunk(chunk_info, bag.bag_header.index_pos, &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(chunk.compression, Compression::None);

    let decompressed = chunk.decompress(&StandardCodec).unwrap();
    assert_eq!(&decompressed[..], &message_data_record(0, time, payload)[..]);

    let mut messages = chunk.messages(&StandardCodec).unwrap();
    match messages.next().unwrap().unwrap() {
        MessageRecord::MessageData(m) => {
            assert_eq!(m.conn_id, 0);
            assert_eq!(m.time, time);
            assert_eq!(&m.data[..], payload);
        }
        MessageRecord::Connection(_) => panic!("expected a MessageData record"),
    }
    assert!(messages.next().is_none());

    assert_eq!(index_data.len(), 1);
    assert_eq!(index_data[0].conn_id, 0);
    assert_eq!(index_data[0].entries().len(), 1);
    assert_eq!(index_data[0].entries()[0].time, time);
    assert_eq!(index_data[0].entries()[0].offset, 0);
}

#[tokio::test]
async fn round_trip_through_composer_reproduces_bytes() {
    let (bytes, ..) = sample_bag_bytes();
    let reader = BagReader::open(MemFile::new(bytes.clone())).await.unwrap();
    let bag = reader.read_bag().await.unwrap();

    let composed = Composer::new(&reader, &bag).compose(&ReadOptions::default()).await.unwrap();
    assert_eq!(composed, bytes, "composing an unmodified bag should reproduce its bytes exactly");

    // Re-parsing the composed output should produce an equivalent model.
    let reader2 = BagReader::open(MemFile::new(composed)).await.unwrap();
    let bag2 = reader2.read_bag().await.unwrap();
    assert_eq!(bag2.bag_header, bag.bag_header);
    assert_eq!(bag2.connections.len(), bag.connections.len());
    assert_eq!(bag2.chunk_infos.len(), bag.chunk_infos.len());
}

#[tokio::test]
async fn derives_topics_and_message_counts() {
    let (bytes, ..) = sample_bag_bytes();
    let reader = BagReader::open(MemFile::new(bytes)).await.unwrap();
    let bag = reader.read_bag().await.unwrap();

    let topics = connections_to_topics(&bag.connections).unwrap();
    assert_eq!(topics, vec![("/topic".to_string(), "std_msgs/String".to_string())]);

    let (by_topic, total) = message_counts(&bag.chunk_infos, &bag.connections).unwrap();
    assert_eq!(total, 1);
    assert_eq!(by_topic["/topic"].datatype, "std_msgs/String");
    assert_eq!(by_topic["/topic"].count, 1);
}

// === S4: conflicting topic/datatype pairs === //

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
fn conflicting_datatypes_on_shared_topic_is_rejected() {
    let mut connections = HashMap::new();
    connections.insert(0, conn(0, "/shared", "TypeA"));
    connections.insert(1, conn(1, "/shared", "TypeB"));
    let err = connections_to_topics(&connections).unwrap_err();
    assert!(matches!(err, RosbagError::TopicTypeConflict { topic } if topic == "/shared"));
}

// === S5: BagHeader missing its op field === //

#[tokio::test]
async fn bag_header_without_op_is_rejected() {
    let header = fields(&[
        field("index_pos", &4117u64.to_le_bytes()),
        field("conn_count", &0u32.to_le_bytes()),
        field("chunk_count", &0u32.to_le_bytes()),
    ]);
    let data_len = 4096 - header.len();
    let mut record_bytes = Vec::new();
    record_bytes.extend_from_slice(&(header.len() as u32).to_le_bytes());
    record_bytes.extend_from_slice(&header);
    record_bytes.extend_from_slice(&(data_len as u32).to_le_bytes());
    record_bytes.extend(std::iter::repeat(b' ').take(data_len));

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&record_bytes);

    let reader = BagReader::open(MemFile::new(bytes)).await.unwrap();
    let err = reader.read_header().await.unwrap_err();
    assert!(matches!(err, RosbagError::MissingOp { .. }));
}

// === S6: IndexData data section length disagrees with its count field === //

#[tokio::test]
async fn corrupt_index_data_length_is_rejected() {
    let time = Time { sec: 1, nsec: 0 };
    let msg_record = message_data_record(0, time, b"x");
    let chunk_rec = chunk_record(&msg_record);

    // Declares 2 entries (24 bytes) but only supplies 12 bytes of data.
    let bad_header = fields(&[
        field("ver", &1u32.to_le_bytes()),
        field("conn", &0u32.to_le_bytes()),
        field("count", &2u32.to_le_bytes()),
        field("op", &[0x04]),
    ]);
    let mut bad_data = Vec::new();
    bad_data.extend_from_slice(&time_bytes(time));
    bad_data.extend_from_slice(&0u32.to_le_bytes());
    let bad_index_rec = record(&bad_header, &bad_data);

    let chunk_section = [chunk_rec, bad_index_rec].concat();
    let chunk_pos = MAGIC.len() as u64 + 4104;

    let connection_section = connection_record(0, "/t", "/t", "std_msgs/String", &"0".repeat(32), "");
    let chunk_info_section = chunk_info_record(
        chunk_pos,
        time,
        time,
        &[ChunkInfoEntry { conn_id: 0, count: 1 }],
    );

    let index_pos = chunk_pos + chunk_section.len() as u64 + connection_section.len() as u64;
    let header = bag_header_bytes(index_pos, 1, 1);

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&chunk_section);
    bytes.extend_from_slice(&connection_section);
    bytes.extend_from_slice(&chunk_info_section);

    let reader = BagReader::open(MemFile::new(bytes)).await.unwrap();
    let bag = reader.read_bag().await.unwrap();
    let err = reader
        .read_chunk(&bag.chunk_infos[0], bag.bag_header.index_pos, &ReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RosbagError::CorruptIndex { .. }));
}
