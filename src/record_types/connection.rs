//! `Connection` (opcode 7): one publisher stream, identified by topic and
//! message type.

use bytes::{Bytes, BytesMut};

use super::utils::{set_field_str, set_field_u32, unknown_field, write_u32};
use super::{HeaderGen, RecordGen};
use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::fields::{compose_fields, extract_fields};

/// Connection record carrying a message type for a ROS topic.
///
/// Two topic fields exist, `storage_topic` and `topic`, because messages
/// can be written to the bag on a topic different from the one the
/// publisher originally used.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique connection id.
    pub id: u32,
    /// Topic under which the messages are stored in this bag.
    pub storage_topic: String,
    /// Name of the topic the publisher originally sent on.
    pub topic: String,
    /// Message type.
    pub tp: String,
    /// MD5 hash sum of the message type, as the 32-character lowercase hex
    /// string producers emit (kept as text rather than decoded, since
    /// nothing in this codec needs the binary form).
    pub md5sum: String,
    /// Full text of the message definition.
    pub message_definition: String,
    /// Name of the node that sent the data (may be empty).
    pub caller_id: String,
    /// Whether the publisher is in latching mode (resends its last value to
    /// new subscribers).
    pub latching: bool,
}

#[derive(Default, Debug, Clone)]
pub(crate) struct ConnectionHeader {
    pub id: Option<u32>,
    pub storage_topic: Option<String>,
}

impl RecordGen for Connection {
    type Header = ConnectionHeader;

    fn read_data(c: &mut Cursor, header: Self::Header) -> Result<Self> {
        let offset = c.offset();
        let id = header.id.ok_or(RosbagError::Corrupt {
            offset,
            reason: "Connection missing conn field".into(),
        })?;
        let storage_topic = header.storage_topic.ok_or(RosbagError::Corrupt {
            offset,
            reason: "Connection missing topic field".into(),
        })?;

        let buf = c.next_chunk()?;
        let inner_offset = c.offset() - buf.len() as u64;

        let mut topic = None;
        let mut tp = None;
        let mut md5sum = None;
        let mut message_definition = None;
        let mut caller_id = None;
        let mut latching = false;

        for (name, val) in extract_fields(buf, inner_offset)? {
            match name.as_str() {
                "topic" => set_field_str(&mut topic, &val, inner_offset)?,
                "type" => set_field_str(&mut tp, &val, inner_offset)?,
                "md5sum" => {
                    if md5sum.is_some() || val.len() != 32 {
                        return Err(RosbagError::Corrupt {
                            offset: inner_offset,
                            reason: "invalid or duplicate md5sum field".into(),
                        });
                    }
                    md5sum = Some(String::from_utf8(val.to_vec()).map_err(|_| RosbagError::Corrupt {
                        offset: inner_offset,
                        reason: "md5sum is not valid UTF-8".into(),
                    })?);
                }
                "message_definition" => set_field_str(&mut message_definition, &val, inner_offset)?,
                "callerid" => set_field_str(&mut caller_id, &val, inner_offset)?,
                "latching" => {
                    latching = match val.first() {
                        Some(b'1') => true,
                        Some(b'0') => false,
                        _ => {
                            return Err(RosbagError::Corrupt {
                                offset: inner_offset,
                                reason: "latching field must be ASCII '0' or '1'".into(),
                            })
                        }
                    }
                }
                other => unknown_field(other, &val),
            }
        }

        let topic = topic.ok_or(RosbagError::Corrupt {
            offset: inner_offset,
            reason: "Connection missing topic field".into(),
        })?;
        let tp = tp.ok_or(RosbagError::Corrupt {
            offset: inner_offset,
            reason: "Connection missing type field".into(),
        })?;
        let md5sum = md5sum.ok_or(RosbagError::Corrupt {
            offset: inner_offset,
            reason: "Connection missing md5sum field".into(),
        })?;
        let message_definition = message_definition.ok_or(RosbagError::Corrupt {
            offset: inner_offset,
            reason: "Connection missing message_definition field".into(),
        })?;
        let caller_id = caller_id.unwrap_or_default();

        Ok(Self {
            id,
            storage_topic,
            topic,
            tp,
            md5sum,
            message_definition,
            caller_id,
            latching,
        })
    }
}

impl HeaderGen for ConnectionHeader {
    const OP: u8 = 0x07;

    fn read_header(header: Bytes, base_offset: u64) -> Result<Self> {
        let mut rec = Self::default();
        let mut seen_op = false;
        for (name, val) in extract_fields(header, base_offset)? {
            match name.as_str() {
                "op" => {
                    super::utils::check_op(&val, Self::OP, base_offset)?;
                    seen_op = true;
                }
                "topic" => set_field_str(&mut rec.storage_topic, &val, base_offset)?,
                _ => rec.process_field(&name, &val, base_offset)?,
            }
        }
        if !seen_op {
            return Err(RosbagError::MissingOp {
                offset: base_offset,
            });
        }
        Ok(rec)
    }

    fn process_field(&mut self, name: &str, val: &Bytes, base_offset: u64) -> Result<()> {
        match name {
            "conn" => set_field_u32(&mut self.id, val, base_offset)?,
            _ => unknown_field(name, val),
        }
        Ok(())
    }
}

impl Connection {
    pub(crate) fn compose(&self) -> BytesMut {
        let outer = compose_fields([
            ("topic", self.storage_topic.as_bytes().to_vec()),
            ("conn", self.id.to_le_bytes().to_vec()),
            ("op", vec![ConnectionHeader::OP]),
        ]);

        let mut inner_entries: Vec<(&str, Vec<u8>)> = vec![
            ("topic", self.topic.as_bytes().to_vec()),
            ("type", self.tp.as_bytes().to_vec()),
            ("md5sum", self.md5sum.as_bytes().to_vec()),
            ("message_definition", self.message_definition.as_bytes().to_vec()),
        ];
        if !self.caller_id.is_empty() {
            inner_entries.push(("callerid", self.caller_id.as_bytes().to_vec()));
        }
        inner_entries.push(("latching", vec![if self.latching { b'1' } else { b'0' }]));
        let inner = compose_fields(inner_entries);

        let mut out = BytesMut::with_capacity(4 + outer.len() + 4 + inner.len());
        write_u32(&mut out, outer.len() as u32);
        out.extend_from_slice(&outer);
        write_u32(&mut out, inner.len() as u32);
        out.extend_from_slice(&inner);
        out
    }
}
