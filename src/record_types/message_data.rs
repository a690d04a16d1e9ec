//! `MessageData` (opcode 2): a single serialized message on a connection.

use bytes::{Bytes, BytesMut};

use super::utils::{set_field_time, set_field_u32, time_bytes, unknown_field, write_u32};
use super::{HeaderGen, RecordGen};
use crate::cursor::Cursor;
use crate::error::{Result, RosbagError};
use crate::fields::compose_fields;
use crate::time::Time;

/// Message data for a connection identified by `conn_id`.
#[derive(Debug, Clone)]
pub struct MessageData {
    /// Connection on which the message arrived.
    pub conn_id: u32,
    /// Time at which the message was received.
    pub time: Time,
    /// Serialized message payload, opaque to this crate.
    pub data: Bytes,
}

impl MessageData {
    pub(crate) fn compose(&self) -> BytesMut {
        let header = compose_fields([
            ("conn", self.conn_id.to_le_bytes().to_vec()),
            ("time", time_bytes(self.time).to_vec()),
            ("op", vec![MessageDataHeader::OP]),
        ]);
        let mut out = BytesMut::with_capacity(4 + header.len() + 4 + self.data.len());
        write_u32(&mut out, header.len() as u32);
        out.extend_from_slice(&header);
        write_u32(&mut out, self.data.len() as u32);
        out.extend_from_slice(&self.data);
        out
    }
}

#[derive(Default, Debug)]
pub(crate) struct MessageDataHeader {
    pub conn_id: Option<u32>,
    pub time: Option<Time>,
}

impl RecordGen for MessageData {
    type Header = MessageDataHeader;

    fn read_data(c: &mut Cursor, header: Self::Header) -> Result<Self> {
        let offset = c.offset();
        let conn_id = header.conn_id.ok_or(RosbagError::Corrupt {
            offset,
            reason: "MessageData missing conn field".into(),
        })?;
        let time = header.time.ok_or(RosbagError::Corrupt {
            offset,
            reason: "MessageData missing time field".into(),
        })?;
        let data = c.next_chunk()?;
        Ok(MessageData { conn_id, time, data })
    }
}

impl HeaderGen for MessageDataHeader {
    const OP: u8 = 0x02;

    fn process_field(&mut self, name: &str, val: &Bytes, base_offset: u64) -> Result<()> {
        match name {
            "conn" => set_field_u32(&mut self.conn_id, val, base_offset)?,
            "time" => set_field_time(&mut self.time, val, base_offset)?,
            _ => unknown_field(name, val),
        }
        Ok(())
    }
}
