//! Shared helpers for decoding and composing record header fields.

use byteorder::{ByteOrder, LE};
use bytes::{Bytes, BytesMut};

use crate::error::{Result, RosbagError};
use crate::time::Time;

pub(crate) fn check_op(val: &Bytes, expected: u8, offset: u64) -> Result<()> {
    if val.len() == 1 && val[0] == expected {
        Ok(())
    } else {
        let found = val.first().copied().unwrap_or(0);
        Err(RosbagError::OpcodeMismatch {
            offset,
            expected,
            found,
        })
    }
}

pub(crate) fn unknown_field(name: &str, _val: &Bytes) {
    log::warn!("unknown header field: {name}");
}

pub(crate) fn set_field_u32(field: &mut Option<u32>, val: &Bytes, offset: u64) -> Result<()> {
    if val.len() != 4 || field.is_some() {
        return Err(RosbagError::Corrupt {
            offset,
            reason: "invalid or duplicate u32 header field".into(),
        });
    }
    *field = Some(LE::read_u32(val));
    Ok(())
}

pub(crate) fn set_field_u64(field: &mut Option<u64>, val: &Bytes, offset: u64) -> Result<()> {
    if val.len() != 8 || field.is_some() {
        return Err(RosbagError::Corrupt {
            offset,
            reason: "invalid or duplicate u64 header field".into(),
        });
    }
    let lo = LE::read_u32(&val[..4]) as u64;
    let hi = LE::read_u32(&val[4..]) as u64;
    *field = Some(lo | (hi << 32));
    Ok(())
}

pub(crate) fn set_field_time(field: &mut Option<Time>, val: &Bytes, offset: u64) -> Result<()> {
    if val.len() != 8 || field.is_some() {
        return Err(RosbagError::Corrupt {
            offset,
            reason: "invalid or duplicate time header field".into(),
        });
    }
    let sec = LE::read_u32(&val[..4]);
    let nsec = LE::read_u32(&val[4..]);
    *field = Some(Time { sec, nsec });
    Ok(())
}

pub(crate) fn set_field_str(field: &mut Option<String>, val: &Bytes, offset: u64) -> Result<()> {
    if field.is_some() {
        return Err(RosbagError::Corrupt {
            offset,
            reason: "duplicate header field".into(),
        });
    }
    *field = Some(
        String::from_utf8(val.to_vec()).map_err(|_| RosbagError::Corrupt {
            offset,
            reason: "header field is not valid UTF-8".into(),
        })?,
    );
    Ok(())
}

pub(crate) fn u32_bytes(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

pub(crate) fn u64_bytes(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

pub(crate) fn time_bytes(time: Time) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&time.sec.to_le_bytes());
    out[4..].copy_from_slice(&time.nsec.to_le_bytes());
    out
}

pub(crate) fn write_u32(buf: &mut BytesMut, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u64(buf: &mut BytesMut, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_time(buf: &mut BytesMut, time: Time) {
    buf.extend_from_slice(&time_bytes(time));
}
