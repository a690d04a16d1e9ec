//! C2: the header codec, a 32-bit length prefix wrapped around a field
//! block (see [`crate::fields`] for the field block itself).
//!
//! Record layout on disk is `[header_len u32][header bytes][data_len
//! u32][data bytes]`; this module only handles the first two pieces.

use bytes::Bytes;
use byteorder::{ByteOrder, LE};

use crate::error::{Result, RosbagError};
use crate::fields::{compose_fields, extract_fields, HeaderFields};

/// Split `[header_len: u32][header bytes]` off the front of `buf`, returning
/// the decoded fields and the bytes following the header (the data-length
/// prefix and data section, left for the caller to parse).
///
/// `base_offset` is `buf`'s absolute file offset.
pub(crate) fn extract_header(buf: Bytes, base_offset: u64) -> Result<(HeaderFields, Bytes)> {
    if buf.len() < 4 {
        return Err(RosbagError::Truncated { offset: base_offset });
    }
    let header_len = LE::read_u32(&buf[..4]) as usize;
    let remaining = buf.len() - 4;
    if header_len > remaining {
        return Err(RosbagError::Truncated { offset: base_offset });
    }
    let header_bytes = buf.slice(4..4 + header_len);
    let rest = buf.slice(4 + header_len..);
    let fields = extract_fields(header_bytes, base_offset + 4)?;
    Ok((fields, rest))
}

/// Encode a field block with its 4-byte length prefix.
///
/// Fails with [`RosbagError::EmptyHeader`] if `entries` is empty, since every
/// real record carries at least an `op` field.
pub(crate) fn compose_header<I, N, V>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<[u8]>,
{
    let field_bytes = compose_fields(entries);
    if field_bytes.is_empty() {
        return Err(RosbagError::EmptyHeader);
    }
    let mut out = Vec::with_capacity(4 + field_bytes.len());
    out.extend_from_slice(&(field_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&field_bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_empty_header_fails() {
        let entries: Vec<(&str, Vec<u8>)> = vec![];
        assert!(matches!(
            compose_header(entries),
            Err(RosbagError::EmptyHeader)
        ));
    }

    #[test]
    fn round_trips_through_extract() {
        let entries: Vec<(&str, Vec<u8>)> = vec![("op", vec![7]), ("conn", vec![1, 0, 0, 0])];
        let composed = compose_header(entries).unwrap();
        let mut buf = composed.clone();
        buf.extend_from_slice(&0u32.to_le_bytes()); // empty data section
        let (fields, rest) = extract_header(Bytes::from(buf), 0).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(rest.len(), 4);
    }
}
