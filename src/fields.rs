//! C1: the field codec, a header-field dictionary encoded as a sequence of
//! length-prefixed `name=value` entries.

use byteorder::{ByteOrder, LE};
use bytes::Bytes;

use crate::error::{Result, RosbagError};

/// One decoded `name=value` entry. Values are opaque bytes; names are ASCII.
pub type Field = (String, Bytes);

/// An ordered, duplicate-tolerant collection of header fields.
///
/// Insertion order is preserved so that [`compose_fields`] can reproduce a
/// record's canonical field order on the way back out; [`extract_fields`]
/// instead follows last-write-wins semantics for duplicate names when
/// looked up with [`lookup`], matching observed reader behavior.
pub type HeaderFields = Vec<Field>;

/// Decode a buffer of zero or more length-prefixed `name=value` entries.
///
/// `base_offset` is the absolute file offset of `buf[0]`, used to annotate
/// errors with the offset at which they occurred.
pub(crate) fn extract_fields(mut buf: Bytes, base_offset: u64) -> Result<HeaderFields> {
    let mut fields = HeaderFields::new();
    let mut pos = 0u64;

    while !buf.is_empty() {
        if buf.len() < 4 {
            return Err(RosbagError::Truncated {
                offset: base_offset + pos,
            });
        }
        let field_len = LE::read_u32(&buf[..4]) as usize;
        let remaining = buf.len() - 4;
        if field_len > remaining {
            return Err(RosbagError::Corrupt {
                offset: base_offset + pos,
                reason: format!("field length {field_len} exceeds {remaining} remaining bytes"),
            });
        }

        let entry = buf.slice(4..4 + field_len);
        let delim = entry.iter().position(|b| *b == b'=').ok_or(RosbagError::Malformed {
            offset: base_offset + pos + 4,
        })?;
        let name = std::str::from_utf8(&entry[..delim])
            .map_err(|_| RosbagError::Malformed {
                offset: base_offset + pos + 4,
            })?
            .to_string();
        let value = entry.slice(delim + 1..);
        fields.push((name, value));

        let consumed = 4 + field_len;
        buf = buf.slice(consumed..);
        pos += consumed as u64;
    }

    Ok(fields)
}

/// Look up the last value written for `name`, matching extract's
/// last-write-wins rule for duplicate field names within one buffer.
pub(crate) fn lookup<'a>(fields: &'a HeaderFields, name: &str) -> Option<&'a Bytes> {
    fields.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v)
}

/// Encode an ordered sequence of `(name, value)` pairs as a field buffer.
///
/// The caller is responsible for never handing in duplicate names; the
/// composer side of this codec never emits duplicates by construction,
/// since each record type's compose path writes its canonical field set
/// exactly once.
pub(crate) fn compose_fields<I, N, V>(entries: I) -> Vec<u8>
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for (name, value) in entries {
        let name = name.as_ref();
        let value = value.as_ref();
        let field_len = name.len() + 1 + value.len();
        out.extend_from_slice(&(field_len as u32).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.push(b'=');
        out.extend_from_slice(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_simple_field() {
        // S3: "foo=bar"
        let mut buf = Vec::new();
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend_from_slice(b"foo=bar");
        let fields = extract_fields(Bytes::from(buf), 0).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "foo");
        assert_eq!(&fields[0].1[..], b"bar");
    }

    #[test]
    fn compose_then_extract_round_trips() {
        let entries: Vec<(&str, Vec<u8>)> = vec![("a", b"1".to_vec()), ("bb", b"22".to_vec())];
        let composed = compose_fields(entries.clone());
        let fields = extract_fields(Bytes::from(composed), 0).unwrap();
        assert_eq!(fields.len(), entries.len());
        for ((name, value), (fname, fvalue)) in entries.iter().zip(fields.iter()) {
            assert_eq!(name, fname);
            assert_eq!(&value[..], &fvalue[..]);
        }
    }

    #[test]
    fn truncated_suffix_fails() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend_from_slice(b"foo=ba"); // one byte short of the declared length
        let err = extract_fields(Bytes::from(buf), 0).unwrap_err();
        assert!(matches!(err, RosbagError::Corrupt { .. }));
    }

    #[test]
    fn missing_equals_is_malformed() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(b"foo");
        let err = extract_fields(Bytes::from(buf), 0).unwrap_err();
        assert!(matches!(err, RosbagError::Malformed { .. }));
    }

    #[test]
    fn short_length_prefix_is_truncated() {
        let err = extract_fields(Bytes::from_static(&[1, 0, 0]), 0).unwrap_err();
        assert!(matches!(err, RosbagError::Truncated { .. }));
    }

    #[test]
    fn duplicate_names_last_write_wins_on_lookup() {
        let entries: Vec<(&str, Vec<u8>)> = vec![("k", b"first".to_vec()), ("k", b"second".to_vec())];
        let composed = compose_fields(entries);
        let fields = extract_fields(Bytes::from(composed), 0).unwrap();
        assert_eq!(&lookup(&fields, "k").unwrap()[..], b"second");
    }
}
