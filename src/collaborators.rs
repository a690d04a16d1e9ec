//! External-collaborator contracts (spec.md §6).
//!
//! This crate is the record codec and bag layout engine only; it never
//! touches a filesystem, a network socket, or a message-definition grammar
//! directly. Callers plug those in by implementing the traits below.

use bytes::Bytes;

use crate::error::{Result, RosbagError};

/// A random-access byte source. Implementations typically wrap a file
/// handle, an in-memory buffer, or an object-store client.
///
/// Used generically (`BagReader<F: Filelike>`), never as a trait object, so
/// the native `async fn` below needs no boxing.
pub trait Filelike: Send + Sync {
    /// Total size of the underlying byte source.
    fn size(&self) -> impl std::future::Future<Output = Result<u64>> + Send;
    /// Read `len` bytes starting at `offset`.
    fn read(&self, offset: u64, len: u64) -> impl std::future::Future<Output = Result<Bytes>> + Send;
}

/// The write half of a [`Filelike`] source, obtained when a caller wants to
/// patch a bag in place rather than realize a whole new byte buffer.
pub trait Writer: Send + Sync {
    /// Write `bytes` at `offset`.
    fn write(&mut self, offset: u64, bytes: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Flush and release any resources held by the writer.
    fn close(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// A table from compression name (`"none"`, `"bz2"`, `"lz4"`, ...) to a
/// decompress transform.
pub trait Decompressor {
    /// Decompress `bytes` encoded under `name`. `hint`, when given, is the
    /// declared uncompressed size (`Chunk::size`) and may be used to
    /// pre-size the output buffer.
    fn decompress(&self, name: &str, bytes: Bytes, hint: Option<u32>) -> Result<Bytes>;
}

/// A table from compression name to a compress transform, the inverse of
/// [`Decompressor`].
pub trait Compressor {
    /// Compress `bytes` under the codec named `name`.
    fn compress(&self, name: &str, bytes: &[u8]) -> Result<Bytes>;
}

/// One named, typed field in a parsed ROS message definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// ROS type name (e.g. `"float64"`, `"geometry_msgs/Point"`).
    pub field_type: String,
    /// `true` if this field is an array of `field_type`.
    pub is_array: bool,
}

/// One message type's field list, as produced by a
/// [`MessageDefinitionParser`].
///
/// A ROS `message_definition` blob concatenates the primary message type
/// with every embedded sub-message type it references (ROS's `===`-
/// separated "full text" convention); the parser returns one descriptor per
/// type, primary type first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTypeDescriptor {
    /// Fully-qualified type name (e.g. `geometry_msgs/Point`), or empty for
    /// the primary type when the caller expects it to be keyed by the
    /// owning connection's `tp` instead.
    pub name: String,
    /// The type's fields, in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

/// Parses ROS message-definition text (as stored in
/// `Connection::message_definition`) into a list of named type descriptors.
///
/// The crate never parses ROS IDL grammar itself; callers supply this.
pub type MessageDefinitionParser = dyn Fn(&str) -> Result<Vec<MessageTypeDescriptor>> + Send + Sync;

/// The only compression codec this crate implements itself: a passthrough
/// for `"none"`, plus `bz2`/`lz4` wired straight through to the `bzip2` and
/// `lz4` crates. Provided as a convenience default; callers with other
/// compression needs implement [`Decompressor`]/[`Compressor`] directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCodec;

impl Decompressor for StandardCodec {
    fn decompress(&self, name: &str, bytes: Bytes, hint: Option<u32>) -> Result<Bytes> {
        use bytes::Buf;

        match name {
            "none" => Ok(bytes),
            "bz2" => {
                let mut out = Vec::with_capacity(hint.map(|s| s as usize).unwrap_or(bytes.len()));
                let mut decompressor = bzip2::Decompress::new(false);
                decompressor
                    .decompress_vec(&bytes, &mut out)
                    .map_err(|e| RosbagError::Decompress(e.to_string()))?;
                Ok(Bytes::from(out))
            }
            "lz4" => {
                let mut decoder = lz4::Decoder::new(bytes.clone().reader())
                    .map_err(|e| RosbagError::Decompress(e.to_string()))?;
                let mut out = Vec::with_capacity(hint.map(|s| s as usize).unwrap_or(bytes.len()));
                std::io::copy(&mut decoder, &mut out)
                    .map_err(|e| RosbagError::Decompress(e.to_string()))?;
                Ok(Bytes::from(out))
            }
            other => Err(RosbagError::Decompress(format!(
                "unsupported compression codec {other:?}"
            ))),
        }
    }
}

impl Compressor for StandardCodec {
    fn compress(&self, name: &str, bytes: &[u8]) -> Result<Bytes> {
        use std::io::Write;

        match name {
            "none" => Ok(Bytes::copy_from_slice(bytes)),
            "bz2" => {
                let mut compressor = bzip2::Compress::new(bzip2::Compression::default(), 30);
                let mut out = Vec::with_capacity(bytes.len());
                compressor
                    .compress_vec(bytes, &mut out, bzip2::Action::Finish)
                    .map_err(|e| RosbagError::Decompress(e.to_string()))?;
                Ok(Bytes::from(out))
            }
            "lz4" => {
                let mut encoder = lz4::EncoderBuilder::new()
                    .build(Vec::new())
                    .map_err(|e| RosbagError::Decompress(e.to_string()))?;
                encoder
                    .write_all(bytes)
                    .map_err(|e| RosbagError::Decompress(e.to_string()))?;
                let (out, result) = encoder.finish();
                result.map_err(|e| RosbagError::Decompress(e.to_string()))?;
                Ok(Bytes::from(out))
            }
            other => Err(RosbagError::Decompress(format!(
                "unsupported compression codec {other:?}"
            ))),
        }
    }
}
