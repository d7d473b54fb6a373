//! Data model (§3): the parsed, immutable metadata a `Bag` accumulates
//! during `open`.

use std::collections::HashMap;

use crate::error::{FormatError, Result};

/// Metadata for one publication channel, parsed from a message-definition
/// record (opcode `0x01`). Immutable once parsed.
#[derive(Debug, Clone)]
pub struct TopicInfo {
    /// Topic name.
    pub topic: String,
    /// Fully-qualified message type name.
    pub datatype: String,
    /// 16-byte schema compatibility digest, decoded from its 32-hex-char
    /// on-disk representation.
    pub md5sum: [u8; 16],
    /// Opaque textual schema definition.
    pub msg_def: String,
}

/// Compression algorithm of a chunk's stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Payload stored as-is.
    None,
    /// Bzip2-compressed payload.
    Bz2,
    /// Zlib-compressed payload.
    Zlib,
}

impl Compression {
    pub(crate) fn parse(name: &str) -> Result<Self> {
        match name {
            "none" => Ok(Compression::None),
            "bz2" => Ok(Compression::Bz2),
            "zlib" => Ok(Compression::Zlib),
            other => Err(FormatError::UnknownCompression(other.to_string()).into()),
        }
    }
}

/// Parsed header of a chunk record (v1.3 only).
#[derive(Debug, Clone)]
pub struct ChunkHeader {
    /// Compression algorithm of the stored payload.
    pub compression: Compression,
    /// Bytes of the stored (possibly compressed) payload.
    pub compressed_size: u32,
    /// Bytes of the payload after decompression; equal to
    /// `compressed_size` when `compression` is `None`.
    pub uncompressed_size: u32,
    /// Absolute file offset of the chunk's stored payload.
    pub data_pos: u64,
}

/// Metadata for one chunk, populated from the index region during
/// `open`. Immutable thereafter.
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    /// Byte offset of the chunk record in the file.
    pub chunk_pos: u64,
    /// Earliest message timestamp in the chunk, in nanoseconds.
    pub start_time: u64,
    /// Latest message timestamp in the chunk, in nanoseconds.
    pub end_time: u64,
    /// Per-topic message counts inside the chunk.
    pub topic_counts: HashMap<String, u32>,
}

/// A random-access pointer into a v1.3 chunk.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry103 {
    /// Message timestamp, in nanoseconds.
    pub time: u64,
    /// Offset of the owning chunk record.
    pub chunk_pos: u64,
    /// Byte offset within the *uncompressed* chunk payload where the
    /// message's record header begins.
    pub offset: u32,
}

/// A random-access pointer into a v1.2 bag.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry102 {
    /// Message timestamp, in nanoseconds.
    pub time: u64,
    /// Absolute file offset of the message record.
    pub offset: u64,
}
