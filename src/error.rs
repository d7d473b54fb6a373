//! Error types for the bag reader.
//!
//! Two kinds are observable, matching the two ways a bag can fail to
//! produce a message: the bytes don't conform to the on-disk format
//! ([`FormatError`]), or a semantic precondition above the byte format
//! fails ([`GeneralError`]).

use std::fmt;

/// The bag bytes do not conform to the record format at some point.
#[derive(Debug, Clone)]
pub enum FormatError {
    /// Fewer bytes were available than a length prefix promised.
    ShortRead {
        /// Bytes requested.
        requested: usize,
        /// Bytes actually available.
        available: usize,
    },
    /// A record header field had no `=` separator, or its declared size
    /// ran past the end of the header blob.
    MalformedHeaderField,
    /// A header field was requested but absent, or present with the
    /// wrong byte width for its requested decoding.
    MissingField(&'static str),
    /// A record's `op` field did not match what the caller expected.
    UnexpectedOpcode {
        /// Opcode required by context.
        expected: u8,
        /// Opcode actually present.
        actual: u8,
    },
    /// The version banner line did not match `#ROS<tag> V<M>.<m>`.
    InvalidVersionBanner(String),
    /// The computed version number is not one this reader supports.
    UnsupportedVersion(u16),
    /// A chunk-info or topic-index record declared an unsupported
    /// internal record version (only version 1 is defined).
    UnsupportedRecordVersion {
        /// Which kind of record ("chunk info" or "index").
        kind: &'static str,
        /// The version value found in the record.
        version: u32,
    },
    /// A chunk declared a compression algorithm other than
    /// `none`, `bz2`, or `zlib`.
    UnknownCompression(String),
    /// A chunk's per-topic index entry count did not match the count
    /// recorded for that topic in its chunk-info record.
    ChunkTopicCountMismatch {
        /// Topic whose counts disagree.
        topic: String,
        /// Count recorded in the chunk-info record.
        expected: u32,
        /// Number of index entries actually read for the topic.
        actual: u32,
    },
    /// A chunk declared `compression = "none"` but its compressed and
    /// uncompressed sizes differed.
    ChunkSizeMismatch {
        /// Declared compressed (stored) size.
        compressed: u32,
        /// Declared uncompressed size.
        uncompressed: u32,
    },
    /// The source was exhausted or truncated mid-record.
    Truncated,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::ShortRead {
                requested,
                available,
            } => write!(
                f,
                "expected {requested} bytes, read {available}"
            ),
            FormatError::MalformedHeaderField => {
                write!(f, "malformed record header field")
            }
            FormatError::MissingField(name) => {
                write!(f, "expected \"{name}\" field in record")
            }
            FormatError::UnexpectedOpcode { expected, actual } => write!(
                f,
                "expected op code {expected:#04x}, got {actual:#04x}"
            ),
            FormatError::InvalidVersionBanner(line) => {
                write!(f, "rosbag does not support version line {line:?}")
            }
            FormatError::UnsupportedVersion(v) => {
                write!(f, "unknown bag version {v}")
            }
            FormatError::UnsupportedRecordVersion { kind, version } => {
                write!(f, "unknown {kind} record version: {version}")
            }
            FormatError::UnknownCompression(name) => {
                write!(f, "unknown compression: {name}")
            }
            FormatError::ChunkTopicCountMismatch {
                topic,
                expected,
                actual,
            } => write!(
                f,
                "chunk info for topic {topic} declared {expected} messages, index has {actual}"
            ),
            FormatError::ChunkSizeMismatch {
                compressed,
                uncompressed,
            } => write!(
                f,
                "chunk declared compression \"none\" but compressed size {compressed} != uncompressed size {uncompressed}"
            ),
            FormatError::Truncated => write!(f, "bag truncated mid-record"),
        }
    }
}

impl std::error::Error for FormatError {}

/// A semantic failure above the byte format: something the format
/// allows but which this open/retrieval cannot service.
#[derive(Debug, Clone)]
pub enum GeneralError {
    /// `Bag::open` was called with an argument it does not support.
    UnsupportedOpenArgument(String),
    /// A v1.3 index entry referenced a `chunk_pos` with no recorded
    /// [`ChunkHeader`][crate::types::ChunkHeader].
    NoChunkAtPosition(u64),
    /// The schema compiler could not produce a deserializer for a
    /// datatype.
    SchemaGenerationFailed {
        /// The datatype that failed to compile.
        datatype: String,
        /// The underlying error message.
        reason: String,
    },
    /// A message was requested on a topic whose datatype was never
    /// declared by a preceding message-definition record.
    UndeclaredTopic(String),
    /// The byte source reported an I/O failure.
    Io(String),
}

impl fmt::Display for GeneralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralError::UnsupportedOpenArgument(msg) => {
                write!(f, "unsupported argument to open: {msg}")
            }
            GeneralError::NoChunkAtPosition(pos) => {
                write!(f, "no chunk at position {pos}")
            }
            GeneralError::SchemaGenerationFailed { datatype, reason } => write!(
                f,
                "error generating datatype {datatype}: {reason}"
            ),
            GeneralError::UndeclaredTopic(topic) => write!(
                f,
                "cannot deserialize messages on topic [{topic}]: message was not preceded in bag by a definition"
            ),
            GeneralError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for GeneralError {}

/// The crate's top-level error type.
#[derive(Debug, Clone)]
pub enum BagError {
    /// See [`FormatError`].
    Format(FormatError),
    /// See [`GeneralError`].
    General(GeneralError),
}

impl fmt::Display for BagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BagError::Format(e) => write!(f, "{e}"),
            BagError::General(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BagError::Format(e) => Some(e),
            BagError::General(e) => Some(e),
        }
    }
}

impl From<FormatError> for BagError {
    fn from(e: FormatError) -> Self {
        BagError::Format(e)
    }
}

impl From<GeneralError> for BagError {
    fn from(e: GeneralError) -> Self {
        BagError::General(e)
    }
}

impl From<std::io::Error> for BagError {
    fn from(e: std::io::Error) -> Self {
        BagError::General(GeneralError::Io(e.to_string()))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BagError>;
