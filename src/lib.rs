//! A reader for the versioned, record-oriented ROS bag log format
//! (v1.2 and v1.3).
//!
//! A bag stores, in one sequential byte stream, message-type
//! declarations, payloads grouped into optionally compressed chunks,
//! and per-topic indexes for random access by time. This crate parses
//! that stream, validates its structural invariants, reconstructs the
//! per-topic index, and yields decoded message payloads.
//!
//! Message deserialization itself is delegated to a [`SchemaCompiler`]
//! supplied at open time — this crate owns the record format, not the
//! ROS message-definition language.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rosbag::{Bag, RawBytesCompiler};
//!
//! # fn main() -> rosbag::Result<()> {
//! let mut bag = Bag::open_path("dataset.bag", Arc::new(RawBytesCompiler))?;
//! for (topic, info) in bag.topic_infos() {
//!     println!("{topic}: {}", info.datatype);
//! }
//! for message in bag.get_messages()? {
//!     let _ = message;
//! }
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs, rust_2018_idioms)]

mod bag;
mod byte_source;
mod decompress;
mod error;
mod field_iter;
mod header;
mod reader_v102;
mod reader_v103;
mod record;
mod schema;
mod types;
mod version;

pub use bag::Bag;
pub use byte_source::{BagFile, ByteSource, SliceSource};
pub use error::{BagError, FormatError, GeneralError, Result};
pub use schema::{Message, MessageFactory, RawBytesCompiler, SchemaCompiler};
pub use types::{ChunkHeader, ChunkInfo, Compression, IndexEntry102, IndexEntry103, TopicInfo};
