//! The external schema-compiler contract (§6, §9) and an in-repo test
//! double for it.
//!
//! The real schema compiler — turning a ROS message-definition string
//! into a generated deserializer — is an external collaborator and out
//! of scope (spec §1). What this crate owns is the seam: a capability
//! passed into the [`Bag`][crate::bag::Bag] at construction time, with
//! the per-datatype deserializer cache owned by the reader rather than
//! the compiler.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{GeneralError, Result};

/// A decoded message value. The only built-in kind wraps the raw
/// serialized bytes; real deployments supply their own
/// [`MessageFactory`] producing richer values.
#[derive(Debug, Clone)]
pub enum Message {
    /// Undecoded payload bytes, as produced by [`RawBytesCompiler`].
    Raw(Bytes),
}

/// Produces decoded message values from serialized bytes for one
/// datatype.
pub trait MessageFactory: Send + Sync {
    /// Deserialize one message payload.
    fn deserialize(&self, data: &[u8]) -> Result<Message>;
}

/// Given `(datatype, msg_def)`, produce a factory of deserializers for
/// that datatype.
pub trait SchemaCompiler: Send + Sync {
    /// Compile a message definition into a deserializer factory, or
    /// raise a generation error if the definition is malformed.
    fn compile(&self, datatype: &str, msg_def: &str) -> Result<Arc<dyn MessageFactory>>;
}

/// A [`SchemaCompiler`] that performs no decoding: every datatype gets
/// a factory that wraps its payload bytes verbatim as
/// [`Message::Raw`]. Used by the CLI inspector and by tests, standing
/// in for the real ROS message-definition compiler.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawBytesCompiler;

struct RawBytesFactory;

impl MessageFactory for RawBytesFactory {
    fn deserialize(&self, data: &[u8]) -> Result<Message> {
        Ok(Message::Raw(Bytes::copy_from_slice(data)))
    }
}

impl SchemaCompiler for RawBytesCompiler {
    fn compile(&self, _datatype: &str, _msg_def: &str) -> Result<Arc<dyn MessageFactory>> {
        Ok(Arc::new(RawBytesFactory))
    }
}

pub(crate) fn generation_failed(datatype: &str, reason: impl std::fmt::Display) -> GeneralError {
    GeneralError::SchemaGenerationFailed {
        datatype: datatype.to_string(),
        reason: reason.to_string(),
    }
}
