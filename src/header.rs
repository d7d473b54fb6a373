//! Header field accessor (§4.C): decode a parsed header's fields by
//! name and requested kind.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use bytes::Bytes;

use crate::byte_source::{le_u32, le_u64};
use crate::error::{FormatError, Result};
use crate::field_iter::FieldIterator;

/// A parsed record header: field name to raw value. Field order is not
/// semantically meaningful; a name repeated within one header keeps the
/// last occurrence (§4.B).
pub(crate) struct Header {
    fields: HashMap<String, Bytes>,
    consumed: RefCell<HashSet<&'static str>>,
}

impl Header {
    /// Parse a header blob into a name -> raw value mapping.
    pub(crate) fn parse(buf: Bytes) -> Result<Self> {
        let mut fields = HashMap::new();
        for item in FieldIterator::new(buf) {
            let (name, val) = item?;
            fields.insert(name, val);
        }
        Ok(Self {
            fields,
            consumed: RefCell::new(HashSet::new()),
        })
    }

    fn raw(&self, name: &'static str) -> Result<&Bytes> {
        self.consumed.borrow_mut().insert(name);
        self.fields.get(name).ok_or(FormatError::MissingField(name).into())
    }

    /// Log a warning for every field present on disk that no typed
    /// getter read. Call once a record's readers have consumed every
    /// field they recognize (teacher: `record_types/utils.rs`'s
    /// `unknown_field`, `record_types/connection.rs`'s fallthrough
    /// `_ => warn!(...)` match arm).
    pub(crate) fn warn_unknown_fields(&self) {
        let consumed = self.consumed.borrow();
        for (name, val) in &self.fields {
            if !consumed.contains(name.as_str()) {
                log::warn!("unknown header field: {name}={val:?}");
            }
        }
    }

    pub(crate) fn get_str(&self, name: &'static str) -> Result<String> {
        let val = self.raw(name)?;
        String::from_utf8(val.to_vec()).map_err(|_| FormatError::MissingField(name).into())
    }

    pub(crate) fn get_bytes(&self, name: &'static str) -> Result<Bytes> {
        Ok(self.raw(name)?.clone())
    }

    pub(crate) fn get_u8(&self, name: &'static str) -> Result<u8> {
        let val = self.raw(name)?;
        if val.len() != 1 {
            return Err(FormatError::MissingField(name).into());
        }
        Ok(val[0])
    }

    pub(crate) fn get_u32(&self, name: &'static str) -> Result<u32> {
        let val = self.raw(name)?;
        if val.len() != 4 {
            return Err(FormatError::MissingField(name).into());
        }
        Ok(le_u32(val))
    }

    pub(crate) fn get_u64(&self, name: &'static str) -> Result<u64> {
        let val = self.raw(name)?;
        if val.len() != 8 {
            return Err(FormatError::MissingField(name).into());
        }
        Ok(le_u64(val))
    }

    /// Decode a `time` field: two consecutive LE u32s, seconds then
    /// nanoseconds, packed into one u64 of total nanoseconds.
    pub(crate) fn get_time(&self, name: &'static str) -> Result<u64> {
        let val = self.raw(name)?;
        if val.len() != 8 {
            return Err(FormatError::MissingField(name).into());
        }
        let secs = le_u32(&val[..4]) as u64;
        let nsecs = le_u32(&val[4..]) as u64;
        Ok(secs * 1_000_000_000 + nsecs)
    }

    /// Fetch the `op` field as u8 and require it to equal `expected`.
    pub(crate) fn assert_op(&self, expected: u8) -> Result<()> {
        let op = self.get_u8("op")?;
        if op != expected {
            return Err(FormatError::UnexpectedOpcode {
                expected,
                actual: op,
            }
            .into());
        }
        Ok(())
    }
}
