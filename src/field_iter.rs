//! Iterator over the packed `name=value` fields of a record header.

use bytes::Bytes;

use crate::byte_source::le_u32;
use crate::error::{FormatError, Result};

/// Split one `{ u32 field_len; bytes[field_len] field }` entry off the
/// front of `header`, returning `(name, value, remainder)`.
fn read_field(mut header: Bytes) -> Result<(String, Bytes, Bytes)> {
    if header.len() < 4 {
        return Err(FormatError::MalformedHeaderField.into());
    }
    let n = le_u32(&header[..4]) as usize;
    header = header.slice(4..);

    if header.len() < n {
        return Err(FormatError::MalformedHeaderField.into());
    }
    let field = header.slice(..n);
    let rest = header.slice(n..);

    let sep = field
        .iter()
        .position(|&b| b == b'=')
        .ok_or(FormatError::MalformedHeaderField)?;
    let name = std::str::from_utf8(&field[..sep])
        .map_err(|_| FormatError::MalformedHeaderField)?
        .to_string();
    let value = field.slice(sep + 1..);
    Ok((name, value, rest))
}

/// Iterates the `name=value` fields of a header blob in the order they
/// appear on disk.
pub(crate) struct FieldIterator {
    buf: Bytes,
}

impl FieldIterator {
    pub(crate) fn new(buf: Bytes) -> Self {
        Self { buf }
    }
}

impl Iterator for FieldIterator {
    type Item = Result<(String, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        match read_field(self.buf.clone()) {
            Ok((name, val, rest)) => {
                self.buf = rest;
                Some(Ok((name, val)))
            }
            Err(e) => {
                self.buf = Bytes::new();
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(fields: &[(&str, &[u8])]) -> Bytes {
        let mut buf = Vec::new();
        for (name, value) in fields {
            let mut entry = name.as_bytes().to_vec();
            entry.push(b'=');
            entry.extend_from_slice(value);
            buf.extend_from_slice(&(entry.len() as u32).to_le_bytes());
            buf.extend_from_slice(&entry);
        }
        Bytes::from(buf)
    }

    #[test]
    fn iterates_fields_in_order() {
        let buf = packed(&[("op", &[3]), ("topic", b"/a")]);
        let fields: Vec<_> = FieldIterator::new(buf).collect::<Result<_>>().unwrap();
        assert_eq!(fields, vec![("op".to_string(), Bytes::from_static(&[3])), ("topic".to_string(), Bytes::from_static(b"/a"))]);
    }

    #[test]
    fn empty_header_yields_no_fields() {
        assert_eq!(FieldIterator::new(Bytes::new()).count(), 0);
    }

    #[test]
    fn repeated_field_name_surfaces_both_occurrences_in_order() {
        // FieldIterator itself does not dedupe; Header::parse is what
        // keeps the last occurrence (see header.rs's own test).
        let buf = packed(&[("op", &[3]), ("op", &[2])]);
        let fields: Vec<_> = FieldIterator::new(buf).collect::<Result<_>>().unwrap();
        assert_eq!(
            fields,
            vec![
                ("op".to_string(), Bytes::from_static(&[3])),
                ("op".to_string(), Bytes::from_static(&[2])),
            ]
        );
    }

    #[test]
    fn missing_separator_is_malformed() {
        let entry = b"noseparator";
        let mut buf = Vec::new();
        buf.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        buf.extend_from_slice(entry);
        let mut it = FieldIterator::new(Bytes::from(buf));
        assert!(it.next().unwrap().is_err());
    }
}
