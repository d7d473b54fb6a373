//! The seekable byte source contract (§6) and its two implementors.
//!
//! Everything above this module reads a bag through the [`ByteSource`]
//! trait; `BagFile` backs it with a file on disk, `SliceSource` backs it
//! with an in-memory buffer (used both by tests and internally as the
//! source for a decompressed chunk payload).

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LE};
use bytes::Bytes;

use crate::error::{FormatError, GeneralError, Result};

/// A seekable byte source: `read(n)`, absolute/relative seek, `tell`,
/// one `readline` for the version banner, and `close`.
pub trait ByteSource {
    /// Read exactly `n` bytes, or fail with [`FormatError::ShortRead`].
    fn read(&mut self, n: usize) -> Result<Bytes>;

    /// Seek to an absolute byte offset.
    fn seek_abs(&mut self, offset: u64) -> Result<()>;

    /// Seek by a signed offset relative to the current position.
    fn seek_cur(&mut self, delta: i64) -> Result<()>;

    /// Current byte offset.
    fn tell(&mut self) -> Result<u64>;

    /// Read one line up to and including `\n` (used only for the
    /// version banner).
    fn readline(&mut self) -> Result<String>;
}

/// File-backed byte source.
pub struct BagFile {
    inner: BufReader<File>,
}

impl BagFile {
    /// Open a bag file at `path`.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            inner: BufReader::new(file),
        })
    }
}

impl ByteSource for BagFile {
    fn read(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; n];
        let mut read = 0;
        while read < n {
            match self.inner.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(k) => read += k,
                Err(e) => return Err(GeneralError::Io(e.to_string()).into()),
            }
        }
        if read != n {
            return Err(FormatError::ShortRead {
                requested: n,
                available: read,
            }
            .into());
        }
        Ok(Bytes::from(buf))
    }

    fn seek_abs(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| GeneralError::Io(e.to_string()))?;
        Ok(())
    }

    fn seek_cur(&mut self, delta: i64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Current(delta))
            .map_err(|e| GeneralError::Io(e.to_string()))?;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64> {
        self.inner
            .stream_position()
            .map_err(|e| GeneralError::Io(e.to_string()).into())
    }

    fn readline(&mut self) -> Result<String> {
        let mut line = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            match self.inner.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                Err(e) => return Err(GeneralError::Io(e.to_string()).into()),
            }
        }
        String::from_utf8(line).map_err(|_| FormatError::InvalidVersionBanner(String::new()).into())
    }
}

/// In-memory byte source over an already-loaded buffer. Used for the
/// decompressed chunk cache's payload and for tests.
#[derive(Debug, Clone)]
pub struct SliceSource {
    buf: Bytes,
    pos: usize,
}

impl SliceSource {
    /// Wrap a buffer for sequential/seekable reads.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
        }
    }

    /// Number of bytes remaining from the current position.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl ByteSource for SliceSource {
    fn read(&mut self, n: usize) -> Result<Bytes> {
        if self.pos + n > self.buf.len() {
            return Err(FormatError::ShortRead {
                requested: n,
                available: self.buf.len().saturating_sub(self.pos),
            }
            .into());
        }
        let out = self.buf.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(out)
    }

    fn seek_abs(&mut self, offset: u64) -> Result<()> {
        self.pos = offset as usize;
        Ok(())
    }

    fn seek_cur(&mut self, delta: i64) -> Result<()> {
        self.pos = (self.pos as i64 + delta) as usize;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }

    fn readline(&mut self) -> Result<String> {
        let start = self.pos;
        let end = self.buf[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| start + i + 1)
            .unwrap_or(self.buf.len());
        let line = self.buf.slice(start..end);
        self.pos = end;
        String::from_utf8(line.to_vec()).map_err(|_| FormatError::InvalidVersionBanner(String::new()).into())
    }
}

/// Read a u32 little-endian value out of a byte slice already in hand
/// (used when decoding header field values, which are loaded wholesale).
pub(crate) fn le_u32(buf: &[u8]) -> u32 {
    LE::read_u32(buf)
}

/// Read a u64 little-endian value out of a byte slice already in hand.
pub(crate) fn le_u64(buf: &[u8]) -> u64 {
    LE::read_u64(buf)
}

/// Read a sized blob (`u32` length prefix + that many bytes) from a
/// byte source.
pub(crate) fn read_sized(src: &mut dyn ByteSource) -> Result<Bytes> {
    let len_bytes = src.read(4)?;
    let n = le_u32(&len_bytes) as usize;
    src.read(n)
}
