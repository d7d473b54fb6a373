//! Chunk payload decompression (§4.E step 3).

use bytes::Bytes;
use std::io::Read;

use crate::error::{FormatError, GeneralError, Result};
use crate::types::Compression;

impl Compression {
    /// Decompress `data` according to this algorithm. `uncompressed_size`
    /// sizes the output buffer but is not otherwise trusted; callers
    /// validate the decompressed length themselves.
    pub(crate) fn decompress(self, data: Bytes, uncompressed_size: u32) -> Result<Bytes> {
        match self {
            Compression::None => Ok(data),
            Compression::Bz2 => {
                let mut decompressed = Vec::with_capacity(uncompressed_size as usize);
                let mut decompressor = bzip2::Decompress::new(false);
                decompressor
                    .decompress_vec(&data, &mut decompressed)
                    .map_err(|e| GeneralError::Io(format!("bz2 decompression failed: {e}")))?;
                Ok(Bytes::from(decompressed))
            }
            Compression::Zlib => {
                let mut decoder = flate2::read::ZlibDecoder::new(&data[..]);
                let mut decompressed = Vec::with_capacity(uncompressed_size as usize);
                decoder
                    .read_to_end(&mut decompressed)
                    .map_err(|e| GeneralError::Io(format!("zlib decompression failed: {e}")))?;
                Ok(Bytes::from(decompressed))
            }
        }
    }
}

/// Check a decompressed chunk payload's length against the size the
/// chunk header declared.
pub(crate) fn check_len(actual: usize, expected: u32) -> Result<()> {
    if actual != expected as usize {
        return Err(FormatError::Truncated.into());
    }
    Ok(())
}
