//! Record reader (§4.B): one `(header, data)` pair off a byte source.

use bytes::Bytes;

use crate::byte_source::{le_u32, read_sized, ByteSource};
use crate::error::{BagError, FormatError, Result};
use crate::header::Header;

/// Opcodes shared by the v1.2 and v1.3 layouts (§4.D).
pub(crate) mod op {
    pub(crate) const MSG_DEF: u8 = 0x01;
    pub(crate) const MSG_DATA: u8 = 0x02;
    pub(crate) const FILE_HEADER: u8 = 0x03;
    pub(crate) const INDEX_DATA: u8 = 0x04;
    pub(crate) const CHUNK: u8 = 0x05;
    pub(crate) const CHUNK_INFO: u8 = 0x06;
}

/// Read one record: a sized header blob, parsed into named fields,
/// followed by a sized data blob. Used for every record kind except
/// `Chunk`, whose payload is read on demand rather than eagerly (§4.E).
pub(crate) fn read_record(src: &mut dyn ByteSource) -> Result<(Header, Bytes)> {
    let header_buf = read_sized(src)?;
    let header = Header::parse(header_buf)?;
    let data = read_sized(src)?;
    Ok((header, data))
}

/// Read one record, but return `Ok(None)` instead of an error when the
/// source is cleanly exhausted at a record boundary (no bytes at all
/// before the header's length prefix). A short read that starts mid
/// length-prefix is still a genuine truncation.
///
/// Used by the two readers that scan forward until end-of-file rather
/// than a known count: the v1.2 unindexed reader (§4.G) and the v1.2
/// indexed reader's index-region scan (§4.F), whose termination
/// condition is not given explicitly by a count field (§9 open
/// questions).
pub(crate) fn try_read_record(src: &mut dyn ByteSource) -> Result<Option<(Header, Bytes)>> {
    let len_bytes = match src.read(4) {
        Ok(b) => b,
        Err(BagError::Format(FormatError::ShortRead { available: 0, .. })) => return Ok(None),
        Err(e) => return Err(e),
    };
    let n = le_u32(&len_bytes) as usize;
    let header_buf = src.read(n)?;
    let header = Header::parse(header_buf)?;
    let data = read_sized(src)?;
    Ok(Some((header, data)))
}

/// Read record headers forward, discarding any message-definition
/// records (opcode `0x01`) along the way, and return the data blob of
/// the first record whose opcode is `0x02` (message data). Any other
/// opcode is a format error. Shared by every retrieval path (§4.E
/// step 4, §4.F).
pub(crate) fn read_next_message_data(src: &mut dyn ByteSource) -> Result<Bytes> {
    loop {
        let (header, data) = read_record(src)?;
        let found_op = header.get_u8("op")?;
        if found_op == op::MSG_DEF {
            continue;
        }
        if found_op != op::MSG_DATA {
            return Err(FormatError::UnexpectedOpcode {
                expected: op::MSG_DATA,
                actual: found_op,
            }
            .into());
        }
        header.warn_unknown_fields();
        return Ok(data);
    }
}
