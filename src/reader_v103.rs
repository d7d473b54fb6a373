//! V1.3 reader (§4.E): file header, chunk infos, chunk headers, and
//! per-chunk topic indexes.

use std::collections::HashMap;

use base16ct::lower::decode as hex_decode;

use crate::bag::{Bag, TopicIndexEntries};
use crate::byte_source::{le_u32, read_sized, ByteSource, SliceSource};
use crate::error::{FormatError, Result};
use crate::record::{op, read_record, try_read_record};
use crate::types::{ChunkHeader, ChunkInfo, Compression, IndexEntry103, TopicInfo};

/// Parse the file header, index region, chunk infos, chunk headers,
/// and per-chunk topic indexes, populating `bag`'s tables (§4.E
/// `start_reading`).
pub(crate) fn start_reading(bag: &mut Bag) -> Result<()> {
    let (index_pos, chunk_count, topic_count) = match read_file_header(bag)? {
        Some(header) => header,
        None => {
            // Nothing at all after the version banner: an empty bag,
            // not a truncated one (spec boundary: `open` succeeds,
            // `get_messages` is empty).
            log::debug!("v1.3 bag: no records after version banner");
            return Ok(());
        }
    };
    log::debug!("v1.3 bag: {chunk_count} chunks, {topic_count} topics, index at {index_pos}");

    bag.src.seek_abs(index_pos)?;

    for _ in 0..topic_count {
        let topic_info = read_message_definition(bag)?;
        bag.topic_infos.insert(topic_info.topic.clone(), topic_info);
    }

    let mut chunk_infos = Vec::with_capacity(chunk_count as usize);
    for _ in 0..chunk_count {
        chunk_infos.push(read_chunk_info(bag)?);
    }

    for chunk_info in &chunk_infos {
        bag.src.seek_abs(chunk_info.chunk_pos)?;

        let chunk_header = read_chunk_header(bag)?;
        bag.chunk_headers.insert(chunk_info.chunk_pos, chunk_header.clone());

        // Skip the stored (possibly compressed) payload; random access
        // decompresses it on demand, not during open (§4.E step 3).
        bag.src.seek_cur(chunk_header.compressed_size as i64)?;

        for _ in 0..chunk_info.topic_counts.len() {
            read_topic_index(bag, chunk_info.chunk_pos, &chunk_info.topic_counts)?;
        }
    }

    bag.chunk_infos = chunk_infos;
    Ok(())
}

/// File header record (opcode `0x03`): `index_pos`, `chunk_count`,
/// `topic_count`. The data blob is padding, read and ignored. Returns
/// `None` when the source is cleanly exhausted right after the version
/// banner, rather than mid-record (§9 open question: a recordless file
/// is an empty bag, not a truncated one).
fn read_file_header(bag: &mut Bag) -> Result<Option<(u64, u32, u32)>> {
    let (header, _data) = match try_read_record(bag.src.as_mut())? {
        Some(r) => r,
        None => return Ok(None),
    };
    header.assert_op(op::FILE_HEADER)?;
    let index_pos = header.get_u64("index_pos")?;
    let chunk_count = header.get_u32("chunk_count")?;
    let topic_count = header.get_u32("topic_count")?;
    header.warn_unknown_fields();
    Ok(Some((index_pos, chunk_count, topic_count)))
}

/// Message-type definition record (opcode `0x01`): `topic`, `type`,
/// `md5`, `def`. The data blob is ignored.
pub(crate) fn read_message_definition(bag: &mut Bag) -> Result<TopicInfo> {
    let (header, _data) = read_record(bag.src.as_mut())?;
    header.assert_op(op::MSG_DEF)?;
    let topic = header.get_str("topic")?;
    let datatype = header.get_str("type")?;
    let md5_hex = header.get_str("md5")?;
    let msg_def = header.get_str("def")?;

    let mut md5sum = [0u8; 16];
    hex_decode(md5_hex.as_bytes(), &mut md5sum)
        .map_err(|_| FormatError::MissingField("md5"))?;

    header.warn_unknown_fields();
    Ok(TopicInfo {
        topic,
        datatype,
        md5sum,
        msg_def,
    })
}

/// Chunk-info record (opcode `0x06`): `ver` (must be 1), `chunk_pos`,
/// `start_time`, `end_time`, `count`, followed by `count` pairs of
/// (sized topic name, `u32` count) in the data blob.
fn read_chunk_info(bag: &mut Bag) -> Result<ChunkInfo> {
    let (header, data) = read_record(bag.src.as_mut())?;
    header.assert_op(op::CHUNK_INFO)?;

    let ver = header.get_u32("ver")?;
    if ver != 1 {
        return Err(FormatError::UnsupportedRecordVersion {
            kind: "chunk info",
            version: ver,
        }
        .into());
    }
    let chunk_pos = header.get_u64("chunk_pos")?;
    let start_time = header.get_time("start_time")?;
    let end_time = header.get_time("end_time")?;
    let count = header.get_u32("count")?;

    let mut cursor = SliceSource::new(data);
    let mut topic_counts = HashMap::with_capacity(count as usize);
    for _ in 0..count {
        let topic_name = read_sized(&mut cursor)?;
        let topic_name = String::from_utf8(topic_name.to_vec())
            .map_err(|_| FormatError::MalformedHeaderField)?;
        let count_bytes = cursor.read(4)?;
        topic_counts.insert(topic_name, le_u32(&count_bytes));
    }

    header.warn_unknown_fields();
    Ok(ChunkInfo {
        chunk_pos,
        start_time,
        end_time,
        topic_counts,
    })
}

/// Chunk record header (opcode `0x05`): `compression`, `size`
/// (uncompressed). The following `u32` is the compressed (stored) size;
/// the position right after it is `data_pos`. The compressed payload
/// itself is deliberately not read here (§4.E step 5).
fn read_chunk_header(bag: &mut Bag) -> Result<ChunkHeader> {
    let header_buf = read_sized(bag.src.as_mut())?;
    let header = crate::header::Header::parse(header_buf)?;
    header.assert_op(op::CHUNK)?;

    let compression = Compression::parse(&header.get_str("compression")?)?;
    let uncompressed_size = header.get_u32("size")?;

    let compressed_size_bytes = bag.src.read(4)?;
    let compressed_size = le_u32(&compressed_size_bytes);
    let data_pos = bag.src.tell()?;

    if compression == Compression::None && compressed_size != uncompressed_size {
        return Err(FormatError::ChunkSizeMismatch {
            compressed: compressed_size,
            uncompressed: uncompressed_size,
        }
        .into());
    }

    header.warn_unknown_fields();
    Ok(ChunkHeader {
        compression,
        compressed_size,
        uncompressed_size,
        data_pos,
    })
}

/// Topic-index record (opcode `0x04`): `ver` (must be 1), `topic`,
/// `count`, followed by `count` pairs of `(time, u32 offset)` in the
/// data blob. Appended to the owning topic's index, concatenating
/// across chunks (§3 "TopicIndex").
fn read_topic_index(
    bag: &mut Bag,
    chunk_pos: u64,
    topic_counts: &HashMap<String, u32>,
) -> Result<()> {
    let (header, data) = read_record(bag.src.as_mut())?;
    header.assert_op(op::INDEX_DATA)?;

    let ver = header.get_u32("ver")?;
    if ver != 1 {
        return Err(FormatError::UnsupportedRecordVersion {
            kind: "index",
            version: ver,
        }
        .into());
    }
    let topic = header.get_str("topic")?;
    let count = header.get_u32("count")?;

    if let Some(&expected) = topic_counts.get(&topic) {
        if expected != count {
            return Err(FormatError::ChunkTopicCountMismatch {
                topic,
                expected,
                actual: count,
            }
            .into());
        }
    }

    header.warn_unknown_fields();

    let mut cursor = SliceSource::new(data);
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let secs_bytes = cursor.read(4)?;
        let nsecs_bytes = cursor.read(4)?;
        let time = le_u32(&secs_bytes) as u64 * 1_000_000_000 + le_u32(&nsecs_bytes) as u64;
        let offset_bytes = cursor.read(4)?;
        let offset = le_u32(&offset_bytes);
        entries.push(IndexEntry103 {
            time,
            chunk_pos,
            offset,
        });
    }

    append_entries(bag, topic, entries);
    Ok(())
}

fn append_entries(bag: &mut Bag, topic: String, entries: Vec<IndexEntry103>) {
    if let Some(&idx) = bag.topic_position.get(&topic) {
        match &mut bag.topic_indexes[idx].1 {
            TopicIndexEntries::V103(v) => v.extend(entries),
            TopicIndexEntries::V102(_) => unreachable!("v1.3 reader never mixes entry kinds"),
        }
    } else {
        bag.topic_position.insert(topic.clone(), bag.topic_indexes.len());
        bag.topic_indexes.push((topic, TopicIndexEntries::V103(entries)));
    }
}
