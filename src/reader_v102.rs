//! V1.2 readers: the indexed layout (§4.F, absolute file offsets, no
//! chunks) and the unindexed, forward-only layout (§4.G).

use crate::bag::{Bag, TopicIndexEntries};
use crate::byte_source::{le_u32, le_u64, ByteSource, SliceSource};
use crate::error::{FormatError, Result};
use crate::record::{op, read_record, try_read_record};
use crate::reader_v103;
use crate::schema::Message;
use crate::types::{IndexEntry102, TopicInfo};

/// File header (opcode `0x03`) carrying only `index_pos`; read topic
/// index records until end-of-file (§4.F `start_reading`, and §9 open
/// question: the loop has no count to bound it, so termination is
/// end-of-file).
pub(crate) fn start_reading_indexed(bag: &mut Bag) -> Result<()> {
    let (header, _data) = read_record(bag.src.as_mut())?;
    header.assert_op(op::FILE_HEADER)?;
    let index_pos = header.get_u64("index_pos")?;
    header.warn_unknown_fields();
    log::debug!("v1.2 indexed bag: index at {index_pos}");

    bag.src.seek_abs(index_pos)?;

    loop {
        let rec = try_read_record(bag.src.as_mut())?;
        let (header, data) = match rec {
            Some(r) => r,
            None => break,
        };
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
        header.warn_unknown_fields();

        let mut cursor = SliceSource::new(data);
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let secs_bytes = cursor.read(4)?;
            let nsecs_bytes = cursor.read(4)?;
            let time = le_u32(&secs_bytes) as u64 * 1_000_000_000 + le_u32(&nsecs_bytes) as u64;
            let offset_bytes = cursor.read(8)?;
            let offset = le_u64(&offset_bytes);
            entries.push(IndexEntry102 { time, offset });
        }

        if let Some(&idx) = bag.topic_position.get(&topic) {
            match &mut bag.topic_indexes[idx].1 {
                TopicIndexEntries::V102(v) => v.extend(entries),
                TopicIndexEntries::V103(_) => unreachable!("v1.2 reader never mixes entry kinds"),
            }
        } else {
            bag.topic_position.insert(topic.clone(), bag.topic_indexes.len());
            bag.topic_indexes.push((topic, TopicIndexEntries::V102(entries)));
        }
    }

    // Populate topic_infos from the message-definition record that
    // precedes each topic's first message (§4.F).
    let first_offsets: Vec<(String, u64)> = bag
        .topic_indexes
        .iter()
        .map(|(topic, entries)| {
            let offset = match entries {
                TopicIndexEntries::V102(v) => v[0].offset,
                TopicIndexEntries::V103(_) => unreachable!(),
            };
            (topic.clone(), offset)
        })
        .collect();

    for (_topic, offset) in first_offsets {
        bag.src.seek_abs(offset)?;
        // Field layout is identical to the v1.3 message-definition record.
        let topic_info = reader_v103::read_message_definition(bag)?;
        bag.topic_infos.insert(topic_info.topic.clone(), topic_info);
    }

    Ok(())
}

/// Lazy, restartable-only-by-reopen scan (§4.G). Each step reads record
/// headers, installing any `0x01` as topic metadata keyed by topic, and
/// emits a decoded message for the first `0x02` using the most recently
/// seen topic. End of file during a header read terminates the scan
/// cleanly rather than erroring.
pub(crate) fn get_messages_unindexed(bag: &mut Bag) -> Result<Vec<Message>> {
    let mut out = Vec::new();

    loop {
        let rec = try_read_record(bag.src.as_mut())?;
        let (header, data) = match rec {
            Some(r) => r,
            None => break,
        };

        let found_op = header.get_u8("op")?;
        if found_op == op::MSG_DEF {
            let topic = header.get_str("topic")?;
            let datatype = header.get_str("type")?;
            let md5_hex = header.get_str("md5")?;
            let msg_def = header.get_str("def")?;
            let mut md5sum = [0u8; 16];
            base16ct::lower::decode(md5_hex.as_bytes(), &mut md5sum)
                .map_err(|_| FormatError::MissingField("md5"))?;
            let topic_info = TopicInfo {
                topic: topic.clone(),
                datatype,
                md5sum,
                msg_def,
            };
            header.warn_unknown_fields();
            log::debug!("unindexed reader: switching to topic {topic}");
            bag.unindexed_current_topic = Some(topic.clone());
            bag.topic_infos.insert(topic, topic_info);
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

        let topic = bag
            .unindexed_current_topic
            .clone()
            .ok_or_else(|| crate::error::GeneralError::UndeclaredTopic("<none>".to_string()))?;
        let topic_info = bag
            .topic_infos
            .get(&topic)
            .cloned()
            .ok_or_else(|| crate::error::GeneralError::UndeclaredTopic(topic.clone()))?;
        let factory = bag.get_or_compile_factory(&topic_info)?;
        out.push(factory.deserialize(&data)?);
    }

    Ok(out)
}
