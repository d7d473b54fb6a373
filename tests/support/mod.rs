//! Synthetic bag byte-builders shared by the integration tests.
//!
//! There is no sample `.bag` fixture in this repo; every scenario is
//! assembled field-by-field so each test documents exactly which bytes
//! it depends on.

#![allow(dead_code)]

pub fn le_u32(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

pub fn le_u64(v: u64) -> [u8; 8] {
    v.to_le_bytes()
}

/// One `name=value` header field, length-prefixed.
pub fn field(name: &str, value: &[u8]) -> Vec<u8> {
    let mut entry = Vec::new();
    entry.extend_from_slice(name.as_bytes());
    entry.push(b'=');
    entry.extend_from_slice(value);
    let mut out = Vec::new();
    out.extend_from_slice(&le_u32(entry.len() as u32));
    out.extend_from_slice(&entry);
    out
}

pub fn op_field(op: u8) -> Vec<u8> {
    field("op", &[op])
}

pub fn u32_field(name: &str, v: u32) -> Vec<u8> {
    field(name, &le_u32(v))
}

pub fn u64_field(name: &str, v: u64) -> Vec<u8> {
    field(name, &le_u64(v))
}

pub fn time_field(name: &str, secs: u32, nsecs: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8);
    buf.extend_from_slice(&le_u32(secs));
    buf.extend_from_slice(&le_u32(nsecs));
    field(name, &buf)
}

pub fn str_field(name: &str, v: &str) -> Vec<u8> {
    field(name, v.as_bytes())
}

/// Assemble one record: a sized header (the concatenation of `fields`)
/// followed by a sized data blob.
pub fn record(fields: &[Vec<u8>], data: &[u8]) -> Vec<u8> {
    let mut header = Vec::new();
    for f in fields {
        header.extend_from_slice(f);
    }
    let mut out = Vec::new();
    out.extend_from_slice(&le_u32(header.len() as u32));
    out.extend_from_slice(&header);
    out.extend_from_slice(&le_u32(data.len() as u32));
    out.extend_from_slice(data);
    out
}

pub const OP_MSG_DEF: u8 = 0x01;
pub const OP_MSG_DATA: u8 = 0x02;
pub const OP_FILE_HEADER: u8 = 0x03;
pub const OP_INDEX_DATA: u8 = 0x04;
pub const OP_CHUNK: u8 = 0x05;
pub const OP_CHUNK_INFO: u8 = 0x06;

pub fn md5_hex(byte: u8) -> String {
    base16ct::lower::encode_string(&[byte; 16])
}

/// A message-definition record (opcode `0x01`).
pub fn msg_def_record(topic: &str, datatype: &str, md5: &str, def: &str) -> Vec<u8> {
    record(
        &[
            op_field(OP_MSG_DEF),
            str_field("topic", topic),
            str_field("type", datatype),
            str_field("md5", md5),
            str_field("def", def),
        ],
        &[],
    )
}

/// A message-data record (opcode `0x02`) inside a v1.3 chunk, with
/// no outer length framing (chunk payloads are raw concatenated
/// records once decompressed).
pub fn msg_data_record(conn: u32, secs: u32, nsecs: u32, payload: &[u8]) -> Vec<u8> {
    record(
        &[op_field(OP_MSG_DATA), u32_field("conn", conn), time_field("time", secs, nsecs)],
        payload,
    )
}

/// A v1.2 message-data record, which additionally carries `topic`.
pub fn msg_data_record_v102(topic: &str, secs: u32, nsecs: u32, payload: &[u8]) -> Vec<u8> {
    record(
        &[
            op_field(OP_MSG_DATA),
            str_field("topic", topic),
            time_field("time", secs, nsecs),
        ],
        payload,
    )
}

/// One chunk's contribution to a [`V103Bag`]: its messages and the
/// compression its payload is stored under.
pub struct ChunkSpec {
    pub compression: &'static str,
    pub messages: Vec<(u32, u32, Vec<u8>)>,
}

fn compress(compression: &str, data: &[u8]) -> Vec<u8> {
    match compression {
        "none" => data.to_vec(),
        "bz2" => {
            let mut encoder =
                bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            std::io::Write::write_all(&mut encoder, data).unwrap();
            encoder.finish().unwrap()
        }
        "zlib" => {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            std::io::Write::write_all(&mut encoder, data).unwrap();
            encoder.finish().unwrap()
        }
        other => panic!("unsupported test compression {other}"),
    }
}

/// Build a complete, well-formed v1.3 bag: one topic, one or more
/// chunks (each independently compressed), an index region, and a file
/// header whose `index_pos` points at it.
pub struct V103Bag {
    pub topic: String,
    pub datatype: String,
    pub chunks: Vec<ChunkSpec>,
}

impl V103Bag {
    /// Convenience constructor for the common single-chunk, uncompressed
    /// case.
    pub fn single_chunk(topic: &str, datatype: &str, messages: Vec<(u32, u32, Vec<u8>)>) -> Self {
        V103Bag {
            topic: topic.to_string(),
            datatype: datatype.to_string(),
            chunks: vec![ChunkSpec {
                compression: "none",
                messages,
            }],
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"#ROSBAG V1.3\n");

        let chunk_count = self.chunks.len() as u32;

        // `index_pos` isn't known until the rest of the bag is built.
        // `u64_field`/`u32_field` are fixed-width regardless of value,
        // so writing a placeholder now and patching it in place below
        // doesn't shift anything that follows.
        let file_header_pos = out.len();
        let placeholder = record(
            &[
                op_field(OP_FILE_HEADER),
                u64_field("index_pos", 0),
                u32_field("chunk_count", chunk_count),
                u32_field("topic_count", 1),
            ],
            &[],
        );
        out.extend_from_slice(&placeholder);

        let mut chunk_infos = Vec::new(); // (chunk_pos, start, end, count)

        for chunk in &self.chunks {
            let chunk_pos = out.len() as u64;

            let mut chunk_payload = Vec::new();
            let mut offsets = Vec::new();
            chunk_payload.extend_from_slice(&msg_def_record(
                &self.topic,
                &self.datatype,
                &md5_hex(0xAB),
                "string data",
            ));
            for (secs, nsecs, payload) in &chunk.messages {
                offsets.push(chunk_payload.len() as u32);
                chunk_payload.extend_from_slice(&msg_data_record(0, *secs, *nsecs, payload));
            }
            let uncompressed_size = chunk_payload.len() as u32;
            let stored = compress(chunk.compression, &chunk_payload);

            let chunk_header_fields = vec![
                op_field(OP_CHUNK),
                str_field("compression", chunk.compression),
                u32_field("size", uncompressed_size),
            ];
            let mut chunk_header_bytes = Vec::new();
            for f in &chunk_header_fields {
                chunk_header_bytes.extend_from_slice(f);
            }
            out.extend_from_slice(&le_u32(chunk_header_bytes.len() as u32));
            out.extend_from_slice(&chunk_header_bytes);
            out.extend_from_slice(&le_u32(stored.len() as u32));
            out.extend_from_slice(&stored);

            // The topic-index record for this chunk sits right after
            // its payload in the main stream, not in the index region:
            // `open` reads it immediately after skipping past the
            // chunk.
            let mut index_data = Vec::new();
            for (offset, (secs, nsecs, _)) in offsets.iter().zip(&chunk.messages) {
                index_data.extend_from_slice(&le_u32(*secs));
                index_data.extend_from_slice(&le_u32(*nsecs));
                index_data.extend_from_slice(&le_u32(*offset));
            }
            out.extend_from_slice(&record(
                &[
                    op_field(OP_INDEX_DATA),
                    u32_field("ver", 1),
                    str_field("topic", &self.topic),
                    u32_field("count", chunk.messages.len() as u32),
                ],
                &index_data,
            ));

            let start = chunk.messages.first().map(|(s, n, _)| (*s, *n)).unwrap_or((0, 0));
            let end = chunk.messages.last().map(|(s, n, _)| (*s, *n)).unwrap_or((0, 0));
            chunk_infos.push((chunk_pos, start, end, chunk.messages.len() as u32));
        }

        // The index region starts here: one message-definition record
        // per topic, then one chunk-info record per chunk.
        let index_pos = out.len() as u64;

        out.extend_from_slice(&msg_def_record(&self.topic, &self.datatype, &md5_hex(0xAB), "string data"));

        for (chunk_pos, start, end, count) in &chunk_infos {
            let mut topic_counts_data = Vec::new();
            topic_counts_data.extend_from_slice(&le_u32(self.topic.len() as u32));
            topic_counts_data.extend_from_slice(self.topic.as_bytes());
            topic_counts_data.extend_from_slice(&le_u32(*count));
            out.extend_from_slice(&record(
                &[
                    op_field(OP_CHUNK_INFO),
                    u32_field("ver", 1),
                    u64_field("chunk_pos", *chunk_pos),
                    time_field("start_time", start.0, start.1),
                    time_field("end_time", end.0, end.1),
                    u32_field("count", 1),
                ],
                &topic_counts_data,
            ));
        }

        let final_header = record(
            &[
                op_field(OP_FILE_HEADER),
                u64_field("index_pos", index_pos),
                u32_field("chunk_count", chunk_count),
                u32_field("topic_count", 1),
            ],
            &[],
        );
        assert_eq!(final_header.len(), placeholder.len());
        out[file_header_pos..file_header_pos + final_header.len()].copy_from_slice(&final_header);

        out
    }
}

/// Build a complete, well-formed v1.2 indexed bag for one topic.
///
/// Mirrors the original reader's layout: a topic's first index entry
/// points at its message-definition record, and every entry (including
/// the first) is resolved by skipping forward over any `0x01` records
/// until a `0x02` is found.
pub struct V102IndexedBag {
    pub topic: String,
    pub datatype: String,
    pub messages: Vec<(u32, u32, Vec<u8>)>,
}

impl V102IndexedBag {
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"#ROSBAG V1.2\n");

        let file_header_pos = out.len();
        let placeholder = record(&[op_field(OP_FILE_HEADER), u64_field("index_pos", 0)], &[]);
        out.extend_from_slice(&placeholder);

        let mut offsets = Vec::with_capacity(self.messages.len());

        let def_pos = out.len() as u64;
        out.extend_from_slice(&msg_def_record(&self.topic, &self.datatype, &md5_hex(0xCD), "string data"));
        offsets.push(def_pos);

        for (i, (secs, nsecs, payload)) in self.messages.iter().enumerate() {
            if i > 0 {
                offsets.push(out.len() as u64);
            }
            out.extend_from_slice(&msg_data_record_v102(&self.topic, *secs, *nsecs, payload));
        }

        let index_pos = out.len() as u64;
        let mut index_data = Vec::new();
        for ((secs, nsecs, _), offset) in self.messages.iter().zip(&offsets) {
            index_data.extend_from_slice(&le_u32(*secs));
            index_data.extend_from_slice(&le_u32(*nsecs));
            index_data.extend_from_slice(&le_u64(*offset));
        }
        out.extend_from_slice(&record(
            &[
                op_field(OP_INDEX_DATA),
                u32_field("ver", 1),
                str_field("topic", &self.topic),
                u32_field("count", self.messages.len() as u32),
            ],
            &index_data,
        ));

        let final_header = record(&[op_field(OP_FILE_HEADER), u64_field("index_pos", index_pos)], &[]);
        assert_eq!(final_header.len(), placeholder.len());
        out[file_header_pos..file_header_pos + final_header.len()].copy_from_slice(&final_header);

        out
    }
}
