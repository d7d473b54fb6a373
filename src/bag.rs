//! Bag façade (§4.H): the root aggregate and its public operations.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::byte_source::{BagFile, ByteSource, SliceSource};
use crate::error::{GeneralError, Result};
use crate::record::read_next_message_data;
use crate::schema::{Message, MessageFactory, SchemaCompiler};
use crate::types::{ChunkHeader, ChunkInfo, IndexEntry102, IndexEntry103, TopicInfo};
use crate::version::{self, Version};
use crate::{reader_v102, reader_v103};

/// One topic's random-access index, in the version-appropriate shape.
#[derive(Debug, Clone)]
pub(crate) enum TopicIndexEntries {
    V103(Vec<IndexEntry103>),
    V102(Vec<IndexEntry102>),
}

impl TopicIndexEntries {
    pub(crate) fn len(&self) -> usize {
        match self {
            TopicIndexEntries::V103(v) => v.len(),
            TopicIndexEntries::V102(v) => v.len(),
        }
    }
}

/// Root aggregate owning the byte source, detected version, and every
/// table populated during `open` (§3).
pub struct Bag {
    pub(crate) src: Box<dyn ByteSource>,
    pub(crate) version: Version,
    pub(crate) compiler: Arc<dyn SchemaCompiler>,

    pub(crate) topic_infos: HashMap<String, TopicInfo>,
    pub(crate) chunk_infos: Vec<ChunkInfo>,
    pub(crate) chunk_headers: HashMap<u64, ChunkHeader>,

    /// Topics in first-appearance order, each with its index entries in
    /// on-disk order.
    pub(crate) topic_indexes: Vec<(String, TopicIndexEntries)>,
    pub(crate) topic_position: HashMap<String, usize>,

    /// Single-slot decompressed-chunk cache (§4.E "Cache policy").
    pub(crate) cache: Option<(u64, Bytes)>,

    /// Deserializer factories, cached per datatype for the bag's
    /// lifetime (§5 "Resource ownership").
    pub(crate) factories: HashMap<String, Arc<dyn MessageFactory>>,

    /// Tracks the most recently declared topic for the unindexed v1.2
    /// reader, which has no index to carry this for it (§4.G).
    pub(crate) unindexed_current_topic: Option<String>,
}

impl Bag {
    /// Open a bag file from a path, backed by [`BagFile`].
    pub fn open_path(
        path: impl AsRef<std::path::Path>,
        compiler: Arc<dyn SchemaCompiler>,
    ) -> Result<Self> {
        Self::open(Box::new(BagFile::open(path)?), compiler)
    }

    /// Open a bag from any [`ByteSource`] (§4.H `open`).
    ///
    /// On any format or I/O error the source is dropped and the error
    /// is returned; there is no partial-open state to clean up beyond
    /// that (§4 "Failure semantics").
    pub fn open(mut src: Box<dyn ByteSource>, compiler: Arc<dyn SchemaCompiler>) -> Result<Self> {
        let version = version::probe(src.as_mut())?;
        log::debug!("detected bag version {version:?}");

        let mut bag = Bag {
            src,
            version,
            compiler,
            topic_infos: HashMap::new(),
            chunk_infos: Vec::new(),
            chunk_headers: HashMap::new(),
            topic_indexes: Vec::new(),
            topic_position: HashMap::new(),
            cache: None,
            factories: HashMap::new(),
            unindexed_current_topic: None,
        };

        match version {
            Version::V103 => reader_v103::start_reading(&mut bag)?,
            Version::V102Indexed => reader_v102::start_reading_indexed(&mut bag)?,
            Version::V102Unindexed => {} // nothing to pre-read; §4.G is lazy
        }

        Ok(bag)
    }

    /// Release the byte source and discard the decompressed-chunk
    /// cache. Never fails (§4.H).
    pub fn close(self) {}

    /// Topic metadata, as populated during `open` (or, for the
    /// unindexed reader, as seen so far).
    pub fn topic_infos(&self) -> &HashMap<String, TopicInfo> {
        &self.topic_infos
    }

    /// Per-chunk metadata populated from the index region (v1.3 only;
    /// empty for v1.2 bags).
    pub fn chunk_infos(&self) -> &[ChunkInfo] {
        &self.chunk_infos
    }

    /// Number of index entries recorded for `topic`.
    pub fn topic_index_len(&self, topic: &str) -> usize {
        self.topic_position
            .get(topic)
            .map(|&i| self.topic_indexes[i].1.len())
            .unwrap_or(0)
    }

    /// Topics in the order their index first appears in the bag.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topic_indexes.iter().map(|(t, _)| t.as_str())
    }

    pub(crate) fn get_or_compile_factory(
        &mut self,
        topic_info: &TopicInfo,
    ) -> Result<Arc<dyn MessageFactory>> {
        if let Some(f) = self.factories.get(&topic_info.datatype) {
            return Ok(f.clone());
        }
        let factory = self
            .compiler
            .compile(&topic_info.datatype, &topic_info.msg_def)
            .map_err(|_| {
                crate::schema::generation_failed(
                    &topic_info.datatype,
                    "schema compiler rejected message definition",
                )
            })?;
        self.factories
            .insert(topic_info.datatype.clone(), factory.clone());
        Ok(factory)
    }

    fn topic_info_for(&self, topic: &str) -> Result<TopicInfo> {
        self.topic_infos
            .get(topic)
            .cloned()
            .ok_or_else(|| GeneralError::UndeclaredTopic(topic.to_string()).into())
    }

    fn deserialize_for(&mut self, topic: &str, data: &[u8]) -> Result<Message> {
        let topic_info = self.topic_info_for(topic)?;
        let factory = self.get_or_compile_factory(&topic_info)?;
        factory.deserialize(data)
    }

    /// Random-access retrieval of one v1.3 entry (§4.E "Random-access
    /// message retrieval"). Not reentrant: mutates the byte source's
    /// read position and, for compressed chunks, the decompressed-chunk
    /// cache.
    fn read_entry_v103(&mut self, topic: &str, entry: IndexEntry103) -> Result<Message> {
        let chunk_header = self
            .chunk_headers
            .get(&entry.chunk_pos)
            .cloned()
            .ok_or(GeneralError::NoChunkAtPosition(entry.chunk_pos))?;

        let data = if chunk_header.compression == crate::types::Compression::None {
            self.src
                .seek_abs(chunk_header.data_pos + entry.offset as u64)?;
            read_next_message_data(self.src.as_mut())?
        } else {
            if self.cache.as_ref().map(|(pos, _)| *pos) != Some(entry.chunk_pos) {
                log::trace!("decompressed-chunk cache miss at {}, decompressing", entry.chunk_pos);
                self.src.seek_abs(chunk_header.data_pos)?;
                let compressed = self.src.read(chunk_header.compressed_size as usize)?;
                let decompressed = chunk_header
                    .compression
                    .decompress(compressed, chunk_header.uncompressed_size)?;
                crate::decompress::check_len(decompressed.len(), chunk_header.uncompressed_size)?;
                self.cache = Some((entry.chunk_pos, decompressed));
            }
            let (_, cached) = self.cache.as_ref().expect("just populated");
            let mut mem = SliceSource::new(cached.clone());
            mem.seek_abs(entry.offset as u64)?;
            read_next_message_data(&mut mem)?
        };

        self.deserialize_for(topic, &data)
    }

    /// Random-access retrieval of one v1.2 entry (§4.F). No
    /// decompression path: the offset is an absolute file offset.
    fn read_entry_v102(&mut self, topic: &str, entry: IndexEntry102) -> Result<Message> {
        self.src.seek_abs(entry.offset)?;
        let data = read_next_message_data(self.src.as_mut())?;
        self.deserialize_for(topic, &data)
    }

    /// Retrieve the message at position `index` within `topic`'s index
    /// (random access, for callers that want one entry rather than the
    /// whole bag). Reading the same entry twice yields byte-identical
    /// messages (§8 idempotence).
    pub fn read_message(&mut self, topic: &str, index: usize) -> Result<Message> {
        let pos = *self
            .topic_position
            .get(topic)
            .ok_or_else(|| GeneralError::UndeclaredTopic(topic.to_string()))?;
        let entry = match &self.topic_indexes[pos].1 {
            TopicIndexEntries::V103(v) => IndexEntryRef::V103(
                *v.get(index)
                    .ok_or_else(|| GeneralError::UndeclaredTopic(topic.to_string()))?,
            ),
            TopicIndexEntries::V102(v) => IndexEntryRef::V102(
                *v.get(index)
                    .ok_or_else(|| GeneralError::UndeclaredTopic(topic.to_string()))?,
            ),
        };
        match entry {
            IndexEntryRef::V103(e) => self.read_entry_v103(topic, e),
            IndexEntryRef::V102(e) => self.read_entry_v102(topic, e),
        }
    }

    /// Decode every message in the bag (§4.H `get_messages`).
    ///
    /// For v1.3 and indexed v1.2 bags, visits topics in the order they
    /// appear in `topic_indexes` and, within each topic, entries in
    /// index order (§4.E "Iteration order"); no global time ordering is
    /// synthesized (§5 "Ordering"). For unindexed v1.2 bags this is a
    /// forward-only scan that continues from wherever the byte source
    /// currently sits — restartable only by reopening (§4.G).
    pub fn get_messages(&mut self) -> Result<Vec<Message>> {
        match self.version {
            Version::V103 | Version::V102Indexed => self.get_messages_indexed(),
            Version::V102Unindexed => reader_v102::get_messages_unindexed(self),
        }
    }

    fn get_messages_indexed(&mut self) -> Result<Vec<Message>> {
        let plan: Vec<(String, usize)> = self
            .topic_indexes
            .iter()
            .flat_map(|(topic, entries)| {
                (0..entries.len()).map(move |i| (topic.clone(), i))
            })
            .collect();

        let mut out = Vec::with_capacity(plan.len());
        for (topic, index) in plan {
            out.push(self.read_message(&topic, index)?);
        }
        Ok(out)
    }
}

enum IndexEntryRef {
    V103(IndexEntry103),
    V102(IndexEntry102),
}
