//! Document-owned bump region for string storage.
//!
//! Every string that crosses a mutation API boundary (tag names,
//! attribute names and values, text data) is copied into the owning
//! document's region at the point of entry, so no node ever borrows from
//! caller-supplied or transient memory. Individual node destruction
//! returns nothing to the region; the whole region is reclaimed in one
//! bulk operation at document teardown.

use crate::error::{DomError, DomResult};

/// Fixed chunk capacity. Strings larger than this get a dedicated chunk.
const CHUNK_CAPACITY: usize = 16 * 1024;

/// Stable reference to a string stored in a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrId {
    chunk: u32,
    start: u32,
    len: u32,
}

impl StrId {
    /// Length in bytes of the referenced string.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the referenced string is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Chunked bump allocator for document-owned strings.
///
/// Chunks are allocated at full capacity and never grow, so a stored
/// string's chunk/offset address stays valid until the region is dropped.
#[derive(Debug, Default)]
pub struct Region {
    chunks: Vec<String>,
    bytes_used: usize,
    /// Optional byte budget; allocation past it fails.
    limit: Option<usize>,
}

impl Region {
    /// Create an unbounded region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a region that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            chunks: Vec::new(),
            bytes_used: 0,
            limit: Some(limit),
        }
    }

    /// Copy `text` into the region and return a stable reference.
    pub fn alloc_str(&mut self, text: &str) -> DomResult<StrId> {
        if let Some(limit) = self.limit {
            if self.bytes_used + text.len() > limit {
                return Err(DomError::Allocation);
            }
        }
        let chunk_index = self.chunk_for(text.len());
        let chunk = &mut self.chunks[chunk_index];
        let start = chunk.len();
        chunk.push_str(text);
        self.bytes_used += text.len();
        Ok(StrId {
            chunk: chunk_index as u32,
            start: start as u32,
            len: text.len() as u32,
        })
    }

    /// Resolve a reference to the stored string.
    pub fn resolve(&self, id: StrId) -> &str {
        let chunk = &self.chunks[id.chunk as usize];
        &chunk[id.start as usize..(id.start + id.len) as usize]
    }

    /// Total bytes of string data stored.
    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    /// Find or open a chunk with room for `len` bytes.
    fn chunk_for(&mut self, len: usize) -> usize {
        if let Some(last) = self.chunks.last() {
            if last.capacity() - last.len() >= len {
                return self.chunks.len() - 1;
            }
        }
        let capacity = len.max(CHUNK_CAPACITY);
        tracing::debug!(capacity, chunks = self.chunks.len() + 1, "region growing");
        self.chunks.push(String::with_capacity(capacity));
        self.chunks.len() - 1
    }
}
