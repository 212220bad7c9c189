//! The fixed-size byte buffer and its sentinel encoding.
//!
//! [`Arena`] owns the backing `Vec<u8>` and is the only code that turns
//! bytes into header/trailer values and back. All sentinel reads are
//! bounds-checked and return `None` past the end of the buffer, so a
//! corrupted size can never turn into an out-of-range access.

use std::fmt;
use std::ops::Range;

use crate::block::{Block, BlockTag, FRAME_SIZE, SENTINEL_SIZE};
use crate::handle::ArenaId;

/// A flat byte buffer partitioned into boundary-tagged blocks.
///
/// Created once with its whole capacity as a single free block. The
/// buffer is allocated up front and never resized.
pub struct Arena {
    /// Identity of the current contents; renewed on reset.
    id: ArenaId,
    /// Backing storage, exactly `capacity` bytes.
    bytes: Vec<u8>,
}

impl Arena {
    /// Create an arena of `capacity` bytes holding one free block.
    ///
    /// The caller guarantees `capacity` holds at least one block with a
    /// non-empty payload and that its size fits in a tag.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > FRAME_SIZE);
        let mut arena = Self {
            id: ArenaId::next(),
            bytes: vec![0; capacity],
        };
        arena.format();
        arena
    }

    /// Discard all blocks and start over with one free block.
    ///
    /// Takes a fresh [`ArenaId`], so pointers and cursors from before the
    /// reset no longer match this arena.
    pub(crate) fn reset(&mut self) {
        self.id = ArenaId::next();
        self.format();
    }

    fn format(&mut self) {
        let whole = BlockTag::free(self.capacity() - FRAME_SIZE);
        self.write_block(0, whole);
    }

    /// Identity of the arena's current contents.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Total size in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Read the `i32` stored at `offset`, or `None` if it would run past
    /// the end of the buffer.
    pub(crate) fn read_i32(&self, offset: usize) -> Option<i32> {
        let end = offset.checked_add(SENTINEL_SIZE)?;
        let raw: [u8; SENTINEL_SIZE] = self.bytes.get(offset..end)?.try_into().ok()?;
        Some(i32::from_ne_bytes(raw))
    }

    /// Store `value` at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + SENTINEL_SIZE` exceeds the capacity. The engine
    /// only writes at offsets derived from a verified partition.
    pub(crate) fn write_i32(&mut self, offset: usize, value: i32) {
        self.bytes[offset..offset + SENTINEL_SIZE].copy_from_slice(&value.to_ne_bytes());
    }

    /// Header tag at `offset`.
    pub(crate) fn read_tag(&self, offset: usize) -> Option<BlockTag> {
        self.read_i32(offset).map(BlockTag::from_raw)
    }

    /// Block whose header sits at `offset`, if the header is readable.
    pub(crate) fn block_at(&self, offset: usize) -> Option<Block> {
        self.read_tag(offset).map(|tag| Block { offset, tag })
    }

    /// Write `tag` to the header at `offset` and to the trailer it implies.
    pub(crate) fn write_block(&mut self, offset: usize, tag: BlockTag) {
        self.write_i32(offset, tag.raw());
        self.write_i32(offset + SENTINEL_SIZE + tag.size(), tag.raw());
    }

    /// Raw bytes in `range`, or `None` if the range leaves the buffer.
    pub(crate) fn bytes(&self, range: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(range)
    }

    /// Mutable raw bytes in `range`, or `None` if the range leaves the buffer.
    pub(crate) fn bytes_mut(&mut self, range: Range<usize>) -> Option<&mut [u8]> {
        self.bytes.get_mut(range)
    }
}

/// Shows identity, capacity and block tags only. Payload bytes may hold
/// the padding of typed values, which is uninitialised and must not be read.
impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout: Vec<i32> = self.blocks().map(|b| b.tag.raw()).collect();
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("layout", &layout)
            .finish()
    }
}
