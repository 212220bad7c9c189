//! Block tags: the sign-encoded size values stored in headers and trailers.
//!
//! A tag is one native-endian `i32`. Its magnitude is the payload size in
//! bytes; a positive value marks the block free, a negative value marks
//! it in use. Zero is never a valid tag.

use std::fmt;

/// Size in bytes of one header or trailer sentinel.
pub const SENTINEL_SIZE: usize = std::mem::size_of::<i32>();

/// Bytes of metadata framing every block (header plus trailer).
pub(crate) const FRAME_SIZE: usize = 2 * SENTINEL_SIZE;

/// Signed size value stored in a block's header and trailer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockTag(i32);

impl BlockTag {
    /// Tag for a free block with a payload of `size` bytes.
    pub fn free(size: usize) -> Self {
        debug_assert!(size > 0 && size <= i32::MAX as usize, "bad block size {size}");
        Self(size as i32)
    }

    /// Tag for an in-use block with a payload of `size` bytes.
    pub fn used(size: usize) -> Self {
        debug_assert!(size > 0 && size <= i32::MAX as usize, "bad block size {size}");
        Self(-(size as i32))
    }

    /// Wrap a value read straight from the arena.
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The stored signed value.
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Whether the block is available for allocation.
    pub fn is_free(self) -> bool {
        self.0 > 0
    }

    /// Whether the block has been handed out.
    pub fn is_used(self) -> bool {
        self.0 < 0
    }

    /// Zero is the only value that is neither free nor used.
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Payload size in bytes.
    pub fn size(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Total bytes the block occupies, sentinels included.
    pub fn span(self) -> usize {
        self.size() + FRAME_SIZE
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One block as seen during traversal: where its header sits and what it says.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Offset of the header sentinel.
    pub offset: usize,
    /// Value stored in the header.
    pub tag: BlockTag,
}

impl Block {
    /// Offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + SENTINEL_SIZE
    }

    /// Offset of the trailer sentinel.
    pub fn trailer_offset(&self) -> usize {
        self.offset + SENTINEL_SIZE + self.tag.size()
    }

    /// Offset one past the trailer, i.e. the next block's header.
    pub fn end(&self) -> usize {
        self.offset + self.tag.span()
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.tag.size()
    }

    /// Whether the block is free.
    pub fn is_free(&self) -> bool {
        self.tag.is_free()
    }

    /// Whether the block is in use.
    pub fn is_used(&self) -> bool {
        self.tag.is_used()
    }
}
