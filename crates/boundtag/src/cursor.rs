//! Block-by-block traversal.
//!
//! Two primitive steps move between block boundaries:
//!
//! - **forward:** from a header at `i`, the next header is at
//!   `i + |tag at i| + 2 * SENTINEL_SIZE`.
//! - **backward:** from a header at `i`, the previous trailer is at
//!   `i - SENTINEL_SIZE`, and the previous header is `|trailer|` bytes and
//!   one more sentinel before that.
//!
//! The end position is offset `capacity`, one past the last trailer.
//! Stepping backward from the end reads the last trailer, which is only
//! meaningful because the arena is always fully partitioned.
//!
//! [`Cursor`] is a detached `(arena id, offset)` handle resolved through
//! the [`Arena`]; [`Blocks`] is the iterator form used by the engine and
//! by callers that only need to look. Positions past a block boundary that
//! a later allocate or deallocate moved are no longer meaningful.

use std::iter::FusedIterator;

use crate::arena::Arena;
use crate::block::{Block, BlockTag, SENTINEL_SIZE};
use crate::handle::ArenaId;

/// A position on a block boundary of one arena.
///
/// Two cursors are equal only if they belong to the same arena and sit at
/// the same offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    arena: ArenaId,
    offset: usize,
}

impl Cursor {
    pub(crate) fn new(arena: ArenaId, offset: usize) -> Self {
        Self { arena, offset }
    }

    /// The arena this cursor belongs to.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Byte offset of the header this cursor sits on.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Arena {
    /// Cursor on the first block's header.
    pub fn begin(&self) -> Cursor {
        Cursor::new(self.id(), 0)
    }

    /// The one-past-the-last-block position.
    pub fn end(&self) -> Cursor {
        Cursor::new(self.id(), self.capacity())
    }

    /// Tag stored at the cursor's header.
    ///
    /// `None` for the end position, for a cursor of another arena, or if
    /// the header cannot be read.
    pub fn tag_at(&self, cursor: Cursor) -> Option<BlockTag> {
        if cursor.arena != self.id() {
            return None;
        }
        self.read_tag(cursor.offset)
    }

    /// Move to the next block's header.
    ///
    /// Stepping off the last block yields [`end`](Arena::end). Returns
    /// `None` from the end position, for a foreign cursor, or when the
    /// stored size would carry the cursor past the end.
    pub fn step_forward(&self, cursor: Cursor) -> Option<Cursor> {
        let tag = self.tag_at(cursor).filter(|tag| tag.is_valid())?;
        let next = cursor.offset.checked_add(tag.span())?;
        (next <= self.capacity()).then(|| Cursor::new(cursor.arena, next))
    }

    /// Move to the previous block's header.
    ///
    /// Works from the end position too. Returns `None` from the first
    /// block, for a foreign cursor, or when the previous trailer points
    /// before the start of the arena.
    pub fn step_back(&self, cursor: Cursor) -> Option<Cursor> {
        if cursor.arena != self.id() || cursor.offset > self.capacity() {
            return None;
        }
        let trailer = cursor.offset.checked_sub(SENTINEL_SIZE)?;
        let tag = self.read_tag(trailer).filter(|tag| tag.is_valid())?;
        let header = trailer.checked_sub(tag.size())?.checked_sub(SENTINEL_SIZE)?;
        Some(Cursor::new(cursor.arena, header))
    }

    /// Iterate over every block from the first header to the end.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            arena: self,
            front: 0,
            back: self.capacity(),
        }
    }
}

/// Mutable cursor used by the engine to rewrite tags while walking.
///
/// Holds the arena exclusively, so no other position can observe a block
/// boundary while it is being moved.
pub(crate) struct CursorMut<'a> {
    arena: &'a mut Arena,
    offset: usize,
}

impl<'a> CursorMut<'a> {
    /// Cursor on the first block of `arena`.
    pub(crate) fn new(arena: &'a mut Arena) -> Self {
        Self { arena, offset: 0 }
    }

    /// Cursor on the header at `offset`, which must be a block boundary.
    pub(crate) fn at(arena: &'a mut Arena, offset: usize) -> Self {
        debug_assert!(offset <= arena.capacity());
        Self { arena, offset }
    }

    /// Detached copy of the current position.
    pub(crate) fn position(&self) -> Cursor {
        Cursor::new(self.arena.id(), self.offset)
    }

    /// Tag at the current header; `None` at the end.
    pub(crate) fn tag(&self) -> Option<BlockTag> {
        if self.offset >= self.arena.capacity() {
            return None;
        }
        self.arena.read_tag(self.offset)
    }

    /// Rewrite the current block's header and the trailer the new tag implies.
    pub(crate) fn set_tag(&mut self, tag: BlockTag) {
        self.arena.write_block(self.offset, tag);
    }

    /// Step forward; `false` (and no movement) if already at the end.
    pub(crate) fn move_next(&mut self) -> bool {
        match self.arena.step_forward(self.position()) {
            Some(next) => {
                self.offset = next.offset;
                true
            }
            None => false,
        }
    }

    /// Step backward; `false` (and no movement) if at the first block.
    pub(crate) fn move_prev(&mut self) -> bool {
        match self.arena.step_back(self.position()) {
            Some(prev) => {
                self.offset = prev.offset;
                true
            }
            None => false,
        }
    }
}

/// Iterator over the blocks of an [`Arena`] in address order.
///
/// Double-ended: `next_back` walks from the last trailer toward the
/// start. A header that cannot be followed (zero size or a size running
/// past the remaining range) ends the iteration from both sides.
pub struct Blocks<'a> {
    arena: &'a Arena,
    /// Offset of the next header to yield from the front.
    front: usize,
    /// Offset one past the last block not yet yielded from the back.
    back: usize,
}

impl Blocks<'_> {
    fn stop(&mut self) -> Option<Block> {
        self.front = self.back;
        None
    }
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.front >= self.back {
            return None;
        }
        let Some(block) = self.arena.block_at(self.front) else {
            return self.stop();
        };
        if !block.tag.is_valid() || block.end() > self.back {
            return self.stop();
        }
        self.front = block.end();
        Some(block)
    }
}

impl DoubleEndedIterator for Blocks<'_> {
    fn next_back(&mut self) -> Option<Block> {
        if self.back <= self.front {
            return None;
        }
        let prev = self
            .arena
            .step_back(Cursor::new(self.arena.id(), self.back))
            .filter(|c| c.offset >= self.front);
        let Some(block) = prev.and_then(|c| self.arena.block_at(c.offset)) else {
            return self.stop();
        };
        self.back = block.offset;
        Some(block)
    }
}

impl FusedIterator for Blocks<'_> {}
