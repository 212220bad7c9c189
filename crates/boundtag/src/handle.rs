//! Arena identities and payload pointers.
//!
//! A [`BlockPtr`] is the index-based replacement for a raw payload
//! pointer: it names a byte offset inside one specific arena. Pointers and
//! cursors compare equal only when both the [`ArenaId`] and the offset
//! match, so a pointer handed out by one allocator is never mistaken for a
//! position in another.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an arena's current contents.
///
/// Allocated from a monotonic atomic counter via [`ArenaId::next`]. An
/// arena takes a fresh ID when it is created and again when it is reset,
/// which invalidates every pointer and cursor taken before the reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate a fresh, never-before-returned ID. Thread-safe.
    pub fn next() -> Self {
        Self(ARENA_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a payload byte inside a specific arena.
///
/// Returned by [`BlockAllocator::allocate`](crate::BlockAllocator::allocate)
/// pointing at the first payload byte (just past the header). Pointers are
/// plain values: holding one does not keep the block alive, and a pointer
/// whose block has been freed is rejected by the allocator on use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct BlockPtr {
    pub(crate) arena: ArenaId,
    pub(crate) offset: usize,
}

impl BlockPtr {
    pub(crate) fn new(arena: ArenaId, offset: usize) -> Self {
        Self { arena, offset }
    }

    /// The arena this pointer belongs to.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Byte offset from the start of the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Pointer `bytes` further into the arena.
    ///
    /// Pure arithmetic; the result is only checked when it is used.
    pub fn add(self, bytes: usize) -> Self {
        Self {
            arena: self.arena,
            offset: self.offset.saturating_add(bytes),
        }
    }
}

impl fmt::Display for BlockPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockPtr(arena={}, off={})", self.arena, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_ids_are_unique() {
        let a = ArenaId::next();
        let b = ArenaId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn add_advances_offset_in_same_arena() {
        let id = ArenaId::next();
        let p = BlockPtr::new(id, 4);
        let q = p.add(16);
        assert_eq!(q.offset(), 20);
        assert_eq!(q.arena(), id);
    }

    #[test]
    fn add_saturates_instead_of_wrapping() {
        let p = BlockPtr::new(ArenaId::next(), usize::MAX - 1);
        assert_eq!(p.add(10).offset(), usize::MAX);
    }

    #[test]
    fn equality_requires_same_arena() {
        let p = BlockPtr::new(ArenaId::next(), 4);
        let q = BlockPtr::new(ArenaId::next(), 4);
        assert_ne!(p, q);
        assert_eq!(p, BlockPtr::new(p.arena(), 4));
    }
}
