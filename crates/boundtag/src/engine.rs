//! First-fit allocation, deallocation with coalescing, and validation.
//!
//! [`BlockAllocator`] owns one [`Arena`] and keeps it exactly partitioned
//! into blocks at all times:
//!
//! 1. block spans sum to the capacity;
//! 2. every header equals its trailer;
//! 3. no two neighbouring blocks are both free;
//! 4. every tag is non-zero.
//!
//! Allocation scans from the first block and takes the first free block
//! whose span covers the request. The block is split when the remainder
//! can hold a minimal block (one element plus sentinels); otherwise the
//! whole block is handed out. Deallocation marks the block free and merges
//! it with a free predecessor and a free successor.

use tracing::{debug, trace, warn};

use crate::arena::Arena;
use crate::block::{Block, BlockTag, FRAME_SIZE, SENTINEL_SIZE};
use crate::config::{ArenaConfig, ConfigError};
use crate::cursor::{Blocks, CursorMut};
use crate::error::{AllocError, Corruption, PointerFault};
use crate::handle::{ArenaId, BlockPtr};
use crate::stats::ArenaStats;

/// Boundary-tag allocator over a fixed-size arena.
///
/// Requests are counted in elements of
/// [`element_size`](ArenaConfig::element_size) bytes. Single-threaded:
/// every mutating operation takes `&mut self`.
#[derive(Debug)]
pub struct BlockAllocator {
    arena: Arena,
    config: ArenaConfig,
}

impl BlockAllocator {
    /// Create an allocator whose arena is one free block.
    ///
    /// Fails if the configuration cannot hold a single minimal block.
    pub fn new(config: ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let arena = Arena::new(config.capacity);
        debug!(
            arena = %arena.id(),
            capacity = config.capacity,
            element_size = config.element_size,
            "created arena"
        );
        let allocator = Self { arena, config };
        debug_assert!(allocator.validate());
        Ok(allocator)
    }

    /// Allocate room for `count` elements.
    ///
    /// Returns a pointer to the first payload byte of the chosen block. On
    /// failure the arena is unchanged.
    pub fn allocate(&mut self, count: usize) -> Result<BlockPtr, AllocError> {
        if count == 0 {
            return Err(AllocError::EmptyRequest);
        }
        let needed = count
            .checked_mul(self.config.element_size)
            .and_then(|bytes| bytes.checked_add(FRAME_SIZE));
        let Some(needed) = needed else {
            return Err(self.out_of_memory(usize::MAX));
        };
        let min_block = self.config.min_block_bytes();
        let id = self.arena.id();

        let mut cursor = CursorMut::new(&mut self.arena);
        let mut chosen = None;
        while let Some(tag) = cursor.tag() {
            if tag.is_free() && tag.span() >= needed {
                let offset = cursor.position().offset();
                let leftover = tag.span() - needed;
                if leftover >= min_block {
                    cursor.set_tag(BlockTag::used(needed - FRAME_SIZE));
                    cursor.move_next();
                    cursor.set_tag(BlockTag::free(leftover - FRAME_SIZE));
                    trace!(
                        arena = %id,
                        offset,
                        used = needed - FRAME_SIZE,
                        remainder = leftover - FRAME_SIZE,
                        "split free block"
                    );
                } else {
                    cursor.set_tag(BlockTag::used(tag.size()));
                }
                chosen = Some(offset);
                break;
            }
            if !cursor.move_next() {
                break;
            }
        }

        let Some(offset) = chosen else {
            let err = self.out_of_memory(needed);
            debug!(arena = %id, count, %err, "allocation failed");
            return Err(err);
        };
        debug!(arena = %id, count, offset, "allocated block");
        debug_assert!(
            self.validate(),
            "arena corrupted by allocate: {:?}",
            self.check()
        );
        Ok(BlockPtr::new(id, offset + SENTINEL_SIZE))
    }

    /// Return the block whose payload starts at `ptr`.
    ///
    /// `size_hint` is the element count the caller believes it allocated.
    /// It is advisory: the block's own sentinels decide how much is freed,
    /// and a hint larger than the block is only logged.
    ///
    /// The freed block is merged with a free predecessor and a free
    /// successor. If the pointer is rejected the arena is unchanged.
    pub fn deallocate(&mut self, ptr: BlockPtr, size_hint: usize) -> Result<(), AllocError> {
        let block = self.locate(ptr)?;
        let header = block.tag.raw();
        // `locate` only yields blocks that end inside the arena, so the
        // trailer is always readable.
        let trailer = self.arena.read_i32(block.trailer_offset()).unwrap_or(0);
        if trailer != header {
            return Err(AllocError::invalid(
                ptr.offset,
                PointerFault::CorruptedSentinels { header, trailer },
            ));
        }
        if !block.is_used() {
            return Err(AllocError::invalid(ptr.offset, PointerFault::AlreadyFree));
        }
        if size_hint.saturating_mul(self.config.element_size) > block.size() {
            warn!(
                arena = %self.arena.id(),
                offset = block.offset,
                size_hint,
                block_bytes = block.size(),
                "size hint exceeds block size"
            );
        }

        let id = self.arena.id();
        let mut size = block.size();
        let mut cursor = CursorMut::at(&mut self.arena, block.offset);
        cursor.set_tag(BlockTag::free(size));

        if cursor.move_prev() {
            match cursor.tag() {
                Some(prev) if prev.is_free() => {
                    size += prev.span();
                    cursor.set_tag(BlockTag::free(size));
                    trace!(arena = %id, offset = cursor.position().offset(), size, "merged with predecessor");
                }
                _ => {
                    cursor.move_next();
                }
            }
        }

        let start = cursor.position().offset();
        if cursor.move_next() {
            if let Some(next) = cursor.tag().filter(|tag| tag.is_free()) {
                size += next.span();
                cursor.move_prev();
                cursor.set_tag(BlockTag::free(size));
                trace!(arena = %id, offset = start, size, "merged with successor");
            }
        }

        debug!(arena = %id, offset = block.offset, freed = block.size(), "deallocated block");
        debug_assert!(
            self.validate(),
            "arena corrupted by deallocate: {:?}",
            self.check()
        );
        Ok(())
    }

    /// Whether all structural invariants hold.
    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    /// Walk every block and report the first structural violation.
    pub fn check(&self) -> Result<(), Corruption> {
        let capacity = self.arena.capacity();
        let mut offset = 0;
        let mut prev_free = false;
        while offset < capacity {
            let Some(tag) = self.arena.read_tag(offset) else {
                return Err(Corruption::Overrun { offset });
            };
            if !tag.is_valid() {
                return Err(Corruption::ZeroSize { offset });
            }
            let end = offset.saturating_add(tag.span());
            if end > capacity {
                return Err(Corruption::Overrun { offset });
            }
            let trailer = self.arena.read_i32(end - SENTINEL_SIZE).unwrap_or(0);
            if trailer != tag.raw() {
                return Err(Corruption::SentinelMismatch {
                    offset,
                    header: tag.raw(),
                    trailer,
                });
            }
            if tag.is_free() && prev_free {
                return Err(Corruption::AdjacentFree { offset });
            }
            prev_free = tag.is_free();
            offset = end;
        }
        Ok(())
    }

    /// Discard every allocation and return to a single free block.
    ///
    /// Pointers handed out before the reset are rejected afterwards.
    pub fn reset(&mut self) {
        self.arena.reset();
        debug!(arena = %self.arena.id(), "reset arena");
    }

    /// Iterate over the blocks in address order.
    pub fn blocks(&self) -> Blocks<'_> {
        self.arena.blocks()
    }

    /// Raw signed tag of every block in address order.
    pub fn layout(&self) -> Vec<i32> {
        self.blocks().map(|b| b.tag.raw()).collect()
    }

    /// Pointer to the `n`-th in-use block (0-based) in address order.
    pub fn nth_in_use(&self, n: usize) -> Option<BlockPtr> {
        self.blocks()
            .filter(Block::is_used)
            .nth(n)
            .map(|b| BlockPtr::new(self.arena.id(), b.payload_offset()))
    }

    /// The block whose payload starts at `ptr`, free or in use.
    pub fn block_of(&self, ptr: BlockPtr) -> Option<Block> {
        self.locate(ptr).ok()
    }

    /// Payload bytes of the in-use block at `ptr`.
    pub fn payload(&self, ptr: BlockPtr) -> Result<&[u8], AllocError> {
        let block = self.used_block(ptr)?;
        self.arena
            .bytes(block.payload_offset()..block.trailer_offset())
            .ok_or(AllocError::invalid(ptr.offset, PointerFault::OutOfBounds))
    }

    /// Mutable payload bytes of the in-use block at `ptr`.
    pub fn payload_mut(&mut self, ptr: BlockPtr) -> Result<&mut [u8], AllocError> {
        let block = self.used_block(ptr)?;
        self.arena
            .bytes_mut(block.payload_offset()..block.trailer_offset())
            .ok_or(AllocError::invalid(ptr.offset, PointerFault::OutOfBounds))
    }

    /// Occupancy summary.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats::collect(self.blocks(), self.arena.capacity())
    }

    /// Read-only view of the arena for cursor-based traversal.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Identity of the arena's current contents.
    pub fn id(&self) -> ArenaId {
        self.arena.id()
    }

    /// The configuration this allocator was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Total arena size in bytes.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.config.element_size
    }

    pub(crate) fn bytes_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        self.arena.bytes_mut(offset..offset.checked_add(len)?)
    }

    pub(crate) fn bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.arena.bytes(offset..offset.checked_add(len)?)
    }

    /// Find the block whose payload starts at `ptr`.
    ///
    /// The header offset is confirmed by walking the partition before any
    /// sentinel is trusted, so a pointer into the middle of a payload is
    /// rejected instead of being misread as a header.
    fn locate(&self, ptr: BlockPtr) -> Result<Block, AllocError> {
        if ptr.arena != self.arena.id() {
            return Err(AllocError::invalid(ptr.offset, PointerFault::ForeignArena));
        }
        if ptr.offset < SENTINEL_SIZE || ptr.offset >= self.arena.capacity() {
            return Err(AllocError::invalid(ptr.offset, PointerFault::OutOfBounds));
        }
        let header = ptr.offset - SENTINEL_SIZE;
        self.blocks()
            .take_while(|b| b.offset <= header)
            .find(|b| b.offset == header)
            .ok_or(AllocError::invalid(ptr.offset, PointerFault::NotBlockStart))
    }

    fn used_block(&self, ptr: BlockPtr) -> Result<Block, AllocError> {
        let block = self.locate(ptr)?;
        if block.is_used() {
            Ok(block)
        } else {
            Err(AllocError::invalid(ptr.offset, PointerFault::AlreadyFree))
        }
    }

    fn out_of_memory(&self, requested: usize) -> AllocError {
        AllocError::OutOfMemory {
            requested,
            largest_free: self
                .blocks()
                .filter(Block::is_free)
                .map(|b| b.tag.span())
                .max()
                .unwrap_or(0),
        }
    }
}
