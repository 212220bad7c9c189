//! Typed element storage on top of the block allocator.
//!
//! [`TypedAllocator<T>`] sizes its elements as `size_of::<T>()` and adds
//! construct/destroy of `T` values in allocated slots. Block metadata is
//! never touched by these operations: constructing a value does not
//! allocate, and destroying one does not free its block.
//!
//! Slots holding a live value are tracked so that a value is never read
//! from bytes that were not written as a `T`, and never dropped twice.
//! Deallocating a block forgets any values still live in it without
//! running their destructors, and so does dropping the allocator.

use std::mem::size_of;

use crate::block::Block;
use crate::config::{ArenaConfig, ConfigError};
use crate::cursor::Blocks;
use crate::engine::BlockAllocator;
use crate::error::{AllocError, PointerFault};
use crate::handle::{ArenaId, BlockPtr};
use crate::raw::Slots;
use crate::stats::ArenaStats;

/// Allocator for arrays of `T` inside a fixed-capacity arena.
pub struct TypedAllocator<T> {
    blocks: BlockAllocator,
    /// Slots currently holding a constructed `T`.
    live: Slots<T>,
}

impl<T> TypedAllocator<T> {
    /// Create an allocator with a `capacity`-byte arena.
    ///
    /// Fails if `T` is zero-sized or the capacity cannot hold one `T` plus
    /// a header and a trailer.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            blocks: BlockAllocator::new(ArenaConfig::for_type::<T>(capacity))?,
            live: Slots::new(),
        })
    }

    /// Allocate room for `count` values of `T`.
    pub fn allocate(&mut self, count: usize) -> Result<BlockPtr, AllocError> {
        self.blocks.allocate(count)
    }

    /// Free the block at `ptr`.
    ///
    /// Values still constructed in the block are forgotten, not dropped.
    pub fn deallocate(&mut self, ptr: BlockPtr, count: usize) -> Result<(), AllocError> {
        let block = self.blocks.block_of(ptr);
        self.blocks.deallocate(ptr, count)?;
        if let Some(block) = block {
            self.live.forget(block.payload_offset()..block.trailer_offset());
        }
        Ok(())
    }

    /// Pointer to element `index` of the array starting at `ptr`.
    pub fn element(&self, ptr: BlockPtr, index: usize) -> BlockPtr {
        ptr.add(index.saturating_mul(size_of::<T>()))
    }

    /// Place `value` in the slot at `ptr`.
    ///
    /// The slot must be an element boundary inside an in-use block and must
    /// not already hold a value.
    pub fn construct(&mut self, ptr: BlockPtr, value: T) -> Result<(), AllocError> {
        let offset = self.slot(ptr)?;
        let dst = self
            .blocks
            .bytes_mut(offset, size_of::<T>())
            .ok_or(AllocError::invalid(offset, PointerFault::OutOfBounds))?;
        self.live
            .store(offset, dst, value)
            .map_err(|_| AllocError::SlotOccupied { offset })
    }

    /// Drop the value in the slot at `ptr`.
    pub fn destroy(&mut self, ptr: BlockPtr) -> Result<(), AllocError> {
        drop(self.take(ptr)?);
        Ok(())
    }

    /// Move the value out of the slot at `ptr`, leaving the slot vacant.
    pub fn take(&mut self, ptr: BlockPtr) -> Result<T, AllocError> {
        let offset = self.slot(ptr)?;
        let src = self
            .blocks
            .bytes(offset, size_of::<T>())
            .ok_or(AllocError::invalid(offset, PointerFault::OutOfBounds))?;
        self.live
            .take(offset, src)
            .ok_or(AllocError::SlotVacant { offset })
    }

    /// Whether the slot at `ptr` holds a constructed value.
    pub fn is_constructed(&self, ptr: BlockPtr) -> bool {
        self.slot(ptr).is_ok_and(|offset| self.live.is_live(offset))
    }

    /// Number of constructed values across the arena.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether all structural invariants hold.
    pub fn validate(&self) -> bool {
        self.blocks.validate()
    }

    /// Raw signed tag of every block in address order.
    pub fn layout(&self) -> Vec<i32> {
        self.blocks.layout()
    }

    /// Iterate over the blocks in address order.
    pub fn blocks(&self) -> Blocks<'_> {
        self.blocks.blocks()
    }

    /// Pointer to the `n`-th in-use block (0-based) in address order.
    pub fn nth_in_use(&self, n: usize) -> Option<BlockPtr> {
        self.blocks.nth_in_use(n)
    }

    /// Occupancy summary.
    pub fn stats(&self) -> ArenaStats {
        self.blocks.stats()
    }

    /// Identity of the arena's current contents.
    pub fn id(&self) -> ArenaId {
        self.blocks.id()
    }

    /// Resolve `ptr` to the offset of a whole `T` slot in an in-use block.
    fn slot(&self, ptr: BlockPtr) -> Result<usize, AllocError> {
        let offset = ptr.offset();
        if ptr.arena() != self.blocks.id() {
            return Err(AllocError::invalid(offset, PointerFault::ForeignArena));
        }
        let block = self
            .blocks
            .blocks()
            .find(|b: &Block| offset < b.end())
            .ok_or(AllocError::invalid(offset, PointerFault::OutOfBounds))?;
        if !block.is_used() {
            return Err(AllocError::invalid(offset, PointerFault::AlreadyFree));
        }
        let within = offset
            .checked_sub(block.payload_offset())
            .ok_or(AllocError::invalid(offset, PointerFault::Misaligned))?;
        if within % size_of::<T>() != 0 || within + size_of::<T>() > block.size() {
            return Err(AllocError::invalid(offset, PointerFault::Misaligned));
        }
        Ok(offset)
    }
}

impl<T: Copy> TypedAllocator<T> {
    /// Copy of the value in the slot at `ptr`.
    pub fn read(&self, ptr: BlockPtr) -> Result<T, AllocError> {
        let offset = self.slot(ptr)?;
        let src = self
            .blocks
            .bytes(offset, size_of::<T>())
            .ok_or(AllocError::invalid(offset, PointerFault::OutOfBounds))?;
        self.live
            .copy(offset, src)
            .ok_or(AllocError::SlotVacant { offset })
    }
}

impl<T> std::fmt::Debug for TypedAllocator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedAllocator")
            .field("blocks", &self.blocks)
            .field("live", &self.live.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn element_size_follows_type() {
        let a = TypedAllocator::<u32>::new(100).unwrap();
        assert_eq!(a.layout(), vec![92]);
        assert_eq!(a.blocks.element_size(), 4);
    }

    #[test]
    fn zero_sized_type_is_rejected() {
        assert_eq!(
            TypedAllocator::<()>::new(100).unwrap_err(),
            ConfigError::ZeroSizedElement
        );
    }

    #[test]
    fn construct_then_read_each_element() {
        let mut a = TypedAllocator::<f64>::new(1000).unwrap();
        let p = a.allocate(4).unwrap();
        for i in 0..4 {
            a.construct(a.element(p, i), i as f64 * 1.5).unwrap();
        }
        for i in 0..4 {
            assert_eq!(a.read(a.element(p, i)).unwrap(), i as f64 * 1.5);
        }
        assert_eq!(a.layout(), vec![-32, 952]);
        assert_eq!(a.live_count(), 4);
    }

    #[test]
    fn destroy_runs_drop_once() {
        let tracker = Rc::new(());
        let mut a = TypedAllocator::<Rc<()>>::new(256).unwrap();
        let p = a.allocate(2).unwrap();
        a.construct(p, Rc::clone(&tracker)).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 2);
        a.destroy(p).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 1);
        assert_eq!(a.destroy(p), Err(AllocError::SlotVacant { offset: p.offset() }));
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn construct_twice_is_rejected() {
        let mut a = TypedAllocator::<u64>::new(128).unwrap();
        let p = a.allocate(1).unwrap();
        a.construct(p, 7).unwrap();
        assert_eq!(
            a.construct(p, 8),
            Err(AllocError::SlotOccupied { offset: p.offset() })
        );
        assert_eq!(a.read(p).unwrap(), 7);
    }

    #[test]
    fn take_moves_value_out() {
        let mut a = TypedAllocator::<String>::new(512).unwrap();
        let p = a.allocate(1).unwrap();
        a.construct(p, "hello".to_string()).unwrap();
        assert!(a.is_constructed(p));
        assert_eq!(a.take(p).unwrap(), "hello");
        assert!(!a.is_constructed(p));
    }

    #[test]
    fn misaligned_slot_is_rejected() {
        let mut a = TypedAllocator::<u64>::new(128).unwrap();
        let p = a.allocate(2).unwrap();
        let err = a.construct(p.add(3), 1).unwrap_err();
        assert!(matches!(
            err,
            AllocError::InvalidPointer {
                fault: PointerFault::Misaligned,
                ..
            }
        ));
    }

    #[test]
    fn slot_past_requested_elements_is_rejected() {
        let mut a = TypedAllocator::<u64>::new(128).unwrap();
        let p = a.allocate(2).unwrap();
        // Element 2 would land on the trailer.
        assert!(a.construct(a.element(p, 2), 1).is_err());
    }

    #[test]
    fn slot_in_free_block_is_rejected() {
        let mut a = TypedAllocator::<u64>::new(128).unwrap();
        let p = a.allocate(1).unwrap();
        a.deallocate(p, 1).unwrap();
        assert!(matches!(
            a.construct(p, 1),
            Err(AllocError::InvalidPointer {
                fault: PointerFault::AlreadyFree,
                ..
            })
        ));
    }

    #[test]
    fn deallocate_forgets_live_values_without_dropping() {
        let tracker = Rc::new(());
        let mut a = TypedAllocator::<Rc<()>>::new(256).unwrap();
        let p = a.allocate(1).unwrap();
        a.construct(p, Rc::clone(&tracker)).unwrap();
        a.deallocate(p, 1).unwrap();
        assert_eq!(a.live_count(), 0);
        assert_eq!(Rc::strong_count(&tracker), 2);
        let q = a.allocate(1).unwrap();
        assert_eq!(q, p);
        assert!(!a.is_constructed(q));
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Padded {
        tag: u8,
        value: u32,
    }

    #[test]
    fn debug_never_reads_padding_bytes() {
        let mut a = TypedAllocator::<Padded>::new(64).unwrap();
        let p = a.allocate(1).unwrap();
        a.construct(p, Padded { tag: 1, value: 7 }).unwrap();
        let shown = format!("{a:?}");
        assert!(shown.contains("live: 1"));
        assert!(shown.contains("layout: [-8, 40]"));
        assert_eq!(a.read(p).unwrap(), Padded { tag: 1, value: 7 });
    }

    #[test]
    fn construct_does_not_change_layout() {
        let mut a = TypedAllocator::<u32>::new(64).unwrap();
        let p = a.allocate(3).unwrap();
        let before = a.layout();
        a.construct(a.element(p, 1), 0xFFFF_FFFF).unwrap();
        a.destroy(a.element(p, 1)).unwrap();
        assert_eq!(a.layout(), before);
        assert!(a.validate());
    }
}
