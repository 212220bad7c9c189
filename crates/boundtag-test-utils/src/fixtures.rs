//! Shared helpers for integration tests.

use boundtag::{ArenaConfig, BlockAllocator, BlockPtr};

/// Allocator with the given capacity and element size.
///
/// Panics on an invalid configuration; tests pass known-good values.
pub fn allocator(capacity: usize, element_size: usize) -> BlockAllocator {
    BlockAllocator::new(ArenaConfig::new(capacity, element_size))
        .unwrap_or_else(|e| panic!("bad test config {capacity}/{element_size}: {e}"))
}

/// Allocate each count in turn, panicking on failure.
pub fn allocate_all(allocator: &mut BlockAllocator, counts: &[usize]) -> Vec<BlockPtr> {
    counts
        .iter()
        .map(|&count| {
            allocator
                .allocate(count)
                .unwrap_or_else(|e| panic!("allocate({count}) failed: {e}"))
        })
        .collect()
}

/// Assert the exact signed layout and that every invariant holds.
#[track_caller]
pub fn assert_layout(allocator: &BlockAllocator, expected: &[i32]) {
    assert_eq!(allocator.layout(), expected, "unexpected block layout");
    if let Err(corruption) = allocator.check() {
        panic!("arena invariants violated: {corruption}");
    }
}

/// Assert the structural invariants directly from the block list: spans
/// sum to capacity and no two neighbours are free.
#[track_caller]
pub fn assert_partitioned(allocator: &BlockAllocator) {
    let blocks: Vec<_> = allocator.blocks().collect();
    let total: usize = blocks.iter().map(|b| b.tag.span()).sum();
    assert_eq!(total, allocator.capacity(), "blocks do not cover the arena");
    for pair in blocks.windows(2) {
        assert!(
            !(pair[0].is_free() && pair[1].is_free()),
            "adjacent free blocks at {} and {}",
            pair[0].offset,
            pair[1].offset
        );
    }
}
