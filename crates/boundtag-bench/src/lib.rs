//! Workloads shared by the boundtag benchmarks.
//!
//! - [`mixed_counts`]: deterministic spread of request sizes
//! - [`fragmented`]: an allocator with every other block freed
//! - [`churn`]: allocate a batch, then free it in an interleaved order

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use boundtag::{ArenaConfig, BlockAllocator, BlockPtr};

/// Arena size used by the benchmarks: 1 MiB.
pub const BENCH_CAPACITY: usize = 1 << 20;

/// `n` element counts between 1 and 32, cycling through a fixed pattern.
pub fn mixed_counts(n: usize) -> Vec<usize> {
    (0..n).map(|i| 1 + (i * 7 + i / 5) % 32).collect()
}

/// Fresh allocator of [`BENCH_CAPACITY`] bytes and 8-byte elements.
///
/// Returns `None` only if the benchmark configuration is invalid.
pub fn bench_allocator() -> Option<BlockAllocator> {
    BlockAllocator::new(ArenaConfig::new(BENCH_CAPACITY, 8)).ok()
}

/// Allocator with `blocks` allocations of which every other one is freed,
/// leaving free holes of mixed sizes between in-use blocks.
pub fn fragmented(blocks: usize) -> Option<BlockAllocator> {
    let mut allocator = bench_allocator()?;
    let ptrs: Vec<BlockPtr> = mixed_counts(blocks)
        .into_iter()
        .filter_map(|count| allocator.allocate(count).ok())
        .collect();
    for ptr in ptrs.into_iter().step_by(2) {
        allocator.deallocate(ptr, 0).ok()?;
    }
    Some(allocator)
}

/// Allocate every count, then free evens front-to-back and odds
/// back-to-front. Returns the number of successful allocations.
pub fn churn(allocator: &mut BlockAllocator, counts: &[usize]) -> usize {
    let ptrs: Vec<BlockPtr> = counts
        .iter()
        .filter_map(|&count| allocator.allocate(count).ok())
        .collect();
    for ptr in ptrs.iter().step_by(2) {
        let _ = allocator.deallocate(*ptr, 0);
    }
    for ptr in ptrs.iter().skip(1).step_by(2).rev() {
        let _ = allocator.deallocate(*ptr, 0);
    }
    ptrs.len()
}
