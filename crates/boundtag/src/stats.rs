//! Occupancy statistics.

use crate::block::{Block, FRAME_SIZE};

/// Snapshot of how an arena is carved up.
///
/// Byte counts are payload bytes; sentinel overhead is reported
/// separately by [`overhead_bytes`](ArenaStats::overhead_bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total arena size in bytes.
    pub capacity: usize,
    /// Number of blocks, free and in use.
    pub block_count: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Number of in-use blocks.
    pub used_blocks: usize,
    /// Payload bytes in free blocks.
    pub free_bytes: usize,
    /// Payload bytes in in-use blocks.
    pub used_bytes: usize,
    /// Payload size of the largest free block.
    pub largest_free: usize,
}

impl ArenaStats {
    pub(crate) fn collect(blocks: impl Iterator<Item = Block>, capacity: usize) -> Self {
        blocks.fold(
            Self {
                capacity,
                ..Self::default()
            },
            |mut stats, block| {
                stats.block_count += 1;
                if block.is_free() {
                    stats.free_blocks += 1;
                    stats.free_bytes += block.size();
                    stats.largest_free = stats.largest_free.max(block.size());
                } else {
                    stats.used_blocks += 1;
                    stats.used_bytes += block.size();
                }
                stats
            },
        )
    }

    /// Bytes spent on headers and trailers.
    pub fn overhead_bytes(&self) -> usize {
        self.block_count * FRAME_SIZE
    }

    /// Share of free payload bytes outside the largest free block.
    ///
    /// 0.0 when all free space is one block (or nothing is free), close to
    /// 1.0 when free space is scattered in many small blocks.
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - self.largest_free as f64 / self.free_bytes as f64
    }
}
