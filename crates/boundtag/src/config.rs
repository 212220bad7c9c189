//! Allocator configuration parameters.

use std::error::Error;
use std::fmt;

use crate::block::FRAME_SIZE;

/// Configuration for a [`BlockAllocator`](crate::BlockAllocator).
///
/// Both values are fixed for the lifetime of the allocator: the arena
/// never grows, and every allocation request is counted in elements of
/// `element_size` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total arena size in bytes, sentinels included.
    ///
    /// Must hold at least one minimal block
    /// (`element_size + 2 * SENTINEL_SIZE`).
    pub capacity: usize,

    /// Size of one stored element in bytes. Must be non-zero.
    pub element_size: usize,
}

impl ArenaConfig {
    /// Default arena capacity in bytes.
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Default element size: one `f64`.
    pub const DEFAULT_ELEMENT_SIZE: usize = std::mem::size_of::<f64>();

    /// Largest capacity whose single free block still fits in an `i32` tag.
    pub const MAX_CAPACITY: usize = i32::MAX as usize + FRAME_SIZE;

    /// Create a config with an explicit capacity and element size.
    pub fn new(capacity: usize, element_size: usize) -> Self {
        Self {
            capacity,
            element_size,
        }
    }

    /// Create a config whose element size is `size_of::<T>()`.
    pub fn for_type<T>(capacity: usize) -> Self {
        Self::new(capacity, std::mem::size_of::<T>())
    }

    /// Smallest block that can exist: one element plus header and trailer.
    pub fn min_block_bytes(&self) -> usize {
        self.element_size.saturating_add(FRAME_SIZE)
    }

    /// Payload size of the single free block a fresh arena starts with.
    pub fn initial_free_bytes(&self) -> usize {
        self.capacity.saturating_sub(FRAME_SIZE)
    }

    /// Check that an arena with this configuration can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.element_size == 0 {
            return Err(ConfigError::ZeroSizedElement);
        }
        let minimum = self.min_block_bytes();
        if self.capacity < minimum {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity,
                minimum,
            });
        }
        if self.capacity > Self::MAX_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                capacity: self.capacity,
                maximum: Self::MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_ELEMENT_SIZE)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Reasons an allocator could not be constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The capacity cannot hold even one minimal block.
    CapacityTooSmall {
        /// The configured capacity in bytes.
        capacity: usize,
        /// Bytes needed for one element plus both sentinels.
        minimum: usize,
    },
    /// The capacity is too large for the initial free block's size to fit
    /// in a 32-bit sentinel.
    CapacityTooLarge {
        /// The configured capacity in bytes.
        capacity: usize,
        /// The largest supported capacity.
        maximum: usize,
    },
    /// Zero-sized elements would allow zero-sized blocks.
    ZeroSizedElement,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityTooSmall { capacity, minimum } => {
                write!(
                    f,
                    "arena capacity {capacity} bytes is below the minimal block size of {minimum} bytes"
                )
            }
            Self::CapacityTooLarge { capacity, maximum } => {
                write!(
                    f,
                    "arena capacity {capacity} bytes exceeds the maximum of {maximum} bytes"
                )
            }
            Self::ZeroSizedElement => write!(f, "element size must be at least 1 byte"),
        }
    }
}

impl Error for ConfigError {}
