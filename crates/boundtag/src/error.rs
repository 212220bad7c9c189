//! Allocator error types.

use std::error::Error;
use std::fmt;

/// Errors returned by allocate, deallocate, and the typed slot operations.
///
/// Every error is reported before the arena is touched: a failed call
/// leaves the block layout exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// No free block is large enough for the request.
    OutOfMemory {
        /// Bytes needed, header and trailer included.
        requested: usize,
        /// Span of the largest free block (0 if none is free).
        largest_free: usize,
    },
    /// An allocation of zero elements was requested.
    EmptyRequest,
    /// The pointer does not name a live allocation of this arena.
    InvalidPointer {
        /// Byte offset carried by the rejected pointer.
        offset: usize,
        /// Why the pointer was rejected.
        fault: PointerFault,
    },
    /// A value is already constructed in the slot.
    SlotOccupied {
        /// Byte offset of the slot.
        offset: usize,
    },
    /// No constructed value lives in the slot.
    SlotVacant {
        /// Byte offset of the slot.
        offset: usize,
    },
}

impl AllocError {
    pub(crate) fn invalid(offset: usize, fault: PointerFault) -> Self {
        Self::InvalidPointer { offset, fault }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
            Self::EmptyRequest => write!(f, "allocation of zero elements"),
            Self::InvalidPointer { offset, fault } => {
                write!(f, "invalid pointer at offset {offset}: {fault}")
            }
            Self::SlotOccupied { offset } => {
                write!(f, "slot at offset {offset} already holds a value")
            }
            Self::SlotVacant { offset } => {
                write!(f, "slot at offset {offset} holds no value")
            }
        }
    }
}

impl Error for AllocError {}

/// Detail for [`AllocError::InvalidPointer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerFault {
    /// The pointer was issued by a different arena, or before a reset.
    ForeignArena,
    /// The offset lies outside the arena's payload range.
    OutOfBounds,
    /// The offset is not the payload start of any block.
    NotBlockStart,
    /// The offset is inside a block but not on an element boundary.
    Misaligned,
    /// Header and trailer disagree.
    CorruptedSentinels {
        /// Value read from the header.
        header: i32,
        /// Value read from the trailer.
        trailer: i32,
    },
    /// The block is free: never allocated, or already deallocated.
    AlreadyFree,
}

impl fmt::Display for PointerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignArena => write!(f, "pointer belongs to another arena"),
            Self::OutOfBounds => write!(f, "outside the arena"),
            Self::NotBlockStart => write!(f, "not the start of a block"),
            Self::Misaligned => write!(f, "not on an element boundary"),
            Self::CorruptedSentinels { header, trailer } => {
                write!(f, "corrupted sentinels: header {header}, trailer {trailer}")
            }
            Self::AlreadyFree => write!(f, "block is not allocated"),
        }
    }
}

/// First structural violation found by [`check`](crate::BlockAllocator::check).
///
/// Any of these means a previous operation broke the arena; a correct
/// allocator never produces one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corruption {
    /// A header holds zero.
    ZeroSize {
        /// Offset of the header.
        offset: usize,
    },
    /// A header and its trailer hold different values.
    SentinelMismatch {
        /// Offset of the header.
        offset: usize,
        /// Value in the header.
        header: i32,
        /// Value in the trailer.
        trailer: i32,
    },
    /// A free block directly follows another free block.
    AdjacentFree {
        /// Offset of the second free block's header.
        offset: usize,
    },
    /// A block extends past the end of the arena, so the blocks do not
    /// partition it exactly.
    Overrun {
        /// Offset of the offending header.
        offset: usize,
    },
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize { offset } => write!(f, "zero-sized block at offset {offset}"),
            Self::SentinelMismatch {
                offset,
                header,
                trailer,
            } => {
                write!(
                    f,
                    "block at offset {offset}: header {header} does not match trailer {trailer}"
                )
            }
            Self::AdjacentFree { offset } => {
                write!(f, "uncoalesced free block at offset {offset}")
            }
            Self::Overrun { offset } => {
                write!(f, "block at offset {offset} runs past the end of the arena")
            }
        }
    }
}

impl Error for Corruption {}
