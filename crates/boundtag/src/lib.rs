//! Fixed-capacity boundary-tag arena allocator.
//!
//! A [`BlockAllocator`] manages one pre-sized byte buffer as a contiguous
//! sequence of variable-length blocks. Every block is framed by a header
//! and a trailer sentinel holding the same signed 32-bit value: the
//! magnitude is the payload size in bytes, the sign is the state
//! (positive = free, negative = in use).
//!
//! # Architecture
//!
//! ```text
//! TypedAllocator<T>  (construct / destroy of T values in allocated slots)
//! └── BlockAllocator (first-fit allocate, deallocate + coalesce, validate)
//!     ├── Cursor / CursorMut / Blocks (forward and backward block steps)
//!     └── Arena      (Vec<u8> + i32 header/trailer encoding)
//! ```
//!
//! # Layout
//!
//! ```text
//! offset 0                                                         N
//! | hdr -40 | 40 payload bytes | trl -40 | hdr +944 | ... | trl +944 |
//! ```
//!
//! After every public operation the arena is exactly partitioned into
//! blocks, each header equals its trailer, no two neighbouring blocks are
//! both free, and no block has size zero. [`BlockAllocator::check`]
//! reports the first violation if one ever occurs.
//!
//! # Safety
//!
//! The crate is `unsafe`-free except for the private `raw` module, which
//! holds the unaligned value reads and writes used by [`TypedAllocator`]
//! together with the live-slot bookkeeping that guards them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod block;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod handle;
mod raw;
pub mod stats;
pub mod typed;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use block::{Block, BlockTag, SENTINEL_SIZE};
pub use config::{ArenaConfig, ConfigError};
pub use cursor::{Blocks, Cursor};
pub use engine::BlockAllocator;
pub use error::{AllocError, Corruption, PointerFault};
pub use handle::{ArenaId, BlockPtr};
pub use stats::ArenaStats;
pub use typed::TypedAllocator;
