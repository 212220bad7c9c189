//! Test utilities for boundtag development.
//!
//! - [`ReferenceModel`]: a list-of-blocks model of first-fit allocation
//!   with coalescing, used as an oracle for the real allocator.
//! - [`Op`] and [`ops`]: operation sequences for property tests.
//! - [`fixtures`]: small helpers shared by integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod model;

pub use model::ReferenceModel;

use boundtag::BlockAllocator;
use proptest::prelude::*;

/// One step of a generated workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate this many elements.
    Alloc(usize),
    /// Free the n-th in-use block (0-based), if there is one.
    FreeNth(usize),
}

impl Op {
    /// Apply to a real allocator. Returns whether anything changed.
    pub fn apply(self, allocator: &mut BlockAllocator) -> bool {
        match self {
            Op::Alloc(count) => allocator.allocate(count).is_ok(),
            Op::FreeNth(n) => match allocator.nth_in_use(n) {
                Some(ptr) => {
                    if let Err(e) = allocator.deallocate(ptr, 0) {
                        panic!("freeing in-use block {n} failed: {e}");
                    }
                    true
                }
                None => false,
            },
        }
    }

    /// Apply to the reference model. Returns whether anything changed.
    pub fn apply_model(self, model: &mut ReferenceModel) -> bool {
        match self {
            Op::Alloc(count) => model.allocate(count),
            Op::FreeNth(n) => model.free_nth(n),
        }
    }
}

/// Single operation: allocations of `1..max_count` elements or frees of
/// one of the first 16 in-use blocks, weighted toward allocation.
pub fn op(max_count: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1..max_count.max(2)).prop_map(Op::Alloc),
        2 => (0usize..16).prop_map(Op::FreeNth),
    ]
}

/// Sequence of up to `max_len` operations.
pub fn ops(max_count: usize, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(op(max_count), 0..max_len)
}
