//! Command harness for the boundtag allocator.
//!
//! Reads scripts of allocation and deallocation requests, replays each
//! test case against a fresh [`BlockAllocator`](boundtag::BlockAllocator),
//! and reports the resulting block layout. The text format is a debugging
//! surface, not a stable protocol:
//!
//! ```text
//! 2          <- number of test cases
//!            <- blank line
//! 5          <- allocate 5 elements
//! 3
//! -1         <- free the 1st in-use block (address order)
//!            <- blank line ends the case
//! 10
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod run;
pub mod script;

pub use run::{format_layout, run_case, run_script, RunError};
pub use script::{Request, Script, ScriptError};
