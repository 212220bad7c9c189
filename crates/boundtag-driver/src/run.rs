//! Replaying scripts against a fresh allocator per case.

use std::error::Error;
use std::fmt;

use boundtag::{AllocError, ArenaConfig, BlockAllocator, ConfigError};
use tracing::{debug, warn};

use crate::script::{Request, Script};

/// Errors that abort a replay.
///
/// An allocation that runs out of memory does not abort the case; it is
/// logged and the case continues.
#[derive(Debug)]
pub enum RunError {
    /// The arena configuration is unusable.
    Config(ConfigError),
    /// The allocator rejected a request for a reason other than lack of space.
    Alloc(AllocError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid arena configuration: {e}"),
            Self::Alloc(e) => write!(f, "allocator error: {e}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Alloc(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<AllocError> for RunError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

/// Run one case on a new arena and return its final layout.
pub fn run_case(config: &ArenaConfig, requests: &[Request]) -> Result<Vec<i32>, RunError> {
    let mut allocator = BlockAllocator::new(*config)?;
    for &request in requests {
        match request {
            Request::Allocate(count) => match allocator.allocate(count) {
                Ok(ptr) => debug!(count, offset = ptr.offset(), "allocate"),
                Err(err @ AllocError::OutOfMemory { .. }) => {
                    warn!(count, %err, "allocation skipped");
                }
                Err(err) => return Err(err.into()),
            },
            Request::Deallocate(index) => match allocator.nth_in_use(index) {
                Some(ptr) => {
                    allocator.deallocate(ptr, 0)?;
                    debug!(index, offset = ptr.offset(), "deallocate");
                }
                None => debug!(index, "no in-use block at index, skipped"),
            },
        }
    }
    Ok(allocator.layout())
}

/// Run every declared case of `script`.
pub fn run_script(config: &ArenaConfig, script: &Script) -> Result<Vec<Vec<i32>>, RunError> {
    script
        .cases()
        .enumerate()
        .map(|(i, requests)| {
            debug!(case = i + 1, requests = requests.len(), "running case");
            run_case(config, requests)
        })
        .collect()
}

/// Space-separated signed block sizes, the output line for one case.
pub fn format_layout(layout: &[i32]) -> String {
    layout
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
