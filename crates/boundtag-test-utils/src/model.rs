//! Reference model of the allocator.
//!
//! Keeps blocks as a plain list of `(payload bytes, free)` pairs with no
//! byte-level encoding, so it can be trusted independently of the
//! sentinel arithmetic in the real arena.

use boundtag::SENTINEL_SIZE;

const FRAME: usize = 2 * SENTINEL_SIZE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceModel {
    element_size: usize,
    blocks: Vec<(usize, bool)>,
}

impl ReferenceModel {
    pub fn new(capacity: usize, element_size: usize) -> Self {
        Self {
            element_size,
            blocks: vec![(capacity - FRAME, true)],
        }
    }

    /// First fit with splitting. Returns `false` (and changes nothing) when
    /// no free block is large enough.
    pub fn allocate(&mut self, count: usize) -> bool {
        let Some(needed) = count
            .checked_mul(self.element_size)
            .and_then(|bytes| bytes.checked_add(FRAME))
        else {
            return false;
        };
        let Some(i) = self
            .blocks
            .iter()
            .position(|&(size, free)| free && size + FRAME >= needed)
        else {
            return false;
        };
        let span = self.blocks[i].0 + FRAME;
        let leftover = span - needed;
        if leftover >= self.element_size + FRAME {
            self.blocks[i] = (needed - FRAME, false);
            self.blocks.insert(i + 1, (leftover - FRAME, true));
        } else {
            self.blocks[i].1 = false;
        }
        true
    }

    /// Free the n-th in-use block and merge it with free neighbours.
    pub fn free_nth(&mut self, n: usize) -> bool {
        let Some(mut i) = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.1)
            .nth(n)
            .map(|(i, _)| i)
        else {
            return false;
        };
        self.blocks[i].1 = true;
        if i + 1 < self.blocks.len() && self.blocks[i + 1].1 {
            let (next, _) = self.blocks.remove(i + 1);
            self.blocks[i].0 += next + FRAME;
        }
        if i > 0 && self.blocks[i - 1].1 {
            let (size, _) = self.blocks.remove(i);
            i -= 1;
            self.blocks[i].0 += size + FRAME;
        }
        true
    }

    /// Signed payload sizes in address order: negative for in-use blocks.
    pub fn layout(&self) -> Vec<i32> {
        self.blocks
            .iter()
            .map(|&(size, free)| {
                let size = i32::try_from(size).unwrap_or(i32::MAX);
                if free {
                    size
                } else {
                    -size
                }
            })
            .collect()
    }

    pub fn used_blocks(&self) -> usize {
        self.blocks.iter().filter(|&&(_, free)| !free).count()
    }
}
