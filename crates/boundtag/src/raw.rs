//! Unaligned value storage inside arena bytes.
//!
//! Payloads start four bytes past a header, so a stored `T` is generally
//! not aligned for `T`. Every access therefore goes through
//! `ptr::write_unaligned` / `ptr::read_unaligned`. This is the only module
//! in the crate allowed to use `unsafe`.
//!
//! [`Slots`] pairs those accesses with the set of offsets that currently
//! hold a `T`, so a value is only ever read back from bytes it was written
//! to, and moved out at most once.

#![allow(unsafe_code)]

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::Range;
use std::ptr;

/// Offsets of arena slots holding a constructed `T`.
///
/// Callers must hand every method the bytes of the same arena: the slice
/// passed for an offset starts at that offset. `TypedAllocator` owns both
/// the arena and its `Slots` and is the only user.
pub(crate) struct Slots<T> {
    live: BTreeSet<usize>,
    _marker: PhantomData<T>,
}

impl<T> Slots<T> {
    pub(crate) fn new() -> Self {
        Self {
            live: BTreeSet::new(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn is_live(&self, offset: usize) -> bool {
        self.live.contains(&offset)
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    /// Move `value` into `dst` and mark `offset` live.
    ///
    /// Hands the value back if the slot is already live.
    pub(crate) fn store(&mut self, offset: usize, dst: &mut [u8], value: T) -> Result<(), T> {
        if self.live.contains(&offset) {
            return Err(value);
        }
        write(dst, value);
        self.live.insert(offset);
        Ok(())
    }

    /// Move the value at `offset` out of `src`, leaving the slot vacant.
    pub(crate) fn take(&mut self, offset: usize, src: &[u8]) -> Option<T> {
        if !self.live.remove(&offset) {
            return None;
        }
        // SAFETY: `offset` was live, so `store` wrote a `T` to these bytes
        // and nothing has moved it out; removing the offset above makes
        // this the only read.
        Some(unsafe { read(src) })
    }

    /// Forget every live slot in `range` without dropping its value.
    pub(crate) fn forget(&mut self, range: Range<usize>) {
        self.live.retain(|offset| !range.contains(offset));
    }
}

impl<T: Copy> Slots<T> {
    /// Copy of the value at `offset`, which stays live.
    pub(crate) fn copy(&self, offset: usize, src: &[u8]) -> Option<T> {
        if !self.live.contains(&offset) {
            return None;
        }
        // SAFETY: `offset` is live, so it holds a `T` written by `store`;
        // `T: Copy`, so reading leaves the stored value intact.
        Some(unsafe { read(src) })
    }
}

/// Move `value` into the first `size_of::<T>()` bytes of `dst`.
///
/// # Panics
///
/// Panics if `dst` is shorter than `size_of::<T>()`.
fn write<T>(dst: &mut [u8], value: T) {
    assert!(
        dst.len() >= size_of::<T>(),
        "slot of {} bytes cannot hold {} bytes",
        dst.len(),
        size_of::<T>()
    );
    // SAFETY: `dst` is valid for writes of `size_of::<T>()` bytes (checked
    // above) and `write_unaligned` places no alignment requirement on it.
    unsafe { ptr::write_unaligned(dst.as_mut_ptr().cast::<T>(), value) }
}

/// Bitwise-copy a `T` out of the first `size_of::<T>()` bytes of `src`.
///
/// # Safety
///
/// Those bytes must hold a `T` previously stored by [`write`]. Unless `T`
/// is `Copy`, the caller must treat the slot as vacated afterwards, or the
/// value would be dropped twice.
///
/// # Panics
///
/// Panics if `src` is shorter than `size_of::<T>()`.
unsafe fn read<T>(src: &[u8]) -> T {
    assert!(
        src.len() >= size_of::<T>(),
        "slot of {} bytes cannot hold {} bytes",
        src.len(),
        size_of::<T>()
    );
    // SAFETY: `src` is valid for reads of `size_of::<T>()` bytes (checked
    // above); the caller guarantees they form a valid `T`.
    unsafe { ptr::read_unaligned(src.as_ptr().cast::<T>()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_at_odd_offset() {
        let mut buf = [0u8; 16];
        let mut slots = Slots::<u64>::new();
        slots.store(3, &mut buf[3..], 0x0102_0304_0506_0708).unwrap();
        assert_eq!(slots.copy(3, &buf[3..]), Some(0x0102_0304_0506_0708));
        assert!(slots.is_live(3));
    }

    #[test]
    fn owned_values_move_out_once() {
        let mut buf = [0u8; 64];
        let mut slots = Slots::<String>::new();
        slots.store(4, &mut buf[4..], String::from("arena")).unwrap();
        assert_eq!(slots.take(4, &buf[4..]).as_deref(), Some("arena"));
        assert_eq!(slots.take(4, &buf[4..]), None);
        assert_eq!(slots.len(), 0);
    }

    #[test]
    fn occupied_slot_hands_value_back() {
        let mut buf = [0u8; 16];
        let mut slots = Slots::<u32>::new();
        slots.store(0, &mut buf[..], 1).unwrap();
        assert_eq!(slots.store(0, &mut buf[..], 2), Err(2));
        assert_eq!(slots.copy(0, &buf[..]), Some(1));
    }

    #[test]
    fn forget_clears_only_the_range() {
        let mut buf = [0u8; 32];
        let mut slots = Slots::<u32>::new();
        for offset in [0, 8, 16] {
            slots.store(offset, &mut buf[offset..], 7).unwrap();
        }
        slots.forget(4..16);
        assert!(slots.is_live(0) && !slots.is_live(8) && slots.is_live(16));
    }

    #[test]
    #[should_panic(expected = "cannot hold")]
    fn short_slot_panics() {
        let mut buf = [0u8; 4];
        let _ = Slots::<u64>::new().store(0, &mut buf, 1);
    }
}
