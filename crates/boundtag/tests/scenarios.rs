//! End-to-end allocator scenarios checked against exact block layouts.

use boundtag::{AllocError, BlockAllocator, PointerFault};
use boundtag_test_utils::fixtures::{allocate_all, allocator, assert_layout, assert_partitioned};

/// 240-byte arena holding [-64][-8][-128][-8] with the 1st and 3rd freed.
fn two_holes() -> BlockAllocator {
    let mut a = allocator(240, 8);
    allocate_all(&mut a, &[8, 1, 16, 1]);
    assert_layout(&a, &[-64, -8, -128, -8]);
    let first = a.nth_in_use(0).unwrap();
    a.deallocate(first, 8).unwrap();
    let middle = a.nth_in_use(1).unwrap();
    a.deallocate(middle, 16).unwrap();
    assert_layout(&a, &[64, -8, 128, -8]);
    a
}

#[test]
fn first_fit_skips_holes_that_are_too_small() {
    let mut a = two_holes();
    let p = a.allocate(10).unwrap();
    assert_eq!(p.offset(), 72 + 16 + 4);
    assert_layout(&a, &[64, -8, -80, 40, -8]);
}

#[test]
fn first_fit_takes_the_lowest_hole_that_fits() {
    let mut a = two_holes();
    let p = a.allocate(2).unwrap();
    assert_eq!(p.offset(), 4);
    assert_layout(&a, &[-16, 40, -8, 128, -8]);
}

#[test]
fn worked_example_from_default_config() {
    let mut a = allocator(1000, 8);
    assert_layout(&a, &[992]);
    let ptrs = allocate_all(&mut a, &[5, 3]);
    assert_layout(&a, &[-40, -24, 912]);
    a.deallocate(ptrs[0], 5).unwrap();
    assert_layout(&a, &[40, -24, 912]);
}

#[test]
fn splitting_threshold() {
    // Remainder of exactly one minimal block (8 payload + 8 sentinels) splits.
    let mut a = allocator(104, 8);
    a.allocate(10).unwrap();
    assert_layout(&a, &[-80, 8]);

    // Anything smaller is absorbed into the allocation.
    let mut b = allocator(100, 8);
    b.allocate(10).unwrap();
    assert_layout(&b, &[-92]);
}

#[test]
fn smallest_arena_holds_one_element() {
    let mut a = allocator(16, 8);
    assert_layout(&a, &[8]);
    let p = a.allocate(1).unwrap();
    assert_layout(&a, &[-8]);
    assert!(matches!(
        a.allocate(1),
        Err(AllocError::OutOfMemory { largest_free: 0, .. })
    ));
    a.deallocate(p, 1).unwrap();
    assert_layout(&a, &[8]);
}

#[test]
fn freeing_the_middle_block_coalesces_three_ways() {
    let mut a = allocator(48, 8);
    let ptrs = allocate_all(&mut a, &[1, 1, 1]);
    assert_layout(&a, &[-8, -8, -8]);
    a.deallocate(ptrs[0], 1).unwrap();
    a.deallocate(ptrs[2], 1).unwrap();
    assert_layout(&a, &[8, -8, 8]);
    a.deallocate(ptrs[1], 1).unwrap();
    assert_layout(&a, &[40]);
}

#[test]
fn rejected_pointers_leave_the_arena_untouched() {
    let mut a = allocator(200, 8);
    let ptrs = allocate_all(&mut a, &[2, 3]);
    a.deallocate(ptrs[0], 2).unwrap();
    let before = a.layout();

    let faults = [
        a.deallocate(ptrs[0], 2),
        a.deallocate(ptrs[1].add(8), 3),
        a.deallocate(ptrs[1].add(500), 3),
    ];
    assert!(matches!(
        faults[0],
        Err(AllocError::InvalidPointer { fault: PointerFault::AlreadyFree, .. })
    ));
    assert!(matches!(
        faults[1],
        Err(AllocError::InvalidPointer { fault: PointerFault::NotBlockStart, .. })
    ));
    assert!(matches!(
        faults[2],
        Err(AllocError::InvalidPointer { fault: PointerFault::OutOfBounds, .. })
    ));
    assert_eq!(a.layout(), before);
    assert_partitioned(&a);
}

#[test]
fn stats_track_occupancy() {
    let mut a = allocator(1000, 8);
    let ptrs = allocate_all(&mut a, &[5, 3, 2]);
    a.deallocate(ptrs[1], 3).unwrap();
    let stats = a.stats();
    assert_eq!(stats.block_count, 4);
    assert_eq!(stats.used_blocks, 2);
    assert_eq!(stats.free_blocks, 2);
    assert_eq!(stats.used_bytes, 56);
    assert_eq!(stats.largest_free, 888);
    assert_eq!(
        stats.used_bytes + stats.free_bytes + stats.overhead_bytes(),
        stats.capacity
    );
    assert!(stats.fragmentation() > 0.0);
}

#[test]
fn cursor_walks_match_layout() {
    let mut a = allocator(1000, 8);
    allocate_all(&mut a, &[5, 3, 2]);
    let arena = a.arena();

    let mut forward = Vec::new();
    let mut c = arena.begin();
    while let Some(tag) = arena.tag_at(c) {
        forward.push(tag.raw());
        c = arena.step_forward(c).unwrap();
    }
    assert_eq!(c, arena.end());
    assert_eq!(forward, a.layout());

    let mut backward = Vec::new();
    let mut c = arena.end();
    while let Some(prev) = arena.step_back(c) {
        c = prev;
        backward.push(arena.tag_at(c).unwrap().raw());
    }
    backward.reverse();
    assert_eq!(backward, forward);
}
