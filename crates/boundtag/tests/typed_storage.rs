//! Typed construct/destroy over the block allocator.

use std::cell::Cell;
use std::rc::Rc;

use boundtag::{AllocError, TypedAllocator};

#[derive(Debug)]
struct Noisy {
    value: u32,
    drops: Rc<Cell<usize>>,
}

impl Drop for Noisy {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[test]
fn values_survive_neighbouring_frees() {
    let mut a = TypedAllocator::<u64>::new(512).unwrap();
    let p = a.allocate(3).unwrap();
    let q = a.allocate(2).unwrap();
    let r = a.allocate(3).unwrap();
    for i in 0..2 {
        a.construct(a.element(q, i), 100 + i as u64).unwrap();
    }
    a.deallocate(p, 3).unwrap();
    a.deallocate(r, 3).unwrap();
    assert_eq!(a.layout()[1], -16);
    assert_eq!(a.read(a.element(q, 0)).unwrap(), 100);
    assert_eq!(a.read(a.element(q, 1)).unwrap(), 101);
    assert!(a.validate());
}

#[test]
fn destroy_drops_each_value_once() {
    let drops = Rc::new(Cell::new(0));
    let mut a = TypedAllocator::<Noisy>::new(1024).unwrap();
    let p = a.allocate(4).unwrap();
    for i in 0..4 {
        let slot = a.element(p, i);
        a.construct(
            slot,
            Noisy {
                value: i as u32,
                drops: Rc::clone(&drops),
            },
        )
        .unwrap();
    }
    assert_eq!(a.live_count(), 4);

    let taken = a.take(a.element(p, 2)).unwrap();
    assert_eq!(taken.value, 2);
    drop(taken);
    assert_eq!(drops.get(), 1);

    for i in [0, 1, 3] {
        a.destroy(a.element(p, i)).unwrap();
    }
    assert_eq!(drops.get(), 4);
    assert_eq!(
        a.destroy(p).unwrap_err(),
        AllocError::SlotVacant { offset: p.offset() }
    );
    assert_eq!(drops.get(), 4);
    a.deallocate(p, 4).unwrap();
    assert_eq!(a.live_count(), 0);
}

#[test]
fn stale_pointer_after_free_cannot_construct() {
    let mut a = TypedAllocator::<u32>::new(64).unwrap();
    let p = a.allocate(2).unwrap();
    a.deallocate(p, 2).unwrap();
    assert!(a.construct(p, 1).is_err());
    assert_eq!(a.live_count(), 0);
}
