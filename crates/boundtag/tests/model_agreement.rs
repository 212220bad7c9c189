//! Property tests: the allocator agrees with the reference model.

use boundtag_test_utils::fixtures::{allocator, assert_partitioned};
use boundtag_test_utils::{ops, ReferenceModel};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn layouts_match_model(
        capacity in 16usize..1500,
        element_size in prop_oneof![Just(1usize), Just(4), Just(8), Just(12)],
        script in ops(32, 120),
    ) {
        prop_assume!(capacity >= element_size + 8);
        let mut real = allocator(capacity, element_size);
        let mut model = ReferenceModel::new(capacity, element_size);
        for op in script {
            let changed = op.apply(&mut real);
            let model_changed = op.apply_model(&mut model);
            prop_assert_eq!(changed, model_changed, "{:?} disagreed", op);
            prop_assert_eq!(real.layout(), model.layout(), "after {:?}", op);
            prop_assert_eq!(real.check(), Ok(()));
        }
        prop_assert_eq!(real.stats().used_blocks, model.used_blocks());
        assert_partitioned(&real);
    }

    #[test]
    fn freeing_all_in_any_order_restores_one_block(
        counts in proptest::collection::vec(1usize..12, 1..24),
        order in proptest::collection::vec(0usize..24, 24),
    ) {
        let mut a = allocator(1000, 8);
        for n in counts {
            let _ = a.allocate(n);
        }
        for i in order {
            let used = a.stats().used_blocks;
            if used == 0 {
                break;
            }
            let p = a.nth_in_use(i % used).unwrap();
            a.deallocate(p, 0).unwrap();
        }
        while let Some(p) = a.nth_in_use(0) {
            a.deallocate(p, 0).unwrap();
        }
        prop_assert_eq!(a.layout(), vec![992]);
    }
}
