use guac_idpool::Pool;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Next,
    Free(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![Just(Op::Next), (0usize..64).prop_map(Op::Free)],
        0..200,
    )
}

proptest! {
    #[test]
    fn any_interleaving_keeps_held_ids_unique_and_respects_floor(
        min_floor in 0u64..16,
        ops in ops(),
    ) {
        let pool = Pool::new(min_floor);
        let mut held = std::collections::HashSet::new();
        let mut issued_order = Vec::new();
        let mut freed_ever = std::collections::HashSet::new();

        for op in ops {
            match op {
                Op::Next => {
                    let id = pool.next();
                    prop_assert!(id >= 0);
                    prop_assert!(held.insert(id), "id {id} handed out while still held");
                    issued_order.push(id);
                }
                Op::Free(idx) => {
                    if issued_order.is_empty() {
                        continue;
                    }
                    let id = issued_order[idx % issued_order.len()];
                    if held.remove(&id) {
                        freed_ever.insert(id);
                        pool.free(id);
                    }
                }
            }
        }

        let floor = min_floor as usize;
        if issued_order.len() >= floor {
            let prefix: Vec<i64> = issued_order[..floor].to_vec();
            let expected: Vec<i64> = (0..floor as i64).collect();
            prop_assert_eq!(prefix, expected);
        }
    }
}
