use super::*;

use crate::node::NodeId;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Put(
        #[proptest(strategy = "-64i64..64")] Key,
        #[proptest(strategy = "-1000i64..1000")] Value,
    ),
    #[proptest(weight = 3)]
    Erase(#[proptest(strategy = "-64i64..64")] Key),
    #[proptest(weight = 2)]
    Find(#[proptest(strategy = "-64i64..64")] Key),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=400)
}

fn distinct_keys() -> impl Strategy<Value = Vec<Key>> {
    prop::collection::btree_set(any::<i64>(), 0..=300).prop_map(|s| s.into_iter().collect())
}

/// Stats of the subtree under `id`, gathered from raw values only.
fn scan_subtree(t: &TreeMapStats, id: NodeId) -> Stats {
    let mut stack = vec![id];
    let mut values = Vec::new();
    while let Some(id) = stack.pop() {
        let node = &t.nodes[id];
        values.push(node.value);
        stack.extend(node.left);
        stack.extend(node.right);
    }
    Stats {
        count: values.len(),
        sum: values.iter().map(|&v| i128::from(v)).sum(),
        min: values.iter().copied().min().unwrap(),
        max: values.iter().copied().max().unwrap(),
    }
}

/// Worst-case AVL height for `n` entries: ceil(1.44 * log2(n + 2)).
fn avl_height_bound(n: usize) -> usize {
    (1.44 * ((n + 2) as f64).log2()).ceil() as usize
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t = TreeMapStats::new();
        let mut m: BTreeMap<Key, Value> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Put(key, value) => {
                    prop_assert_eq!(t.put(key, value), m.insert(key, value));
                }
                Op::Erase(key) => {
                    prop_assert_eq!(t.erase(key), m.remove(&key));
                }
                Op::Find(key) => {
                    prop_assert_eq!(t.find(key), m.get(&key).copied());
                }
            }

            prop_assert_eq!(t.check_invariants(), Ok(()));
            prop_assert_eq!(t.size(), m.len());
            prop_assert_eq!(t.root_stats().map_or(0, |s| s.count), m.len());
        }

        let got: Vec<(Key, Value)> = t.iter().collect();
        let expected: Vec<(Key, Value)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_height_bound(keys in distinct_keys()) {
        let mut t = TreeMapStats::new();
        for (i, &k) in keys.iter().enumerate() {
            t.put(k, i as Value);
            prop_assert!(t.height() <= avl_height_bound(t.size()));
        }
        for &k in keys.iter().step_by(2) {
            t.erase(k);
            prop_assert!(t.height() <= avl_height_bound(t.size()));
        }
    }

    #[test]
    fn prop_subtree_stats_match_scan(ops in ops_strategy()) {
        let mut t = TreeMapStats::new();
        for op in ops {
            match op {
                Op::Put(key, value) => { t.put(key, value); }
                Op::Erase(key) => { t.erase(key); }
                Op::Find(_) => {}
            }
        }

        for (key, _) in t.iter() {
            let id = t.find_node(key).unwrap();
            prop_assert_eq!(t.get_stats(key), Some(&scan_subtree(&t, id)));
        }
    }

    #[test]
    fn prop_put_then_erase_restores(
        keys in distinct_keys(),
        fresh in any::<i64>(),
        value in any::<i64>(),
    ) {
        let mut t: TreeMapStats = keys.iter().map(|&k| (k, k / 2)).collect();
        prop_assume!(!t.contains_key(fresh));
        let size = t.size();
        let stats = t.root_stats().copied();

        t.put(fresh, value);
        prop_assert_eq!(t.size(), size + 1);
        t.erase(fresh);
        prop_assert_eq!(t.size(), size);
        prop_assert_eq!(t.root_stats().copied(), stats);

        for &k in &keys {
            t.erase(k);
        }
        prop_assert!(t.empty());
        prop_assert_eq!(t.size(), 0);
        prop_assert_eq!(t.check_invariants(), Ok(()));
    }

    #[test]
    fn prop_order_consistency(keys in distinct_keys()) {
        let t: TreeMapStats = keys.iter().map(|&k| (k, 0)).collect();

        let in_order: Vec<Key> = t.iter().map(|(k, _)| k).collect();
        prop_assert!(in_order.windows(2).all(|w| w[0] < w[1]));

        for pair in in_order.windows(2) {
            prop_assert_eq!(t.successor(pair[0]), Some(pair[1]));
            prop_assert_eq!(t.predecessor(pair[1]), Some(pair[0]));
        }
        for &k in &in_order {
            if let Some(p) = t.predecessor(k) {
                prop_assert_eq!(t.successor(p), Some(k));
            }
        }
        prop_assert_eq!(t.first().map(|(k, _)| k), in_order.first().copied());
        prop_assert_eq!(t.last().map(|(k, _)| k), in_order.last().copied());
    }

    #[test]
    fn prop_overwrite_is_idempotent_on_size(
        keys in distinct_keys(),
        v1 in any::<i64>(),
        v2 in any::<i64>(),
    ) {
        prop_assume!(!keys.is_empty());
        let mut t: TreeMapStats = keys.iter().map(|&k| (k, 1)).collect();
        let k = keys[keys.len() / 2];
        let size = t.size();

        t.put(k, v1);
        t.put(k, v2);
        prop_assert_eq!(t.size(), size);
        prop_assert_eq!(t.find(k), Some(v2));
        let root = t.root_stats().unwrap();
        prop_assert_eq!(root.sum, i128::from(v2) + (size as i128 - 1));
        prop_assert_eq!(t.check_invariants(), Ok(()));
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<Key> = vec![10, 20, 30, 40, 50, 60, 70];

    for_each_permutation(&keys, |perm| {
        let mut t = TreeMapStats::new();
        let mut m: BTreeMap<Key, Value> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as Value;
            assert_eq!(t.put(k, v), m.insert(k, v));
            t.check_invariants().unwrap();
        }

        assert!(t.height() <= 4);
        let got: Vec<(Key, Value)> = t.iter().collect();
        let expected: Vec<(Key, Value)> = m.into_iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_erase_order_small_set() {
    let keys: Vec<Key> = vec![10, 20, 30, 40, 50, 60];

    // Insert in a fixed order, then erase in all permutations.
    let base: TreeMapStats = keys.iter().map(|&k| (k, k + 1)).collect();

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut remaining = keys.len();

        for k in perm {
            assert_eq!(t.erase(k), Some(k + 1));
            remaining -= 1;
            assert_eq!(t.size(), remaining);
            t.check_invariants().unwrap();
        }
        assert!(t.empty());
        assert!(t.root.is_none());
    });
}

#[test]
fn randomized_put_erase_find() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(2);
    let mut t = TreeMapStats::with_capacity(1024);
    let mut m: BTreeMap<Key, Value> = BTreeMap::new();

    for step in 0..50_000 {
        let key: Key = rng.gen_range(-2000..2000);
        match rng.gen_range(0..100) {
            0..=49 => {
                let v: Value = rng.gen();
                assert_eq!(t.put(key, v), m.insert(key, v));
            }
            50..=74 => {
                assert_eq!(t.erase(key), m.remove(&key));
            }
            _ => {
                assert_eq!(t.find(key), m.get(&key).copied());
            }
        }
        if step % 1000 == 0 {
            t.check_invariants().unwrap();
        }
    }

    t.check_invariants().unwrap();
    assert_eq!(t.size(), m.len());
    let got: Vec<(Key, Value)> = t.iter().collect();
    let expected: Vec<(Key, Value)> = m.into_iter().collect();
    assert_eq!(got, expected);
}
