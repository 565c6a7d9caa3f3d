use super::*;
use crate::arena::{Color, NodeId};

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) fn init_logging() {
    // Other tests may have installed it already.
    let _ = simplelog::TestLogger::init(simplelog::LevelFilter::Debug, simplelog::Config::default());
}

pub(crate) fn validate_tree<T: Ord + Debug>(t: &BalancedTree<T>) {
    assert_eq!(t.nodes.len(), t.count, "occupied slots must match size");

    if t.root.is_nil() {
        assert_eq!(t.count, 0, "empty tree must report size 0");
        return;
    }

    let root = t.nodes.node(t.root);
    assert!(root.parent.is_nil(), "root must not have a parent");
    assert_eq!(root.color, Color::Black, "root must be black");

    // (node, depth, black nodes from root down to and including node)
    let mut stack: Vec<(NodeId, usize, usize)> = vec![(t.root, 1, 1)];
    let mut reachable = 0usize;
    let mut max_depth = 0usize;
    let mut black_height: Option<usize> = None;

    while let Some((id, depth, blacks)) = stack.pop() {
        reachable += 1;
        max_depth = max_depth.max(depth);
        let node = t.nodes.node(id);

        for child in [node.left, node.right] {
            if child.is_nil() {
                match black_height {
                    None => black_height = Some(blacks),
                    Some(h) => assert_eq!(h, blacks, "black height differs below {id:?}"),
                }
                continue;
            }

            let c = t.nodes.node(child);
            assert_eq!(c.parent, id, "parent link of {child:?} must point back to {id:?}");
            if node.color == Color::Red {
                assert_eq!(c.color, Color::Black, "red node {id:?} has red child {child:?}");
            }
            if child == node.left {
                assert!(c.item < node.item, "{:?} must order before {:?}", c.item, node.item);
            } else {
                assert!(c.item > node.item, "{:?} must order after {:?}", c.item, node.item);
            }

            let blacks = blacks + usize::from(c.color == Color::Black);
            stack.push((child, depth + 1, blacks));
        }
    }

    assert_eq!(reachable, t.count, "reachable node count must match size");

    let bound = 2.0 * ((t.count + 1) as f64).log2();
    assert!(
        max_depth as f64 <= bound,
        "height {max_depth} exceeds 2*log2(n+1) = {bound:.2} for n = {}",
        t.count
    );

    let items: Vec<&T> = t.iter().collect();
    assert_eq!(items.len(), t.count);
    assert!(
        items.windows(2).all(|w| w[0] < w[1]),
        "in-order traversal must be strictly increasing"
    );
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 4)]
    Insert(#[proptest(strategy = "0u16..256")] u16, bool),
    #[proptest(weight = 3)]
    Delete(#[proptest(strategy = "0u16..256")] u16, bool),
    Search(#[proptest(strategy = "0u16..256")] u16),
    Predecessor(#[proptest(strategy = "0u16..256")] u16),
    Successor(#[proptest(strategy = "0u16..256")] u16),
    Bounds,
    Compact,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let mut t: BalancedTree<u16> = BalancedTree::new();
        let mut m: BTreeSet<u16> = BTreeSet::new();
        let destroyed = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&destroyed);
        t.set_destroy(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        let mut expected_destroyed = 0usize;

        for op in ops {
            match op {
                Op::Insert(item, replace) => {
                    let expected = if m.contains(&item) {
                        if replace {
                            expected_destroyed += 1;
                            Ok(())
                        } else {
                            Err(Error::Duplicate)
                        }
                    } else {
                        m.insert(item);
                        Ok(())
                    };
                    prop_assert_eq!(t.insert(item, replace).map_err(|e| e.kind()), expected);
                }
                Op::Delete(item, destroy) => {
                    let expected = if m.remove(&item) {
                        if destroy {
                            expected_destroyed += 1;
                            Ok(None)
                        } else {
                            Ok(Some(item))
                        }
                    } else {
                        Err(Error::NotFound)
                    };
                    prop_assert_eq!(t.delete(&item, destroy), expected);
                }
                Op::Search(item) => {
                    prop_assert_eq!(t.search(&item), m.get(&item).ok_or(Error::NotFound));
                }
                Op::Predecessor(item) => {
                    let expected = if m.contains(&item) {
                        m.range(..item).next_back().ok_or(Error::NotFound)
                    } else {
                        Err(Error::NotFound)
                    };
                    prop_assert_eq!(t.predecessor(&item), expected);
                }
                Op::Successor(item) => {
                    let expected = if m.contains(&item) {
                        m.range((Bound::Excluded(item), Bound::Unbounded))
                            .next()
                            .ok_or(Error::NotFound)
                    } else {
                        Err(Error::NotFound)
                    };
                    prop_assert_eq!(t.successor(&item), expected);
                }
                Op::Bounds => {
                    prop_assert_eq!(t.minimum(), m.first().ok_or(Error::Empty));
                    prop_assert_eq!(t.maximum(), m.last().ok_or(Error::Empty));
                }
                Op::Compact => {
                    t.compact();
                    prop_assert_eq!(t.nodes.vacant(), 0);
                }
            }

            prop_assert_eq!(t.size(), m.len());
        }

        validate_tree(&t);
        prop_assert_eq!(destroyed.load(Ordering::SeqCst), expected_destroyed);

        let got: Vec<u16> = t.iter().copied().collect();
        let expected: Vec<u16> = m.iter().copied().collect();
        prop_assert_eq!(got, expected);

        prop_assert!(t.deinit(true).is_empty());
        prop_assert_eq!(
            destroyed.load(Ordering::SeqCst),
            expected_destroyed + m.len(),
            "teardown must destroy each remaining item exactly once"
        );
    }

    #[test]
    fn prop_auto_compact_preserves_order(
        items in prop::collection::btree_set(any::<u32>(), 0..=600),
        keep_every in 2usize..6,
    ) {
        let config = Config {
            auto_compact: true,
            compaction_threshold: 32,
            ..Config::default()
        };
        let mut t = BalancedTree::with_config(config);
        for &item in &items {
            prop_assert!(t.insert(item, false).is_ok());
        }

        let mut kept = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if i % keep_every == 0 {
                kept.push(*item);
            } else {
                prop_assert_eq!(t.take(item), Ok(*item));
            }
        }

        validate_tree(&t);
        let got: Vec<u32> = t.iter().copied().collect();
        prop_assert_eq!(got, kept);
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
    let items: Vec<u32> = (1..=7).collect();

    for_each_permutation(&items, |perm| {
        let mut t = BalancedTree::new();
        for item in perm {
            assert!(t.insert(item, false).is_ok());
            validate_tree(&t);
        }
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), items);
        assert_eq!(t.minimum(), Ok(&1));
        assert_eq!(t.maximum(), Ok(&7));
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let items: Vec<u32> = (1..=7).collect();

    // Insert in a fixed order, then delete in all permutations.
    let base: BalancedTree<u32> = items.iter().copied().collect();
    validate_tree(&base);

    for_each_permutation(&items, |perm| {
        let mut t = base.clone();
        let mut m: BTreeSet<u32> = items.iter().copied().collect();

        for item in perm {
            assert_eq!(t.delete(&item, false), Ok(Some(item)));
            m.remove(&item);
            assert_eq!(t.size(), m.len());
            validate_tree(&t);

            for &rest in &m {
                let before = m.range(..rest).next_back().ok_or(Error::NotFound);
                assert_eq!(t.predecessor(&rest), before);
            }
        }
        assert_eq!(t.size(), 0);
        assert!(t.root.is_nil());
        assert_eq!(t.minimum(), Err(Error::Empty));
    });
}
