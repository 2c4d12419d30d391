#![cfg(feature = "check")]

use proptest::collection::vec as pvec;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use ptree_core::{Direction, Entry, Ipv4Ops, PatriciaTree, Record};

/// A generated entry: canonical key plus `None` for a full key.
type Sample = (u32, Option<u16>);

fn canon(key: u32, len: u16) -> u32 {
    if len == 0 {
        0
    } else {
        key & (u32::MAX << (32 - len))
    }
}

/// Distinct entries, mixing full keys and masks that often nest.
fn entries(max: usize) -> impl Strategy<Value = Vec<Sample>> {
    // a few shared high bytes keep prefixes overlapping
    let key = (0u32..4, any::<u32>()).prop_map(|(hi, lo)| (hi << 30) | (lo >> 2));
    pvec((key, prop::option::weighted(0.4, 0u16..=32)), 1..max).prop_map(|raw| {
        let mut seen = HashSet::new();
        raw.into_iter()
            .map(|(k, len)| (len.map_or(k, |l| canon(k, l)), len))
            .filter(|e| seen.insert(*e))
            .collect()
    })
}

fn build(samples: &[Sample]) -> (PatriciaTree<Ipv4Ops>, Vec<Record<u32>>) {
    let mut items: Vec<Record<u32>> = samples.iter().map(|&(k, _)| Record::new(k, ())).collect();
    let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
    for (id, &(_, len)) in samples.iter().enumerate() {
        insert(&mut tree, &mut items, id, len);
    }
    (tree, items)
}

fn insert(tree: &mut PatriciaTree<Ipv4Ops>, items: &mut [Record<u32>], id: usize, len: Option<u16>) {
    match len {
        Some(len) => tree.insert_mask(items, id, len).unwrap(),
        None => tree.insert(items, id).unwrap(),
    }
}

/// Sort position: masks come before the longer entries they cover.
fn order_key(sample: &Sample) -> (u32, u16, bool) {
    (sample.0, sample.1.unwrap_or(32), sample.1.is_none())
}

/// Brute-force longest-prefix match over the linked entries.
fn oracle(samples: &[Sample], live: &[usize], probe: u32) -> Option<usize> {
    if let Some(&id) = live.iter().find(|&&id| samples[id] == (probe, None)) {
        return Some(id);
    }
    live.iter()
        .copied()
        .filter(|&id| matches!(samples[id].1, Some(len) if canon(probe, len) == samples[id].0))
        .max_by_key(|&id| samples[id].1)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn distinct_keys_build_a_valid_tree(keys in prop::collection::hash_set(any::<u32>(), 1..200)) {
        let mut items: Vec<Record<u32>> = keys.iter().map(|&k| Record::new(k, ())).collect();
        let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
        for id in 0..items.len() {
            tree.insert(&mut items, id).unwrap();
        }
        prop_assert!(tree.check(&items));
        prop_assert_eq!(tree.len(), keys.len());
        for (id, item) in items.iter().enumerate() {
            prop_assert_eq!(tree.find(&items, item.key()), Some(id));
        }
    }

    #[test]
    fn lookups_agree_with_brute_force(samples in entries(120), probes in pvec(any::<u32>(), 32)) {
        let (tree, items) = build(&samples);
        prop_assert!(tree.check(&items));
        let live: Vec<usize> = (0..samples.len()).collect();
        for probe in probes.into_iter().chain(samples.iter().map(|s| s.0)) {
            prop_assert_eq!(tree.find(&items, &probe), oracle(&samples, &live, probe), "probe {:#010x}", probe);
        }
    }

    #[test]
    fn nested_masks_prefer_the_longer(key in any::<u32>(), short in 0u16..31, extra in 1u16..=8) {
        let long = (short + extra).min(32);
        let mut items = vec![
            Record::new(canon(key, short), ()),
            Record::new(canon(key, long), ()),
        ];
        let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
        tree.insert_mask(&mut items, 0, short).unwrap();
        tree.insert_mask(&mut items, 1, long).unwrap();
        prop_assert!(tree.check(&items));
        prop_assert_eq!(tree.find(&items, &key), Some(1));
        // flip the last bit of the longer prefix
        let diverged = key ^ (1 << (32 - long));
        prop_assert_eq!(tree.find(&items, &diverged), Some(0));
    }

    #[test]
    fn iteration_is_sorted_both_ways(samples in entries(120)) {
        let (tree, items) = build(&samples);
        let up: Vec<usize> = tree.iter(&items, Direction::Ascending).collect();
        let mut expected: Vec<usize> = (0..samples.len()).collect();
        expected.sort_by_key(|&id| order_key(&samples[id]));
        prop_assert_eq!(&up, &expected);

        let mut down: Vec<usize> = tree.iter(&items, Direction::Descending).collect();
        down.reverse();
        prop_assert_eq!(down, expected);
    }

    #[test]
    fn insert_then_remove_is_a_no_op(samples in entries(80), extra in (any::<u32>(), prop::option::of(0u16..=32))) {
        let extra = (extra.1.map_or(extra.0, |l| canon(extra.0, l)), extra.1);
        prop_assume!(!samples.contains(&extra));
        let mut all = samples.clone();
        all.push(extra);
        let (mut tree, mut items) = build(&samples);
        items.push(Record::new(extra.0, ()));
        let before: Vec<usize> = tree.iter(&items, Direction::Ascending).collect();

        let id = samples.len();
        insert(&mut tree, &mut items, id, extra.1);
        prop_assert!(tree.check(&items));
        tree.remove(&mut items, id).unwrap();
        prop_assert!(tree.check(&items));
        prop_assert!(!items[id].node().is_linked());
        let after: Vec<usize> = tree.iter(&items, Direction::Ascending).collect();
        prop_assert_eq!(before, after);
        let live: Vec<usize> = (0..samples.len()).collect();
        prop_assert_eq!(tree.find(&items, &extra.0), oracle(&all, &live, extra.0));
    }

    #[test]
    fn removal_in_any_order(samples in entries(120), seed in any::<u64>()) {
        let (mut tree, mut items) = build(&samples);
        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut live: Vec<usize> = order.clone();
        for &id in &order {
            tree.remove(&mut items, id).unwrap();
            live.retain(|&x| x != id);
            prop_assert!(tree.check(&items), "after removing {}", id);
            prop_assert_eq!(tree.len(), live.len());
            let key = samples[id].0;
            prop_assert_eq!(tree.find(&items, &key), oracle(&samples, &live, key));
        }
        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.iterate(&items, None, Direction::Ascending), None);
    }

    #[test]
    fn interleaved_inserts_and_removes(
        (samples, steps) in entries(48).prop_flat_map(|samples| {
            let n = samples.len();
            (Just(samples), pvec((0..n, any::<u32>()), 1..400))
        })
    ) {
        let mut items: Vec<Record<u32>> = samples.iter().map(|&(k, _)| Record::new(k, ())).collect();
        let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
        let mut live: Vec<usize> = Vec::new();

        // each step toggles one entry: in if absent, out if present
        for (id, probe) in steps {
            if items[id].node().is_linked() {
                tree.remove(&mut items, id).unwrap();
                live.retain(|&x| x != id);
            } else {
                insert(&mut tree, &mut items, id, samples[id].1);
                live.push(id);
            }
            prop_assert!(tree.check(&items), "after toggling {}", id);
            prop_assert_eq!(tree.len(), live.len());

            let key = samples[id].0;
            prop_assert_eq!(tree.find(&items, &key), oracle(&samples, &live, key));
            prop_assert_eq!(tree.find(&items, &probe), oracle(&samples, &live, probe));

            let mut expected = live.clone();
            expected.sort_by_key(|&x| order_key(&samples[x]));
            let up: Vec<usize> = tree.iter(&items, Direction::Ascending).collect();
            prop_assert_eq!(&up, &expected);
            let mut down: Vec<usize> = tree.iter(&items, Direction::Descending).collect();
            down.reverse();
            prop_assert_eq!(down, expected);
        }
    }

    #[test]
    fn check_has_no_side_effects(samples in entries(60)) {
        let (tree, items) = build(&samples);
        let first = tree.check(&items);
        let second = tree.check(&items);
        prop_assert!(first);
        prop_assert_eq!(first, second);
    }
}
