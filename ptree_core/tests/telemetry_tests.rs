use ptree_core::constants::{METRIC_INSERTS, METRIC_INSERT_REJECTS, METRIC_LOOKUPS, METRIC_LOOKUP_HITS, METRIC_REMOVES};
use ptree_core::telemetry::register_stats_callback;
use ptree_core::{Error, Ipv4Ops, PatriciaTree, Record};
use std::sync::atomic::{AtomicU64, Ordering};

static INSERTS: AtomicU64 = AtomicU64::new(0);
static REJECTS: AtomicU64 = AtomicU64::new(0);
static REMOVES: AtomicU64 = AtomicU64::new(0);
static LOOKUPS: AtomicU64 = AtomicU64::new(0);
static HITS: AtomicU64 = AtomicU64::new(0);
static OTHER: AtomicU64 = AtomicU64::new(0);

fn collect(name: &str, value: u64) {
    let slot = match name {
        METRIC_INSERTS => &INSERTS,
        METRIC_INSERT_REJECTS => &REJECTS,
        METRIC_REMOVES => &REMOVES,
        METRIC_LOOKUPS => &LOOKUPS,
        METRIC_LOOKUP_HITS => &HITS,
        _ => &OTHER,
    };
    slot.fetch_add(value, Ordering::Relaxed);
}

#[test]
fn counters_reach_the_callback() {
    assert!(register_stats_callback(collect));
    assert!(!register_stats_callback(collect));

    let mut items = vec![Record::new(1u32, ()), Record::new(2, ()), Record::new(2, ())];
    let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
    tree.insert(&mut items, 0).unwrap();
    tree.insert(&mut items, 1).unwrap();
    assert_eq!(tree.insert(&mut items, 2), Err(Error::DuplicateKey));
    assert_eq!(tree.find(&items, &2), Some(1));
    tree.remove(&mut items, 0).unwrap();

    assert_eq!(INSERTS.load(Ordering::Relaxed), 2);
    assert_eq!(REJECTS.load(Ordering::Relaxed), 1);
    assert_eq!(LOOKUPS.load(Ordering::Relaxed), 1);
    assert_eq!(HITS.load(Ordering::Relaxed), 1);
    assert_eq!(REMOVES.load(Ordering::Relaxed), 1);

    // only counters are forwarded
    metrics::gauge!("ptree_test_gauge").decrement(3.0);
    metrics::histogram!("ptree_test_histogram").record(7.0);
    assert_eq!(OTHER.load(Ordering::Relaxed), 0);
    metrics::counter!("ptree_test_counter").increment(2);
    assert_eq!(OTHER.load(Ordering::Relaxed), 2);
}
