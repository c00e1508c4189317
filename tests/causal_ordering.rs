//! Causal ordering across devices
//!
//! Two devices edit offline, exchange clocks, and stamp their operations.
//! Property tests check the algebra the rest of the system relies on.
//!
//! Run with:
//!   cargo test --test causal_ordering

use std::cmp::Ordering;

use causal_sync::{CausalOrdering, DeviceId, LogicalTimestamp, ManualClock, VectorClock};
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dev(id: &str) -> DeviceId {
    DeviceId::create(id).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn offline_edits_are_concurrent_until_merged() {
    init_logging();
    let laptop = dev("laptop");
    let phone = dev("phone");

    // Shared starting point
    let base = VectorClock::create(Some(&laptop))
        .increment_for_device(&laptop)
        .unwrap();

    // Both go offline and edit
    let laptop_clock = base.increment_for_device(&laptop).unwrap();
    let phone_clock = base
        .merge(&VectorClock::create(Some(&phone)))
        .increment_for_device(&phone)
        .unwrap();

    assert!(base.happened_before(&laptop_clock));
    assert!(base.happened_before(&phone_clock));
    assert_eq!(laptop_clock.compare(&phone_clock), CausalOrdering::Concurrent);

    // Reconnect: the laptop receives the phone's history and edits again
    let reconciled = laptop_clock
        .merge(&phone_clock)
        .increment_for_device(&laptop)
        .unwrap();

    assert!(laptop_clock.happened_before(&reconciled));
    assert!(phone_clock.happened_before(&reconciled));
    assert_eq!(reconciled.get(&laptop), 3);
    assert_eq!(reconciled.get(&phone), 1);

    // Stamps still give a deterministic order between the concurrent edits
    let clock = ManualClock::at_millis(0);
    let t_laptop = LogicalTimestamp::from_vector_clock(&laptop_clock, &clock).unwrap();
    let t_phone = LogicalTimestamp::from_vector_clock(&phone_clock, &clock).unwrap();
    assert_ne!(t_laptop.compare_to(&t_phone), Ordering::Equal);
    assert_eq!(
        t_laptop.compare_to(&t_phone),
        t_phone.compare_to(&t_laptop).reverse()
    );

    let t_reconciled = LogicalTimestamp::from_vector_clock(&reconciled, &clock).unwrap();
    assert!(t_reconciled.is_after(&t_laptop));
    assert!(t_reconciled.is_after(&t_phone));
}

#[test]
fn increments_never_mutate_the_receiver() {
    let a = dev("deviceA");
    let fresh = VectorClock::create(None);
    let first = fresh.increment_for_device(&a).unwrap();
    let second = first.increment_for_device(&a).unwrap();

    assert!(fresh.is_empty());
    assert_eq!(first.get(&a), 1);
    assert_eq!(second.get(&a), 2);
}

#[test]
fn stamps_sort_deterministically() {
    let clock = ManualClock::at_millis(0);
    let snapshot = VectorClock::new().observe(&dev("x"), 1);

    let mut stamps: Vec<LogicalTimestamp> = ["c", "a", "b"]
        .iter()
        .enumerate()
        .map(|(i, d)| LogicalTimestamp::create(dev(d), (i % 2) as i64, &snapshot, &clock).unwrap())
        .collect();
    stamps.sort();

    // same logical time and snapshot: device id decides
    let order: Vec<String> = stamps.iter().map(|t| t.to_string()).collect();
    assert_eq!(order, ["b@0", "c@0", "a@1"]);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn device_id_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,64}"
}

fn clock_strategy() -> impl Strategy<Value = VectorClock> {
    prop::collection::btree_map("[a-d]", 0u64..6, 0..4).prop_map(|entries| {
        entries
            .into_iter()
            .fold(VectorClock::new(), |vc, (d, c)| vc.observe(&dev(&d), c))
    })
}

fn stamp_strategy() -> impl Strategy<Value = LogicalTimestamp> {
    (device_id_strategy(), 0i64..4, clock_strategy()).prop_map(|(d, t, vc)| {
        LogicalTimestamp::create(dev(&d), t, &vc, &ManualClock::at_millis(0)).unwrap()
    })
}

proptest! {
    #[test]
    fn valid_device_ids_round_trip(raw in device_id_strategy(), pad in " {0,3}") {
        let padded = format!("{}{}{}", pad, raw, pad);
        let id = DeviceId::create(&padded).unwrap();
        prop_assert_eq!(id.as_str(), raw.as_str());
    }

    #[test]
    fn compare_to_is_a_total_order(a in stamp_strategy(), b in stamp_strategy(), c in stamp_strategy()) {
        prop_assert_eq!(a.compare_to(&a), Ordering::Equal);
        prop_assert_eq!(a.compare_to(&b), b.compare_to(&a).reverse());
        prop_assert_eq!(a.compare_to(&b) == Ordering::Equal, a.equals(&b));

        if a.compare_to(&b) != Ordering::Greater && b.compare_to(&c) != Ordering::Greater {
            prop_assert_ne!(a.compare_to(&c), Ordering::Greater);
        }
    }

    #[test]
    fn merge_is_a_join(a in clock_strategy(), b in clock_strategy(), c in clock_strategy()) {
        prop_assert_eq!(a.merge(&b), b.merge(&a));
        prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
        prop_assert_eq!(a.merge(&a), a.clone());

        let joined = a.merge(&b);
        prop_assert!(joined.dominates(&a));
        prop_assert!(joined.dominates(&b));
    }

    #[test]
    fn happened_before_is_asymmetric(a in clock_strategy(), b in clock_strategy()) {
        prop_assert!(!(a.happened_before(&b) && b.happened_before(&a)));
        if a.is_concurrent_with(&b) {
            prop_assert!(!a.happened_before(&b) && !b.happened_before(&a));
        }
    }
}
