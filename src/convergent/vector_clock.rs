//! Causal history tracking via vector clocks
//!
//! A vector clock maps each known device to the number of causal events seen
//! from that device. Comparing two clocks tells us whether one event happened
//! before another, or whether they were concurrent (neither knew about the other).
//!
//! Clocks are immutable: every operation returns a new clock.

use log::trace;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::identity::DeviceId;

/// Per-device event counter
pub type Counter = u64;

/// Outcome of comparing two clocks under the happened-before partial order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CausalOrdering {
    /// Self happened before other
    Before,
    /// Other happened before self
    After,
    /// Identical causal history
    Equal,
    /// Neither dominates the other
    Concurrent,
}

/// Snapshot of causal history across devices.
///
/// `==` is snapshot identity: `{A:0}` and `{}` differ under `==` yet
/// [`compare`](Self::compare) reports them [`CausalOrdering::Equal`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    /// Map from device to the number of events seen from it. Sorted so that
    /// fingerprints and tie-breaks never depend on insertion order.
    counters: BTreeMap<DeviceId, Counter>,
}

impl VectorClock {
    /// Create a clock. A seed device becomes known with a zero counter.
    pub fn create(seed_device: Option<&DeviceId>) -> Self {
        let mut counters = BTreeMap::new();
        if let Some(device) = seed_device {
            counters.insert(device.clone(), 0);
        }
        Self { counters }
    }

    /// An empty clock (knows nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter for a device (0 if never seen)
    pub fn get(&self, device: &DeviceId) -> Counter {
        self.counters.get(device).copied().unwrap_or(0)
    }

    pub fn contains(&self, device: &DeviceId) -> bool {
        self.counters.contains_key(device)
    }

    /// All devices this clock knows about, in id order
    pub fn devices(&self) -> impl Iterator<Item = &DeviceId> {
        self.counters.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, Counter)> {
        self.counters.iter().map(|(d, c)| (d, *c))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Record one more local event for `device`.
    pub fn increment_for_device(&self, device: &DeviceId) -> Result<Self, ValidationError> {
        let next = self
            .get(device)
            .checked_add(1)
            .ok_or_else(|| ValidationError::CounterOverflow(device.clone()))?;

        let mut counters = self.counters.clone();
        counters.insert(device.clone(), next);
        trace!("vector clock: {} -> {}", device, next);
        Ok(Self { counters })
    }

    /// Record having seen `counter` events from `device`. Never goes backwards.
    pub fn observe(&self, device: &DeviceId, counter: Counter) -> Self {
        let mut counters = self.counters.clone();
        let current = counters.entry(device.clone()).or_insert(0);
        if counter > *current {
            *current = counter;
        }
        Self { counters }
    }

    /// Componentwise maximum over the union of known devices
    pub fn merge(&self, other: &VectorClock) -> Self {
        let mut counters = self.counters.clone();
        for (device, counter) in &other.counters {
            let current = counters.entry(device.clone()).or_insert(0);
            if *counter > *current {
                *current = *counter;
            }
        }
        trace!(
            "vector clock merge: {} + {} devices -> {}",
            self.len(),
            other.len(),
            counters.len()
        );
        Self { counters }
    }

    /// Has this clock seen everything `other` has seen?
    pub fn dominates(&self, other: &VectorClock) -> bool {
        other.counters.iter().all(|(d, c)| self.get(d) >= *c)
    }

    /// Every counter ≤ the other's, with at least one strictly less
    pub fn happened_before(&self, other: &VectorClock) -> bool {
        other.dominates(self) && !self.dominates(other)
    }

    /// Neither clock dominates the other
    pub fn is_concurrent_with(&self, other: &VectorClock) -> bool {
        !self.dominates(other) && !other.dominates(self)
    }

    pub fn compare(&self, other: &VectorClock) -> CausalOrdering {
        match (self.dominates(other), other.dominates(self)) {
            (true, true) => CausalOrdering::Equal,
            (false, true) => CausalOrdering::Before,
            (true, false) => CausalOrdering::After,
            (false, false) => CausalOrdering::Concurrent,
        }
    }

    /// Device holding the highest counter. Ties go to the smallest device id.
    pub fn max_entry(&self) -> Option<(&DeviceId, Counter)> {
        // BTreeMap iterates in id order; only a strictly greater counter displaces
        self.counters.iter().fold(None, |best, (device, counter)| match best {
            Some((_, best_counter)) if *counter <= best_counter => best,
            _ => Some((device, *counter)),
        })
    }

    /// Deterministic SHA-256 fingerprint of the snapshot, hex-encoded.
    ///
    /// Zero counters are part of the snapshot: a clock that knows a device at
    /// zero fingerprints differently from one that has never heard of it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (device, counter) in &self.counters {
            hasher.update(device.as_str().as_bytes());
            hasher.update(b"=");
            hasher.update(counter.to_string().as_bytes());
            hasher.update(b";");
        }
        hex::encode(hasher.finalize())
    }
}
