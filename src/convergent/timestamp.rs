//! Totally ordered logical timestamps
//!
//! Vector clocks only give a partial order. A `LogicalTimestamp` pins an event
//! to a scalar counter plus a fingerprint of the clock snapshot it came from,
//! which yields a strict total order usable for deterministic tie-breaking.
//!
//! The total order is NOT the causal order: two concurrent events still get
//! ordered one way or the other.
//!
//! The logical counter and the wall-clock creation instant are kept apart.
//! Ordering and equality look only at the logical parts; age and expiry look
//! only at `created_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::vector_clock::{Counter, VectorClock};
use crate::clock::{millis_between, Clock};
use crate::config::CausalConfig;
use crate::error::ValidationError;
use crate::identity::DeviceId;

const COMPACT_HASH_LEN: usize = 8;
const CLOCK_HASH_LEN: usize = 64;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LogicalTimestampRecord")]
pub struct LogicalTimestamp {
    device_id: DeviceId,
    timestamp: Counter,
    vector_clock_hash: String,
    created_at: DateTime<Utc>,
}

/// Wire form, checked before it becomes a `LogicalTimestamp`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogicalTimestampRecord {
    device_id: DeviceId,
    timestamp: Counter,
    vector_clock_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LogicalTimestampRecord> for LogicalTimestamp {
    type Error = ValidationError;

    fn try_from(record: LogicalTimestampRecord) -> Result<Self, Self::Error> {
        let hash = &record.vector_clock_hash;
        let well_formed = hash.len() == CLOCK_HASH_LEN
            && hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
        if !well_formed {
            return Err(ValidationError::InvalidClockHash);
        }

        Ok(Self {
            device_id: record.device_id,
            timestamp: record.timestamp,
            vector_clock_hash: record.vector_clock_hash,
            created_at: record.created_at,
        })
    }
}

impl LogicalTimestamp {
    /// Stamp an event from `device_id` at logical time `timestamp`.
    pub fn create(
        device_id: DeviceId,
        timestamp: i64,
        vector_clock: &VectorClock,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        if timestamp < 0 {
            return Err(ValidationError::NegativeTimestamp(timestamp));
        }

        Ok(Self {
            device_id,
            timestamp: timestamp as Counter,
            vector_clock_hash: vector_clock.fingerprint(),
            created_at: clock.now(),
        })
    }

    /// Stamp using the device holding the highest counter in `vector_clock`.
    ///
    /// When several devices share the maximum, the lexicographically smallest
    /// device id is chosen.
    pub fn from_vector_clock(
        vector_clock: &VectorClock,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        let (device, counter) = vector_clock
            .max_entry()
            .ok_or(ValidationError::EmptyVectorClock)?;

        Ok(Self {
            device_id: device.clone(),
            timestamp: counter,
            vector_clock_hash: vector_clock.fingerprint(),
            created_at: clock.now(),
        })
    }

    /// A fresh stamp from a new single-device clock. Always at logical time 1.
    pub fn now(device_id: DeviceId, clock: &dyn Clock) -> Result<Self, ValidationError> {
        let vector_clock = VectorClock::create(Some(&device_id)).increment_for_device(&device_id)?;
        Self::from_vector_clock(&vector_clock, clock)
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn timestamp(&self) -> Counter {
        self.timestamp
    }

    pub fn vector_clock_hash(&self) -> &str {
        &self.vector_clock_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Strict total order: timestamp, then clock hash, then device id.
    pub fn compare_to(&self, other: &LogicalTimestamp) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.vector_clock_hash.cmp(&other.vector_clock_hash))
            .then_with(|| self.device_id.cmp(&other.device_id))
    }

    pub fn equals(&self, other: &LogicalTimestamp) -> bool {
        self.timestamp == other.timestamp
            && self.device_id == other.device_id
            && self.vector_clock_hash == other.vector_clock_hash
    }

    pub fn is_after(&self, other: &LogicalTimestamp) -> bool {
        self.compare_to(other) == Ordering::Greater
    }

    pub fn is_before(&self, other: &LogicalTimestamp) -> bool {
        self.compare_to(other) == Ordering::Less
    }

    /// Same logical time from different snapshots.
    ///
    /// This is a cheap heuristic, not a causal check. Compare the underlying
    /// [`VectorClock`]s when the real relation matters.
    pub fn is_concurrent_with(&self, other: &LogicalTimestamp) -> bool {
        self.timestamp == other.timestamp && self.vector_clock_hash != other.vector_clock_hash
    }

    /// `{timestamp}:{first 8 hash chars}`
    pub fn to_compact_string(&self) -> String {
        let prefix: String = self.vector_clock_hash.chars().take(COMPACT_HASH_LEN).collect();
        format!("{}:{}", self.timestamp, prefix)
    }

    /// Milliseconds since this stamp was created, by `clock`.
    pub fn age_ms(&self, clock: &dyn Clock) -> i64 {
        millis_between(self.created_at, clock.now())
    }

    pub fn is_expired(&self, max_age_ms: i64, clock: &dyn Clock) -> bool {
        self.age_ms(clock) > max_age_ms
    }

    /// Expired under the configured `timestamp_max_age_ms`
    pub fn is_stale(&self, config: &CausalConfig, clock: &dyn Clock) -> bool {
        self.is_expired(config.timestamp_max_age_ms, clock)
    }
}

impl PartialEq for LogicalTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for LogicalTimestamp {}

impl PartialOrd for LogicalTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogicalTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
    }
}

impl fmt::Display for LogicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.device_id.short_id(), self.timestamp)
    }
}
