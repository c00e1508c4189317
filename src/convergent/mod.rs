//! Causal ordering for leaderless, peer-to-peer synchronization
//!
//! - [`VectorClock`]: per-device counters, giving the happened-before partial order
//! - [`LogicalTimestamp`]: a strict total order derived from a clock snapshot,
//!   for deterministic tie-breaking between events the partial order leaves open

mod timestamp;
mod vector_clock;

pub use timestamp::LogicalTimestamp;
pub use vector_clock::{CausalOrdering, Counter, VectorClock};
