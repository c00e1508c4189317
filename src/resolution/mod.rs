//! Conflict resolution records
//!
//! This layer does not decide what a merged document looks like. It records
//! how a detected conflict between concurrent operations was settled, how much
//! that outcome can be trusted, and whether a person should look at it.

mod context;
mod record;
mod strategy;

pub use context::{ConflictType, ResolutionContext, UserSelection};
pub use record::{ConflictResolution, ResolutionMetrics, ResolutionSnapshot};
pub use strategy::{Confidence, ResolutionStrategy};
