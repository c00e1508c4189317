// Causal Sync - causality tracking and conflict resolution for offline-first editing

pub mod clock;
pub mod config;
pub mod convergent;
pub mod error;
pub mod identity;
pub mod resolution;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CausalConfig, ConfigError};
pub use convergent::{CausalOrdering, LogicalTimestamp, VectorClock};
pub use error::{CausalError, SerializationError, ValidationError};
pub use identity::DeviceId;
pub use resolution::{
    Confidence, ConflictResolution, ConflictType, ResolutionContext, ResolutionMetrics,
    ResolutionSnapshot, ResolutionStrategy, UserSelection,
};
