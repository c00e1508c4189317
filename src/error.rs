use thiserror::Error;

use crate::identity::DeviceId;
use crate::resolution::ResolutionStrategy;

/// Expected, recoverable rejections of malformed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Device ID must be a non-empty string")]
    EmptyOrInvalidType,

    #[error("Device ID cannot exceed 64 characters (got {length})")]
    TooLong { length: usize },

    #[error("Device ID contains invalid character {character:?}; only letters, digits, '-' and '_' are allowed")]
    InvalidCharacter { character: char },

    #[error("Timestamp cannot be negative: {0}")]
    NegativeTimestamp(i64),

    #[error("Vector clock hash must be 64 lowercase hex characters")]
    InvalidClockHash,

    #[error("Cannot create a logical timestamp from an empty vector clock")]
    EmptyVectorClock,

    #[error("Counter for device {0} would overflow")]
    CounterOverflow(DeviceId),

    #[error("Strategy {0} is not suitable for automatic resolution")]
    StrategyNotAutomatic(ResolutionStrategy),

    #[error("Strategy {0} should be used for automatic resolution")]
    StrategyNotManual(ResolutionStrategy),

    #[error("Resolution result data cannot be null")]
    NullResultData,

    #[error("Manual resolution requires a user selection")]
    MissingUserSelection,

    #[error("User selection must reference an operation")]
    InvalidOperationSelection,

    #[error("Automatic resolution cannot carry a user selection")]
    UnexpectedUserSelection,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to serialize resolution data: {0}")]
    Encode(String),

    #[error("Failed to deserialize resolution data: {0}")]
    Decode(String),
}

/// Any error the causality layer can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CausalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}
