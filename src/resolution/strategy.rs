use serde::{Deserialize, Serialize};
use std::fmt;

/// How a conflict between concurrent operations was settled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStrategy {
    /// The later operation (by logical timestamp) wins
    LastWriterWins,

    /// The earlier operation wins
    FirstWriterWins,

    /// Both operations are applied and combined
    MergeOperations,

    /// Operations are transformed against each other and both applied
    OperationalTransform,

    /// Merge against the common ancestor
    ThreeWayMerge,

    /// No automatic outcome; a person has to decide
    UserDecisionRequired,

    /// A person picked one of the competing operations
    ManualSelection,
}

impl ResolutionStrategy {
    pub const ALL: [ResolutionStrategy; 7] = [
        ResolutionStrategy::LastWriterWins,
        ResolutionStrategy::FirstWriterWins,
        ResolutionStrategy::MergeOperations,
        ResolutionStrategy::OperationalTransform,
        ResolutionStrategy::ThreeWayMerge,
        ResolutionStrategy::UserDecisionRequired,
        ResolutionStrategy::ManualSelection,
    ];

    /// May be applied without a person in the loop
    pub fn is_automatic(self) -> bool {
        matches!(
            self,
            ResolutionStrategy::LastWriterWins
                | ResolutionStrategy::FirstWriterWins
                | ResolutionStrategy::MergeOperations
                | ResolutionStrategy::OperationalTransform
                | ResolutionStrategy::ThreeWayMerge
        )
    }

    pub fn is_manual(self) -> bool {
        !self.is_automatic()
    }

    /// Combines both sides rather than picking one
    pub fn is_merge(self) -> bool {
        matches!(
            self,
            ResolutionStrategy::MergeOperations
                | ResolutionStrategy::OperationalTransform
                | ResolutionStrategy::ThreeWayMerge
        )
    }

    /// Human-readable explanation for summaries
    pub fn description(self) -> &'static str {
        match self {
            ResolutionStrategy::LastWriterWins => "the most recent change was kept",
            ResolutionStrategy::FirstWriterWins => "the earliest change was kept",
            ResolutionStrategy::MergeOperations => "the conflicting changes were merged",
            ResolutionStrategy::OperationalTransform => {
                "the changes were reconciled by operational transformation"
            }
            ResolutionStrategy::ThreeWayMerge => {
                "the changes were merged against their common ancestor"
            }
            ResolutionStrategy::UserDecisionRequired => "a user decision is required",
            ResolutionStrategy::ManualSelection => "a user selected the change to keep",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionStrategy::LastWriterWins => "LAST_WRITER_WINS",
            ResolutionStrategy::FirstWriterWins => "FIRST_WRITER_WINS",
            ResolutionStrategy::MergeOperations => "MERGE_OPERATIONS",
            ResolutionStrategy::OperationalTransform => "OPERATIONAL_TRANSFORM",
            ResolutionStrategy::ThreeWayMerge => "THREE_WAY_MERGE",
            ResolutionStrategy::UserDecisionRequired => "USER_DECISION_REQUIRED",
            ResolutionStrategy::ManualSelection => "MANUAL_SELECTION",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trust placed in a resolution. Ordered `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_lowercase(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        })
    }
}
