//! Inputs supplied to a resolution by its collaborators
//!
//! The conflict detector describes what it found in a [`ResolutionContext`];
//! a user (or whatever stands in for one) answers with a [`UserSelection`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::DeviceId;

/// Kind of conflict the detector observed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    /// Two devices edited the same location
    ConcurrentModification,

    /// Edits disagree about the shape of the document
    StructuralConflict,

    /// Edits are individually valid but contradict each other in meaning
    SemanticConflict,

    /// One side edited what the other deleted
    DeletionConflict,

    /// Edits disagree about the order of elements
    OrderingConflict,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionContext {
    pub conflict_id: String,
    pub involved_devices: Vec<DeviceId>,
    pub conflict_type: ConflictType,
    /// Location in the document the conflict concerns
    pub target_path: String,
    pub detected_at: DateTime<Utc>,
    pub operation_count: usize,
}

impl ResolutionContext {
    /// Describe a freshly detected conflict under a new random id
    pub fn new(
        conflict_type: ConflictType,
        target_path: impl Into<String>,
        involved_devices: Vec<DeviceId>,
        operation_count: usize,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            conflict_id: Uuid::new_v4().to_string(),
            involved_devices,
            conflict_type,
            target_path: target_path.into(),
            detected_at,
            operation_count,
        }
    }

    pub fn with_conflict_id(mut self, conflict_id: impl Into<String>) -> Self {
        self.conflict_id = conflict_id.into();
        self
    }

    pub fn with_operation_count(mut self, operation_count: usize) -> Self {
        self.operation_count = operation_count;
        self
    }

    pub fn with_conflict_type(mut self, conflict_type: ConflictType) -> Self {
        self.conflict_type = conflict_type;
        self
    }
}

/// A person's answer to a conflict
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSelection {
    pub selected_operation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl UserSelection {
    pub fn new(selected_operation_id: impl Into<String>) -> Self {
        Self {
            selected_operation_id: selected_operation_id.into(),
            custom_data: None,
            rationale: None,
        }
    }

    pub fn with_custom_data(mut self, custom_data: serde_json::Value) -> Self {
        self.custom_data = Some(custom_data);
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.selected_operation_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_ids_are_unique() {
        let now = Utc::now();
        let a = ResolutionContext::new(ConflictType::ConcurrentModification, "/x", vec![], 2, now);
        let b = ResolutionContext::new(ConflictType::ConcurrentModification, "/x", vec![], 2, now);
        assert_ne!(a.conflict_id, b.conflict_id);
        assert_eq!(a.with_conflict_id("c-1").conflict_id, "c-1");
    }

    #[test]
    fn test_context_json_shape() {
        let device = DeviceId::create("laptop").unwrap();
        let ctx = ResolutionContext::new(
            ConflictType::SemanticConflict,
            "/proof/steps/3",
            vec![device],
            2,
            Utc::now(),
        )
        .with_conflict_id("c-42");

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["conflictId"], "c-42");
        assert_eq!(json["conflictType"], "SEMANTIC_CONFLICT");
        assert_eq!(json["involvedDevices"][0], "laptop");
        assert_eq!(json["operationCount"], 2);
    }

    #[test]
    fn test_user_selection_validity() {
        assert!(UserSelection::new("op-1").is_valid());
        assert!(!UserSelection::new("").is_valid());
        assert!(!UserSelection::new("  ").is_valid());

        let selection = UserSelection::new("op-1").with_rationale("kept the newer premise");
        let json = serde_json::to_value(&selection).unwrap();
        assert!(json.get("customData").is_none());
        assert_eq!(json["rationale"], "kept the newer premise");
    }
}
