//! The recorded outcome of a conflict
//!
//! A `ConflictResolution` is created exactly once per detected conflict, through
//! one of three factories:
//!
//! - [`ConflictResolution::create_automatic`]: a policy settled it
//! - [`ConflictResolution::create_manual`]: a person settled it
//! - [`ConflictResolution::create_merged`]: a merge algorithm combined both
//!   sides; confidence is derived from the context
//!
//! After creation the record is read-only. [`ConflictResolution::clone_resolution`]
//! issues a deep copy stamped with a new resolution time.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::context::{ConflictType, ResolutionContext, UserSelection};
use super::strategy::{Confidence, ResolutionStrategy};
use crate::clock::{millis_between, Clock};
use crate::config::CausalConfig;
use crate::error::{SerializationError, ValidationError};
use crate::identity::DeviceId;

/// A resolved conflict. `T` is the merge output, opaque to this layer.
///
/// Decoding runs the same checks as [`ConflictResolution::from_snapshot`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolution<T = serde_json::Value> {
    strategy: ResolutionStrategy,
    confidence: Confidence,
    resolved_at: DateTime<Utc>,
    resolved_by: DeviceId,
    context: ResolutionContext,
    result_data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_selection: Option<UserSelection>,
    automatic_resolution: bool,
}

/// Unchecked wire form of a full `ConflictResolution`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConflictResolutionRecord<T> {
    strategy: ResolutionStrategy,
    confidence: Confidence,
    resolved_at: DateTime<Utc>,
    resolved_by: DeviceId,
    context: ResolutionContext,
    result_data: T,
    #[serde(default)]
    user_selection: Option<UserSelection>,
    automatic_resolution: bool,
}

impl<'de, T> Deserialize<'de> for ConflictResolution<T>
where
    T: Serialize + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = ConflictResolutionRecord::<T>::deserialize(deserializer)?;
        let resolution = Self {
            strategy: record.strategy,
            confidence: record.confidence,
            resolved_at: record.resolved_at,
            resolved_by: record.resolved_by,
            context: record.context,
            result_data: record.result_data,
            user_selection: record.user_selection,
            automatic_resolution: record.automatic_resolution,
        };
        resolution.checked().map_err(de::Error::custom)
    }
}

/// The persisted/transported form of a resolution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSnapshot<T = serde_json::Value> {
    pub strategy: ResolutionStrategy,
    pub confidence: Confidence,
    pub resolved_at: DateTime<Utc>,
    pub context: ResolutionContext,
    pub result_data: T,
    pub automatic_resolution: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetrics {
    /// Time from detection to resolution; negative if the clocks disagree
    pub resolution_time_ms: i64,
    pub operations_involved: usize,
    pub devices_involved: usize,
    pub was_automated: bool,
    pub confidence: Confidence,
}

impl<T: Serialize> ConflictResolution<T> {
    /// Record a resolution chosen by an automatic policy.
    pub fn create_automatic(
        strategy: ResolutionStrategy,
        confidence: Confidence,
        resolved_by: DeviceId,
        context: ResolutionContext,
        result_data: T,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        if !strategy.is_automatic() {
            return Err(ValidationError::StrategyNotAutomatic(strategy));
        }

        debug!(
            "conflict {} resolved automatically by {} via {} ({})",
            context.conflict_id, resolved_by, strategy, confidence
        );

        Ok(Self {
            strategy,
            confidence,
            resolved_at: clock.now(),
            resolved_by,
            context,
            result_data,
            user_selection: None,
            automatic_resolution: true,
        })
    }

    /// Record a resolution a person decided. Confidence is always high.
    pub fn create_manual(
        strategy: ResolutionStrategy,
        resolved_by: DeviceId,
        context: ResolutionContext,
        result_data: T,
        user_selection: UserSelection,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        if !strategy.is_manual() {
            return Err(ValidationError::StrategyNotManual(strategy));
        }
        if !user_selection.is_valid() {
            return Err(ValidationError::InvalidOperationSelection);
        }

        debug!(
            "conflict {} resolved manually by {} selecting {}",
            context.conflict_id, resolved_by, user_selection.selected_operation_id
        );

        Ok(Self {
            strategy,
            confidence: Confidence::High,
            resolved_at: clock.now(),
            resolved_by,
            context,
            result_data,
            user_selection: Some(user_selection),
            automatic_resolution: false,
        })
    }

    /// Record the output of operational transformation, with confidence
    /// derived from the context.
    pub fn create_merged(
        resolved_by: DeviceId,
        context: ResolutionContext,
        merge_result: T,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        Self::create_merged_with(
            resolved_by,
            context,
            merge_result,
            ResolutionStrategy::OperationalTransform,
            &CausalConfig::default(),
            clock,
        )
    }

    /// Record a merge made with any automatic `strategy`.
    ///
    /// Confidence starts high. It drops to low when the merge spans at least
    /// `merge_low_confidence_operation_threshold` operations or produced no
    /// result, otherwise to medium for semantic conflicts.
    pub fn create_merged_with(
        resolved_by: DeviceId,
        context: ResolutionContext,
        merge_result: T,
        strategy: ResolutionStrategy,
        config: &CausalConfig,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        let confidence = if context.operation_count >= config.merge_low_confidence_operation_threshold
            || is_null_payload(&merge_result)
        {
            warn!(
                "merge for conflict {} over {} operations has low confidence",
                context.conflict_id, context.operation_count
            );
            Confidence::Low
        } else if context.conflict_type == ConflictType::SemanticConflict {
            Confidence::Medium
        } else {
            Confidence::High
        };

        Self::create_automatic(strategy, confidence, resolved_by, context, merge_result, clock)
    }

    /// Rebuild a resolution from its boundary form.
    ///
    /// `resolved_by` and the user selection travel separately from the snapshot.
    pub fn from_snapshot(
        snapshot: ResolutionSnapshot<T>,
        resolved_by: DeviceId,
        user_selection: Option<UserSelection>,
    ) -> Result<Self, ValidationError> {
        Self {
            strategy: snapshot.strategy,
            confidence: snapshot.confidence,
            resolved_at: snapshot.resolved_at,
            resolved_by,
            context: snapshot.context,
            result_data: snapshot.result_data,
            user_selection,
            automatic_resolution: snapshot.automatic_resolution,
        }
        .checked()
    }

    /// Factory rules for a record that did not come from a factory
    fn checked(self) -> Result<Self, ValidationError> {
        if self.automatic_resolution && !self.strategy.is_automatic() {
            return Err(ValidationError::StrategyNotAutomatic(self.strategy));
        }
        if !self.automatic_resolution && !self.strategy.is_manual() {
            return Err(ValidationError::StrategyNotManual(self.strategy));
        }
        if self.automatic_resolution && self.user_selection.is_some() {
            return Err(ValidationError::UnexpectedUserSelection);
        }
        self.validate_resolution()?;
        Ok(self)
    }

    pub fn validate_resolution(&self) -> Result<(), ValidationError> {
        if is_null_payload(&self.result_data) {
            return Err(ValidationError::NullResultData);
        }
        if !self.automatic_resolution {
            let selection = self
                .user_selection
                .as_ref()
                .ok_or(ValidationError::MissingUserSelection)?;
            if !selection.is_valid() {
                return Err(ValidationError::InvalidOperationSelection);
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> ResolutionSnapshot<&T> {
        ResolutionSnapshot {
            strategy: self.strategy,
            confidence: self.confidence,
            resolved_at: self.resolved_at,
            context: self.context.clone(),
            result_data: &self.result_data,
            automatic_resolution: self.automatic_resolution,
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, SerializationError> {
        serde_json::to_value(self.snapshot()).map_err(|e| SerializationError::Encode(e.to_string()))
    }

    /// Deep copy with a fresh `resolved_at`. The payload goes through a JSON
    /// round trip, so anything JSON cannot represent is rejected.
    pub fn clone_resolution(&self, clock: &dyn Clock) -> Result<Self, SerializationError>
    where
        T: DeserializeOwned,
    {
        let encoded = serde_json::to_string(&self.result_data)
            .map_err(|e| SerializationError::Encode(e.to_string()))?;
        let result_data: T =
            serde_json::from_str(&encoded).map_err(|e| SerializationError::Decode(e.to_string()))?;

        debug!("cloned resolution for conflict {}", self.context.conflict_id);

        Ok(Self {
            strategy: self.strategy,
            confidence: self.confidence,
            resolved_at: clock.now(),
            resolved_by: self.resolved_by.clone(),
            context: self.context.clone(),
            result_data,
            user_selection: self.user_selection.clone(),
            automatic_resolution: self.automatic_resolution,
        })
    }
}

impl<T> ConflictResolution<T> {
    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    pub fn resolved_by(&self) -> &DeviceId {
        &self.resolved_by
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    pub fn result_data(&self) -> &T {
        &self.result_data
    }

    pub fn user_selection(&self) -> Option<&UserSelection> {
        self.user_selection.as_ref()
    }

    pub fn is_automatic(&self) -> bool {
        self.automatic_resolution
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence == Confidence::High
    }

    pub fn is_merge_resolution(&self) -> bool {
        self.strategy.is_merge()
    }

    pub fn requires_user_validation(&self) -> bool {
        self.confidence == Confidence::Low
            || self.strategy == ResolutionStrategy::UserDecisionRequired
            || (self.is_merge_resolution()
                && self.context.conflict_type == ConflictType::SemanticConflict)
    }

    pub fn can_be_undone(&self) -> bool {
        !self.automatic_resolution || self.confidence == Confidence::Low
    }

    /// e.g. "Automatic resolution: the most recent change was kept (high confidence)"
    pub fn resolution_summary(&self) -> String {
        let mode = if self.automatic_resolution {
            "Automatic resolution"
        } else {
            "Manual resolution"
        };
        format!(
            "{}: {} ({} confidence)",
            mode,
            self.strategy.description(),
            self.confidence.as_lowercase()
        )
    }

    pub fn resolution_metrics(&self) -> ResolutionMetrics {
        ResolutionMetrics {
            resolution_time_ms: millis_between(self.context.detected_at, self.resolved_at),
            operations_involved: self.context.operation_count,
            devices_involved: self.context.involved_devices.len(),
            was_automated: self.automatic_resolution,
            confidence: self.confidence,
        }
    }

    pub fn age_ms(&self, clock: &dyn Clock) -> i64 {
        millis_between(self.resolved_at, clock.now())
    }

    pub fn is_expired(&self, max_age_ms: i64, clock: &dyn Clock) -> bool {
        self.age_ms(clock) > max_age_ms
    }

    /// Expired under the configured `resolution_max_age_ms`
    pub fn is_stale(&self, config: &CausalConfig, clock: &dyn Clock) -> bool {
        self.is_expired(config.resolution_max_age_ms, clock)
    }
}

impl<T: PartialEq> ConflictResolution<T> {
    /// Same strategy, conflict, resolver and result. Timing and confidence are ignored.
    pub fn equals(&self, other: &ConflictResolution<T>) -> bool {
        self.strategy == other.strategy
            && self.context.conflict_id == other.context.conflict_id
            && self.resolved_by == other.resolved_by
            && self.result_data == other.result_data
    }
}

impl<T: PartialEq> PartialEq for ConflictResolution<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<T: Serialize> fmt::Display for ConflictResolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(
                f,
                "ConflictResolution({} for {})",
                self.strategy, self.context.conflict_id
            ),
        }
    }
}

/// A payload counts as null when it serializes to JSON `null`.
fn is_null_payload<T: Serialize>(data: &T) -> bool {
    matches!(serde_json::to_value(data), Ok(serde_json::Value::Null))
}
