//! RecordState - lifecycle of a record across one pipeline run
//!
//! Extracted -> ContextAssembled -> Drafted -> Finalized -> Persisted,
//! with a terminal Failed state reachable from Drafted or Finalized.

use crate::errors::{AppraisalError, AppraisalResult};
use crate::value_objects::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Loaded from the portal or the record store
    #[default]
    Extracted,
    /// Prompt context has been assembled
    ContextAssembled,
    /// A draft has been requested from the model
    Drafted,
    /// Draft accepted by the finalizer
    Finalized,
    /// Written to the output file
    Persisted,
    /// Excluded from output
    Failed,
}

impl RecordState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordState::Extracted => "extracted",
            RecordState::ContextAssembled => "context_assembled",
            RecordState::Drafted => "drafted",
            RecordState::Finalized => "finalized",
            RecordState::Persisted => "persisted",
            RecordState::Failed => "failed",
        }
    }

    /// Check if this state can move to `next`
    pub fn can_transition_to(&self, next: RecordState) -> bool {
        matches!(
            (self, next),
            (RecordState::Extracted, RecordState::ContextAssembled)
                | (RecordState::ContextAssembled, RecordState::Drafted)
                | (RecordState::Drafted, RecordState::Finalized)
                | (RecordState::Finalized, RecordState::Persisted)
                | (RecordState::Drafted, RecordState::Failed)
                | (RecordState::Finalized, RecordState::Failed)
        )
    }

    /// Move to `next`, rejecting transitions that skip or reverse a stage
    pub fn transition(self, next: RecordState, record_id: &RecordId) -> AppraisalResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppraisalError::InvalidTransition {
                record_id: record_id.clone(),
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordState::Persisted | RecordState::Failed)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
