//! RecordId - identity of a goal or attribute card
//!
//! Identifiers come from the portal (or a hand-edited YAML file), so they are
//! opaque strings. The only business rule is that they are non-empty.

use crate::errors::{AppraisalError, AppraisalResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of an appraisal record within one run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create RecordId from its string representation, trimming whitespace
    pub fn parse(id: &str) -> AppraisalResult<Self> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(AppraisalError::malformed(
                "record",
                "record id cannot be empty",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = AppraisalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
