//! Domain Errors - failure kinds of an appraisal run
//!
//! Per-record failures (generation, validation) are collected and reported at
//! the end of a run. Everything else aborts the run.

use crate::value_objects::{RecordId, RecordState};
use thiserror::Error;

/// Errors raised while extracting, generating or persisting appraisal comments
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppraisalError {
    /// The portal could not deliver the records (fatal, before the pipeline starts)
    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    /// The model call failed or returned unusable text for one record
    #[error("Generation failed for {record_id}: {reason}")]
    GenerationFailure { record_id: RecordId, reason: String },

    /// The finalizer rejected a draft
    #[error("Validation failed for {record_id}: {reason}")]
    ValidationFailure { record_id: RecordId, reason: String },

    /// The record store could not be written (fatal, no partial output)
    #[error("Failed to persist {path}: {reason}")]
    PersistenceFailure { path: String, reason: String },

    /// Input file content is missing required fields or is inconsistent
    #[error("Malformed record in {file}: {reason}")]
    MalformedRecord { file: String, reason: String },

    /// Runtime settings are invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A record attempted a lifecycle transition that does not exist
    #[error("Invalid transition for {record_id}: {from} -> {to}")]
    InvalidTransition {
        record_id: RecordId,
        from: RecordState,
        to: RecordState,
    },
}

/// Domain result type
pub type AppraisalResult<T> = Result<T, AppraisalError>;

impl AppraisalError {
    pub fn generation(record_id: &RecordId, reason: impl Into<String>) -> Self {
        Self::GenerationFailure {
            record_id: record_id.clone(),
            reason: reason.into(),
        }
    }

    pub fn validation(record_id: &RecordId, reason: impl Into<String>) -> Self {
        Self::ValidationFailure {
            record_id: record_id.clone(),
            reason: reason.into(),
        }
    }

    pub fn malformed(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn persistence(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error only affects a single record
    pub fn is_record_failure(&self) -> bool {
        matches!(
            self,
            AppraisalError::GenerationFailure { .. } | AppraisalError::ValidationFailure { .. }
        )
    }

    /// Check if the error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        !self.is_record_failure()
    }

    /// Record the error is attached to, if any
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            AppraisalError::GenerationFailure { record_id, .. }
            | AppraisalError::ValidationFailure { record_id, .. }
            | AppraisalError::InvalidTransition { record_id, .. } => Some(record_id),
            _ => None,
        }
    }
}

/// Failures of a single language model call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("model returned an empty completion")]
    Empty,
}

/// Failures of the web automation layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortalError {
    #[error("portal rejected the session")]
    Unauthorized,

    #[error("portal request failed: {0}")]
    Request(String),

    #[error("portal returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed portal payload: {0}")]
    MalformedPayload(String),
}

pub type PortalResult<T> = Result<T, PortalError>;

impl From<PortalError> for AppraisalError {
    fn from(err: PortalError) -> Self {
        AppraisalError::ExtractionFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecordId {
        RecordId::parse(s).unwrap()
    }

    #[test]
    fn test_error_classification() {
        assert!(AppraisalError::generation(&id("G1"), "timeout").is_record_failure());
        assert!(AppraisalError::validation(&id("A1"), "empty").is_record_failure());

        assert!(AppraisalError::ExtractionFailure("login".into()).is_fatal());
        assert!(AppraisalError::persistence("out.yaml", "disk full").is_fatal());
        assert!(AppraisalError::malformed("goals.yaml", "missing id").is_fatal());
    }

    #[test]
    fn test_error_record_id() {
        let err = AppraisalError::generation(&id("G7"), "boom");
        assert_eq!(err.record_id().map(RecordId::as_str), Some("G7"));
        assert!(AppraisalError::Configuration("x".into()).record_id().is_none());
    }

    #[test]
    fn test_portal_error_maps_to_extraction_failure() {
        let err: AppraisalError = PortalError::Unauthorized.into();
        assert!(matches!(err, AppraisalError::ExtractionFailure(_)));
        assert!(err.to_string().contains("rejected the session"));
    }
}
