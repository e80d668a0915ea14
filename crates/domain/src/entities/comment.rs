//! GeneratedComment - the draft or final comment for one record

use super::record::RecordKind;
use crate::value_objects::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedComment {
    pub record_id: RecordId,
    pub kind: RecordKind,
    pub text: String,
    /// What the model says it based the comment on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub finalized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_no: Option<u32>,
}

impl GeneratedComment {
    /// Create a raw, not yet finalized draft
    pub fn draft(record_id: RecordId, kind: RecordKind, text: impl Into<String>) -> Self {
        Self {
            record_id,
            kind,
            text: text.into(),
            reason: None,
            finalized: false,
            card_no: None,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_card_no(mut self, card_no: Option<u32>) -> Self {
        self.card_no = card_no;
        self
    }
}

/// Finalized comments grouped by kind, as written to the output file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSet {
    #[serde(default)]
    pub goals: Vec<GeneratedComment>,
    #[serde(default)]
    pub attributes: Vec<GeneratedComment>,
}

impl CommentSet {
    /// Group comments by kind, keeping their relative order
    pub fn from_comments(comments: impl IntoIterator<Item = GeneratedComment>) -> Self {
        let (goals, attributes) = comments
            .into_iter()
            .partition(|c| c.kind == RecordKind::Goal);
        Self { goals, attributes }
    }

    pub fn len(&self) -> usize {
        self.goals.len() + self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedComment> {
        self.goals.iter().chain(self.attributes.iter())
    }

    pub fn record_ids(&self) -> Vec<&RecordId> {
        self.iter().map(|c| &c.record_id).collect()
    }

    pub fn of_kind(&self, kind: RecordKind) -> &[GeneratedComment] {
        match kind {
            RecordKind::Goal => &self.goals,
            RecordKind::Attribute => &self.attributes,
        }
    }
}
