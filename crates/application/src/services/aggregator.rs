//! Context Aggregator
//!
//! Pairs every goal and attribute with the auxiliary context its prompt needs.
//! Stakeholders are matched per record through the authors of the record's
//! previous messages. Feed-forward cards, user notes and appraisal settings
//! describe the associate and go to every record.

use domain::{
    AppraisalRecord, AppraisalResult, AppraisalSettings, AppraisalSnapshot, ConversationContext,
    RecordId, RecordKind, Stakeholder, StakeholderContext,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Everything the generator needs to draft one comment
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub record: AppraisalRecord,
    /// Stakeholders who took part in the record's conversation
    pub stakeholders: Vec<Stakeholder>,
    pub conversation: ConversationContext,
    pub settings: AppraisalSettings,
}

impl PromptContext {
    pub fn record_id(&self) -> &RecordId {
        self.record.id()
    }

    pub fn kind(&self) -> RecordKind {
        self.record.kind()
    }

    /// Notes of the matched stakeholders keyed by emp id
    pub fn stakeholder_notes(&self) -> BTreeMap<&str, &str> {
        self.stakeholders
            .iter()
            .filter_map(|s| s.notes.as_deref().map(|n| (s.emp_id.as_str(), n)))
            .collect()
    }

    pub fn has_auxiliary(&self) -> bool {
        !self.stakeholders.is_empty() || !self.conversation.is_empty() || !self.settings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAggregator;

impl ContextAggregator {
    pub fn new() -> Self {
        Self
    }

    /// One context per record: goals in input order, then attributes in input order
    pub fn aggregate(&self, snapshot: &AppraisalSnapshot) -> AppraisalResult<Vec<PromptContext>> {
        snapshot.check_unique_ids()?;

        let contexts: Vec<PromptContext> = snapshot
            .records()
            .map(|record| {
                let stakeholders = matched_stakeholders(&record, &snapshot.stakeholders);
                debug!(
                    record_id = %record.id(),
                    kind = %record.kind(),
                    stakeholders = stakeholders.len(),
                    "Assembled prompt context"
                );
                PromptContext {
                    record,
                    stakeholders,
                    conversation: snapshot.conversation.clone(),
                    settings: snapshot.settings.clone(),
                }
            })
            .collect();

        Ok(contexts)
    }
}

/// Stakeholders in order of their first message on the record, each once
fn matched_stakeholders(record: &AppraisalRecord, context: &StakeholderContext) -> Vec<Stakeholder> {
    let mut matched: Vec<Stakeholder> = Vec::new();
    for message in record.previous_messages() {
        if let Some(person) = context.find_author(&message.author) {
            if !matched.iter().any(|m| m.emp_id == person.emp_id) {
                matched.push(person.clone());
            }
        }
    }
    matched
}
