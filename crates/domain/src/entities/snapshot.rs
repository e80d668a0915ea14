//! AppraisalSnapshot - everything extracted for one appraisal subject

use super::context::{AppraisalSettings, ConversationContext, StakeholderContext};
use super::record::{AppraisalRecord, AttributeRecord, GoalRecord, RecordKind};
use crate::errors::{AppraisalError, AppraisalResult};
use crate::value_objects::RecordId;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppraisalSnapshot {
    pub goals: Vec<GoalRecord>,
    pub attributes: Vec<AttributeRecord>,
    pub stakeholders: StakeholderContext,
    pub conversation: ConversationContext,
    pub settings: AppraisalSettings,
}

impl AppraisalSnapshot {
    /// Number of records subject to comment generation
    pub fn record_count(&self) -> usize {
        self.goals.len() + self.attributes.len()
    }

    /// Goals first, then attributes, each in input order
    pub fn records(&self) -> impl Iterator<Item = AppraisalRecord> + '_ {
        self.goals
            .iter()
            .cloned()
            .map(AppraisalRecord::from)
            .chain(self.attributes.iter().cloned().map(AppraisalRecord::from))
    }

    /// Reject an id used twice, within a category or across goals and attributes
    pub fn check_unique_ids(&self) -> AppraisalResult<()> {
        let mut seen: HashMap<&RecordId, RecordKind> = HashMap::new();
        let ids = self
            .goals
            .iter()
            .map(|g| (&g.id, RecordKind::Goal))
            .chain(self.attributes.iter().map(|a| (&a.id, RecordKind::Attribute)));

        for (id, kind) in ids {
            if let Some(first) = seen.insert(id, kind) {
                let reason = if first == kind {
                    format!("duplicate {kind} id {id}")
                } else {
                    format!("id {id} is used by both a goal and an attribute")
                };
                return Err(AppraisalError::malformed(format!("{kind}s"), reason));
            }
        }
        Ok(())
    }
}
