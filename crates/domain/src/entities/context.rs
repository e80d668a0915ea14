//! Auxiliary context: stakeholders, feed-forward notes, appraisal settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A person involved in the appraisal (the associate, a supervisor, a reviewer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub emp_id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Stakeholder {
    /// Whether `author` (as written on a message) refers to this person
    pub fn matches_author(&self, author: &str) -> bool {
        let author = author.trim();
        !author.is_empty()
            && (author.eq_ignore_ascii_case(self.name.trim())
                || author.eq_ignore_ascii_case(self.emp_id.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderContext {
    #[serde(default)]
    pub stakeholders: Vec<Stakeholder>,
}

impl StakeholderContext {
    pub fn new(stakeholders: Vec<Stakeholder>) -> Self {
        Self { stakeholders }
    }

    pub fn is_empty(&self) -> bool {
        self.stakeholders.is_empty()
    }

    pub fn find_author(&self, author: &str) -> Option<&Stakeholder> {
        self.stakeholders.iter().find(|s| s.matches_author(author))
    }
}

/// One card of the feed-forward conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedForwardCard {
    pub title: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

/// Free-text history used to keep generated comments in the associate's voice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Feed-forward cards grouped by section heading
    #[serde(default)]
    pub feed_forward: BTreeMap<String, Vec<FeedForwardCard>>,
    /// Notes written by the associate (user_comments.txt)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_notes: Option<String>,
}

impl ConversationContext {
    pub fn is_empty(&self) -> bool {
        self.feed_forward.values().all(Vec::is_empty)
            && self
                .user_notes
                .as_deref()
                .map_or(true, |notes| notes.trim().is_empty())
    }
}

/// Key/value pairs from the portal's settings panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppraisalSettings(pub BTreeMap<String, String>);

impl AppraisalSettings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}
