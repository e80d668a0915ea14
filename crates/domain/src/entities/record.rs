//! Goal and attribute records extracted from the appraisal portal

use crate::value_objects::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which portal tab a record lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Goal,
    Attribute,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Goal => "goal",
            RecordKind::Attribute => "attribute",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goal weight as the portal shows it: a percentage or a label like "High"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weight {
    Numeric(f64),
    Category(String),
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Numeric(value) => write!(f, "{value}"),
            Weight::Category(label) => f.write_str(label),
        }
    }
}

/// One message of the conversation already attached to a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousMessage {
    pub author: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_assessment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_messages: Vec<PreviousMessage>,
    /// Card metadata shown by the portal (target date, weightage, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Position on the portal tab, used when filling comments back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_no: Option<u32>,
}

impl GoalRecord {
    pub fn new(id: RecordId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            weight: None,
            self_assessment: None,
            previous_messages: Vec::new(),
            attributes: BTreeMap::new(),
            card_no: None,
        }
    }

    /// Required-field check applied at load time
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("goal {} has an empty title", self.id));
        }
        if self.description.trim().is_empty() {
            return Err(format!("goal {} has an empty description", self.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub id: RecordId,
    pub name: String,
    pub criteria: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_messages: Vec<PreviousMessage>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_no: Option<u32>,
}

impl AttributeRecord {
    pub fn new(id: RecordId, name: impl Into<String>, criteria: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            criteria: criteria.into(),
            rating: None,
            previous_messages: Vec::new(),
            attributes: BTreeMap::new(),
            card_no: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("attribute {} has an empty name", self.id));
        }
        if self.criteria.trim().is_empty() {
            return Err(format!("attribute {} has empty criteria", self.id));
        }
        Ok(())
    }
}

/// A goal or an attribute, viewed uniformly by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum AppraisalRecord {
    Goal(GoalRecord),
    Attribute(AttributeRecord),
}

impl AppraisalRecord {
    pub fn id(&self) -> &RecordId {
        match self {
            AppraisalRecord::Goal(goal) => &goal.id,
            AppraisalRecord::Attribute(attribute) => &attribute.id,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            AppraisalRecord::Goal(_) => RecordKind::Goal,
            AppraisalRecord::Attribute(_) => RecordKind::Attribute,
        }
    }

    /// Card heading: goal title or attribute name
    pub fn heading(&self) -> &str {
        match self {
            AppraisalRecord::Goal(goal) => &goal.title,
            AppraisalRecord::Attribute(attribute) => &attribute.name,
        }
    }

    /// What the manager expects: goal description or attribute criteria
    pub fn requirement(&self) -> &str {
        match self {
            AppraisalRecord::Goal(goal) => &goal.description,
            AppraisalRecord::Attribute(attribute) => &attribute.criteria,
        }
    }

    pub fn previous_messages(&self) -> &[PreviousMessage] {
        match self {
            AppraisalRecord::Goal(goal) => &goal.previous_messages,
            AppraisalRecord::Attribute(attribute) => &attribute.previous_messages,
        }
    }

    pub fn card_no(&self) -> Option<u32> {
        match self {
            AppraisalRecord::Goal(goal) => goal.card_no,
            AppraisalRecord::Attribute(attribute) => attribute.card_no,
        }
    }

    /// Remaining record fields as label/value pairs, in display order
    pub fn details(&self) -> Vec<(String, String)> {
        let mut details = Vec::new();
        let extra = match self {
            AppraisalRecord::Goal(goal) => {
                if let Some(weight) = &goal.weight {
                    details.push(("Weight".to_string(), weight.to_string()));
                }
                if let Some(text) = &goal.self_assessment {
                    details.push(("Self assessment".to_string(), text.clone()));
                }
                &goal.attributes
            }
            AppraisalRecord::Attribute(attribute) => {
                if let Some(rating) = &attribute.rating {
                    details.push(("Rating".to_string(), rating.clone()));
                }
                &attribute.attributes
            }
        };
        details.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        details
    }
}

impl From<GoalRecord> for AppraisalRecord {
    fn from(goal: GoalRecord) -> Self {
        AppraisalRecord::Goal(goal)
    }
}

impl From<AttributeRecord> for AppraisalRecord {
    fn from(attribute: AttributeRecord) -> Self {
        AppraisalRecord::Attribute(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecordId {
        RecordId::parse(s).unwrap()
    }

    #[test]
    fn test_goal_validation() {
        let goal = GoalRecord::new(id("G1"), "Improve latency", "Reduce p99 by 20%");
        assert!(goal.validate().is_ok());

        let empty = GoalRecord::new(id("G2"), "  ", "Reduce p99 by 20%");
        assert!(empty.validate().unwrap_err().contains("G2"));
    }

    #[test]
    fn test_weight_accepts_number_or_label() {
        let goal: GoalRecord = serde_yaml::from_str(
            "id: G1\ntitle: T\ndescription: D\nweight: 20\n",
        )
        .unwrap();
        assert_eq!(goal.weight, Some(Weight::Numeric(20.0)));

        let goal: GoalRecord = serde_yaml::from_str(
            "id: G1\ntitle: T\ndescription: D\nweight: High\n",
        )
        .unwrap();
        assert_eq!(goal.weight, Some(Weight::Category("High".into())));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let result = serde_yaml::from_str::<AttributeRecord>("id: A1\nname: Ownership\n");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("criteria"));
    }

    #[test]
    fn test_record_view() {
        let mut attribute = AttributeRecord::new(id("A1"), "Ownership", "Drives outcomes");
        attribute.rating = Some("Exceeds".into());
        attribute.card_no = Some(2);
        let record = AppraisalRecord::from(attribute);

        assert_eq!(record.kind(), RecordKind::Attribute);
        assert_eq!(record.heading(), "Ownership");
        assert_eq!(record.requirement(), "Drives outcomes");
        assert_eq!(record.card_no(), Some(2));
        assert_eq!(
            record.details(),
            vec![("Rating".to_string(), "Exceeds".to_string())]
        );
    }
}
