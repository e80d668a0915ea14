use application::{extract_snapshot, submit_comments};
use async_trait::async_trait;
use domain::{
    AppraisalError, AppraisalPortal, AppraisalSettings, AttributeRecord, CommentSet, Credentials,
    FeedForwardCard, GeneratedComment, GoalRecord, PortalError, PortalResult, RecordId,
    RecordKind, Session, Stakeholder, StakeholderContext, SubmissionReceipt,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct FakePortal {
    goals: Vec<GoalRecord>,
    attributes: Vec<AttributeRecord>,
    goals_unavailable: bool,
    context_unavailable: bool,
    submitted: Mutex<Vec<GeneratedComment>>,
}

fn id(s: &str) -> RecordId {
    RecordId::parse(s).unwrap()
}

#[async_trait]
impl AppraisalPortal for FakePortal {
    async fn login(&self, _credentials: &Credentials) -> PortalResult<Session> {
        Ok(Session::new("token"))
    }

    async fn validate_session(&self, _session: &Session) -> PortalResult<bool> {
        Ok(true)
    }

    async fn extract_goals(&self, _session: &Session) -> PortalResult<Vec<GoalRecord>> {
        if self.goals_unavailable {
            return Err(PortalError::Unauthorized);
        }
        Ok(self.goals.clone())
    }

    async fn extract_attributes(&self, _session: &Session) -> PortalResult<Vec<AttributeRecord>> {
        Ok(self.attributes.clone())
    }

    async fn extract_settings(&self, _session: &Session) -> PortalResult<AppraisalSettings> {
        if self.context_unavailable {
            return Err(PortalError::Status {
                status: 500,
                body: "panel missing".into(),
            });
        }
        let mut settings = BTreeMap::new();
        settings.insert("Appraisal Year".to_string(), "2024-2025".to_string());
        Ok(AppraisalSettings(settings))
    }

    async fn extract_stakeholders(&self, _session: &Session) -> PortalResult<StakeholderContext> {
        if self.context_unavailable {
            return Err(PortalError::Request("timeout".into()));
        }
        Ok(StakeholderContext::new(vec![Stakeholder {
            emp_id: "1001".into(),
            name: "Asha Rao".into(),
            role: "Supervisor".into(),
            notes: None,
        }]))
    }

    async fn extract_feed_forward(
        &self,
        _session: &Session,
    ) -> PortalResult<BTreeMap<String, Vec<FeedForwardCard>>> {
        if self.context_unavailable {
            return Err(PortalError::MalformedPayload("not json".into()));
        }
        let mut sections = BTreeMap::new();
        sections.insert(
            "Aspirations".to_string(),
            vec![FeedForwardCard {
                title: "Certification".into(),
                value: "Yes".into(),
                description: String::new(),
            }],
        );
        Ok(sections)
    }

    async fn submit_comments(
        &self,
        _session: &Session,
        comments: &[GeneratedComment],
    ) -> PortalResult<SubmissionReceipt> {
        self.submitted.lock().unwrap().extend_from_slice(comments);
        Ok(SubmissionReceipt {
            accepted: comments.len(),
            rejected: Vec::new(),
        })
    }
}

fn portal() -> FakePortal {
    FakePortal {
        goals: vec![GoalRecord::new(id("G1"), "Latency", "Reduce p99")],
        attributes: vec![AttributeRecord::new(id("A1"), "Ownership", "Drives outcomes")],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_extract_full_snapshot() {
    let snapshot = extract_snapshot(&portal(), &Session::new("token"))
        .await
        .unwrap();

    assert_eq!(snapshot.record_count(), 2);
    assert_eq!(snapshot.settings.get("Appraisal Year"), Some("2024-2025"));
    assert_eq!(snapshot.stakeholders.stakeholders.len(), 1);
    assert_eq!(snapshot.conversation.feed_forward["Aspirations"].len(), 1);
    assert!(snapshot.conversation.user_notes.is_none());
}

#[tokio::test]
async fn test_missing_context_does_not_abort() {
    let portal = FakePortal {
        context_unavailable: true,
        ..portal()
    };
    let snapshot = extract_snapshot(&portal, &Session::new("token"))
        .await
        .unwrap();

    assert_eq!(snapshot.record_count(), 2);
    assert!(snapshot.settings.is_empty());
    assert!(snapshot.stakeholders.is_empty());
    assert!(snapshot.conversation.is_empty());
}

#[tokio::test]
async fn test_goal_extraction_failure_is_fatal() {
    let portal = FakePortal {
        goals_unavailable: true,
        ..portal()
    };
    let err = extract_snapshot(&portal, &Session::new("token"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppraisalError::ExtractionFailure(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_duplicate_ids_from_portal_are_rejected() {
    let portal = FakePortal {
        attributes: vec![AttributeRecord::new(id("G1"), "Ownership", "Drives outcomes")],
        ..portal()
    };
    let err = extract_snapshot(&portal, &Session::new("token"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppraisalError::ExtractionFailure(_)));
}

#[tokio::test]
async fn test_submit_sends_goals_then_attributes() {
    let portal = portal();
    let mut goal = GeneratedComment::draft(id("G1"), RecordKind::Goal, "Done");
    goal.finalized = true;
    let mut attribute = GeneratedComment::draft(id("A1"), RecordKind::Attribute, "Done");
    attribute.finalized = true;
    let set = CommentSet::from_comments(vec![attribute, goal]);

    let receipt = submit_comments(&portal, &Session::new("token"), &set)
        .await
        .unwrap();

    assert_eq!(receipt.accepted, 2);
    let submitted: Vec<String> = portal
        .submitted
        .lock()
        .unwrap()
        .iter()
        .map(|c| c.record_id.as_str().to_string())
        .collect();
    assert_eq!(submitted, vec!["G1", "A1"]);
}
