use application::{
    CommentFinalizer, CommentGenerator, OutputWriter, Pipeline, PipelineStage, RunReport,
};
use async_trait::async_trait;
use domain::{
    AppraisalError, AppraisalSnapshot, AttributeRecord, GoalRecord, ModelError, RecordId,
    RecordState, RecordStore, TextGenerator,
};
use infrastructure::YamlRecordStore;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Fails any prompt mentioning one of `failing_topics`, answers the rest
struct FakeModel {
    failing_topics: Vec<String>,
    draft_reply: String,
    proofread: Result<String, ModelError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    fn new() -> Self {
        Self {
            failing_topics: Vec::new(),
            draft_reply: "```yaml\ncomment: I delivered this with **measurable** results.\nreason: requirement\n```"
                .to_string(),
            proofread: Ok("comment_changed: false".to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, topic: &str) -> Self {
        self.failing_topics.push(format!("**Topic:** {topic}"));
        self
    }
}

#[async_trait]
impl TextGenerator for FakeModel {
    async fn generate(&self, prompt: &str, _model: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("**Comment:**") {
            return self.proofread.clone();
        }
        if self.failing_topics.iter().any(|t| prompt.contains(t.as_str())) {
            return Err(ModelError::Status {
                status: 500,
                body: "model crashed".into(),
            });
        }
        Ok(self.draft_reply.clone())
    }
}

fn id(s: &str) -> RecordId {
    RecordId::parse(s).unwrap()
}

fn pipeline(model: Arc<FakeModel>, store: Arc<YamlRecordStore>, proofread: bool) -> Pipeline {
    let mut finalizer = CommentFinalizer::new(1000);
    if proofread {
        finalizer = finalizer.with_proofreading(model.clone(), "test-model");
    }
    Pipeline::new(
        CommentGenerator::new(model, "test-model"),
        finalizer,
        OutputWriter::new(store),
    )
}

fn store(dir: &TempDir) -> Arc<YamlRecordStore> {
    Arc::new(YamlRecordStore::new(
        dir.path(),
        dir.path().join("final_comments.yaml"),
    ))
}

fn ids(report: &RunReport) -> BTreeSet<String> {
    report
        .comments
        .record_ids()
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

#[tokio::test]
async fn test_single_goal_without_context() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let model = Arc::new(FakeModel::new());
    let snapshot = AppraisalSnapshot {
        goals: vec![GoalRecord::new(id("G1"), "Improve latency", "Reduce p99 by 20%")],
        ..Default::default()
    };

    let report = pipeline(model, store.clone(), false)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(report.comments.len(), 1);
    let comment = &report.comments.goals[0];
    assert_eq!(comment.record_id.as_str(), "G1");
    assert_eq!(comment.text, "I delivered this with measurable results.");
    assert!(comment.finalized);
    assert!(!report.has_failures());
    assert_eq!(report.state_of(&id("G1")), Some(RecordState::Persisted));

    let written = store.load_comments().await.unwrap().unwrap();
    assert_eq!(written, report.comments);
}

#[tokio::test]
async fn test_second_attribute_fails() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let model = Arc::new(FakeModel::new().failing_on("Collaboration"));
    let snapshot = AppraisalSnapshot {
        attributes: vec![
            AttributeRecord::new(id("A1"), "Ownership", "Takes responsibility"),
            AttributeRecord::new(id("A2"), "Collaboration", "Works across teams"),
        ],
        ..Default::default()
    };

    let report = pipeline(model, store.clone(), false)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(report.has_failures());
    assert_eq!(report.failures[0].record_id.as_str(), "A2");
    assert_eq!(report.failures[0].stage, PipelineStage::Generation);
    assert!(matches!(
        report.failures[0].error,
        AppraisalError::GenerationFailure { .. }
    ));
    assert_eq!(report.state_of(&id("A1")), Some(RecordState::Persisted));
    assert_eq!(report.state_of(&id("A2")), Some(RecordState::Failed));

    let written = store.load_comments().await.unwrap().unwrap();
    assert_eq!(written.attributes.len(), 1);
    assert_eq!(written.attributes[0].record_id.as_str(), "A1");
}

#[tokio::test]
async fn test_every_record_accounted_for() {
    let dir = TempDir::new().unwrap();
    let model = Arc::new(FakeModel::new().failing_on("Mentoring"));
    let snapshot = AppraisalSnapshot {
        goals: vec![
            GoalRecord::new(id("G1"), "Latency", "Reduce p99"),
            GoalRecord::new(id("G2"), "Mentoring", "Mentor two joiners"),
            GoalRecord::new(id("G3"), "Cost", "Cut cloud spend"),
        ],
        attributes: vec![AttributeRecord::new(id("A1"), "Ownership", "Drives outcomes")],
        ..Default::default()
    };

    let report = pipeline(model, store(&dir), false)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(report.succeeded() + report.failed(), snapshot.record_count());
    assert_eq!(report.total(), snapshot.record_count());
    for (_, state) in &report.states {
        assert!(state.is_terminal());
    }
}

#[tokio::test]
async fn test_empty_cleanup_result_is_validation_failure() {
    let dir = TempDir::new().unwrap();
    let mut model = FakeModel::new();
    model.draft_reply = "```yaml\ncomment: '\"\"'\n```".to_string();
    let snapshot = AppraisalSnapshot {
        goals: vec![GoalRecord::new(id("G1"), "Latency", "Reduce p99")],
        ..Default::default()
    };

    let report = pipeline(Arc::new(model), store(&dir), false)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(report.failures[0].stage, PipelineStage::Cleanup);
    assert!(matches!(
        report.failures[0].error,
        AppraisalError::ValidationFailure { .. }
    ));
    assert_eq!(report.state_of(&id("G1")), Some(RecordState::Failed));
    assert!(report.comments.is_empty());
}

#[tokio::test]
async fn test_proofreading_failure_and_success() {
    let dir = TempDir::new().unwrap();
    let snapshot = AppraisalSnapshot {
        goals: vec![GoalRecord::new(id("G1"), "Latency", "Reduce p99")],
        ..Default::default()
    };

    let mut broken = FakeModel::new();
    broken.proofread = Err(ModelError::Request("connection reset".into()));
    let report = pipeline(Arc::new(broken), store(&dir), true)
        .run(&snapshot)
        .await
        .unwrap();
    assert_eq!(report.failures[0].stage, PipelineStage::Proofreading);
    assert_eq!(report.state_of(&id("G1")), Some(RecordState::Failed));

    let mut fixing = FakeModel::new();
    fixing.proofread = Ok(
        "```yaml\noriginal_comment: x\ncomment_changed: true\nreason_for_change: too vague\nsuggested_comment: I cut p99 by 22%.\n```"
            .to_string(),
    );
    let fixing = Arc::new(fixing);
    let report = pipeline(fixing.clone(), store(&dir), true)
        .run(&snapshot)
        .await
        .unwrap();
    assert_eq!(report.comments.goals[0].text, "I cut p99 by 22%.");
    // one draft call and one proofreading call
    assert_eq!(fixing.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rerun_produces_same_record_ids() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let snapshot = AppraisalSnapshot {
        goals: vec![GoalRecord::new(id("G1"), "Latency", "Reduce p99")],
        attributes: vec![AttributeRecord::new(id("A1"), "Ownership", "Drives outcomes")],
        ..Default::default()
    };

    let first = pipeline(Arc::new(FakeModel::new()), store.clone(), false)
        .run(&snapshot)
        .await
        .unwrap();
    let second = pipeline(Arc::new(FakeModel::new()), store.clone(), false)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(ids(&first), ids(&second));
    assert_eq!(store.load_comments().await.unwrap(), Some(second.comments));
}

#[tokio::test]
async fn test_persistence_failure_is_fatal_and_keeps_previous_output() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let snapshot = AppraisalSnapshot {
        goals: vec![GoalRecord::new(id("G1"), "Latency", "Reduce p99")],
        ..Default::default()
    };

    pipeline(Arc::new(FakeModel::new()), store.clone(), false)
        .run(&snapshot)
        .await
        .unwrap();
    let before = std::fs::read(store.output_path()).unwrap();

    std::fs::create_dir(dir.path().join(".final_comments.yaml.tmp")).unwrap();
    let err = pipeline(Arc::new(FakeModel::new()), store.clone(), false)
        .run(&snapshot)
        .await
        .unwrap_err();

    assert!(matches!(err, AppraisalError::PersistenceFailure { .. }));
    assert_eq!(std::fs::read(store.output_path()).unwrap(), before);
}

#[tokio::test]
async fn test_progress_reports_each_record() {
    let dir = TempDir::new().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let snapshot = AppraisalSnapshot {
        goals: vec![GoalRecord::new(id("G1"), "Latency", "Reduce p99")],
        attributes: vec![AttributeRecord::new(id("A1"), "Ownership", "Drives outcomes")],
        ..Default::default()
    };

    pipeline(Arc::new(FakeModel::new()), store(&dir), false)
        .with_progress(Box::new(move |position, total, record_id| {
            sink.lock()
                .unwrap()
                .push(format!("{}/{} {}", position + 1, total, record_id));
        }))
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["1/2 G1", "2/2 A1"]);
}
