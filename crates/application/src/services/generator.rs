//! Comment Generator - one model call per record

use super::aggregator::PromptContext;
use crate::prompts;
use crate::reply::{fenced_block, normalize_apostrophes};
use domain::{AppraisalError, AppraisalResult, GeneratedComment, TextGenerator};
use serde_yaml::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct CommentGenerator {
    model: Arc<dyn TextGenerator>,
    model_name: String,
}

impl CommentGenerator {
    pub fn new(model: Arc<dyn TextGenerator>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    /// Draft a raw comment for `context`. One attempt, no retries.
    #[instrument(skip(self, context), fields(record_id = %context.record_id(), kind = %context.kind()))]
    pub async fn generate(&self, context: &PromptContext) -> AppraisalResult<GeneratedComment> {
        let record_id = context.record_id();
        let prompt = prompts::draft_prompt(context);
        debug!(prompt_chars = prompt.len(), "Requesting draft");

        let reply = self
            .model
            .generate(&prompt, &self.model_name)
            .await
            .map_err(|e| {
                warn!("Model call failed: {}", e);
                AppraisalError::generation(record_id, e.to_string())
            })?;

        let (text, reason) =
            parse_draft(&reply).map_err(|reason| AppraisalError::generation(record_id, reason))?;

        info!("Drafted comment ({} chars)", text.len());
        Ok(
            GeneratedComment::draft(record_id.clone(), context.kind(), text)
                .with_reason(reason)
                .with_card_no(context.record.card_no()),
        )
    }
}

/// Pull `(comment, reason)` out of a draft reply.
///
/// A fenced block must hold the YAML envelope or a plain string. Without a
/// fence, a reply that parses to a mapping with `comment` or `reason` keys is
/// read as the envelope; anything else is the comment itself.
pub(crate) fn parse_draft(reply: &str) -> Result<(String, Option<String>), String> {
    let reply = normalize_apostrophes(reply);

    let (text, reason) = match fenced_block(&reply) {
        Some(block) => {
            let value: Value = serde_yaml::from_str(block)
                .map_err(|e| format!("unparseable reply envelope: {e}"))?;
            match value {
                Value::Mapping(_) => read_envelope(&value)?,
                Value::String(text) => (text, None),
                _ => return Err("reply envelope is neither a mapping nor text".to_string()),
            }
        }
        None => match serde_yaml::from_str::<Value>(&reply) {
            Ok(value) if is_envelope(&value) => read_envelope(&value)?,
            _ => (reply.trim().to_string(), None),
        },
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err("model returned an empty comment".to_string());
    }
    Ok((text, reason))
}

fn is_envelope(value: &Value) -> bool {
    value.get("comment").is_some() || value.get("reason").is_some()
}

fn read_envelope(value: &Value) -> Result<(String, Option<String>), String> {
    let comment = match value.get("comment") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => return Err("reply envelope has no comment".to_string()),
        Some(other) => scalar_text(other).ok_or("comment is not text")?,
    };
    let reason = value
        .get("reason")
        .and_then(scalar_text)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    Ok((comment, reason))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::{AppraisalRecord, GoalRecord, ModelError, RecordId, RecordKind};
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Result<String, ModelError>,
        seen_models: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(reply: Result<String, ModelError>) -> Self {
            Self {
                reply,
                seen_models: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedModel {
        async fn generate(&self, _prompt: &str, model: &str) -> Result<String, ModelError> {
            self.seen_models.lock().unwrap().push(model.to_string());
            self.reply.clone()
        }
    }

    fn context() -> PromptContext {
        let mut goal = GoalRecord::new(RecordId::parse("G1").unwrap(), "Latency", "Reduce p99");
        goal.card_no = Some(3);
        PromptContext {
            record: AppraisalRecord::Goal(goal),
            stakeholders: Vec::new(),
            conversation: Default::default(),
            settings: Default::default(),
        }
    }

    #[test]
    fn test_parse_fenced_envelope() {
        let reply = "```yaml\ncomment: I reduced p99 by 22%.\nreason: manager requirement\n```";
        let (text, reason) = parse_draft(reply).unwrap();
        assert_eq!(text, "I reduced p99 by 22%.");
        assert_eq!(reason.as_deref(), Some("manager requirement"));
    }

    #[test]
    fn test_parse_unfenced_envelope() {
        let (text, reason) = parse_draft("comment: Shipped it\nreason: notes").unwrap();
        assert_eq!(text, "Shipped it");
        assert_eq!(reason.as_deref(), Some("notes"));
    }

    #[test]
    fn test_parse_plain_text_reply() {
        let (text, reason) = parse_draft("Achieved: a 20% cut in p99 latency").unwrap();
        assert_eq!(text, "Achieved: a 20% cut in p99 latency");
        assert!(reason.is_none());
    }

    #[test]
    fn test_parse_normalizes_apostrophes() {
        let (text, _) = parse_draft("```yaml\ncomment: I\u{2019}ve delivered\n```").unwrap();
        assert_eq!(text, "I've delivered");
    }

    #[test]
    fn test_parse_rejects_missing_or_empty_comment() {
        assert!(parse_draft("```yaml\nreason: only a reason\n```").is_err());
        assert!(parse_draft("```yaml\ncomment: ''\n```").is_err());
        assert!(parse_draft("```yaml\ncomment: [unterminated\n```").is_err());
        assert!(parse_draft("   ").is_err());
    }

    #[tokio::test]
    async fn test_generate_threads_record_identity() {
        let model = Arc::new(ScriptedModel::new(Ok(
            "```yaml\ncomment: I met the target.\nreason: requirement\n```".into(),
        )));
        let generator = CommentGenerator::new(model.clone(), "qwen3:4b");

        let comment = generator.generate(&context()).await.unwrap();

        assert_eq!(comment.record_id.as_str(), "G1");
        assert_eq!(comment.kind, RecordKind::Goal);
        assert_eq!(comment.text, "I met the target.");
        assert_eq!(comment.card_no, Some(3));
        assert!(!comment.finalized);
        assert_eq!(*model.seen_models.lock().unwrap(), vec!["qwen3:4b".to_string()]);
    }

    #[tokio::test]
    async fn test_generate_maps_model_error() {
        let model = Arc::new(ScriptedModel::new(Err(ModelError::Empty)));
        let generator = CommentGenerator::new(model, "m");

        let err = generator.generate(&context()).await.unwrap_err();
        assert!(matches!(err, AppraisalError::GenerationFailure { .. }));
        assert_eq!(err.record_id().map(RecordId::as_str), Some("G1"));
    }
}
