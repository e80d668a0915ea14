//! Prompt templates
//!
//! Both prompts ask for a fenced YAML answer so the reply can be parsed
//! without guessing where the comment starts.

use crate::services::PromptContext;
use domain::{PreviousMessage, RecordKind};

const NONE: &str = "(none)";

fn sheet_name(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Goal => "goal sheet",
        RecordKind::Attribute => "attribute assessment",
    }
}

fn yaml_or_none<T: serde::Serialize>(value: &T, empty: bool) -> String {
    if empty {
        return NONE.to_string();
    }
    serde_yaml::to_string(value)
        .map(|yaml| yaml.trim_end().to_string())
        .unwrap_or_else(|_| NONE.to_string())
}

fn conversation(messages: &[PreviousMessage]) -> String {
    yaml_or_none(&messages, messages.is_empty())
}

/// Record-specific section shared by both prompts
fn record_section(context: &PromptContext) -> String {
    let record = &context.record;
    let details: String = record
        .details()
        .into_iter()
        .map(|(label, value)| format!("**{label}:** {value}\n"))
        .collect();
    format!(
        "**Topic:** {}\n**Manager Requirement:** {}\n{details}**Previous Conversation (associate's perspective):**\n{}\n",
        record.heading(),
        record.requirement(),
        conversation(record.previous_messages())
    )
}

/// Prompt asking for a first-person draft comment on one record
pub fn draft_prompt(context: &PromptContext) -> String {
    let stakeholder_notes = context.stakeholder_notes();
    let feed_forward = &context.conversation.feed_forward;
    let settings = &context.settings;

    format!(
        r#"# CONTEXT
You are helping a high-performing associate write comments on their annual {sheet}.

{record}**Stakeholder Notes:**
{stakeholders}
**Associate Details (feed-forward):**
{feed_forward}
**Appraisal Settings:**
{settings}
**Associate's Own Notes:** {notes}

# ACTION
Answer with YAML only, in this shape:
```yaml
comment: one concise, positive sentence
reason: which of the information above the comment is based on
```

# RESULT
The comment shows the associate's performance and achievements in a natural,
conversational way, and reads as a continuation of the previous conversation.

# STYLE
1. First person, in the associate's voice: modest but confident.
2. Match the manager requirement first; let the previous conversation steer tone and focus.
3. Keep it short and to the point of this topic only.
4. When something is unclear, rely on the earlier messages instead of inventing details.
5. Use the associate's notes only where they are relevant to this topic.
6. Plain ASCII text, no markdown.
"#,
        sheet = sheet_name(context.kind()),
        record = record_section(context),
        stakeholders = yaml_or_none(&stakeholder_notes, stakeholder_notes.is_empty()),
        feed_forward = yaml_or_none(feed_forward, feed_forward.values().all(Vec::is_empty)),
        settings = yaml_or_none(settings, settings.is_empty()),
        notes = context.conversation.user_notes.as_deref().unwrap_or(NONE),
    )
}

/// Prompt asking the model to check a draft against the record it belongs to
pub fn proofread_prompt(context: &PromptContext, comment: &str) -> String {
    format!(
        r#"# CONTEXT
Check that the comment below fits the topic, the manager requirement and the
previous conversation.

{record}**Comment:** {comment}

# ACTION
Change the comment only if it is off topic, repeats something the associate
already said in the conversation, or contradicts the requirement.
Answer with YAML only, in this shape:
```yaml
original_comment: the comment as given
comment_changed: true or false
reason_for_change: why it was changed, empty if unchanged
suggested_comment: the corrected comment, empty if unchanged
```
"#,
        record = record_section(context),
    )
}
