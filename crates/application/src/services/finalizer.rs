//! Comment Finalizer
//!
//! Turns a raw draft into the text that goes into the portal: markdown and
//! typographic punctuation removed, whitespace collapsed, length capped. An
//! optional proofreading call lets the model correct a draft that drifted off
//! topic.

use super::aggregator::PromptContext;
use crate::prompts;
use crate::reply::fenced_block;
use domain::{AppraisalError, AppraisalResult, GeneratedComment, TextGenerator};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Answer shape of the proofreading prompt; `original_comment` is ignored
#[derive(Debug, Deserialize)]
struct ProofreadEnvelope {
    #[serde(default)]
    comment_changed: bool,
    #[serde(default)]
    reason_for_change: Option<String>,
    #[serde(default)]
    suggested_comment: Option<String>,
}

pub struct CommentFinalizer {
    proofreader: Option<(Arc<dyn TextGenerator>, String)>,
    max_chars: usize,
}

impl CommentFinalizer {
    /// Cleanup only, no model calls
    pub fn new(max_chars: usize) -> Self {
        Self {
            proofreader: None,
            max_chars,
        }
    }

    /// Cleanup followed by one proofreading call per comment
    pub fn with_proofreading(
        mut self,
        model: Arc<dyn TextGenerator>,
        model_name: impl Into<String>,
    ) -> Self {
        self.proofreader = Some((model, model_name.into()));
        self
    }

    pub fn proofreads(&self) -> bool {
        self.proofreader.is_some()
    }

    /// Clean, proofread and mark the comment finalized.
    ///
    /// A comment that is already finalized comes back unchanged.
    pub async fn finalize(
        &self,
        context: &PromptContext,
        comment: GeneratedComment,
    ) -> AppraisalResult<GeneratedComment> {
        if comment.finalized {
            return Ok(comment);
        }
        let cleaned = self.clean(comment)?;
        self.review(context, cleaned).await
    }

    /// Cleanup and validation stage. Rejects comments that end up empty.
    pub fn clean(&self, mut comment: GeneratedComment) -> AppraisalResult<GeneratedComment> {
        if comment.finalized {
            return Ok(comment);
        }
        let cleaned = clean_text(&comment.text, self.max_chars);
        if cleaned.is_empty() {
            return Err(AppraisalError::validation(
                &comment.record_id,
                "comment is empty after cleanup",
            ));
        }
        if cleaned != comment.text {
            debug!(record_id = %comment.record_id, "Cleaned draft");
        }
        comment.text = cleaned;
        Ok(comment)
    }

    /// Proofreading stage on a cleaned comment; sets `finalized`.
    ///
    /// A failed model call is a generation failure. A reply that cannot be
    /// parsed keeps the cleaned draft.
    #[instrument(skip(self, context, comment), fields(record_id = %comment.record_id))]
    pub async fn review(
        &self,
        context: &PromptContext,
        mut comment: GeneratedComment,
    ) -> AppraisalResult<GeneratedComment> {
        if comment.finalized {
            return Ok(comment);
        }

        if let Some((model, model_name)) = &self.proofreader {
            let prompt = prompts::proofread_prompt(context, &comment.text);
            let reply = model
                .generate(&prompt, model_name)
                .await
                .map_err(|e| AppraisalError::generation(&comment.record_id, format!("proofreading: {e}")))?;

            match parse_proofread(&reply) {
                Some(envelope) => self.apply_suggestion(&mut comment, envelope),
                None => warn!("Unparseable proofreading reply, keeping the draft"),
            }
        }

        comment.finalized = true;
        Ok(comment)
    }

    fn apply_suggestion(&self, comment: &mut GeneratedComment, envelope: ProofreadEnvelope) {
        if !envelope.comment_changed {
            return;
        }
        let suggestion = envelope
            .suggested_comment
            .map(|s| clean_text(&s, self.max_chars))
            .unwrap_or_default();
        if suggestion.is_empty() {
            debug!("Proofreader flagged a change without a suggestion, keeping the draft");
            return;
        }
        info!(
            reason = envelope.reason_for_change.as_deref().unwrap_or(""),
            "Proofreader replaced the draft"
        );
        comment.text = suggestion;
    }
}

fn parse_proofread(reply: &str) -> Option<ProofreadEnvelope> {
    let body = fenced_block(reply).unwrap_or(reply);
    serde_yaml::from_str(body).ok()
}

/// Text cleanup applied to every comment
pub(crate) fn clean_text(raw: &str, max_chars: usize) -> String {
    let text = ascii_punctuation(raw);
    // List markers only mean something when the draft has several lines
    let multiline = text.lines().filter(|l| !l.trim().is_empty()).count() > 1;

    let mut joined = String::with_capacity(text.len());
    for line in text.lines() {
        let line = strip_line_markup(line.trim(), multiline);
        if line.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(line);
    }

    let mut plain = joined;
    for marker in ["**", "*", "`"] {
        plain = strip_paired(&plain, marker);
    }
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    let unquoted = strip_surrounding_quotes(&collapsed);
    truncate_on_word(unquoted, max_chars).to_string()
}

fn ascii_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2009}' | '\u{202F}' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Drop heading hashes and blockquote markers at line start, plus list
/// markers when the draft is a multi-line list
fn strip_line_markup(line: &str, multiline: bool) -> &str {
    let mut line = line;

    // "## Heading" but not "#1 ranked"
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &line[hashes..];
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            line = rest.trim_start();
        }
    }

    // "> quoted" but not "> 20%"
    if let Some(rest) = line.strip_prefix('>') {
        let rest = rest.trim_start();
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            line = rest;
        }
    }

    if !multiline {
        return line;
    }
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    // Numbered list item: "1. " or "2) "
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if (1..=3).contains(&digits) {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}

/// Remove `marker` pairs that wrap text the way markdown emphasis does:
/// the opening marker starts a word, the closing one ends it. Lone or
/// intraword markers (`3*4`, `__init__`) are left alone.
fn strip_paired(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = opening_marker(rest, marker) {
        let inner_start = open + marker.len();
        let Some(close) = closing_marker(&rest[inner_start..], marker) else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&rest[inner_start..inner_start + close]);
        rest = &rest[inner_start + close + marker.len()..];
    }
    out.push_str(rest);
    out
}

fn opening_marker(text: &str, marker: &str) -> Option<usize> {
    text.match_indices(marker).map(|(i, _)| i).find(|&i| {
        let before = text[..i].chars().next_back();
        let after = text[i + marker.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric())
            && after.is_some_and(|c| !c.is_whitespace())
    })
}

fn closing_marker(text: &str, marker: &str) -> Option<usize> {
    text.match_indices(marker).map(|(i, _)| i).find(|&i| {
        let before = text[..i].chars().next_back();
        let after = text[i + marker.len()..].chars().next();
        before.is_some_and(|c| !c.is_whitespace())
            && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

fn truncate_on_word(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    // Cut inside a word: back off to the previous space
    if !text[cut..].starts_with(' ') {
        if let Some(space) = head.rfind(' ') {
            return head[..space].trim_end();
        }
    }
    head.trim_end()
}

fn strip_surrounding_quotes(mut text: &str) -> &str {
    loop {
        let trimmed = text.trim();
        let stripped = ['"', '\'']
            .iter()
            .find_map(|q| trimmed.strip_prefix(*q).and_then(|t| t.strip_suffix(*q)));
        match stripped {
            Some(inner) => text = inner,
            None => return trimmed,
        }
    }
}
