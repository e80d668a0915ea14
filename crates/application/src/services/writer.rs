//! Output Writer - persists the finalized set in one atomic replace

use domain::{AppraisalError, AppraisalResult, CommentSet, GeneratedComment, RecordStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

pub struct OutputWriter {
    store: Arc<dyn RecordStore>,
}

impl OutputWriter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Write `comments` over the previous output and hand the written set back.
    ///
    /// Only finalized comments, one per record id, are accepted.
    pub async fn write(&self, comments: Vec<GeneratedComment>) -> AppraisalResult<CommentSet> {
        let mut seen = HashSet::new();
        for comment in &comments {
            if !comment.finalized {
                return Err(AppraisalError::validation(
                    &comment.record_id,
                    "comment was not finalized",
                ));
            }
            if !seen.insert(&comment.record_id) {
                return Err(AppraisalError::validation(
                    &comment.record_id,
                    "more than one comment for the record",
                ));
            }
        }

        let set = CommentSet::from_comments(comments);
        self.store.write_comments(&set).await?;
        info!(
            goals = set.goals.len(),
            attributes = set.attributes.len(),
            "Persisted finalized comments"
        );
        Ok(set)
    }
}
