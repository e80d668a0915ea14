use crate::entities::{AppraisalSnapshot, CommentSet};
use crate::errors::AppraisalResult;
use async_trait::async_trait;

/// Persisted structured-file representation of the appraisal records
///
/// Every file is read or written wholesale.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load and validate all input files
    async fn load_snapshot(&self) -> AppraisalResult<AppraisalSnapshot>;

    /// Dump freshly extracted records, replacing previous input files
    async fn save_snapshot(&self, snapshot: &AppraisalSnapshot) -> AppraisalResult<()>;

    /// Replace the output file with `comments`.
    ///
    /// Either the complete set is written or the previous file is left untouched.
    async fn write_comments(&self, comments: &CommentSet) -> AppraisalResult<()>;

    /// Read back the last written output, if any
    async fn load_comments(&self) -> AppraisalResult<Option<CommentSet>>;
}
