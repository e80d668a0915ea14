//! Domain Entities - core business objects
//!
//! Records carry identity; context entries and settings are plain read-only data.

mod comment;
mod context;
pub mod record;
mod snapshot;

pub use comment::{CommentSet, GeneratedComment};
pub use context::{
    AppraisalSettings, ConversationContext, FeedForwardCard, Stakeholder, StakeholderContext,
};
pub use record::{
    AppraisalRecord, AttributeRecord, GoalRecord, PreviousMessage, RecordKind, Weight,
};
pub use snapshot::AppraisalSnapshot;
