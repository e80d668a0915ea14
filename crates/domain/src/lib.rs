//! Domain Layer - appraisal records and comment rules
//!
//! Contains ONLY the business model, with no dependencies on:
//! - Infrastructure (file systems, HTTP, the portal bridge)
//! - Frameworks (CLI, async runtime)
//! - External systems (language model backends)
//!
//! Layout:
//! - Entities: goals, attributes, auxiliary context, generated comments
//! - Value Objects: record identity, record lifecycle state
//! - Ports: interfaces for the model, the portal and the record store
//! - Config: runtime settings recognised by every entry point

pub mod config;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

// Re-export core domain types
pub use config::{ProviderKind, Settings};
pub use entities::{
    AppraisalRecord, AppraisalSettings, AppraisalSnapshot, AttributeRecord, CommentSet,
    ConversationContext, FeedForwardCard, GeneratedComment, GoalRecord, PreviousMessage,
    RecordKind, Stakeholder, StakeholderContext, Weight,
};
pub use errors::{AppraisalError, AppraisalResult, ModelError, PortalError, PortalResult};
pub use ports::{
    AppraisalPortal, Credentials, RecordStore, Session, SubmissionReceipt, TextGenerator,
};
pub use value_objects::{RecordId, RecordState};
