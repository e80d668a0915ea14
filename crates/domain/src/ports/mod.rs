//! Ports - interfaces to the systems the pipeline depends on
//!
//! The domain defines the contracts, infrastructure and the `llm` crate
//! provide the implementations.

mod portal;
mod record_store;
mod text_generator;

pub use portal::{AppraisalPortal, Credentials, Session, SubmissionReceipt};
pub use record_store::RecordStore;
pub use text_generator::TextGenerator;
