//! Use cases composed from the pipeline stages and the portal port

mod extraction;
mod pipeline;

pub use extraction::{extract_snapshot, submit_comments};
pub use pipeline::{Pipeline, PipelineStage, ProgressFn, RecordFailure, RunReport};
