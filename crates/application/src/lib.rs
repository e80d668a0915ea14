//! # Application Layer
//!
//! Drives one appraisal run through its stages:
//!
//! ```text
//! RecordStore -> ContextAggregator -> CommentGenerator -> CommentFinalizer -> OutputWriter
//! ```
//!
//! - `services`: the individual stages, each usable on its own
//! - `use_cases`: the full pipeline, portal extraction and fill-back
//! - `prompts`: prompt templates sent to the language model
//!
//! The layer only talks to the outside world through the domain ports
//! (`TextGenerator`, `RecordStore`, `AppraisalPortal`).

pub mod prompts;
mod reply;
pub mod services;
pub mod use_cases;

pub use services::{
    CommentFinalizer, CommentGenerator, ContextAggregator, OutputWriter, PromptContext,
};
pub use use_cases::{
    extract_snapshot, submit_comments, Pipeline, PipelineStage, ProgressFn, RecordFailure,
    RunReport,
};
