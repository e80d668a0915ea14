//! Pipeline stages

mod aggregator;
mod finalizer;
mod generator;
mod writer;

pub use aggregator::{ContextAggregator, PromptContext};
pub use finalizer::CommentFinalizer;
pub use generator::CommentGenerator;
pub use writer::OutputWriter;
