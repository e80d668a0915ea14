use crate::errors::ModelError;
use async_trait::async_trait;

/// Single request/response text generation
///
/// One call per prompt, no streaming. Retries, if ever wanted, wrap an
/// implementation of this trait.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, ModelError>;
}
