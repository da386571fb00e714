pub mod groq;
pub mod json;
pub mod prompt;

use crate::error::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
}

#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Sends `prompt` as a single user turn and returns the raw answer text.
    async fn complete(&self, prompt: &str, api_key: &str) -> Result<String, GenerationError>;
}
