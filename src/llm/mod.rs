//! LLM client abstraction.
//!
//! The generation stage talks to any OpenAI-compatible chat completion
//! endpoint through the [`LLMClient`] trait. Provider failures and
//! timeouts surface as `AppError::Generation`.

pub mod openai;

use crate::types::Result;
use async_trait::async_trait;

/// Core trait for chat completion providers.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion for a bare prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a completion with a system message steering the response.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model identifier, for logs and diagnostics.
    fn model_name(&self) -> &str;
}

pub use openai::OpenAIClient;
