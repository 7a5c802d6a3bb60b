//! Sage LLM - completion client for the generation backend.
//!
//! The model is an opaque remote service: prompt in, text out. The only
//! shipped implementation speaks the OpenAI-compatible chat-completions
//! wire format, which most hosted and local backends accept.

mod error;
mod openai;

pub use error::GenerationError;
pub use openai::{GeneratorConfig, OpenAiGenerator};

use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Completion interface to the generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a natural-language completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
