//! Text generation seam.
//!
//! The summary flow only needs "prompt in, text or error out". Anything that
//! can answer that implements [`TextGenerator`], which keeps the provider
//! swappable and lets tests substitute their own.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("failed to reach provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid provider endpoint: {0}")]
    InvalidEndpoint(String),
    /// Non-success status. Displays the provider's message only.
    #[error("{message}")]
    Provider { status: StatusCode, message: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("No text generated")]
    NoText,
}

/// A provider that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one request for `prompt` and return the generated text verbatim.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
