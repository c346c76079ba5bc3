//! History agent: region in, summary text out.
//!
//! One prompt, one request, no retries. Every failure comes back as an
//! [`AgentError`] whose message can be shown to the user as is.

use crate::config::{Config, ConfigError};
use crate::gemini::GeminiClient;
use crate::prompt::PromptTemplate;
use crate::provider::{GenerationError, TextGenerator};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Builds prompts for regions and hands them to a [`TextGenerator`].
pub struct HistoryAgent<G> {
    generator: G,
    template: PromptTemplate,
}

impl<G: TextGenerator> HistoryAgent<G> {
    pub fn new(generator: G) -> Self {
        Self::with_template(generator, PromptTemplate::default())
    }

    pub fn with_template(generator: G, template: PromptTemplate) -> Self {
        Self {
            generator,
            template,
        }
    }

    /// Ask the generator for a history of `region`. The text is returned untouched.
    pub async fn history(&self, region: &str) -> Result<String, AgentError> {
        let prompt = self.template.render(region);
        debug!(region, "requesting history summary");
        let text = self.generator.generate(&prompt).await?;
        Ok(text)
    }
}

/// Generate a history summary for `region` using the configured Gemini model.
///
/// Fails before any network traffic when the API key is missing.
pub async fn generate_history(region: &str, config: &Config) -> Result<String, AgentError> {
    let api_key = config.api_key()?;
    let template = config.prompt_template()?;
    let client = GeminiClient::new(&config.provider, api_key)?;

    HistoryAgent::with_template(client, template)
        .history(region)
        .await
}
