//! Gemini `generateContent` client.
//!
//! Uses reqwest for the single POST and serde for the wire types. Only
//! `candidates[0].content.parts[0].text` is read from a successful response,
//! and only `error.message` from a failed one.

use crate::config::ProviderConfig;
use crate::provider::{GenerationError, TextGenerator};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("regionlore/", env!("CARGO_PKG_VERSION"));

/// Request body: `{"contents":[{"parts":[{"text": ...}]}]}`
#[derive(Serialize, Debug)]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize, Debug)]
pub struct RequestContent<'a> {
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
pub struct RequestPart<'a> {
    pub text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    /// A single-turn request carrying one text part
    pub fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

/// Successful response. Every level is optional; a missing one means "no text".
#[derive(Deserialize, Debug)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize, Debug)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Deserialize, Debug)]
pub struct Content {
    #[serde(default)]
    pub parts: Option<Vec<Part>>,
}

#[derive(Deserialize, Debug)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty
    pub fn into_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.is_empty())
    }
}

/// Error body: `{"error":{"message": ...}}`
#[derive(Deserialize, Debug)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Pick the message for a failed request: the provider's own message when
/// the body carries one, otherwise the status text.
fn provider_error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error)
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string())
        })
}

/// Client for one Gemini model
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    model: String,
}

impl GeminiClient {
    /// Build a client for the configured host and model. The key travels as a query parameter.
    pub fn new(settings: &ProviderConfig, api_key: &str) -> Result<Self, GenerationError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        let endpoint = Self::endpoint(settings, api_key)?;
        Ok(Self {
            http,
            endpoint,
            model: settings.model.clone(),
        })
    }

    fn endpoint(settings: &ProviderConfig, api_key: &str) -> Result<Url, GenerationError> {
        let base = format!(
            "{}/v1beta/models/{}:generateContent",
            settings.base_url.trim_end_matches('/'),
            settings.model
        );
        Url::parse_with_params(&base, &[("key", api_key)])
            .map_err(|e| GenerationError::InvalidEndpoint(format!("{}: {}", base, e)))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "sending generateContent request");

        // Errors are stripped of the URL so the key never reaches logs or callers
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Transport(e.without_url()))?;

        if !status.is_success() {
            error!(
                status = status.as_u16(),
                payload = %String::from_utf8_lossy(&body),
                "Gemini API error payload"
            );
            return Err(GenerationError::Provider {
                status,
                message: provider_error_message(status, &body),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&body).map_err(|e| {
            error!(payload = %String::from_utf8_lossy(&body), "unparseable Gemini response");
            GenerationError::MalformedResponse(e.to_string())
        })?;

        parsed.into_text().ok_or(GenerationError::NoText)
    }
}
