//! Advisory service client.
//!
//! The advisory service is an LLM asked for a structured JSON recommendation.
//! It is best-effort: callers treat every [`AdvisoryError`] as "no advice" and
//! fall back to deterministic rules (see [`crate::selector`]).

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory service is disabled")]
    Disabled,

    #[error("advisory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("advisory service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("advisory reply is not JSON: {0}")]
    Parse(String),

    #[error("advisory reply has the wrong shape: {0}")]
    Shape(String),

    #[error("advisory reply chose unknown id '{0}'")]
    UnknownChoice(String),
}

/// One structured question for the advisory service.
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    /// Role and rules for the model.
    pub system: String,
    /// The facts to reason over (profile, candidate list).
    pub context: String,
    /// Example JSON the reply must follow.
    pub response_shape: String,
}

impl AdvisoryRequest {
    fn user_message(&self) -> String {
        format!(
            "{}\n\nRespond with a single JSON object and nothing else, shaped like:\n{}",
            self.context, self.response_shape
        )
    }
}

pub trait Advisor: Send + Sync {
    /// Ask for a recommendation. Returns the first JSON object in the reply.
    fn advise(&self, request: &AdvisoryRequest) -> Result<Value, AdvisoryError>;
}

// ---------------------------------------------------------------------------
// DisabledAdvisor
// ---------------------------------------------------------------------------

/// Used when no API key is configured; selection runs on rules alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAdvisor;

impl Advisor for DisabledAdvisor {
    fn advise(&self, _request: &AdvisoryRequest) -> Result<Value, AdvisoryError> {
        Err(AdvisoryError::Disabled)
    }
}

// ---------------------------------------------------------------------------
// AnthropicAdvisor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl AnthropicSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(20),
            max_tokens: 1024,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API client. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct AnthropicAdvisor {
    settings: AnthropicSettings,
}

impl AnthropicAdvisor {
    pub fn new(settings: AnthropicSettings) -> Self {
        Self { settings }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.settings.base_url.trim_end_matches('/'))
    }
}

impl Advisor for AnthropicAdvisor {
    fn advise(&self, request: &AdvisoryRequest) -> Result<Value, AdvisoryError> {
        // Built per call: a blocking client must not be dropped on an async runtime thread.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.settings.timeout)
            .build()?;

        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: request.user_message(),
            }],
        };

        tracing::debug!(model = %self.settings.model, "sending advisory request");
        let response = client
            .post(self.endpoint())
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: MessagesResponse = response
            .json()
            .map_err(|e| AdvisoryError::Parse(e.to_string()))?;
        let text: String = reply
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        extract_json(&text)
    }
}

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex"))
}

/// Pull the first JSON object out of free-form model text.
///
/// Accepts a bare object, an object wrapped in a ```json fence, or an object
/// surrounded by prose.
pub fn extract_json(text: &str) -> Result<Value, AdvisoryError> {
    let candidate = fence_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let start = candidate
        .find('{')
        .ok_or_else(|| AdvisoryError::Parse("no JSON object in reply".into()))?;

    let mut stream = serde_json::Deserializer::from_str(&candidate[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value @ Value::Object(_))) => Ok(value),
        Some(Ok(_)) => Err(AdvisoryError::Shape("reply is not a JSON object".into())),
        Some(Err(e)) => Err(AdvisoryError::Parse(e.to_string())),
        None => Err(AdvisoryError::Parse("empty reply".into())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
