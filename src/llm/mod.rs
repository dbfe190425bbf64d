//! Text generation: the collaborator contract, the Ollama client, prompt
//! templates and the output normalization stage.

pub mod normalize;
pub mod ollama;
pub mod prompts;
pub mod retry;

pub use ollama::{OllamaConfig, OllamaGenerator};
pub use prompts::{fallback_question, PromptBuilder};
pub use retry::{with_retry, RetryPolicy};

use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde_json::Value;

/// Result type for text generation.
pub type GenResult<T> = Result<T, CollaboratorError>;

/// One free-text generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 200,
            temperature: 0.7,
            stop: Vec::new(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }
}

/// A language model the interviewer can ask things of.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier for logs.
    fn name(&self) -> &str;

    /// Generate interviewer speech. Text that fails post-generation
    /// validation is an error, never an `Ok`.
    async fn ask(&self, request: &GenerationRequest) -> GenResult<String>;

    /// Generate a JSON object.
    async fn ask_structured(&self, prompt: &str, max_tokens: u32) -> GenResult<Value>;
}

/// Generator used when no model is configured. Every call fails, so every
/// question comes from the fallback bank and every analysis is the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn ask(&self, _request: &GenerationRequest) -> GenResult<String> {
        Err(CollaboratorError::Unavailable("offline mode".to_string()))
    }

    async fn ask_structured(&self, _prompt: &str, _max_tokens: u32) -> GenResult<Value> {
        Err(CollaboratorError::Unavailable("offline mode".to_string()))
    }
}

/// Parse a structured response: the first balanced JSON object, or the
/// whole text if that fails.
pub fn parse_structured(text: &str) -> GenResult<Value> {
    if let Some(object) = normalize::extract_json_object(text) {
        if let Ok(value) = serde_json::from_str::<Value>(object) {
            return Ok(value);
        }
    }

    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(CollaboratorError::Malformed("expected a JSON object".to_string())),
        Err(e) => Err(CollaboratorError::Malformed(e.to_string())),
    }
}
