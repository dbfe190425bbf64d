//! Text generation over the Ollama chat API.

use crate::error::CollaboratorError;
use crate::llm::normalize;
use crate::llm::retry::{with_retry, RetryPolicy};
use crate::llm::{parse_structured, GenResult, GenerationRequest, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings for the Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model_name: String,
    pub timeout_seconds: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    /// Temperature of structured (JSON) calls.
    pub structured_temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            timeout_seconds: 30,
            retries: 2,
            backoff_ms: 250,
            structured_temperature: 0.3,
        }
    }
}

impl OllamaConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff_ms: self.backoff_ms,
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions<'a> {
    temperature: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "no_stop")]
    stop: &'a [String],
}

fn no_stop(stop: &&[String]) -> bool {
    stop.is_empty()
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// [`TextGenerator`] backed by a local or remote Ollama server.
pub struct OllamaGenerator {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: OllamaConfig) -> Result<Self, CollaboratorError> {
        info!(
            "Initializing generator with model {} at {}",
            config.model_name, config.base_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CollaboratorError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Send one chat request and return the raw assistant content.
    async fn chat(
        &self,
        prompt: &str,
        temperature: f32,
        num_predict: u32,
        stop: &[String],
        json: bool,
    ) -> GenResult<String> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: &self.config.model_name,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict,
                stop,
            },
            format: json.then_some("json"),
        };

        debug!(model = %self.config.model_name, json, "Sending chat request");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    CollaboratorError::Connect(self.config.base_url.clone())
                } else {
                    CollaboratorError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn ask(&self, request: &GenerationRequest) -> GenResult<String> {
        let raw = with_retry("question generation", self.config.retry_policy(), || {
            self.chat(
                &request.prompt,
                request.temperature,
                request.max_tokens,
                &request.stop,
                false,
            )
        })
        .await?;

        match normalize::clean_question(&raw) {
            Ok(question) => Ok(question),
            Err(rejection) => {
                warn!(reason = %rejection, "Generated text rejected");
                Err(rejection.into())
            }
        }
    }

    async fn ask_structured(&self, prompt: &str, max_tokens: u32) -> GenResult<Value> {
        let temperature = self.config.structured_temperature;
        let raw = with_retry("structured generation", self.config.retry_policy(), || {
            self.chat(prompt, temperature, max_tokens, &[], true)
        })
        .await?;

        parse_structured(&raw)
    }
}
