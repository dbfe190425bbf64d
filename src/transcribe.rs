//! Speech transcription collaborator.

use crate::error::CollaboratorError;
use crate::llm::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Converts recorded audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, CollaboratorError>;
}

/// True when a transcription is too short to count as an answer.
pub fn is_unclear(text: &str, min_words: usize) -> bool {
    text.split_whitespace().count() < min_words
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Posts raw audio to an HTTP endpoint that answers `{"text": "..."}`.
pub struct HttpTranscriber {
    url: String,
    policy: RetryPolicy,
    http_client: reqwest::Client,
}

impl HttpTranscriber {
    pub fn new(url: impl Into<String>, policy: RetryPolicy) -> Result<Self, CollaboratorError> {
        let http_client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| CollaboratorError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            policy,
            http_client,
        })
    }

    async fn post(&self, audio: &[u8]) -> Result<String, CollaboratorError> {
        let response = self
            .http_client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout(self.policy.timeout.as_secs())
                } else if e.is_connect() {
                    CollaboratorError::Connect(self.url.clone())
                } else {
                    CollaboratorError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status { status, body });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(format!("Failed to parse transcription: {}", e)))?;

        Ok(parsed.text.trim().to_string())
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, CollaboratorError> {
        if audio.is_empty() {
            return Ok(String::new());
        }

        debug!(bytes = audio.len(), url = %self.url, "Transcribing audio");
        with_retry("transcription", self.policy, || self.post(audio)).await
    }
}

/// Used when no transcription service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTranscriber;

#[async_trait]
impl Transcriber for NoTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "no transcription service configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unclear_threshold() {
        assert!(is_unclear("", 2));
        assert!(is_unclear("  um  ", 2));
        assert!(!is_unclear("I think so", 2));
        assert!(!is_unclear("yes", 1));
    }

    #[test]
    fn test_response_shape() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text": " hello there ", "language": "en"}"#).unwrap();
        assert_eq!(parsed.text, " hello there ");
    }

    #[tokio::test]
    async fn test_empty_audio_short_circuits() {
        let transcriber = HttpTranscriber::new(
            "http://127.0.0.1:9/transcribe",
            RetryPolicy {
                retries: 0,
                backoff_ms: 1,
                timeout: Duration::from_secs(1),
            },
        )
        .unwrap();
        assert_eq!(transcriber.transcribe(&[]).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_no_transcriber_fails() {
        assert!(NoTranscriber.transcribe(b"RIFF").await.is_err());
    }
}
