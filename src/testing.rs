//! In-process fakes of the external collaborators, for tests.

use crate::error::CollaboratorError;
use crate::llm::{with_retry, GenResult, GenerationRequest, RetryPolicy, TextGenerator};
use crate::memory::{MemoryResult, MemoryStore, StoredFact};
use crate::models::{Fact, Phase};
use crate::transcribe::Transcriber;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Generator that replays scripted results, then fails.
#[derive(Default)]
pub struct ScriptedGenerator {
    answers: Mutex<VecDeque<GenResult<String>>>,
    structured: Mutex<VecDeque<GenResult<Value>>>,
    delay: Option<Duration>,
    ask_calls: AtomicUsize,
    structured_calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, answer: GenResult<String>) -> Self {
        self.answers.lock().unwrap().push_back(answer);
        self
    }

    pub fn with_structured(self, value: GenResult<Value>) -> Self {
        self.structured.lock().unwrap().push_back(value);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub fn structured_calls(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn exhausted() -> CollaboratorError {
    CollaboratorError::Unavailable("script exhausted".to_string())
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn ask(&self, _request: &GenerationRequest) -> GenResult<String> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let next = self.answers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted()))
    }

    async fn ask_structured(&self, _prompt: &str, _max_tokens: u32) -> GenResult<Value> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let next = self.structured.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted()))
    }
}

/// Generator that retries like the Ollama client. Its first attempt hangs
/// past the per-attempt deadline; later attempts return `answer`.
pub struct HangingFirstAttempt {
    policy: RetryPolicy,
    hang: Duration,
    answer: String,
    attempts: AtomicUsize,
}

impl HangingFirstAttempt {
    pub fn new(policy: RetryPolicy, hang: Duration, answer: impl Into<String>) -> Self {
        Self {
            policy,
            hang,
            answer: answer.into(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for HangingFirstAttempt {
    fn name(&self) -> &str {
        "hanging-first-attempt"
    }

    async fn ask(&self, _request: &GenerationRequest) -> GenResult<String> {
        with_retry("question generation", self.policy, || async move {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(self.hang).await;
            }
            Ok(self.answer.clone())
        })
        .await
    }

    async fn ask_structured(&self, _prompt: &str, _max_tokens: u32) -> GenResult<Value> {
        Err(exhausted())
    }
}

/// Memory store whose every call fails.
#[derive(Default)]
pub struct FailingMemory {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MemoryStore for FailingMemory {
    async fn append(&self, _: &str, _: Phase, _: &[Fact]) -> MemoryResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CollaboratorError::Connect("memory".to_string()))
    }

    async fn query(&self, _: &str, _: &str, _: usize) -> MemoryResult<Vec<StoredFact>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CollaboratorError::Connect("memory".to_string()))
    }

    async fn clear(&self, _: &str) -> MemoryResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CollaboratorError::Connect("memory".to_string()))
    }
}

/// Transcriber returning one fixed result.
pub struct FixedTranscriber(pub Result<String, CollaboratorError>);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, CollaboratorError> {
        self.0.clone()
    }
}

/// Analyzer JSON with every sub-score set to `score`.
pub fn uniform_analysis(score: u8) -> Value {
    serde_json::json!({
        "quality_score": score,
        "relevance_score": score,
        "completeness_score": score,
        "technical_depth": score,
        "communication_quality": score,
    })
}
