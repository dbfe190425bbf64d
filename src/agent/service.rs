//! Request-layer facade over the registry and the orchestrator.
//!
//! Each operation resolves a session by id, takes its lock for the duration
//! of the call and delegates to the orchestrator or the report builder.

use crate::agent::orchestrator::{AgentOrchestrator, TurnResult};
use crate::error::{InterviewError, Result};
use crate::interview::{Session, SessionRegistry, SessionStatus};
use crate::memory::MemoryStore;
use crate::report::{InterviewReport, ReportBuilder};
use crate::transcribe::{is_unclear, Transcriber};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Defaults applied to new sessions.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub default_role: String,
    pub initial_difficulty: u8,
    /// Transcriptions with fewer words are treated as unclear.
    pub unclear_min_words: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            default_role: "Software Engineer".to_string(),
            initial_difficulty: 3,
            unclear_min_words: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub session_id: String,
    pub question: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioTurn {
    /// Empty when transcription failed.
    pub transcript: String,
    pub turn: TurnResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndSummary {
    pub session_id: String,
    pub duration_seconds: u64,
    pub total_questions: usize,
}

pub struct InterviewService {
    registry: SessionRegistry,
    orchestrator: Arc<AgentOrchestrator>,
    reports: ReportBuilder,
    transcriber: Arc<dyn Transcriber>,
    memory: Arc<dyn MemoryStore>,
    settings: ServiceSettings,
}

impl InterviewService {
    pub fn new(
        orchestrator: Arc<AgentOrchestrator>,
        reports: ReportBuilder,
        transcriber: Arc<dyn Transcriber>,
        memory: Arc<dyn MemoryStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            orchestrator,
            reports,
            transcriber,
            memory,
            settings,
        }
    }

    /// Create a session and ask its opening question.
    pub async fn start_interview(&self, job_role: Option<&str>) -> Result<StartedInterview> {
        let role = job_role
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(self.settings.default_role.as_str());

        let handle = self
            .registry
            .insert(Session::new(role, self.settings.initial_difficulty))
            .await;
        let mut session = handle.lock().await;
        let opening = self.orchestrator.open(&mut session).await?;

        info!(session_id = %session.id(), role = %role, "Interview started");
        Ok(StartedInterview {
            session_id: session.id().to_string(),
            question: opening.message,
            status: session.status(Utc::now()),
        })
    }

    /// Submit a typed answer.
    pub async fn submit_text(&self, session_id: &str, text: &str) -> Result<TurnResult> {
        let handle = self.registry.get(session_id).await?;
        let mut session = handle.lock().await;
        self.orchestrator.process_turn(&mut session, text).await
    }

    /// Submit a spoken answer. Failed or too-short transcriptions are
    /// answered with a clarification request.
    pub async fn submit_audio(&self, session_id: &str, audio: &[u8]) -> Result<AudioTurn> {
        let handle = self.registry.get(session_id).await?;
        let mut session = handle.lock().await;
        if session.is_ended() {
            return Err(InterviewError::SessionEnded(session_id.to_string()));
        }

        let timeout = self.orchestrator.settings().call_timeout;
        let transcript = match tokio::time::timeout(timeout, self.transcriber.transcribe(audio)).await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(session_id, phase = %session.phase(), error = %e, "Transcription failed");
                String::new()
            }
            Err(_) => {
                warn!(session_id, phase = %session.phase(), "Transcription timed out");
                String::new()
            }
        };

        let turn = if is_unclear(&transcript, self.settings.unclear_min_words) {
            self.orchestrator.clarify(&mut session, &transcript)?
        } else {
            self.orchestrator.process_turn(&mut session, &transcript).await?
        };

        Ok(AudioTurn { transcript, turn })
    }

    pub async fn status(&self, session_id: &str) -> Result<SessionStatus> {
        let handle = self.registry.get(session_id).await?;
        let session = handle.lock().await;
        Ok(session.status(Utc::now()))
    }

    /// End the interview now. Ending twice is rejected.
    pub async fn end_interview(&self, session_id: &str) -> Result<EndSummary> {
        let handle = self.registry.get(session_id).await?;
        let mut session = handle.lock().await;
        if session.is_ended() {
            return Err(InterviewError::SessionEnded(session_id.to_string()));
        }

        let now = Utc::now();
        session.end(now);
        info!(session_id, questions = session.questions().len(), "Interview ended by request");

        Ok(EndSummary {
            session_id: session_id.to_string(),
            duration_seconds: session.duration(now).as_secs(),
            total_questions: session.questions().len(),
        })
    }

    pub async fn report(&self, session_id: &str) -> Result<InterviewReport> {
        let handle = self.registry.get(session_id).await?;
        let session = handle.lock().await;
        self.reports.build(&session).await
    }

    /// Copy of the full session state.
    pub async fn snapshot(&self, session_id: &str) -> Result<Session> {
        let handle = self.registry.get(session_id).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    /// Drop a session and its stored facts. Returns whether the memory
    /// store confirmed the clear.
    pub async fn reset(&self, session_id: &str) -> Result<bool> {
        self.registry.remove(session_id).await?;

        let timeout = self.orchestrator.settings().call_timeout;
        let cleared = match tokio::time::timeout(timeout, self.memory.clear(session_id)).await {
            Ok(Ok(cleared)) => cleared,
            Ok(Err(e)) => {
                warn!(session_id, error = %e, "Failed to clear session memory");
                false
            }
            Err(_) => {
                warn!(session_id, "Clearing session memory timed out");
                false
            }
        };

        info!(session_id, "Session reset");
        Ok(cleared)
    }

    pub async fn session_ids(&self) -> Vec<String> {
        self.registry.ids().await
    }
}
