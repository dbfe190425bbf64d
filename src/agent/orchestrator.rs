//! The turn protocol.
//!
//! [`AgentOrchestrator`] sequences analysis, fact extraction, profile
//! updates, phase transitions and question generation into one turn. Every
//! collaborator failure resolves to a deterministic default, so a turn on an
//! active session always completes and leaves the session consistent.

use crate::agent::analyzer::{is_trivial_answer, AnswerAnalyzer};
use crate::error::{CollaboratorError, InterviewError, Result};
use crate::interview::{weighted_score, PhaseChange, Session};
use crate::llm::normalize;
use crate::llm::prompts::{fallback_question, CLARIFICATION, FAREWELL};
use crate::llm::{GenerationRequest, PromptBuilder, RetryPolicy, TextGenerator};
use crate::memory::{
    context_query, facts_from_analysis, format_context, merge_facts, FactExtractor, MemoryStore,
};
use crate::models::{AnswerAnalysis, Fact, Phase};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tunables of the turn protocol.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub question_max_tokens: u32,
    pub question_temperature: f32,
    pub stop: Vec<String>,
    pub analysis_max_tokens: u32,
    /// Deadline of each collaborator call, covering all of its retries.
    pub call_timeout: Duration,
    pub memory_enabled: bool,
    pub memory_top_k: usize,
    /// Answers with fewer non-whitespace characters skip the analyzer.
    pub short_answer_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            question_max_tokens: 150,
            question_temperature: 0.7,
            stop: vec!["\n\n".to_string(), "Candidate:".to_string()],
            analysis_max_tokens: 500,
            call_timeout: RetryPolicy::default().total_budget(),
            memory_enabled: true,
            memory_top_k: 3,
            short_answer_chars: 5,
        }
    }
}

/// What the interviewer does after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// A new question was asked.
    NextQuestion,
    /// The input was not understood; the open question is repeated.
    Clarification,
    /// The interview is over.
    Ended,
}

/// Result of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub outcome: TurnOutcome,
    /// The interviewer's next utterance.
    pub message: String,
    /// Phase after the turn.
    pub phase: Phase,
    pub phase_changed: bool,
    pub weighted_score: Option<f64>,
    pub analysis: Option<AnswerAnalysis>,
    pub facts_stored: usize,
    /// True when the message came from the static question bank.
    pub fallback_used: bool,
}

impl TurnResult {
    pub fn is_ended(&self) -> bool {
        self.outcome == TurnOutcome::Ended
    }
}

/// Drives sessions through the interview.
pub struct AgentOrchestrator {
    generator: Arc<dyn TextGenerator>,
    memory: Arc<dyn MemoryStore>,
    analyzer: AnswerAnalyzer,
    extractor: FactExtractor,
    settings: OrchestratorSettings,
}

impl AgentOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        memory: Arc<dyn MemoryStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        let analyzer = AnswerAnalyzer::new(
            generator.clone(),
            settings.analysis_max_tokens,
            settings.call_timeout,
        );
        Self {
            generator,
            memory,
            analyzer,
            extractor: FactExtractor::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Ask the opening question of a fresh session.
    pub async fn open(&self, session: &mut Session) -> Result<TurnResult> {
        ensure_active(session)?;

        info!(
            session_id = %session.id(),
            role = %session.job_role,
            generator = %self.generator.name(),
            "Opening interview"
        );
        let (message, fallback_used) = self.next_question(session).await;

        Ok(TurnResult {
            outcome: TurnOutcome::NextQuestion,
            message,
            phase: session.phase(),
            phase_changed: false,
            weighted_score: None,
            analysis: None,
            facts_stored: 0,
            fallback_used,
        })
    }

    /// Process one candidate answer and produce the interviewer's reply.
    pub async fn process_turn(&self, session: &mut Session, raw_answer: &str) -> Result<TurnResult> {
        ensure_active(session)?;

        let answer = raw_answer.trim();
        if answer.is_empty() {
            return self.clarify(session, raw_answer);
        }

        let phase = session.phase();
        let question = session.last_question().unwrap_or_default().to_string();

        let analysis = self.analyze(session, &question, answer).await;

        let lexical = self.extractor.extract(phase, &question, answer);
        let facts = merge_facts(lexical, facts_from_analysis(&analysis, phase));
        let facts_stored = self.store_facts(session, &facts).await;

        session.apply_analysis(&analysis);
        if let Some(area) = analysis.areas_to_probe.first() {
            session.current_topic = Some(area.clone());
        }

        let weighted = weighted_score(&analysis, phase);
        session.add_answer(answer, analysis.clone(), weighted);
        debug!(
            session_id = %session.id(),
            phase = %phase,
            weighted,
            facts = facts_stored,
            "Answer recorded"
        );

        let now = Utc::now();
        let mut phase_changed = false;
        if session.should_advance(now) {
            phase_changed = true;
            if session.advance_phase(now) == PhaseChange::Ended {
                info!(session_id = %session.id(), "Interview complete");
                return Ok(TurnResult {
                    outcome: TurnOutcome::Ended,
                    message: FAREWELL.to_string(),
                    phase: session.phase(),
                    phase_changed,
                    weighted_score: Some(weighted),
                    analysis: Some(analysis),
                    facts_stored,
                    fallback_used: false,
                });
            }
        }

        let (message, fallback_used) = self.next_question(session).await;

        Ok(TurnResult {
            outcome: TurnOutcome::NextQuestion,
            message,
            phase: session.phase(),
            phase_changed,
            weighted_score: Some(weighted),
            analysis: Some(analysis),
            facts_stored,
            fallback_used,
        })
    }

    /// Record unintelligible input and repeat the open question. Phase
    /// counters and scores are untouched.
    pub fn clarify(&self, session: &mut Session, raw_input: &str) -> Result<TurnResult> {
        ensure_active(session)?;

        info!(session_id = %session.id(), phase = %session.phase(), "Answer unclear, asking again");
        session.add_unclear_answer(raw_input.trim());

        let message = match session.last_question() {
            Some(question) => format!("{} {}", CLARIFICATION, question),
            None => CLARIFICATION.to_string(),
        };
        session.add_interviewer_note(message.clone());

        Ok(TurnResult {
            outcome: TurnOutcome::Clarification,
            message,
            phase: session.phase(),
            phase_changed: false,
            weighted_score: None,
            analysis: None,
            facts_stored: 0,
            fallback_used: false,
        })
    }

    async fn analyze(&self, session: &Session, question: &str, answer: &str) -> AnswerAnalysis {
        if is_trivial_answer(answer, self.settings.short_answer_chars) {
            debug!(session_id = %session.id(), "Answer too short to analyze, using default analysis");
            return AnswerAnalysis::default();
        }

        match self
            .analyzer
            .analyze(&session.job_role, session.phase(), question, answer)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    phase = %session.phase(),
                    error = %e,
                    "Analysis unavailable, using default analysis"
                );
                AnswerAnalysis::default()
            }
        }
    }

    /// Persist facts. Failures count as zero facts stored.
    async fn store_facts(&self, session: &Session, facts: &[Fact]) -> usize {
        if !self.settings.memory_enabled || facts.is_empty() {
            return 0;
        }

        let call = self.memory.append(session.id(), session.phase(), facts);
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(Ok(ids)) => ids.len(),
            Ok(Err(e)) => {
                warn!(session_id = %session.id(), phase = %session.phase(), error = %e, "Failed to store facts");
                0
            }
            Err(_) => {
                warn!(session_id = %session.id(), phase = %session.phase(), "Storing facts timed out");
                0
            }
        }
    }

    /// Relevant memory for the current phase and topic, or empty.
    async fn memory_context(&self, session: &Session) -> String {
        if !self.settings.memory_enabled {
            return String::new();
        }

        let query = context_query(session.phase(), session.current_topic.as_deref());
        let call = self
            .memory
            .query(session.id(), &query, self.settings.memory_top_k);
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(Ok(facts)) => format_context(&facts),
            Ok(Err(e)) => {
                warn!(session_id = %session.id(), phase = %session.phase(), error = %e, "Memory lookup failed");
                String::new()
            }
            Err(_) => {
                warn!(session_id = %session.id(), phase = %session.phase(), "Memory lookup timed out");
                String::new()
            }
        }
    }

    /// Generate, validate and record the next question. Returns the text and
    /// whether it came from the fallback bank.
    async fn next_question(&self, session: &mut Session) -> (String, bool) {
        let phase = session.phase();
        let memory_context = self.memory_context(session).await;
        let prompt = PromptBuilder::new(session, &memory_context).question();

        let generated = match prompt {
            Some(prompt) => self.generate(prompt).await,
            None => Err(CollaboratorError::Unavailable(format!(
                "no prompt for phase {}",
                phase
            ))),
        };

        let (question, fallback) = match generated {
            Ok(question) => (question, false),
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    phase = %phase,
                    error = %e,
                    "Question generation failed, using fallback question"
                );
                let question = fallback_question(
                    phase,
                    session.difficulty_level(),
                    session.phase_question_count(),
                );
                (question.to_string(), true)
            }
        };

        let topic = session.current_topic.clone();
        session.add_question(question.clone(), topic, fallback);
        (question, fallback)
    }

    async fn generate(&self, prompt: String) -> std::result::Result<String, CollaboratorError> {
        let request = GenerationRequest::new(prompt)
            .max_tokens(self.settings.question_max_tokens)
            .temperature(self.settings.question_temperature)
            .stop(self.settings.stop.clone());

        let text = tokio::time::timeout(self.settings.call_timeout, self.generator.ask(&request))
            .await
            .map_err(|_| CollaboratorError::Timeout(self.settings.call_timeout.as_secs()))??;

        Ok(normalize::clean_question(&text)?)
    }
}

fn ensure_active(session: &Session) -> Result<()> {
    if session.is_ended() {
        Err(InterviewError::SessionEnded(session.id().to_string()))
    } else {
        Ok(())
    }
}
