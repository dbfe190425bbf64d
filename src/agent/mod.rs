//! The interviewer agent: answer analysis, the turn protocol and the
//! request-layer service built on top of it.

pub mod analyzer;
pub mod orchestrator;
pub mod service;

pub use analyzer::AnswerAnalyzer;
pub use orchestrator::{AgentOrchestrator, OrchestratorSettings, TurnOutcome, TurnResult};
pub use service::{AudioTurn, EndSummary, InterviewService, ServiceSettings, StartedInterview};
