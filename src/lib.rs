//! interviewd - phase-structured AI interview orchestration.
//!
//! The core is the phase state machine, the scorer, the fact pipeline and
//! the turn protocol. Text generation, transcription and memory lookup are
//! external collaborators behind traits, each with a deterministic fallback.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod interview;
pub mod llm;
pub mod memory;
pub mod models;
pub mod report;
pub mod transcribe;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CollaboratorError, InterviewError, Result};
