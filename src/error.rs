//! Error types for the interview core and its external collaborators.
//!
//! Only [`InterviewError`] ever crosses the public service boundary. Every
//! [`CollaboratorError`] is absorbed by the orchestrator and replaced by a
//! deterministic default.

use thiserror::Error;

/// Result type for operations exposed by the interview service.
pub type Result<T> = std::result::Result<T, InterviewError>;

/// Rejected operations on a session (state violations).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterviewError {
    /// The session has reached the ENDED phase and is read-only.
    #[error("Interview {0} has ended")]
    SessionEnded(String),

    /// No session is registered under this id.
    #[error("No active interview with id {0}")]
    SessionNotFound(String),

    /// A report was requested before any answer was recorded.
    #[error("Interview {0} has no answers to assess")]
    NoAnswers(String),
}

/// Why a piece of generated text was refused as an interviewer question.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("empty after cleaning")]
    Empty,

    #[error("too short ({0} chars)")]
    TooShort(usize),

    #[error("leaked reasoning marker `{0}`")]
    ReasoningLeak(String),

    #[error("gives advice instead of asking (`{0}`)")]
    Advice(String),
}

/// Failure of an external collaborator: text generator, transcriber or
/// memory store.
#[derive(Error, Debug, Clone)]
pub enum CollaboratorError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to {0}")]
    Connect(String),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to send request: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Generated text rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Transport-level failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollaboratorError::Timeout(_)
            | CollaboratorError::Connect(_)
            | CollaboratorError::Transport(_) => true,
            CollaboratorError::Status { status, .. } => *status >= 500 || *status == 429,
            CollaboratorError::Malformed(_)
            | CollaboratorError::Rejected(_)
            | CollaboratorError::Unavailable(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CollaboratorError::Timeout(30).is_retryable());
        assert!(CollaboratorError::Connect("http://x".into()).is_retryable());
        assert!(CollaboratorError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!CollaboratorError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!CollaboratorError::Rejected(Rejection::Empty).is_retryable());
        assert!(!CollaboratorError::Malformed("not json".into()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = InterviewError::SessionEnded("session-abc".into());
        assert_eq!(err.to_string(), "Interview session-abc has ended");

        let err = CollaboratorError::from(Rejection::Advice("you should".into()));
        assert!(err.to_string().contains("gives advice"));
    }
}
