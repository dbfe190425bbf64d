//! Interview state machine: phases, scoring, the candidate profile and the
//! session aggregate.

pub mod phases;
pub mod profile;
pub mod registry;
pub mod scoring;
pub mod session;

pub use phases::{should_transition, PhaseCatalog, PhaseProgress, PhaseSpec};
pub use registry::{SessionHandle, SessionRegistry};
pub use scoring::{recommend, weighted_score, Recommendation, ScoreAggregate, ScoreBand};
pub use session::{PhaseChange, Session, SessionStatus};
