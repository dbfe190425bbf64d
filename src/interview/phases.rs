//! Phase catalog and transition policy.
//!
//! The catalog is an exhaustive table over [`Phase`]: adding a phase without
//! a [`PhaseSpec`] is a compile error rather than a silent default.

use crate::models::Phase;
use serde::Serialize;
use std::time::Duration;

/// Per-phase question and time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    pub min_questions: usize,
    pub max_questions: usize,
    pub time_limit: Duration,
    pub description: &'static str,
    pub focus_areas: &'static [&'static str],
}

const fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

const GREETING: PhaseSpec = PhaseSpec {
    min_questions: 1,
    max_questions: 2,
    time_limit: minutes(2),
    description: "Initial greeting and introduction",
    focus_areas: &["welcome", "rapport building"],
};

const INTRODUCTION: PhaseSpec = PhaseSpec {
    min_questions: 3,
    max_questions: 5,
    time_limit: minutes(5),
    description: "Understanding candidate background",
    focus_areas: &["background", "motivation", "career goals", "experience overview"],
};

const TECHNICAL: PhaseSpec = PhaseSpec {
    min_questions: 5,
    max_questions: 10,
    time_limit: minutes(20),
    description: "Technical knowledge assessment",
    focus_areas: &["coding", "architecture", "problem-solving", "tools", "best practices"],
};

const BEHAVIORAL: PhaseSpec = PhaseSpec {
    min_questions: 3,
    max_questions: 6,
    time_limit: minutes(10),
    description: "Past behavior and experiences",
    focus_areas: &["teamwork", "conflict resolution", "leadership", "challenges"],
};

const SITUATIONAL: PhaseSpec = PhaseSpec {
    min_questions: 2,
    max_questions: 4,
    time_limit: minutes(8),
    description: "Hypothetical scenario handling",
    focus_areas: &["decision-making", "judgment", "priorities", "problem-solving approach"],
};

const CLOSING: PhaseSpec = PhaseSpec {
    min_questions: 1,
    max_questions: 3,
    time_limit: minutes(3),
    description: "Wrapping up the interview",
    focus_areas: &["questions", "next steps", "closing remarks"],
};

const ENDED: PhaseSpec = PhaseSpec {
    min_questions: 0,
    max_questions: 0,
    time_limit: Duration::ZERO,
    description: "Interview complete",
    focus_areas: &[],
};

/// Recent-performance mean at or above which a phase may end early.
pub const STRONG_PERFORMANCE: f64 = 8.5;
/// Recent-performance mean at or below which a struggling candidate moves on.
pub const WEAK_PERFORMANCE: f64 = 3.0;

/// Static table of phase order and budgets.
pub struct PhaseCatalog;

impl PhaseCatalog {
    /// Budget of a phase. Defined for every phase.
    pub fn spec_of(phase: Phase) -> &'static PhaseSpec {
        match phase {
            Phase::Greeting => &GREETING,
            Phase::Introduction => &INTRODUCTION,
            Phase::Technical => &TECHNICAL,
            Phase::Behavioral => &BEHAVIORAL,
            Phase::Situational => &SITUATIONAL,
            Phase::Closing => &CLOSING,
            Phase::Ended => &ENDED,
        }
    }

    /// The phase after `phase`. `Ended` maps to itself.
    pub fn next(phase: Phase) -> Phase {
        match phase {
            Phase::Greeting => Phase::Introduction,
            Phase::Introduction => Phase::Technical,
            Phase::Technical => Phase::Behavioral,
            Phase::Behavioral => Phase::Situational,
            Phase::Situational => Phase::Closing,
            Phase::Closing | Phase::Ended => Phase::Ended,
        }
    }

    /// Progress through the current phase's budget.
    pub fn progress(phase: Phase, questions_in_phase: usize, time_in_phase: Duration) -> PhaseProgress {
        let spec = Self::spec_of(phase);

        let question_progress = ratio(questions_in_phase as f64, spec.max_questions as f64);
        let time_progress = ratio(time_in_phase.as_secs_f64(), spec.time_limit.as_secs_f64());

        PhaseProgress {
            phase,
            questions_asked: questions_in_phase,
            min_questions: spec.min_questions,
            max_questions: spec.max_questions,
            question_progress: question_progress.min(1.0),
            time_elapsed_minutes: time_in_phase.as_secs_f64() / 60.0,
            time_limit_minutes: spec.time_limit.as_secs_f64() / 60.0,
            time_progress: time_progress.min(1.0),
            can_transition: questions_in_phase >= spec.min_questions,
            must_transition: questions_in_phase >= spec.max_questions || time_progress >= 1.0,
        }
    }
}

/// A zero budget counts as fully consumed.
fn ratio(used: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        1.0
    } else {
        used / budget
    }
}

/// Snapshot of how far the current phase has progressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseProgress {
    pub phase: Phase,
    pub questions_asked: usize,
    pub min_questions: usize,
    pub max_questions: usize,
    pub question_progress: f64,
    pub time_elapsed_minutes: f64,
    pub time_limit_minutes: f64,
    pub time_progress: f64,
    pub can_transition: bool,
    pub must_transition: bool,
}

/// Decide whether the interview should leave `phase`.
///
/// Rules in priority order: the minimum question count is a hard floor; then
/// the question cap; then the time limit; then adaptive early exit for strong
/// performers, or for struggling ones after one extra question.
pub fn should_transition(
    phase: Phase,
    questions_in_phase: usize,
    time_in_phase: Duration,
    recent_performance: Option<f64>,
) -> bool {
    let spec = PhaseCatalog::spec_of(phase);

    if questions_in_phase < spec.min_questions {
        return false;
    }

    if questions_in_phase >= spec.max_questions {
        return true;
    }

    if time_in_phase >= spec.time_limit {
        return true;
    }

    if let Some(performance) = recent_performance {
        if performance >= STRONG_PERFORMANCE {
            return true;
        }
        if performance <= WEAK_PERFORMANCE && questions_in_phase >= spec.min_questions + 1 {
            return true;
        }
    }

    false
}
