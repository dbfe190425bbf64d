//! Answer scoring and evaluation.
//!
//! Converts the five raw sub-scores of an [`AnswerAnalysis`] into a single
//! phase-weighted 0-10 score, aggregates scores per phase and overall, and
//! maps the overall score to a hire recommendation.

use crate::models::{AnswerAnalysis, Phase};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score used when a weight table carries no weight at all.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Relative importance of each sub-score within a phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub quality: f64,
    pub relevance: f64,
    pub completeness: f64,
    pub technical_depth: f64,
    pub communication: f64,
}

impl ScoreWeights {
    const fn new(
        quality: f64,
        relevance: f64,
        completeness: f64,
        technical_depth: f64,
        communication: f64,
    ) -> Self {
        Self {
            quality,
            relevance,
            completeness,
            technical_depth,
            communication,
        }
    }

    pub fn sum(&self) -> f64 {
        self.quality + self.relevance + self.completeness + self.technical_depth + self.communication
    }

    /// Weight table of a phase. Technical depth carries no weight in
    /// conversational phases; the terminal phase scores nothing.
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Greeting => Self::new(0.1, 0.2, 0.2, 0.0, 0.5),
            Phase::Introduction => Self::new(0.2, 0.25, 0.25, 0.05, 0.25),
            Phase::Technical => Self::new(0.15, 0.2, 0.2, 0.3, 0.15),
            Phase::Behavioral => Self::new(0.2, 0.25, 0.25, 0.0, 0.3),
            Phase::Situational => Self::new(0.2, 0.25, 0.2, 0.15, 0.2),
            Phase::Closing => Self::new(0.2, 0.2, 0.2, 0.0, 0.4),
            Phase::Ended => Self::new(0.0, 0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Phase-weighted score of one answer, in [0, 10], rounded to one decimal.
pub fn weighted_score(analysis: &AnswerAnalysis, phase: Phase) -> f64 {
    let w = ScoreWeights::for_phase(phase);
    let weight_sum = w.sum();
    if weight_sum <= 0.0 {
        return NEUTRAL_SCORE;
    }

    let total = analysis.quality as f64 * w.quality
        + analysis.relevance as f64 * w.relevance
        + analysis.completeness as f64 * w.completeness
        + analysis.technical_depth as f64 * w.technical_depth
        + analysis.communication as f64 * w.communication;

    round1(total / weight_sum)
}

/// Human-readable band of a weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Poor,
    BelowAverage,
    Average,
    Good,
    VeryGood,
    Excellent,
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Poor => write!(f, "Poor - Significant improvement needed"),
            ScoreBand::BelowAverage => write!(f, "Below Average - Some gaps identified"),
            ScoreBand::Average => write!(f, "Average - Meets basic expectations"),
            ScoreBand::Good => write!(f, "Good - Above average performance"),
            ScoreBand::VeryGood => write!(f, "Very Good - Strong candidate"),
            ScoreBand::Excellent => write!(f, "Excellent - Outstanding performance"),
        }
    }
}

/// Map a score into its band. Scores outside [0, 10.1) have no band.
pub fn interpret(score: f64) -> Option<ScoreBand> {
    const BANDS: [(f64, f64, ScoreBand); 6] = [
        (0.0, 3.0, ScoreBand::Poor),
        (3.0, 5.0, ScoreBand::BelowAverage),
        (5.0, 6.5, ScoreBand::Average),
        (6.5, 8.0, ScoreBand::Good),
        (8.0, 9.0, ScoreBand::VeryGood),
        (9.0, 10.1, ScoreBand::Excellent),
    ];

    BANDS
        .iter()
        .find(|(low, high, _)| *low <= score && score < *high)
        .map(|(_, _, band)| *band)
}

/// Hire recommendation derived from the overall weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Hire")]
    StrongHire,
    Hire,
    Maybe,
    #[serde(rename = "No Hire")]
    NoHire,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::StrongHire => write!(f, "Strong Hire"),
            Recommendation::Hire => write!(f, "Hire"),
            Recommendation::Maybe => write!(f, "Maybe"),
            Recommendation::NoHire => write!(f, "No Hire"),
        }
    }
}

pub fn recommend(overall_weighted: f64) -> Recommendation {
    if overall_weighted >= 8.5 {
        Recommendation::StrongHire
    } else if overall_weighted >= 7.0 {
        Recommendation::Hire
    } else if overall_weighted >= 5.5 {
        Recommendation::Maybe
    } else {
        Recommendation::NoHire
    }
}

/// Per-dimension means of a set of answers plus their mean weighted score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreAggregate {
    pub avg_quality: f64,
    pub avg_relevance: f64,
    pub avg_completeness: f64,
    pub avg_technical_depth: f64,
    pub avg_communication: f64,
    pub weighted_average: f64,
    pub answer_count: usize,
}

/// Aggregate the answers of one phase, all weighted by that phase.
pub fn aggregate(analyses: &[&AnswerAnalysis], phase: Phase) -> ScoreAggregate {
    aggregate_scored(analyses.iter().map(|a| (*a, weighted_score(a, phase))))
}

/// Aggregate answers that were each already weighted by their own phase.
pub fn aggregate_scored<'a, I>(scored: I) -> ScoreAggregate
where
    I: IntoIterator<Item = (&'a AnswerAnalysis, f64)>,
{
    let mut sums = [0.0f64; 6];
    let mut n = 0usize;

    for (a, weighted) in scored {
        sums[0] += a.quality as f64;
        sums[1] += a.relevance as f64;
        sums[2] += a.completeness as f64;
        sums[3] += a.technical_depth as f64;
        sums[4] += a.communication as f64;
        sums[5] += weighted;
        n += 1;
    }

    if n == 0 {
        return ScoreAggregate::default();
    }

    let mean = |s: f64| round1(s / n as f64);
    ScoreAggregate {
        avg_quality: mean(sums[0]),
        avg_relevance: mean(sums[1]),
        avg_completeness: mean(sums[2]),
        avg_technical_depth: mean(sums[3]),
        avg_communication: mean(sums[4]),
        weighted_average: mean(sums[5]),
        answer_count: n,
    }
}
