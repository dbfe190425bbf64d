//! Data models for the interview orchestrator.
//!
//! This module contains the core data structures shared by the phase
//! machine, the scorer, the fact pipeline and the report builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lowest and highest raw sub-score an analysis may carry.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// A stage of the structured interview.
///
/// The order is fixed and non-cyclic; `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Greeting,
    Introduction,
    Technical,
    Behavioral,
    Situational,
    Closing,
    Ended,
}

impl Phase {
    /// Every phase in interview order, terminal phase last.
    pub const ALL: [Phase; 7] = [
        Phase::Greeting,
        Phase::Introduction,
        Phase::Technical,
        Phase::Behavioral,
        Phase::Situational,
        Phase::Closing,
        Phase::Ended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Greeting => "greeting",
            Phase::Introduction => "introduction",
            Phase::Technical => "technical",
            Phase::Behavioral => "behavioral",
            Phase::Situational => "situational",
            Phase::Closing => "closing",
            Phase::Ended => "ended",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Ended)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Greeting => write!(f, "Greeting"),
            Phase::Introduction => write!(f, "Introduction"),
            Phase::Technical => write!(f, "Technical"),
            Phase::Behavioral => write!(f, "Behavioral"),
            Phase::Situational => write!(f, "Situational"),
            Phase::Closing => write!(f, "Closing"),
            Phase::Ended => write!(f, "Ended"),
        }
    }
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Interviewer,
    Candidate,
}

/// Seniority bucket inferred from an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
}

impl ExperienceLevel {
    /// Lenient parse of an analyzer label. Unknown labels map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "junior" | "entry" | "entry-level" | "entry level" => Some(ExperienceLevel::Junior),
            "mid" | "mid-level" | "mid level" | "intermediate" => Some(ExperienceLevel::Mid),
            "senior" | "expert" | "lead" => Some(ExperienceLevel::Senior),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
        }
    }
}

/// How confident the candidate sounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceIndicator {
    Low,
    Medium,
    High,
}

impl ConfidenceIndicator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(ConfidenceIndicator::Low),
            "medium" | "moderate" => Some(ConfidenceIndicator::Medium),
            "high" => Some(ConfidenceIndicator::High),
            _ => None,
        }
    }
}

/// Structured information the analyzer pulled out of an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub confidence_indicator: Option<ConfidenceIndicator>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

impl ExtractedInfo {
    /// Build from the analyzer's free-form `extracted_info` object.
    pub fn from_value(value: &Value) -> Self {
        Self {
            skills: string_list(&value["skills"]),
            technologies: string_list(&value["technologies"]),
            experience_level: value["experience_level"]
                .as_str()
                .and_then(ExperienceLevel::parse),
            communication_style: value["communication_style"]
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "unknown")
                .map(String::from),
            confidence_indicator: value["confidence_indicator"]
                .as_str()
                .and_then(ConfidenceIndicator::parse),
            key_points: string_list(&value["key_points"]),
        }
    }
}

/// Scored assessment of one answer. Every sub-score is within
/// [`MIN_SCORE`, `MAX_SCORE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerAnalysis {
    pub quality: u8,
    pub relevance: u8,
    pub completeness: u8,
    pub technical_depth: u8,
    pub communication: u8,
    #[serde(default)]
    pub extracted_info: ExtractedInfo,
    #[serde(default)]
    pub suggested_follow_ups: Vec<String>,
    #[serde(default)]
    pub areas_to_probe: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub positive_signs: Vec<String>,
}

impl Default for AnswerAnalysis {
    /// The analysis used whenever no model analysis is available.
    fn default() -> Self {
        Self {
            quality: 5,
            relevance: 5,
            completeness: 5,
            technical_depth: 3,
            communication: 5,
            extracted_info: ExtractedInfo {
                confidence_indicator: Some(ConfidenceIndicator::Medium),
                ..ExtractedInfo::default()
            },
            suggested_follow_ups: vec!["Can you tell me more about that?".to_string()],
            areas_to_probe: Vec::new(),
            red_flags: Vec::new(),
            positive_signs: Vec::new(),
        }
    }
}

impl AnswerAnalysis {
    /// Validate and normalize a raw analyzer object.
    ///
    /// Scores are clamped into range; unparseable scores fall back to the
    /// default analysis' value for that dimension.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        Self {
            quality: clamp_score(&value["quality_score"], defaults.quality),
            relevance: clamp_score(&value["relevance_score"], defaults.relevance),
            completeness: clamp_score(&value["completeness_score"], defaults.completeness),
            technical_depth: clamp_score(&value["technical_depth"], defaults.technical_depth),
            communication: clamp_score(&value["communication_quality"], defaults.communication),
            extracted_info: ExtractedInfo::from_value(&value["extracted_info"]),
            suggested_follow_ups: string_list(&value["suggested_follow_ups"]),
            areas_to_probe: string_list(&value["areas_to_probe"]),
            red_flags: string_list(&value["red_flags"]),
            positive_signs: string_list(&value["positive_signs"]),
        }
    }

    /// Mean of quality, relevance and completeness. Drives difficulty.
    pub fn core_average(&self) -> f64 {
        (self.quality as f64 + self.relevance as f64 + self.completeness as f64) / 3.0
    }
}

/// Clamp an arbitrary JSON value to a sub-score.
fn clamp_score(value: &Value, default: u8) -> u8 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(v) if v.is_finite() => (v.trunc() as i64).clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8,
        _ => default,
    }
}

/// Accept either a JSON array of strings or a single comma separated string.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// The evolving model of the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Unique, insertion ordered.
    pub skills: Vec<String>,
    /// Unique, insertion ordered.
    pub technologies: Vec<String>,
    pub experience_years: Option<u32>,
    /// 1 (low) to 5 (high).
    pub confidence_level: u8,
    pub communication_style: String,
    /// Depth-of-knowledge per technology, 1 to 10.
    pub depth_of_knowledge: std::collections::BTreeMap<String, u8>,
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self {
            skills: Vec::new(),
            technologies: Vec::new(),
            experience_years: None,
            confidence_level: 3,
            communication_style: "neutral".to_string(),
            depth_of_knowledge: Default::default(),
        }
    }
}

/// Sub-scores plus the phase-weighted score of one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub quality: u8,
    pub relevance: u8,
    pub completeness: u8,
    pub technical_depth: u8,
    pub communication: u8,
    pub weighted: f64,
}

impl ScoreSummary {
    pub fn new(analysis: &AnswerAnalysis, weighted: f64) -> Self {
        Self {
            quality: analysis.quality,
            relevance: analysis.relevance,
            completeness: analysis.completeness,
            technical_depth: analysis.technical_depth,
            communication: analysis.communication,
            weighted,
        }
    }
}

/// A question asked by the interviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub phase: Phase,
    pub topic: Option<String>,
    pub difficulty_level: u8,
    /// True when the question came from the static bank.
    pub fallback: bool,
    pub timestamp: DateTime<Utc>,
}

/// A candidate answer with its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer: String,
    pub analysis: AnswerAnalysis,
    pub weighted_score: f64,
    pub phase: Phase,
    /// Index into the question log of the question being answered.
    pub question_index: Option<usize>,
    /// Unintelligible input kept for audit only; never scored.
    #[serde(default)]
    pub unclear: bool,
    pub timestamp: DateTime<Utc>,
}

/// Extra context attached to a conversation turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreSummary>,
    #[serde(default)]
    pub clarification: bool,
}

/// Ordered log entry of the whole conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub phase: Phase,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: TurnMetadata,
}

/// Kind of a small structured claim about the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Skill,
    Technology,
    Experience,
    Behavior,
    KeyPoint,
}

impl FactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::Skill => "skill",
            FactKind::Technology => "technology",
            FactKind::Experience => "experience",
            FactKind::Behavior => "behavior",
            FactKind::KeyPoint => "key_point",
        }
    }
}

/// Where a fact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactOrigin {
    /// The deterministic lexical extractor.
    Lexical,
    /// The external analyzer's `extracted_info`.
    Analyzer,
}

/// A fact extracted from an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub kind: FactKind,
    pub content: String,
    /// 0.0 to 1.0
    pub confidence: f32,
    pub source_phase: Phase,
    pub origin: FactOrigin,
    pub timestamp: DateTime<Utc>,
}

impl Fact {
    pub fn new(kind: FactKind, content: impl Into<String>, confidence: f32, phase: Phase) -> Self {
        Self {
            kind,
            content: content.into(),
            confidence,
            source_phase: phase,
            origin: FactOrigin::Lexical,
            timestamp: Utc::now(),
        }
    }

    pub fn from_analyzer(self) -> Self {
        Self {
            origin: FactOrigin::Analyzer,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_ordering() {
        assert!(Phase::Greeting < Phase::Introduction);
        assert!(Phase::Closing < Phase::Ended);
        assert_eq!(Phase::ALL.len(), 7);
        assert!(Phase::Ended.is_terminal());
        assert!(!Phase::Closing.is_terminal());
    }

    #[test]
    fn test_phase_serde_lowercase() {
        let s = serde_json::to_string(&Phase::Behavioral).unwrap();
        assert_eq!(s, "\"behavioral\"");
        let p: Phase = serde_json::from_str("\"situational\"").unwrap();
        assert_eq!(p, Phase::Situational);
    }

    #[test]
    fn test_analysis_from_value_clamps() {
        let raw = json!({
            "quality_score": 14,
            "relevance_score": -2,
            "completeness_score": "7",
            "technical_depth": "lots",
            "communication_quality": 8.9,
            "extracted_info": {
                "skills": ["system design", ""],
                "technologies": "rust, postgres",
                "experience_level": "Senior",
                "confidence_indicator": "high",
                "communication_style": "unknown"
            },
            "red_flags": ["vague"],
        });

        let analysis = AnswerAnalysis::from_value(&raw);
        assert_eq!(analysis.quality, 10);
        assert_eq!(analysis.relevance, 1);
        assert_eq!(analysis.completeness, 7);
        assert_eq!(analysis.technical_depth, 3);
        assert_eq!(analysis.communication, 8);
        assert_eq!(analysis.extracted_info.skills, vec!["system design"]);
        assert_eq!(analysis.extracted_info.technologies, vec!["rust", "postgres"]);
        assert_eq!(
            analysis.extracted_info.experience_level,
            Some(ExperienceLevel::Senior)
        );
        assert_eq!(
            analysis.extracted_info.confidence_indicator,
            Some(ConfidenceIndicator::High)
        );
        assert_eq!(analysis.extracted_info.communication_style, None);
        assert_eq!(analysis.red_flags, vec!["vague"]);
        assert!(analysis.positive_signs.is_empty());
    }

    #[test]
    fn test_analysis_from_empty_object_uses_defaults() {
        let analysis = AnswerAnalysis::from_value(&json!({}));
        assert_eq!(analysis.quality, 5);
        assert_eq!(analysis.technical_depth, 3);
        assert!(analysis.extracted_info.skills.is_empty());
    }

    #[test]
    fn test_default_analysis_shape() {
        let analysis = AnswerAnalysis::default();
        assert_eq!(
            (
                analysis.quality,
                analysis.relevance,
                analysis.completeness,
                analysis.technical_depth,
                analysis.communication
            ),
            (5, 5, 5, 3, 5)
        );
        assert_eq!(analysis.suggested_follow_ups.len(), 1);
        assert!(analysis.red_flags.is_empty());
        assert!(analysis.positive_signs.is_empty());
        assert_eq!(analysis.core_average(), 5.0);
    }

    #[test]
    fn test_experience_level_parse() {
        assert_eq!(ExperienceLevel::parse("mid-level"), Some(ExperienceLevel::Mid));
        assert_eq!(ExperienceLevel::parse("unknown"), None);
    }
}
