//! Final assessment of an interview.

use crate::error::{CollaboratorError, InterviewError, Result};
use crate::interview::scoring::{aggregate_scored, recommend, Recommendation, ScoreAggregate};
use crate::interview::Session;
use crate::llm::prompts::report_prompt;
use crate::llm::TextGenerator;
use crate::models::{CandidateProfile, Phase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Where the assessment text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentSource {
    Model,
    Template,
}

/// Hiring assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub recommendation: Recommendation,
    /// 1 to 10.
    pub fit_score: u8,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub next_steps: Vec<String>,
    pub source: AssessmentSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub session_id: String,
    pub job_role: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub total_questions: usize,
    pub total_answers: usize,
    pub phases_covered: Vec<Phase>,
    pub generated_at: DateTime<Utc>,
}

/// One question paired with the answer it received, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub phase: Phase,
    pub question: String,
    pub topic: Option<String>,
    pub fallback: bool,
    pub answer: Option<String>,
    pub weighted_score: Option<f64>,
}

/// Everything known about an interview at report time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewReport {
    pub metadata: ReportMetadata,
    pub assessment: Assessment,
    pub overall: ScoreAggregate,
    pub phase_scores: BTreeMap<Phase, ScoreAggregate>,
    pub profile: CandidateProfile,
    pub transcript: Vec<TranscriptEntry>,
    pub red_flags: Vec<String>,
    pub positive_signs: Vec<String>,
    pub final_difficulty: u8,
}

/// Builds [`InterviewReport`]s, asking the model for the narrative part.
pub struct ReportBuilder {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
    timeout: Duration,
}

impl ReportBuilder {
    pub fn new(generator: Arc<dyn TextGenerator>, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            generator,
            max_tokens,
            timeout,
        }
    }

    /// Build the report of an ended or in-progress session.
    pub async fn build(&self, session: &Session) -> Result<InterviewReport> {
        let now = Utc::now();
        let overall = aggregate_scored(
            session
                .scored_answers()
                .map(|a| (&a.analysis, a.weighted_score)),
        );
        if overall.answer_count == 0 {
            return Err(InterviewError::NoAnswers(session.id().to_string()));
        }

        let phase_scores = phase_aggregates(session);
        let red_flags = session.distinct_red_flags();
        let positive_signs = session.distinct_positive_signs();

        let assessment = match self
            .model_assessment(session, &overall, &red_flags, &positive_signs)
            .await
        {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    phase = %session.phase(),
                    error = %e,
                    "Report generation failed, using templated assessment"
                );
                template_assessment(overall.weighted_average, &red_flags, &positive_signs)
            }
        };

        info!(
            session_id = %session.id(),
            recommendation = %assessment.recommendation,
            overall = overall.weighted_average,
            "Report built"
        );

        Ok(InterviewReport {
            metadata: ReportMetadata {
                session_id: session.id().to_string(),
                job_role: session.job_role.clone(),
                start_time: session.start_time,
                end_time: session.end_time,
                duration_seconds: session.duration(now).as_secs(),
                total_questions: session.questions().len(),
                total_answers: overall.answer_count,
                phases_covered: phase_scores.keys().copied().collect(),
                generated_at: now,
            },
            assessment,
            overall,
            phase_scores,
            profile: session.profile.clone(),
            transcript: transcript(session),
            red_flags,
            positive_signs,
            final_difficulty: session.difficulty_level(),
        })
    }

    async fn model_assessment(
        &self,
        session: &Session,
        overall: &ScoreAggregate,
        red_flags: &[String],
        positive_signs: &[String],
    ) -> std::result::Result<Assessment, CollaboratorError> {
        let avg_scores = format!(
            "quality {:.1}, relevance {:.1}, completeness {:.1}, technical depth {:.1}, communication {:.1}, overall {:.1}",
            overall.avg_quality,
            overall.avg_relevance,
            overall.avg_completeness,
            overall.avg_technical_depth,
            overall.avg_communication,
            overall.weighted_average,
        );
        let prompt = report_prompt(
            &session.job_role,
            &session.profile_summary(),
            &avg_scores,
            red_flags,
            positive_signs,
        );

        let value = tokio::time::timeout(
            self.timeout,
            self.generator.ask_structured(&prompt, self.max_tokens),
        )
        .await
        .map_err(|_| CollaboratorError::Timeout(self.timeout.as_secs()))??;

        parse_assessment(&value, overall.weighted_average)
    }
}

/// Aggregates per phase, each answer weighted by the phase it was given in.
fn phase_aggregates(session: &Session) -> BTreeMap<Phase, ScoreAggregate> {
    let mut by_phase: BTreeMap<Phase, Vec<_>> = BTreeMap::new();
    for answer in session.scored_answers() {
        by_phase
            .entry(answer.phase)
            .or_default()
            .push((&answer.analysis, answer.weighted_score));
    }

    by_phase
        .into_iter()
        .map(|(phase, scored)| (phase, aggregate_scored(scored)))
        .collect()
}

/// Pair each question with the first scored answer that references it.
fn transcript(session: &Session) -> Vec<TranscriptEntry> {
    session
        .questions()
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let answer = session
                .scored_answers()
                .find(|a| a.question_index == Some(index));
            TranscriptEntry {
                phase: q.phase,
                question: q.question.clone(),
                topic: q.topic.clone(),
                fallback: q.fallback,
                answer: answer.map(|a| a.answer.clone()),
                weighted_score: answer.map(|a| a.weighted_score),
            }
        })
        .collect()
}

fn parse_recommendation(text: &str) -> Option<Recommendation> {
    match text.trim().to_lowercase().as_str() {
        "strong hire" => Some(Recommendation::StrongHire),
        "hire" => Some(Recommendation::Hire),
        "maybe" => Some(Recommendation::Maybe),
        "no hire" => Some(Recommendation::NoHire),
        _ => None,
    }
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Validate the model's assessment object. The summary is required; a
/// missing or unknown recommendation falls back to the numeric one.
fn parse_assessment(value: &Value, overall: f64) -> std::result::Result<Assessment, CollaboratorError> {
    let summary = value["summary"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CollaboratorError::Malformed("assessment has no summary".to_string()))?;

    let recommendation = value["recommendation"]
        .as_str()
        .and_then(parse_recommendation)
        .unwrap_or_else(|| recommend(overall));

    let fit_score = value["fit_score"]
        .as_f64()
        .map(|f| f.round().clamp(1.0, 10.0) as u8)
        .unwrap_or_else(|| fit_from_overall(overall));

    Ok(Assessment {
        recommendation,
        fit_score,
        summary: summary.to_string(),
        strengths: strings(&value["strengths"]),
        weaknesses: strings(&value["weaknesses"]),
        next_steps: strings(&value["next_steps"]),
        source: AssessmentSource::Model,
    })
}

fn fit_from_overall(overall: f64) -> u8 {
    overall.round().clamp(1.0, 10.0) as u8
}

/// Assessment derived purely from the numbers.
pub fn template_assessment(
    overall: f64,
    red_flags: &[String],
    positive_signs: &[String],
) -> Assessment {
    let recommendation = recommend(overall);
    let summary = match recommendation {
        Recommendation::StrongHire => {
            "The candidate performed exceptionally well across all interview phases, showing strong knowledge and clear communication."
        }
        Recommendation::Hire => {
            "The candidate performed well overall and demonstrated solid skills for the role."
        }
        Recommendation::Maybe => {
            "The candidate showed potential but has some gaps that should be explored further."
        }
        Recommendation::NoHire => {
            "The candidate did not meet the bar for this role based on the interview performance."
        }
    };

    let strengths = if positive_signs.is_empty() {
        vec!["Engaged participant".to_string()]
    } else {
        positive_signs.iter().take(3).cloned().collect()
    };

    Assessment {
        recommendation,
        fit_score: fit_from_overall(overall),
        summary: summary.to_string(),
        strengths,
        weaknesses: red_flags.iter().take(3).cloned().collect(),
        next_steps: vec!["Technical assessment".to_string(), "Team interview".to_string()],
        source: AssessmentSource::Template,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::weighted_score;
    use crate::models::AnswerAnalysis;
    use crate::testing::ScriptedGenerator;
    use serde_json::json;

    fn answered_session() -> Session {
        let now = Utc::now();
        let mut session = Session::new_at("Data Engineer", 3, now);
        session.add_question("Hello, who are you?", None, false);
        let analysis = AnswerAnalysis {
            quality: 8,
            relevance: 8,
            completeness: 8,
            technical_depth: 8,
            communication: 8,
            red_flags: vec!["vague on metrics".into()],
            positive_signs: vec!["ownership".into()],
            ..AnswerAnalysis::default()
        };
        session.apply_analysis(&analysis);
        let weighted = weighted_score(&analysis, Phase::Greeting);
        session.add_answer("I build pipelines.", analysis, weighted);

        session.advance_phase(now);
        session.add_question("What drew you to this role?", None, true);
        session.add_unclear_answer("mm");
        session
    }

    fn builder(generator: ScriptedGenerator) -> ReportBuilder {
        ReportBuilder::new(Arc::new(generator), 600, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_report_without_answers_is_rejected() {
        let session = Session::new("Engineer", 3);
        let err = builder(ScriptedGenerator::new())
            .build(&session)
            .await
            .unwrap_err();
        assert_eq!(err, InterviewError::NoAnswers(session.id().to_string()));
    }

    #[tokio::test]
    async fn test_model_assessment_used_when_valid() {
        let generator = ScriptedGenerator::new().with_structured(Ok(json!({
            "recommendation": "Hire",
            "fit_score": 7.6,
            "summary": "Solid pipeline experience.",
            "strengths": ["ownership"],
            "weaknesses": [],
            "next_steps": ["System design round"]
        })));
        let report = builder(generator).build(&answered_session()).await.unwrap();

        assert_eq!(report.assessment.source, AssessmentSource::Model);
        assert_eq!(report.assessment.recommendation, Recommendation::Hire);
        assert_eq!(report.assessment.fit_score, 8);
        assert_eq!(report.assessment.next_steps, vec!["System design round"]);
    }

    #[tokio::test]
    async fn test_template_used_when_model_fails() {
        let report = builder(ScriptedGenerator::new())
            .build(&answered_session())
            .await
            .unwrap();

        assert_eq!(report.assessment.source, AssessmentSource::Template);
        assert_eq!(report.overall.weighted_average, 8.0);
        assert_eq!(report.assessment.recommendation, Recommendation::Hire);
        assert_eq!(report.assessment.fit_score, 8);
        assert_eq!(report.assessment.strengths, vec!["ownership"]);
        assert_eq!(report.assessment.weaknesses, vec!["vague on metrics"]);
    }

    #[tokio::test]
    async fn test_transcript_pairs_by_question_index() {
        let report = builder(ScriptedGenerator::new())
            .build(&answered_session())
            .await
            .unwrap();

        assert_eq!(report.transcript.len(), 2);
        assert_eq!(report.transcript[0].answer.as_deref(), Some("I build pipelines."));
        assert_eq!(report.transcript[1].answer, None);
        assert!(report.transcript[1].fallback);
        assert_eq!(report.metadata.total_questions, 2);
        assert_eq!(report.metadata.total_answers, 1);
        assert_eq!(report.metadata.phases_covered, vec![Phase::Greeting]);
    }

    #[test]
    fn test_template_without_signals() {
        let assessment = template_assessment(4.2, &[], &[]);
        assert_eq!(assessment.recommendation, Recommendation::NoHire);
        assert_eq!(assessment.fit_score, 4);
        assert_eq!(assessment.strengths, vec!["Engaged participant"]);
        assert!(assessment.weaknesses.is_empty());
        assert_eq!(
            assessment.next_steps,
            vec!["Technical assessment", "Team interview"]
        );
    }

    #[test]
    fn test_assessment_without_summary_is_malformed() {
        let err = parse_assessment(&json!({"recommendation": "Hire"}), 7.0).unwrap_err();
        assert!(matches!(err, CollaboratorError::Malformed(_)));

        let assessment =
            parse_assessment(&json!({"summary": "Fine.", "recommendation": "??"}), 9.0).unwrap();
        assert_eq!(assessment.recommendation, Recommendation::StrongHire);
        assert_eq!(assessment.fit_score, 9);
    }
}
