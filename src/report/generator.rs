//! Report rendering.
//!
//! Turns an [`InterviewReport`] into Markdown or JSON and writes it to disk.

use crate::interview::scoring::{interpret, ScoreAggregate};
use crate::models::Phase;
use crate::report::builder::{Assessment, AssessmentSource, InterviewReport, ReportMetadata};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Output format of a saved report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &InterviewReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Interview Report: {}\n\n", report.metadata.job_role));
    output.push_str(&generate_metadata_section(&report.metadata, report.final_difficulty));
    output.push_str(&generate_assessment_section(&report.assessment));
    output.push_str(&generate_scores_section(&report.overall, &report.phase_scores));
    output.push_str(&generate_profile_section(report));
    output.push_str(&generate_signals_section(&report.positive_signs, &report.red_flags));
    output.push_str(&generate_transcript_section(report));
    output.push_str("---\n\n*Report generated by interviewd*\n");

    output
}

fn generate_metadata_section(metadata: &ReportMetadata, final_difficulty: u8) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Session:** `{}`\n", metadata.session_id));
    section.push_str(&format!(
        "- **Started:** {}\n",
        metadata.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(end) = metadata.end_time {
        section.push_str(&format!("- **Ended:** {}\n", end.format("%Y-%m-%d %H:%M:%S UTC")));
    } else {
        section.push_str("- **Ended:** in progress\n");
    }
    section.push_str(&format!(
        "- **Duration:** {}m {}s\n",
        metadata.duration_seconds / 60,
        metadata.duration_seconds % 60
    ));
    section.push_str(&format!(
        "- **Questions / Answers:** {} / {}\n",
        metadata.total_questions, metadata.total_answers
    ));
    let phases: Vec<String> = metadata.phases_covered.iter().map(Phase::to_string).collect();
    section.push_str(&format!("- **Phases Covered:** {}\n", phases.join(", ")));
    section.push_str(&format!("- **Final Difficulty:** {}/5\n\n", final_difficulty));

    section
}

fn generate_assessment_section(assessment: &Assessment) -> String {
    let mut section = String::new();

    section.push_str("## Assessment\n\n");
    section.push_str(&format!(
        "**Recommendation:** {} | **Fit Score:** {}/10\n\n",
        assessment.recommendation, assessment.fit_score
    ));
    section.push_str(&assessment.summary);
    section.push_str("\n\n");
    if assessment.source == AssessmentSource::Template {
        section.push_str("*Summary derived from scores only.*\n\n");
    }

    for (title, items) in [
        ("Strengths", &assessment.strengths),
        ("Areas for Improvement", &assessment.weaknesses),
        ("Next Steps", &assessment.next_steps),
    ] {
        if items.is_empty() {
            continue;
        }
        section.push_str(&format!("### {}\n\n", title));
        for item in items {
            section.push_str(&format!("- {}\n", item));
        }
        section.push('\n');
    }

    section
}

fn generate_scores_section(
    overall: &ScoreAggregate,
    phase_scores: &BTreeMap<Phase, ScoreAggregate>,
) -> String {
    let mut section = String::new();

    section.push_str("## Scores\n\n");
    let band = interpret(overall.weighted_average)
        .map(|b| b.to_string())
        .unwrap_or_else(|| "Unrated".to_string());
    section.push_str(&format!(
        "**Overall:** {:.1}/10 ({})\n\n",
        overall.weighted_average, band
    ));

    section.push_str("| Phase | Answers | Quality | Relevance | Completeness | Depth | Communication | Weighted |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    for (phase, scores) in phase_scores {
        section.push_str(&score_row(&phase.to_string(), scores));
    }
    section.push_str(&score_row("**All**", overall));
    section.push('\n');

    section
}

fn score_row(label: &str, s: &ScoreAggregate) -> String {
    format!(
        "| {} | {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |\n",
        label,
        s.answer_count,
        s.avg_quality,
        s.avg_relevance,
        s.avg_completeness,
        s.avg_technical_depth,
        s.avg_communication,
        s.weighted_average
    )
}

fn generate_profile_section(report: &InterviewReport) -> String {
    let profile = &report.profile;
    let mut section = String::new();

    section.push_str("## Candidate Profile\n\n");
    if !profile.skills.is_empty() {
        section.push_str(&format!("- **Skills:** {}\n", profile.skills.join(", ")));
    }
    if !profile.technologies.is_empty() {
        section.push_str(&format!(
            "- **Technologies:** {}\n",
            profile.technologies.join(", ")
        ));
    }
    if let Some(years) = profile.experience_years {
        section.push_str(&format!("- **Experience:** ~{} years\n", years));
    }
    section.push_str(&format!("- **Communication:** {}\n", profile.communication_style));
    section.push_str(&format!("- **Confidence:** {}/5\n", profile.confidence_level));

    if !profile.depth_of_knowledge.is_empty() {
        let depth: Vec<String> = profile
            .depth_of_knowledge
            .iter()
            .map(|(tech, level)| format!("{} ({}/10)", tech, level))
            .collect();
        section.push_str(&format!("- **Depth:** {}\n", depth.join(", ")));
    }
    section.push('\n');

    section
}

fn generate_signals_section(positive: &[String], red_flags: &[String]) -> String {
    if positive.is_empty() && red_flags.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Observations\n\n");
    for sign in positive {
        section.push_str(&format!("- ✅ {}\n", sign));
    }
    for flag in red_flags {
        section.push_str(&format!("- ⚠️ {}\n", flag));
    }
    section.push('\n');

    section
}

fn generate_transcript_section(report: &InterviewReport) -> String {
    let mut section = String::new();

    section.push_str("## Transcript\n\n");
    let mut current: Option<Phase> = None;
    for (i, entry) in report.transcript.iter().enumerate() {
        if current != Some(entry.phase) {
            section.push_str(&format!("### {}\n\n", entry.phase));
            current = Some(entry.phase);
        }

        let marker = if entry.fallback { " *(standard question)*" } else { "" };
        section.push_str(&format!("**Q{}.** {}{}\n\n", i + 1, entry.question, marker));
        match (&entry.answer, entry.weighted_score) {
            (Some(answer), Some(score)) => {
                section.push_str(&format!("> {}\n\n*Score: {:.1}/10*\n\n", answer, score));
            }
            (Some(answer), None) => section.push_str(&format!("> {}\n\n", answer)),
            (None, _) => section.push_str("> *(no answer)*\n\n"),
        }
    }

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &InterviewReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render and write the report in the requested format.
pub fn save_report(report: &InterviewReport, path: &Path, format: ReportFormat) -> Result<()> {
    let content = match format {
        ReportFormat::Json => generate_json_report(report)?,
        ReportFormat::Markdown => generate_markdown_report(report),
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::scoring::Recommendation;
    use crate::models::CandidateProfile;
    use crate::report::builder::TranscriptEntry;
    use chrono::Utc;

    fn create_test_report() -> InterviewReport {
        let scores = ScoreAggregate {
            avg_quality: 7.0,
            avg_relevance: 8.0,
            avg_completeness: 7.0,
            avg_technical_depth: 6.0,
            avg_communication: 8.0,
            weighted_average: 7.3,
            answer_count: 1,
        };

        InterviewReport {
            metadata: ReportMetadata {
                session_id: "session-0123456789ab".to_string(),
                job_role: "Platform Engineer".to_string(),
                start_time: Utc::now(),
                end_time: None,
                duration_seconds: 125,
                total_questions: 2,
                total_answers: 1,
                phases_covered: vec![Phase::Technical],
                generated_at: Utc::now(),
            },
            assessment: Assessment {
                recommendation: Recommendation::Hire,
                fit_score: 7,
                summary: "Good grasp of distributed systems.".to_string(),
                strengths: vec!["clear reasoning".to_string()],
                weaknesses: vec![],
                next_steps: vec!["Team interview".to_string()],
                source: AssessmentSource::Template,
            },
            overall: scores.clone(),
            phase_scores: [(Phase::Technical, scores)].into_iter().collect(),
            profile: CandidateProfile {
                technologies: vec!["rust".to_string(), "kafka".to_string()],
                experience_years: Some(4),
                ..CandidateProfile::default()
            },
            transcript: vec![
                TranscriptEntry {
                    phase: Phase::Technical,
                    question: "How do you partition a topic?".to_string(),
                    topic: None,
                    fallback: false,
                    answer: Some("By customer id.".to_string()),
                    weighted_score: Some(7.3),
                },
                TranscriptEntry {
                    phase: Phase::Technical,
                    question: "How would you approach debugging an issue in production?"
                        .to_string(),
                    topic: None,
                    fallback: true,
                    answer: None,
                    weighted_score: None,
                },
            ],
            red_flags: vec!["no testing mentioned".to_string()],
            positive_signs: vec!["clear reasoning".to_string()],
            final_difficulty: 4,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.contains("# Interview Report: Platform Engineer"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("**Recommendation:** Hire"));
        assert!(markdown.contains("**Overall:** 7.3/10 (Good - Above average performance)"));
        assert!(markdown.contains("| Technical | 1 |"));
        assert!(markdown.contains("- **Technologies:** rust, kafka"));
        assert!(markdown.contains("> By customer id."));
        assert!(markdown.contains("> *(no answer)*"));
        assert!(markdown.contains("*(standard question)*"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = create_test_report();
        let section = generate_metadata_section(&report.metadata, 4);

        assert!(section.contains("session-0123456789ab"));
        assert!(section.contains("in progress"));
        assert!(section.contains("2m 5s"));
        assert!(section.contains("Final Difficulty:** 4/5"));
    }

    #[test]
    fn test_signals_section_empty() {
        assert!(generate_signals_section(&[], &[]).is_empty());
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"recommendation\": \"Hire\""));
        assert!(json.contains("\"technical\""));
        assert!(json.contains("\"transcript\""));

        let parsed: InterviewReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.transcript.len(), 2);
    }

    #[test]
    fn test_save_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        save_report(&create_test_report(), &path, ReportFormat::Markdown).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Interview Report"));
    }
}
