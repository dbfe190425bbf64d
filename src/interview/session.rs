//! Interview session state.
//!
//! A [`Session`] is the aggregate root of one interview: the conversation
//! logs, the candidate profile and the phase pointer. It is mutated only
//! through the orchestrator's turn protocol and becomes read-only once the
//! phase reaches [`Phase::Ended`].

use crate::interview::phases::{self, PhaseCatalog, PhaseProgress};
use crate::interview::profile::{self, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::models::{
    AnswerAnalysis, AnswerRecord, CandidateProfile, ConversationTurn, Phase, QuestionRecord,
    Role, ScoreSummary, TurnMetadata,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Number of recent answers whose weighted scores drive adaptive transitions.
pub const RECENT_WINDOW: usize = 3;

/// Characters of a turn kept in prompt context strings.
const CONTEXT_SNIPPET_CHARS: usize = 150;

/// Outcome of leaving a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseChange {
    Advanced(Phase),
    Ended,
}

/// The full state of one interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    session_id: String,
    pub job_role: String,
    phase: Phase,
    phase_start_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    questions: Vec<QuestionRecord>,
    answers: Vec<AnswerRecord>,
    conversation: Vec<ConversationTurn>,
    pub(crate) profile: CandidateProfile,
    pub(crate) current_topic: Option<String>,
    difficulty_level: u8,
    covered_topics: Vec<String>,
    red_flags: Vec<String>,
    positive_signs: Vec<String>,
}

impl Session {
    /// Start a new session in the greeting phase.
    pub fn new(job_role: impl Into<String>, difficulty_level: u8) -> Self {
        Self::new_at(job_role, difficulty_level, Utc::now())
    }

    pub fn new_at(job_role: impl Into<String>, difficulty_level: u8, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            session_id: format!("session-{}", &id[..12]),
            job_role: job_role.into(),
            phase: Phase::Greeting,
            phase_start_time: now,
            start_time: now,
            end_time: None,
            questions: Vec::new(),
            answers: Vec::new(),
            conversation: Vec::new(),
            profile: CandidateProfile::default(),
            current_topic: None,
            difficulty_level: difficulty_level.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY),
            covered_topics: Vec::new(),
            red_flags: Vec::new(),
            positive_signs: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_start_time(&self) -> DateTime<Utc> {
        self.phase_start_time
    }

    pub fn difficulty_level(&self) -> u8 {
        self.difficulty_level
    }

    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    /// Topic the interviewer is currently probing.
    pub fn current_topic(&self) -> Option<&str> {
        self.current_topic.as_deref()
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn covered_topics(&self) -> &[String] {
        &self.covered_topics
    }

    /// Raw red flags, one entry per occurrence.
    pub fn red_flags(&self) -> &[String] {
        &self.red_flags
    }

    /// Raw positive signs, one entry per occurrence.
    pub fn positive_signs(&self) -> &[String] {
        &self.positive_signs
    }

    pub fn distinct_red_flags(&self) -> Vec<String> {
        dedup_preserving_order(&self.red_flags)
    }

    pub fn distinct_positive_signs(&self) -> Vec<String> {
        dedup_preserving_order(&self.positive_signs)
    }

    pub fn is_ended(&self) -> bool {
        self.phase.is_terminal()
    }

    // ----- conversation -----

    /// Record a question in the current phase.
    pub(crate) fn add_question(
        &mut self,
        question: impl Into<String>,
        topic: Option<String>,
        fallback: bool,
    ) -> &QuestionRecord {
        let question = question.into();
        let now = Utc::now();
        let topic = topic.or_else(|| self.current_topic.clone());

        self.conversation.push(ConversationTurn {
            role: Role::Interviewer,
            content: question.clone(),
            phase: self.phase,
            timestamp: now,
            metadata: TurnMetadata {
                topic: topic.clone(),
                difficulty: Some(self.difficulty_level),
                ..TurnMetadata::default()
            },
        });

        if let Some(t) = &topic {
            if !self.covered_topics.contains(t) {
                self.covered_topics.push(t.clone());
            }
        }

        self.questions.push(QuestionRecord {
            question,
            phase: self.phase,
            topic,
            difficulty_level: self.difficulty_level,
            fallback,
            timestamp: now,
        });

        &self.questions[self.questions.len() - 1]
    }

    /// Record a scored answer to the most recent question.
    pub(crate) fn add_answer(
        &mut self,
        answer: impl Into<String>,
        analysis: AnswerAnalysis,
        weighted_score: f64,
    ) -> &AnswerRecord {
        self.push_answer(answer.into(), analysis, weighted_score, false)
    }

    /// Record unintelligible input for audit. It is never scored and the
    /// question it responded to stays open.
    pub(crate) fn add_unclear_answer(&mut self, raw: impl Into<String>) -> &AnswerRecord {
        let analysis = AnswerAnalysis::default();
        self.push_answer(raw.into(), analysis, 0.0, true)
    }

    fn push_answer(
        &mut self,
        answer: String,
        analysis: AnswerAnalysis,
        weighted_score: f64,
        unclear: bool,
    ) -> &AnswerRecord {
        let now = Utc::now();
        let question_index = self.questions.len().checked_sub(1);

        self.conversation.push(ConversationTurn {
            role: Role::Candidate,
            content: answer.clone(),
            phase: self.phase,
            timestamp: now,
            metadata: TurnMetadata {
                scores: (!unclear).then(|| ScoreSummary::new(&analysis, weighted_score)),
                clarification: unclear,
                ..TurnMetadata::default()
            },
        });

        self.answers.push(AnswerRecord {
            answer,
            analysis,
            weighted_score,
            phase: self.phase,
            question_index,
            unclear,
            timestamp: now,
        });

        &self.answers[self.answers.len() - 1]
    }

    /// Log an interviewer utterance that is not a new question, such as a
    /// clarification request.
    pub(crate) fn add_interviewer_note(&mut self, content: impl Into<String>) {
        self.conversation.push(ConversationTurn {
            role: Role::Interviewer,
            content: content.into(),
            phase: self.phase,
            timestamp: Utc::now(),
            metadata: TurnMetadata {
                clarification: true,
                ..TurnMetadata::default()
            },
        });
    }

    pub fn last_question(&self) -> Option<&str> {
        self.questions.last().map(|q| q.question.as_str())
    }

    /// Answers that were actually scored.
    pub fn scored_answers(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.answers.iter().filter(|a| !a.unclear)
    }

    /// Formatted last `num_turns` turns for prompt context.
    pub fn context_string(&self, num_turns: usize) -> String {
        let start = self.conversation.len().saturating_sub(num_turns);
        let recent = &self.conversation[start..];
        if recent.is_empty() {
            return "No conversation yet.".to_string();
        }

        recent
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::Interviewer => "Interviewer",
                    Role::Candidate => "Candidate",
                };
                format!("{}: {}", role, snippet(&turn.content, CONTEXT_SNIPPET_CHARS))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One-line profile summary for prompts.
    pub fn profile_summary(&self) -> String {
        let p = &self.profile;
        let mut parts = Vec::new();

        if !p.skills.is_empty() {
            parts.push(format!("Skills: {}", head(&p.skills, 5)));
        }
        if !p.technologies.is_empty() {
            parts.push(format!("Technologies: {}", head(&p.technologies, 5)));
        }
        if let Some(years) = p.experience_years {
            parts.push(format!("Experience: ~{} years", years));
        }
        if !p.communication_style.is_empty() {
            parts.push(format!("Communication: {}", p.communication_style));
        }

        if parts.is_empty() {
            "No profile data yet.".to_string()
        } else {
            parts.join("; ")
        }
    }

    // ----- profile -----

    /// Fold one analysis into the profile, difficulty and observations.
    /// An ended session is left untouched.
    pub(crate) fn apply_analysis(&mut self, analysis: &AnswerAnalysis) {
        if self.is_ended() {
            return;
        }
        profile::apply(&mut self.profile, analysis);
        self.difficulty_level = profile::adapt_difficulty(self.difficulty_level, analysis);
        self.red_flags.extend(analysis.red_flags.iter().cloned());
        self.positive_signs.extend(analysis.positive_signs.iter().cloned());
    }

    // ----- phases -----

    /// Questions asked in the current phase.
    pub fn phase_question_count(&self) -> usize {
        self.question_count_in(self.phase)
    }

    pub fn question_count_in(&self, phase: Phase) -> usize {
        self.questions.iter().filter(|q| q.phase == phase).count()
    }

    pub fn phase_elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.phase_start_time).to_std().unwrap_or(Duration::ZERO)
    }

    /// Mean weighted score of up to the last three scored answers in the
    /// current phase.
    pub fn recent_performance(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .scored_answers()
            .filter(|a| a.phase == self.phase)
            .map(|a| a.weighted_score)
            .collect();
        let recent = &scores[scores.len().saturating_sub(RECENT_WINDOW)..];

        if recent.is_empty() {
            None
        } else {
            Some(recent.iter().sum::<f64>() / recent.len() as f64)
        }
    }

    pub fn should_advance(&self, now: DateTime<Utc>) -> bool {
        if self.is_ended() {
            return false;
        }
        phases::should_transition(
            self.phase,
            self.phase_question_count(),
            self.phase_elapsed(now),
            self.recent_performance(),
        )
    }

    /// Move to the next phase in the fixed order.
    pub fn advance_phase(&mut self, now: DateTime<Utc>) -> PhaseChange {
        let next = PhaseCatalog::next(self.phase);
        info!(
            session_id = %self.session_id,
            from = %self.phase,
            to = %next,
            "Phase transition"
        );

        if next.is_terminal() {
            self.end(now);
            return PhaseChange::Ended;
        }

        self.phase = next;
        self.phase_start_time = now;
        self.current_topic = None;
        PhaseChange::Advanced(next)
    }

    /// End the interview immediately.
    pub fn end(&mut self, now: DateTime<Utc>) {
        self.phase = Phase::Ended;
        self.current_topic = None;
        if self.end_time.is_none() {
            self.end_time = Some(now);
        }
    }

    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        let end = self.end_time.unwrap_or(now);
        (end - self.start_time).to_std().unwrap_or(Duration::ZERO)
    }

    // ----- status / serialization -----

    pub fn status(&self, now: DateTime<Utc>) -> SessionStatus {
        SessionStatus {
            session_id: self.session_id.clone(),
            phase: self.phase,
            job_role: self.job_role.clone(),
            questions_asked_total: self.questions.len(),
            answers_received_total: self.answers.len(),
            phase_progress: PhaseCatalog::progress(
                self.phase,
                self.phase_question_count(),
                self.phase_elapsed(now),
            ),
            difficulty_level: self.difficulty_level,
            skills: self.profile.skills.iter().take(5).cloned().collect(),
            technologies: self.profile.technologies.iter().take(5).cloned().collect(),
            experience_years: self.profile.experience_years,
            confidence_level: self.profile.confidence_level,
            current_topic: self.current_topic.clone(),
            is_ended: self.is_ended(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Read-only snapshot returned by status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub phase: Phase,
    pub job_role: String,
    pub questions_asked_total: usize,
    pub answers_received_total: usize,
    pub phase_progress: PhaseProgress,
    pub difficulty_level: u8,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub experience_years: Option<u32>,
    pub confidence_level: u8,
    pub current_topic: Option<String>,
    pub is_ended: bool,
}

fn dedup_preserving_order(items: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

fn head(items: &[String], n: usize) -> String {
    items.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::scoring::weighted_score;
    use crate::models::ExtractedInfo;
    use chrono::Duration as ChronoDuration;

    fn answer(session: &mut Session, score: u8) {
        let analysis = AnswerAnalysis {
            quality: score,
            relevance: score,
            completeness: score,
            technical_depth: score,
            communication: score,
            ..AnswerAnalysis::default()
        };
        let weighted = weighted_score(&analysis, session.phase());
        session.apply_analysis(&analysis);
        session.add_answer("an answer", analysis, weighted);
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new("Backend Engineer", 9);
        assert!(session.id().starts_with("session-"));
        assert_eq!(session.id().len(), "session-".len() + 12);
        assert_eq!(session.phase(), Phase::Greeting);
        assert_eq!(session.difficulty_level(), 5);
        assert!(session.last_question().is_none());
        assert!(!session.is_ended());
    }

    #[test]
    fn test_question_and_answer_logs() {
        let mut session = Session::new("Engineer", 3);
        session.add_question("Hello, could you introduce yourself?", None, false);
        answer(&mut session, 6);

        assert_eq!(session.questions().len(), 1);
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.answers()[0].question_index, Some(0));
        assert_eq!(session.conversation().len(), 2);
        assert_eq!(session.conversation()[0].role, Role::Interviewer);
        assert_eq!(session.conversation()[1].role, Role::Candidate);
        assert_eq!(
            session.last_question(),
            Some("Hello, could you introduce yourself?")
        );
    }

    #[test]
    fn test_topics_tracked_uniquely() {
        let mut session = Session::new("Engineer", 3);
        session.add_question("Q1?", Some("caching".into()), false);
        session.add_question("Q2?", Some("caching".into()), false);
        session.current_topic = Some("databases".into());
        session.add_question("Q3?", None, true);

        assert_eq!(session.covered_topics(), &["caching", "databases"]);
        assert_eq!(session.questions()[2].topic.as_deref(), Some("databases"));
        assert!(session.questions()[2].fallback);
    }

    #[test]
    fn test_recent_performance_window() {
        let mut session = Session::new("Engineer", 3);
        assert_eq!(session.recent_performance(), None);

        for score in [2, 10, 10, 10] {
            session.add_question("Q?", None, false);
            answer(&mut session, score);
        }
        assert_eq!(session.recent_performance(), Some(10.0));
    }

    #[test]
    fn test_unclear_answers_not_scored() {
        let mut session = Session::new("Engineer", 3);
        session.add_question("Q?", None, false);
        session.add_unclear_answer("uh");

        assert_eq!(session.answers().len(), 1);
        assert!(session.answers()[0].unclear);
        assert_eq!(session.scored_answers().count(), 0);
        assert_eq!(session.recent_performance(), None);
    }

    #[test]
    fn test_greeting_advances_after_cap() {
        let t0 = Utc::now();
        let mut session = Session::new_at("Engineer", 3, t0);
        session.add_question("Hi?", None, false);
        answer(&mut session, 6);
        assert!(!session.should_advance(t0));

        session.add_question("And?", None, false);
        answer(&mut session, 6);
        assert!(session.should_advance(t0));

        let change = session.advance_phase(t0);
        assert_eq!(change, PhaseChange::Advanced(Phase::Introduction));
        assert_eq!(session.phase_question_count(), 0);
        assert!(session.current_topic.is_none());
    }

    #[test]
    fn test_time_limit_advances() {
        let t0 = Utc::now();
        let mut session = Session::new_at("Engineer", 3, t0);
        session.add_question("Hi?", None, false);
        answer(&mut session, 6);

        let later = t0 + ChronoDuration::minutes(3);
        assert!(session.should_advance(later));
    }

    #[test]
    fn test_closing_advance_ends_interview() {
        let now = Utc::now();
        let mut session = Session::new_at("Engineer", 3, now);
        for _ in 0..5 {
            session.advance_phase(now);
        }
        assert_eq!(session.phase(), Phase::Closing);
        assert_eq!(session.advance_phase(now), PhaseChange::Ended);
        assert!(session.is_ended());
        assert_eq!(session.end_time, Some(now));
        assert!(!session.should_advance(now));
    }

    #[test]
    fn test_flags_kept_with_frequency_but_dedup_on_read() {
        let mut session = Session::new("Engineer", 3);
        let analysis = AnswerAnalysis {
            red_flags: vec!["vague".into()],
            positive_signs: vec!["concrete examples".into(), "ownership".into()],
            ..AnswerAnalysis::default()
        };
        session.apply_analysis(&analysis);
        session.apply_analysis(&analysis);

        assert_eq!(session.red_flags().len(), 2);
        assert_eq!(session.distinct_red_flags(), vec!["vague"]);
        assert_eq!(
            session.distinct_positive_signs(),
            vec!["concrete examples", "ownership"]
        );
    }

    #[test]
    fn test_ended_session_ignores_analysis() {
        let mut session = Session::new("Engineer", 3);
        session.end(Utc::now());

        let analysis = AnswerAnalysis {
            quality: 10,
            relevance: 10,
            completeness: 10,
            extracted_info: ExtractedInfo {
                technologies: vec!["rust".into(), "rust".into()],
                ..ExtractedInfo::default()
            },
            red_flags: vec!["vague".into()],
            ..AnswerAnalysis::default()
        };
        session.apply_analysis(&analysis);

        assert!(session.profile().technologies.is_empty());
        assert_eq!(session.difficulty_level(), 3);
        assert!(session.red_flags().is_empty());
        assert!(session.current_topic().is_none());
    }

    #[test]
    fn test_profile_summary_and_context() {
        let mut session = Session::new("Engineer", 3);
        assert_eq!(session.context_string(3), "No conversation yet.");

        session.apply_analysis(&AnswerAnalysis {
            extracted_info: ExtractedInfo {
                skills: vec!["api design".into()],
                technologies: vec!["rust".into()],
                ..ExtractedInfo::default()
            },
            ..AnswerAnalysis::default()
        });
        assert_eq!(
            session.profile_summary(),
            "Skills: api design; Technologies: rust; Communication: neutral"
        );

        session.add_question("Tell me about yourself.", None, false);
        let long = "x".repeat(200);
        session.add_answer(long, AnswerAnalysis::default(), 5.0);
        let context = session.context_string(3);
        assert!(context.starts_with("Interviewer: Tell me about yourself."));
        assert!(context.ends_with("..."));
    }

    #[test]
    fn test_json_round_trip_preserves_state() {
        let now = Utc::now();
        let mut session = Session::new_at("Engineer", 3, now);
        session.add_question("Hi?", None, false);
        answer(&mut session, 9);
        session.advance_phase(now);
        session.add_question("Background?", None, true);

        let json = session.to_json().unwrap();
        let restored = Session::from_json(&json).unwrap();

        assert_eq!(restored.id(), session.id());
        assert_eq!(restored.phase(), Phase::Introduction);
        assert_eq!(restored.difficulty_level(), session.difficulty_level());
        assert_eq!(restored.questions().len(), 2);
        assert_eq!(restored.answers().len(), 1);
        assert_eq!(restored, session);
    }

    #[test]
    fn test_status_snapshot() {
        let now = Utc::now();
        let mut session = Session::new_at("Engineer", 2, now);
        session.add_question("Hi?", None, false);
        let status = session.status(now);
        assert_eq!(status.phase, Phase::Greeting);
        assert_eq!(status.questions_asked_total, 1);
        assert_eq!(status.phase_progress.questions_asked, 1);
        assert!(status.phase_progress.can_transition);
        assert_eq!(status.difficulty_level, 2);
        assert!(!status.is_ended);
    }
}
