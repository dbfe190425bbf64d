//! Prompt templates and the static fallback question bank.

use crate::interview::Session;
use crate::models::Phase;

/// Persona name used in generated and fallback speech.
pub const INTERVIEWER_NAME: &str = "Alex";

/// Label of a difficulty level as shown to the model.
pub fn difficulty_label(level: u8) -> &'static str {
    match level {
        0 | 1 => "basic/entry-level",
        2 => "intermediate",
        3 => "mid-level",
        4 => "advanced",
        _ => "senior/expert-level",
    }
}

/// Builds generation prompts from session state.
pub struct PromptBuilder<'a> {
    session: &'a Session,
    memory_context: &'a str,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(session: &'a Session, memory_context: &'a str) -> Self {
        Self {
            session,
            memory_context,
        }
    }

    /// Question prompt for the session's current phase. `None` once ended.
    pub fn question(&self) -> Option<String> {
        let role = &self.session.job_role;
        let profile = &self.session.profile;

        let prompt = match self.session.phase() {
            Phase::Greeting => format!(
                "You are {name}, a professional and friendly job interviewer conducting an interview for a {role} position.\n\n\
                 Your task: Greet the candidate warmly, introduce yourself as {name} the interviewer, and ask them to introduce themselves.\n\n\
                 Respond with ONLY your spoken words (1-2 sentences). Be warm and professional.",
                name = INTERVIEWER_NAME,
                role = role,
            ),
            Phase::Introduction => format!(
                "You are {name}, interviewing a candidate for a {role} position.\n\n\
                 What you know about the candidate so far: {info}\n\n\
                 Your task: Ask ONE follow-up question about their background, experience, or motivation for applying.\n\n\
                 Respond with ONLY your spoken question (1 sentence). Be conversational and professional.",
                name = INTERVIEWER_NAME,
                role = role,
                info = self.candidate_info(),
            ),
            Phase::Technical => {
                let level = difficulty_label(self.session.difficulty_level());
                let covered = self.session.covered_topics();
                let covered = if covered.is_empty() {
                    "none yet".to_string()
                } else {
                    covered[covered.len().saturating_sub(5)..].join(", ")
                };
                format!(
                    "You are {name}, a technical interviewer for a {role} position.\n\n\
                     Candidate's technologies: {techs}\n\
                     Difficulty level: {level}\n\
                     Topics already covered: {covered}\n\n\
                     Your task: Ask ONE {level} technical question relevant to {role}. Focus on practical knowledge and problem-solving.\n\n\
                     Respond with ONLY your spoken question. Be specific and clear.",
                    name = INTERVIEWER_NAME,
                    role = role,
                    techs = joined_or(&profile.technologies, 3, "not yet discussed"),
                    level = level,
                    covered = covered,
                )
            }
            Phase::Behavioral => format!(
                "You are {name}, a professional interviewer conducting a behavioral interview.\n\n\
                 Recent conversation:\n{context}\n\n\
                 Your task: Ask ONE behavioral interview question using the \"Tell me about a time when...\" format.\n\n\
                 Focus on topics like: teamwork, challenges, leadership, conflict resolution, or learning from mistakes.\n\n\
                 Respond with ONLY your spoken question. Be conversational.",
                name = INTERVIEWER_NAME,
                context = self.session.context_string(4),
            ),
            Phase::Situational => format!(
                "You are {name}, interviewing for a {role} position.\n\n\
                 Candidate's skills: {skills}\n\n\
                 Your task: Ask ONE hypothetical scenario question using \"What would you do if...\" or \"How would you handle...\" format.\n\n\
                 The scenario should test judgment, problem-solving, or decision-making relevant to the role.\n\n\
                 Respond with ONLY your spoken question.",
                name = INTERVIEWER_NAME,
                role = role,
                skills = joined_or(&profile.skills, 3, "various technical skills"),
            ),
            Phase::Closing => format!(
                "You are {name}, concluding a job interview.\n\n\
                 Your task: Thank the candidate for their time and ask if they have any questions about the role or the team.\n\n\
                 Respond with ONLY your spoken words (1-2 sentences). Be warm and professional.",
                name = INTERVIEWER_NAME,
            ),
            Phase::Ended => return None,
        };

        Some(prompt)
    }

    /// Profile summary with retrieved memory prepended when present.
    fn candidate_info(&self) -> String {
        let summary = self.session.profile_summary();
        if self.memory_context.is_empty() {
            summary
        } else {
            format!("{}\n\n{}", self.memory_context, summary)
        }
    }
}

/// Prompt asking the analyzer for a JSON assessment of one answer.
pub fn analysis_prompt(job_role: &str, phase: Phase, question: &str, answer: &str) -> String {
    format!(
        r#"Analyze this interview answer for a {job_role} position.

Interview Phase: {phase}
Question Asked: "{question}"
Candidate's Answer: "{answer}"

Provide your analysis as a JSON object with these fields:
- quality_score (1-10): How well-structured and articulate the answer is
- relevance_score (1-10): How relevant to the question
- completeness_score (1-10): How complete the answer is
- technical_depth (1-10): Technical knowledge shown (if applicable)
- communication_quality (1-10): Clarity and professionalism
- extracted_info: Object containing skills, technologies, experience_level (junior, mid or senior), communication_style, confidence_indicator (low, medium or high), key_points
- suggested_follow_ups: Array of potential follow-up questions
- areas_to_probe: Array of topics to explore further
- red_flags: Array of concerning aspects (if any)
- positive_signs: Array of positive indicators

Respond with ONLY the JSON object, no other text."#,
        job_role = job_role,
        phase = phase.as_str(),
        question = question,
        answer = answer,
    )
}

/// Prompt asking for the final hiring assessment.
pub fn report_prompt(
    job_role: &str,
    profile_summary: &str,
    avg_scores: &str,
    red_flags: &[String],
    positive_signs: &[String],
) -> String {
    let concerns = if red_flags.is_empty() {
        "None noted".to_string()
    } else {
        red_flags.join(", ")
    };
    let positives = if positive_signs.is_empty() {
        "Several positive indicators".to_string()
    } else {
        positive_signs.join(", ")
    };

    format!(
        r#"Generate a professional interview assessment for a {job_role} candidate.

Candidate Profile:
{profile_summary}

Average Scores: {avg_scores}
Concerns: {concerns}
Positives: {positives}

Provide your assessment as a JSON object with:
- recommendation: "Strong Hire", "Hire", "Maybe", or "No Hire"
- fit_score: 1-10 overall fit
- summary: 2-3 sentence assessment
- strengths: Array of key strengths
- weaknesses: Array of areas for improvement
- next_steps: Array of recommended next steps in hiring process

Respond with ONLY the JSON object."#
    )
}

fn joined_or(items: &[String], n: usize, empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
    }
}

const GREETING_BANK: &[&str] = &[
    "Hello! I'm Alex, and I'll be interviewing you today. Could you please introduce yourself and tell me about your background?",
];

const INTRODUCTION_BANK: &[&str] = &[
    "What aspects of your previous experience are most relevant to this role?",
    "Can you walk me through a project you're particularly proud of?",
    "What are you looking for in your next position?",
];

/// Indexed by difficulty level minus one.
const TECHNICAL_BANK: [&str; 5] = [
    "Can you explain a programming concept you use frequently in your work?",
    "How would you approach debugging an issue in production?",
    "Describe a technical decision you made and the trade-offs involved.",
    "How do you ensure code quality and maintainability in your projects?",
    "Describe the most complex system you've designed or significantly contributed to.",
];

const BEHAVIORAL_BANK: &[&str] = &[
    "Tell me about a time you faced a significant challenge at work. How did you handle it?",
    "Describe a situation where you had to work with a difficult team member.",
    "Tell me about a time when you received critical feedback. How did you respond?",
];

const SITUATIONAL_BANK: &[&str] = &[
    "What would you do if you discovered a critical bug right before a major release?",
    "How would you handle a situation where you had multiple urgent tasks with competing deadlines?",
    "What would you do if a teammate was struggling and falling behind on their work?",
];

const CLOSING_BANK: &[&str] = &[
    "Thank you so much for your time today. Do you have any questions for me about the role or our team?",
];

/// Closing line once the interview has ended.
pub const FAREWELL: &str = "Thank you for participating. The interview is now complete.";

/// Asked back when the answer could not be understood.
pub const CLARIFICATION: &str = "I didn't catch that. Could you please repeat?";

/// Deterministic fallback question for `(phase, difficulty)`.
///
/// `asked_in_phase` rotates through the phase's bank so consecutive
/// fallbacks in one phase do not repeat while the bank lasts.
pub fn fallback_question(phase: Phase, difficulty: u8, asked_in_phase: usize) -> &'static str {
    let bank: &[&str] = match phase {
        Phase::Greeting => GREETING_BANK,
        Phase::Introduction => INTRODUCTION_BANK,
        Phase::Technical => {
            let index = usize::from(difficulty.clamp(1, 5)) - 1;
            return TECHNICAL_BANK[index];
        }
        Phase::Behavioral => BEHAVIORAL_BANK,
        Phase::Situational => SITUATIONAL_BANK,
        Phase::Closing => CLOSING_BANK,
        Phase::Ended => return FAREWELL,
    };
    bank[asked_in_phase % bank.len()]
}
