//! Candidate profile updates and difficulty adaptation.

use crate::models::{AnswerAnalysis, CandidateProfile, ConfidenceIndicator, ExperienceLevel};

/// Difficulty bounds, inclusive.
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

/// Merge one analysis into the candidate profile.
///
/// Experience only ever moves upward. Skills and technologies are
/// deduplicated on insert by exact (case-sensitive) match.
pub fn apply(profile: &mut CandidateProfile, analysis: &AnswerAnalysis) {
    let info = &analysis.extracted_info;

    for skill in &info.skills {
        push_unique(&mut profile.skills, skill);
    }

    for tech in &info.technologies {
        push_unique(&mut profile.technologies, tech);
        if !tech.is_empty() {
            let depth = profile.depth_of_knowledge.entry(tech.clone()).or_insert(0);
            *depth = (*depth).max(analysis.technical_depth);
        }
    }

    match info.experience_level {
        Some(ExperienceLevel::Senior) if profile.experience_years.unwrap_or(0) < 5 => {
            profile.experience_years = Some(8);
        }
        Some(ExperienceLevel::Mid) if profile.experience_years.unwrap_or(0) < 3 => {
            profile.experience_years = Some(4);
        }
        Some(ExperienceLevel::Junior) if profile.experience_years.is_none() => {
            profile.experience_years = Some(1);
        }
        _ => {}
    }

    if analysis.communication >= 7 {
        profile.communication_style = "clear and articulate".to_string();
    } else if analysis.communication <= 4 {
        profile.communication_style = "needs improvement".to_string();
    }

    match info.confidence_indicator {
        Some(ConfidenceIndicator::High) => profile.confidence_level = 5,
        Some(ConfidenceIndicator::Low) => profile.confidence_level = 2,
        _ => {}
    }
}

/// Next difficulty level after an answer: up on a strong answer, down on a
/// weak one, always within [`MIN_DIFFICULTY`, `MAX_DIFFICULTY`].
pub fn adapt_difficulty(current: u8, analysis: &AnswerAnalysis) -> u8 {
    let avg = analysis.core_average();
    let next = if avg >= 8.0 {
        current.saturating_add(1)
    } else if avg <= 4.0 {
        current.saturating_sub(1)
    } else {
        current
    };
    next.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !item.is_empty() && !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
