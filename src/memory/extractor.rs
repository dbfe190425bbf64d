//! Deterministic, rule-based fact extraction from raw answer text.
//!
//! Runs on every answer regardless of whether the external analyzer
//! succeeded, so fact collection keeps working with no model at all.

use crate::models::{AnswerAnalysis, Fact, FactKind, Phase};
use once_cell::sync::Lazy;
use regex::Regex;

/// Confidence of each fact family.
const TECHNOLOGY_CONFIDENCE: f32 = 0.9;
const SKILL_CONFIDENCE: f32 = 0.7;
const EXPERIENCE_CONFIDENCE: f32 = 0.6;
const BEHAVIOR_CONFIDENCE: f32 = 0.7;
const ANALYZER_SKILL_CONFIDENCE: f32 = 0.85;
const ANALYZER_KEY_POINT_CONFIDENCE: f32 = 0.75;

/// Technology vocabulary matched by containment in the lowercased answer.
const TECHNOLOGIES: &[&str] = &[
    "python", "javascript", "typescript", "java", "c++", "c#", "go", "rust",
    "react", "angular", "vue", "nodejs", "node.js", "express", "django", "flask",
    "fastapi", "sql", "mysql", "postgresql", "mongodb", "redis", "elasticsearch",
    "aws", "azure", "gcp", "docker", "kubernetes", "jenkins", "terraform", "git",
    "linux", "rest", "graphql", "api", "microservices", "machine learning", "ml",
    "ai", "deep learning", "tensorflow", "pytorch", "html", "css", "sass",
    "webpack", "npm", "yarn",
];

static SKILL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:experienced|skilled|proficient|expert)\s+(?:in|with|at)\s+(\w+(?:\s+\w+)?)",
        r"(?:I|i)\s+(?:know|use|work with|specialize in)\s+(\w+(?:\s+\w+)?)",
        r"(?i)(?:strong|good)\s+(\w+)\s+skills",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const EXPERIENCE_LEXICON: &[(&str, &[&str])] = &[
    (
        "junior",
        &["learning", "new to", "recently started", "intern", "entry level"],
    ),
    (
        "mid",
        &["a few years", "some experience", "familiar with", "comfortable with"],
    ),
    (
        "senior",
        &["many years", "extensive experience", "led", "architected", "mentored", "expert"],
    ),
];

const BEHAVIOR_LEXICON: &[(&str, &[&str])] = &[
    ("leadership", &["led", "managed", "coordinated", "organized", "mentored"]),
    (
        "problem_solving",
        &["solved", "fixed", "resolved", "debugged", "figured out", "analyzed"],
    ),
    ("teamwork", &["team", "collaborated", "together", "group", "colleagues"]),
];

/// Rule-based extractor. Stateless; never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactExtractor;

impl FactExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract facts from one answer. The question is accepted for parity
    /// with the analyzer call but does not influence the rules.
    pub fn extract(&self, phase: Phase, _question: &str, answer: &str) -> Vec<Fact> {
        let lower = answer.to_lowercase();
        let mut facts = Vec::new();

        for tech in TECHNOLOGIES.iter().filter(|t| contains_term(&lower, t)) {
            facts.push(Fact::new(FactKind::Technology, *tech, TECHNOLOGY_CONFIDENCE, phase));
        }

        for pattern in SKILL_PATTERNS.iter() {
            for caps in pattern.captures_iter(answer) {
                if let Some(m) = caps.get(1) {
                    let skill = m.as_str().trim().to_lowercase();
                    if skill.len() > 2 {
                        facts.push(Fact::new(FactKind::Skill, skill, SKILL_CONFIDENCE, phase));
                    }
                }
            }
        }

        for (level, indicators) in EXPERIENCE_LEXICON {
            if let Some(indicator) = indicators.iter().find(|i| contains_term(&lower, i)) {
                facts.push(Fact::new(
                    FactKind::Experience,
                    format!("{}_level_indicator:{}", level, indicator),
                    EXPERIENCE_CONFIDENCE,
                    phase,
                ));
            }
        }

        if matches!(phase, Phase::Behavioral | Phase::Situational) {
            for (category, words) in BEHAVIOR_LEXICON {
                if let Some(word) = words.iter().find(|w| contains_term(&lower, w)) {
                    facts.push(Fact::new(
                        FactKind::Behavior,
                        format!("{}_indicator:{}", category, word),
                        BEHAVIOR_CONFIDENCE,
                        phase,
                    ));
                }
            }
        }

        dedup_facts(facts)
    }
}

/// Facts carried in the analyzer's structured `extracted_info`.
pub fn facts_from_analysis(analysis: &AnswerAnalysis, phase: Phase) -> Vec<Fact> {
    let info = &analysis.extracted_info;
    let skills = info
        .skills
        .iter()
        .map(|s| Fact::new(FactKind::Skill, s.clone(), ANALYZER_SKILL_CONFIDENCE, phase));
    let technologies = info
        .technologies
        .iter()
        .map(|t| Fact::new(FactKind::Technology, t.clone(), ANALYZER_SKILL_CONFIDENCE, phase));
    let key_points = info.key_points.iter().map(|k| {
        Fact::new(FactKind::KeyPoint, k.clone(), ANALYZER_KEY_POINT_CONFIDENCE, phase)
    });

    skills
        .chain(technologies)
        .chain(key_points)
        .map(Fact::from_analyzer)
        .collect()
}

/// Lexical facts first, then analyzer facts not already present.
pub fn merge_facts(lexical: Vec<Fact>, analyzer: Vec<Fact>) -> Vec<Fact> {
    let mut merged = lexical;
    merged.extend(analyzer);
    dedup_facts(merged)
}

/// Drop repeated (kind, lowercase content) pairs, keeping the first.
fn dedup_facts(facts: Vec<Fact>) -> Vec<Fact> {
    let mut seen = std::collections::HashSet::new();
    facts
        .into_iter()
        .filter(|f| seen.insert((f.kind, f.content.to_lowercase())))
        .collect()
}

/// Containment match that respects word boundaries for alphanumeric terms,
/// so "go" does not fire on "good" and "ai" does not fire on "said".
fn contains_term(haystack: &str, term: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        let starts_clean = !term.starts_with(is_word) || before.map_or(true, |c| !is_word(c));
        let ends_clean = !term.ends_with(is_word) || after.map_or(true, |c| !is_word(c));
        starts_clean && ends_clean
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedInfo, FactOrigin};

    fn contents(facts: &[Fact], kind: FactKind) -> Vec<String> {
        facts
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.content.clone())
            .collect()
    }

    #[test]
    fn test_technology_vocabulary() {
        let facts = FactExtractor::new().extract(
            Phase::Technical,
            "What stack?",
            "We run Rust services on Kubernetes with PostgreSQL and Redis.",
        );
        let techs = contents(&facts, FactKind::Technology);
        assert_eq!(techs.len(), 4);
        assert!(techs.contains(&"rust".to_string()));
        assert!(techs.contains(&"redis".to_string()));
        assert!(techs.contains(&"kubernetes".to_string()));
        assert!(techs.contains(&"postgresql".to_string()));
        assert!(!techs.contains(&"sql".to_string()));
        assert!(facts.iter().all(|f| f.origin == FactOrigin::Lexical));
    }

    #[test]
    fn test_short_terms_need_word_boundaries() {
        let facts = FactExtractor::new().extract(
            Phase::Introduction,
            "",
            "She said it was a good restaurant.",
        );
        assert!(contents(&facts, FactKind::Technology).is_empty());
    }

    #[test]
    fn test_symbol_terms_match() {
        let facts = FactExtractor::new().extract(Phase::Technical, "", "Mostly C++ and C#.");
        let techs = contents(&facts, FactKind::Technology);
        assert!(techs.contains(&"c++".to_string()));
        assert!(techs.contains(&"c#".to_string()));
    }

    #[test]
    fn test_skill_patterns() {
        let facts = FactExtractor::new().extract(
            Phase::Introduction,
            "",
            "I am experienced in distributed systems and have strong communication skills.",
        );
        let skills = contents(&facts, FactKind::Skill);
        assert!(skills.contains(&"distributed systems".to_string()));
        assert!(skills.contains(&"communication".to_string()));
        assert!(facts
            .iter()
            .filter(|f| f.kind == FactKind::Skill)
            .all(|f| f.confidence == SKILL_CONFIDENCE));
    }

    #[test]
    fn test_experience_one_indicator_per_bucket() {
        let facts = FactExtractor::new().extract(
            Phase::Introduction,
            "",
            "I have many years of extensive experience and I mentored juniors.",
        );
        let experience = contents(&facts, FactKind::Experience);
        assert_eq!(experience, vec!["senior_level_indicator:many years"]);
    }

    #[test]
    fn test_behavior_only_in_behavioral_phases() {
        let answer = "I led the team and we debugged it together.";
        let extractor = FactExtractor::new();

        let technical = extractor.extract(Phase::Technical, "", answer);
        assert!(contents(&technical, FactKind::Behavior).is_empty());

        let behavioral = extractor.extract(Phase::Behavioral, "", answer);
        assert_eq!(
            contents(&behavioral, FactKind::Behavior),
            vec![
                "leadership_indicator:led",
                "problem_solving_indicator:debugged",
                "teamwork_indicator:team",
            ]
        );
        assert!(behavioral.iter().all(|f| f.source_phase == Phase::Behavioral));
    }

    #[test]
    fn test_empty_answer_yields_nothing() {
        assert!(FactExtractor::new().extract(Phase::Technical, "Q?", "").is_empty());
    }

    #[test]
    fn test_merge_with_analyzer_facts() {
        let analysis = AnswerAnalysis {
            extracted_info: ExtractedInfo {
                skills: vec!["api design".into()],
                technologies: vec!["Rust".into()],
                key_points: vec!["owns on-call rotation".into()],
                ..ExtractedInfo::default()
            },
            ..AnswerAnalysis::default()
        };

        let lexical = FactExtractor::new().extract(Phase::Technical, "", "I write rust daily.");
        let analyzer = facts_from_analysis(&analysis, Phase::Technical);
        assert_eq!(analyzer.len(), 3);
        assert!(analyzer.iter().all(|f| f.origin == FactOrigin::Analyzer));

        let merged = merge_facts(lexical, analyzer);
        let techs: Vec<_> = merged
            .iter()
            .filter(|f| f.kind == FactKind::Technology)
            .collect();
        assert_eq!(techs.len(), 1);
        assert_eq!(techs[0].origin, FactOrigin::Lexical);
        assert_eq!(contents(&merged, FactKind::KeyPoint), vec!["owns on-call rotation"]);
    }
}
