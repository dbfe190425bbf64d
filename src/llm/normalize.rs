//! Normalization of raw generator output into interviewer speech.
//!
//! Cleaning is an explicit, ordered list of [`Rule`]s. Each rule is a pure
//! `&str -> String` transformation with its own tests. Validation runs after
//! cleaning and either accepts the text or names the [`Rejection`].

use crate::error::Rejection;
use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest acceptable interviewer utterance, in characters.
pub const MIN_QUESTION_CHARS: usize = 10;

/// Fewest words a salvaged question sentence may have.
const MIN_SALVAGE_WORDS: usize = 3;

/// Phrases that mean the model is answering instead of asking.
pub const ADVICE_INDICATORS: &[&str] = &[
    "you should",
    "i recommend",
    "it's important to",
    "the best time",
    "generally speaking",
    "in my experience",
    "typically",
    "it depends on",
    "you'll want to",
    "you need to",
    "here's what",
    "let me explain",
    "the answer is",
];

/// Fragments of chain-of-thought that must never reach the candidate.
pub const REASONING_MARKERS: &[&str] = &[
    "hink>",
    "<think",
    "okay,",
    "alright,",
    "let me",
    "i need to",
    "i should",
    "looking at",
    "based on",
    "the candidate",
    "they said",
    "my reasoning",
    "first i",
    "then i",
    "so i",
    "considering",
];

const QUESTION_WORDS: &[&str] = &[
    "what", "how", "why", "can", "could", "would", "tell", "describe", "explain", "when",
    "where", "who",
];

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<\|?think\|?>.*?</\|?think\|?>").expect("valid regex"));
static THINK_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<\|?think\|?>.*$").expect("valid regex"));
static THINK_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^.*</\|?think\|?>").expect("valid regex"));
static THINK_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?\s*t?hink\s*>").expect("valid regex"));

static STARTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:hello[,!]?\s|hi[,!]?\s|good\s+(?:morning|afternoon|evening)|welcome[,!]?\s|thank\s+you|great[,!]?\s|that'?s?\s+(?:great|interesting|good)|could\s+you|can\s+you|would\s+you|tell\s+me|please\s+(?:tell|describe|explain)|what\s+(?:is|are|do|did|would|made|brings|drew)|how\s+(?:do|did|would|have)|why\s+(?:do|did|would|are)|describe\s|explain\s|walk\s+me|share\s|i'?m\s+alex|nice\s+to\s+meet)",
    )
    .expect("valid regex")
});

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]*\*").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static QUESTION_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]*\?").expect("valid regex"));

/// One cleaning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Remove `<think>..</think>` blocks, reasoning before a stray closing
    /// tag, everything after an unclosed opening tag, and tag fragments.
    StripThinkBlocks,
    /// Remove quotes wrapping the whole text.
    StripQuotes,
    /// Drop any preamble before the first interviewer starter phrase.
    TrimToStarter,
    /// Remove `(..)`, `[..]` and `*..*` asides.
    DropAsides,
    CollapseWhitespace,
}

/// Cleaning rules in application order. Quotes go before the starter trim,
/// which would otherwise cut the opening quote and leave the closing one.
pub const RULES: [Rule; 5] = [
    Rule::StripThinkBlocks,
    Rule::StripQuotes,
    Rule::TrimToStarter,
    Rule::DropAsides,
    Rule::CollapseWhitespace,
];

impl Rule {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Rule::StripThinkBlocks => {
                let text = THINK_BLOCK.replace_all(text, "");
                let text = THINK_CLOSE.replace(&text, "");
                let text = THINK_OPEN.replace(&text, "");
                THINK_FRAGMENT.replace_all(&text, "").into_owned()
            }
            Rule::TrimToStarter => match STARTER.find(text) {
                Some(m) => text[m.start()..].to_string(),
                None => text.to_string(),
            },
            Rule::DropAsides => {
                let text = PARENTHETICAL.replace_all(text, "");
                let text = BRACKETED.replace_all(&text, "");
                EMPHASIS.replace_all(&text, "").into_owned()
            }
            Rule::CollapseWhitespace => WHITESPACE.replace_all(text, " ").trim().to_string(),
            Rule::StripQuotes => {
                let trimmed = text.trim();
                for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
                    if trimmed.len() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
                        let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
                        return inner.trim().to_string();
                    }
                }
                trimmed.to_string()
            }
        }
    }
}

/// Apply every rule in order.
pub fn clean(raw: &str) -> String {
    RULES.iter().fold(raw.to_string(), |text, rule| rule.apply(&text))
}

/// Decide whether cleaned text is acceptable interviewer speech.
pub fn check(text: &str) -> Result<(), Rejection> {
    if text.trim().is_empty() {
        return Err(Rejection::Empty);
    }

    let len = text.chars().count();
    if len < MIN_QUESTION_CHARS {
        return Err(Rejection::TooShort(len));
    }

    let lower = text.to_lowercase();
    if let Some(marker) = REASONING_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(Rejection::ReasoningLeak(marker.to_string()));
    }

    // A question that happens to contain an advice phrase is still a question.
    if !text.contains('?') {
        if let Some(indicator) = ADVICE_INDICATORS.iter().find(|i| lower.contains(*i)) {
            return Err(Rejection::Advice(indicator.to_string()));
        }
    }

    Ok(())
}

/// First question sentence with at least three words.
pub fn first_question(text: &str) -> Option<String> {
    QUESTION_SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|q| q.split_whitespace().count() >= MIN_SALVAGE_WORDS)
        .map(String::from)
}

/// Full pipeline: clean, validate, salvage a question sentence if the whole
/// text is rejected, then ensure terminal punctuation.
pub fn clean_question(raw: &str) -> Result<String, Rejection> {
    let cleaned = clean(raw);

    let accepted = match check(&cleaned) {
        Ok(()) => cleaned,
        Err(rejection) => {
            let without_reasoning = Rule::StripThinkBlocks.apply(raw);
            let salvaged = first_question(&without_reasoning)
                .map(|q| clean(&q))
                .filter(|q| check(q).is_ok());
            match salvaged {
                Some(q) => q,
                None => return Err(rejection),
            }
        }
    };

    Ok(ensure_terminal_punctuation(accepted))
}

fn ensure_terminal_punctuation(mut text: String) -> String {
    if text.ends_with(['?', '!', '.']) {
        return text;
    }
    let lower = text.to_lowercase();
    if QUESTION_WORDS.iter().any(|w| lower.starts_with(w)) {
        text.push('?');
    } else {
        text.push('.');
    }
    text
}

/// First balanced `{...}` object in `text`, skipping braces inside strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
