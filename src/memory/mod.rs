//! Interview memory: fact extraction and the fact store.
//!
//! The store is an external collaborator behind the [`MemoryStore`] trait.
//! [`KeywordMemoryStore`] is the in-process implementation shipped with the
//! binary; it ranks facts by token overlap with the query.

pub mod extractor;

pub use extractor::{facts_from_analysis, merge_facts, FactExtractor};

use crate::error::CollaboratorError;
use crate::models::{Fact, FactKind, Phase};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// Result type for memory operations.
pub type MemoryResult<T> = Result<T, CollaboratorError>;

/// A fact as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFact {
    pub id: String,
    pub session_id: String,
    pub phase: Phase,
    pub kind: FactKind,
    pub content: String,
    pub confidence: f32,
}

/// Session-scoped fact storage with relevance lookup.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store facts for a session and return their ids.
    async fn append(&self, session_id: &str, phase: Phase, facts: &[Fact])
        -> MemoryResult<Vec<String>>;

    /// Facts of a session most relevant to `query`, best first.
    async fn query(&self, session_id: &str, query: &str, top_k: usize)
        -> MemoryResult<Vec<StoredFact>>;

    /// Forget everything stored for a session.
    async fn clear(&self, session_id: &str) -> MemoryResult<bool>;
}

/// Render retrieved facts as a prompt context block.
pub fn format_context(facts: &[StoredFact]) -> String {
    if facts.is_empty() {
        return String::new();
    }
    let mut context = String::from("Relevant information from the interview so far:\n");
    for fact in facts {
        context.push_str(&format!("- {}\n", fact.content));
    }
    context.trim_end().to_string()
}

/// Retrieval query for a phase, optionally narrowed to a topic.
pub fn context_query(phase: Phase, topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!("{} interview topic: {}", phase.as_str(), topic),
        None => format!("{} interview context", phase.as_str()),
    }
}

#[derive(Default)]
struct SessionFacts {
    facts: Vec<StoredFact>,
    next_id: u64,
}

/// In-process store ranking facts by token overlap with the query.
pub struct KeywordMemoryStore {
    max_facts_per_session: usize,
    sessions: RwLock<HashMap<String, SessionFacts>>,
}

impl KeywordMemoryStore {
    pub fn new(max_facts_per_session: usize) -> Self {
        Self {
            max_facts_per_session: max_facts_per_session.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn fact_count(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map_or(0, |s| s.facts.len())
    }
}

impl Default for KeywordMemoryStore {
    fn default() -> Self {
        Self::new(500)
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
        .collect()
}

fn relevance(query_tokens: &HashSet<String>, fact: &StoredFact) -> f32 {
    let mut fact_tokens = tokens(&fact.content);
    fact_tokens.insert(fact.phase.as_str().to_string());
    fact_tokens.insert(fact.kind.as_str().to_string());
    let overlap = query_tokens.intersection(&fact_tokens).count() as f32;
    overlap + fact.confidence * 0.1
}

#[async_trait]
impl MemoryStore for KeywordMemoryStore {
    async fn append(
        &self,
        session_id: &str,
        phase: Phase,
        facts: &[Fact],
    ) -> MemoryResult<Vec<String>> {
        if facts.is_empty() {
            return Ok(Vec::new());
        }

        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(session_id.to_string()).or_default();

        let mut ids = Vec::with_capacity(facts.len());
        for fact in facts {
            let id = format!("{}_{}_{}", session_id, phase.as_str(), entry.next_id);
            entry.next_id += 1;
            entry.facts.push(StoredFact {
                id: id.clone(),
                session_id: session_id.to_string(),
                phase,
                kind: fact.kind,
                content: fact.content.clone(),
                confidence: fact.confidence,
            });
            ids.push(id);
        }

        let overflow = entry.facts.len().saturating_sub(self.max_facts_per_session);
        if overflow > 0 {
            entry.facts.drain(..overflow);
        }

        debug!(session_id, stored = ids.len(), "Stored facts");
        Ok(ids)
    }

    async fn query(
        &self,
        session_id: &str,
        query: &str,
        top_k: usize,
    ) -> MemoryResult<Vec<StoredFact>> {
        let sessions = self.sessions.read().await;
        let Some(entry) = sessions.get(session_id) else {
            return Ok(Vec::new());
        };

        let query_tokens = tokens(query);
        let mut ranked: Vec<(f32, usize, &StoredFact)> = entry
            .facts
            .iter()
            .enumerate()
            .map(|(i, f)| (relevance(&query_tokens, f), i, f))
            .collect();

        // Best score first; ties go to the most recent fact.
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|(_, _, f)| f.clone())
            .collect())
    }

    async fn clear(&self, session_id: &str) -> MemoryResult<bool> {
        let removed = self.sessions.write().await.remove(session_id);
        Ok(removed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(kind: FactKind, content: &str) -> Fact {
        Fact::new(kind, content, 0.9, Phase::Technical)
    }

    #[tokio::test]
    async fn test_append_assigns_ids() {
        let store = KeywordMemoryStore::default();
        let ids = store
            .append(
                "s1",
                Phase::Technical,
                &[fact(FactKind::Technology, "rust"), fact(FactKind::Skill, "testing")],
            )
            .await
            .unwrap();
        assert_eq!(ids, vec!["s1_technical_0", "s1_technical_1"]);
        assert_eq!(store.fact_count("s1").await, 2);

        let empty = store.append("s1", Phase::Technical, &[]).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_query_ranks_by_overlap() {
        let store = KeywordMemoryStore::default();
        store
            .append(
                "s1",
                Phase::Introduction,
                &[
                    fact(FactKind::KeyPoint, "moved from support to backend work"),
                    fact(FactKind::Technology, "kubernetes"),
                    fact(FactKind::KeyPoint, "migrated billing to kubernetes clusters"),
                ],
            )
            .await
            .unwrap();

        let results = store.query("s1", "kubernetes clusters", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "migrated billing to kubernetes clusters");
        assert_eq!(results[1].content, "kubernetes");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = KeywordMemoryStore::default();
        store
            .append("a", Phase::Technical, &[fact(FactKind::Technology, "go")])
            .await
            .unwrap();

        assert!(store.query("b", "go", 5).await.unwrap().is_empty());
        assert!(!store.clear("b").await.unwrap());
        assert!(store.clear("a").await.unwrap());
        assert_eq!(store.fact_count("a").await, 0);
    }

    #[tokio::test]
    async fn test_per_session_cap_drops_oldest() {
        let store = KeywordMemoryStore::new(2);
        for name in ["one", "two", "three"] {
            store
                .append("s", Phase::Technical, &[fact(FactKind::KeyPoint, name)])
                .await
                .unwrap();
        }
        let all = store.query("s", "", 10).await.unwrap();
        let contents: Vec<_> = all.iter().map(|f| f.content.as_str()).collect();
        assert_eq!(contents, vec!["three", "two"]);
    }

    #[test]
    fn test_context_formatting() {
        assert_eq!(format_context(&[]), "");
        let facts = vec![StoredFact {
            id: "s_technical_0".into(),
            session_id: "s".into(),
            phase: Phase::Technical,
            kind: FactKind::Technology,
            content: "rust".into(),
            confidence: 0.9,
        }];
        assert_eq!(
            format_context(&facts),
            "Relevant information from the interview so far:\n- rust"
        );
        assert_eq!(
            context_query(Phase::Technical, Some("caching")),
            "technical interview topic: caching"
        );
        assert_eq!(context_query(Phase::Closing, None), "closing interview context");
    }
}
