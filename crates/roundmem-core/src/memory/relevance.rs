//! Keyword-overlap relevance scoring with importance weighting and time decay.

use std::sync::Arc;

use super::model::{now_millis, MemoryEntry};
use super::tokenizer::Tokenizer;

/// Keywords pulled from a query before falling back to full segmentation.
pub const QUERY_KEYWORDS: usize = 10;

/// Facts scoring at or below this are never returned.
pub const MIN_RELEVANCE: f64 = 0.1;

const MIN_EFFECTIVE_WEIGHT: f64 = 0.5;
const DECAY_GRACE_DAYS: f64 = 7.0;
const DECAY_PER_DAY: f64 = 0.05;
const DECAY_FLOOR: f64 = 0.3;
const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Decay multiplier for something `age_days` old.
///
/// Full weight for the first week, then 5% less per day down to 0.3.
pub fn time_decay(age_days: f64) -> f64 {
    if age_days <= DECAY_GRACE_DAYS {
        return 1.0;
    }
    (1.0 - DECAY_PER_DAY * (age_days - DECAY_GRACE_DAYS)).max(DECAY_FLOOR)
}

/// Score `entry` against `query_keywords` as of `now` (epoch millis).
///
/// Each query keyword contributes up to two matches: one for containment
/// (either direction) with any entry keyword, one for appearing in the
/// entry content.
pub fn score_at(query_keywords: &[String], entry: &MemoryEntry, now: i64) -> f64 {
    if query_keywords.is_empty() {
        return 0.0;
    }

    let mut matches = 0usize;
    for qk in query_keywords {
        if entry
            .keywords
            .iter()
            .any(|fk| fk.contains(qk.as_str()) || qk.contains(fk.as_str()))
        {
            matches += 1;
        }
        if entry.content.contains(qk.as_str()) {
            matches += 1;
        }
    }

    let base = matches as f64 / (query_keywords.len() * 2) as f64;
    let weight = entry.weight.max(MIN_EFFECTIVE_WEIGHT);
    let age_days = now.saturating_sub(entry.timestamp) as f64 / MILLIS_PER_DAY;

    base * weight * time_decay(age_days)
}

/// Score `entry` against `query_keywords` as of the current time.
pub fn score(query_keywords: &[String], entry: &MemoryEntry) -> f64 {
    score_at(query_keywords, entry, now_millis())
}

/// Ranks stored facts against free-text queries.
#[derive(Clone)]
pub struct RelevanceScorer {
    tokenizer: Arc<dyn Tokenizer>,
}

impl RelevanceScorer {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// Keywords used to match `query`: top keywords, or the full
    /// segmentation when extraction yields nothing.
    pub fn query_keywords(&self, query: &str) -> Vec<String> {
        let keywords = self.tokenizer.extract_keywords(query, QUERY_KEYWORDS);
        if keywords.is_empty() {
            self.tokenizer.segment(query)
        } else {
            keywords
        }
    }

    /// Up to `limit` facts relevant to `query`, best first.
    ///
    /// Equal scores keep their original relative order.
    pub fn find_relevant(
        &self,
        facts: &[MemoryEntry],
        query: &str,
        limit: usize,
    ) -> Vec<MemoryEntry> {
        if facts.is_empty() || limit == 0 {
            return Vec::new();
        }

        let keywords = self.query_keywords(query);
        if keywords.is_empty() {
            return Vec::new();
        }

        let now = now_millis();
        let mut scored: Vec<(&MemoryEntry, f64)> = facts
            .iter()
            .map(|fact| (fact, score_at(&keywords, fact, now)))
            .filter(|(_, s)| *s > MIN_RELEVANCE)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(limit)
            .map(|(fact, _)| fact.clone())
            .collect()
    }
}

impl std::fmt::Debug for RelevanceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceScorer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::model::EntryKind;
    use crate::memory::tokenizer::SimpleTokenizer;

    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn fact(content: &str, keywords: &[&str], weight: f64, timestamp: i64) -> MemoryEntry {
        MemoryEntry {
            id: content.to_string(),
            kind: EntryKind::Fact,
            content: content.to_string(),
            source: "analyst".to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            timestamp,
            weight,
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_keywords_score_zero() {
        let f = fact("revenue up", &["revenue"], 1.0, 0);
        assert_eq!(score_at(&[], &f, 0), 0.0);
    }

    #[test]
    fn test_full_match_scores_one() {
        let f = fact("revenue up", &["revenue"], 1.0, 0);
        assert_eq!(score_at(&kw(&["revenue"]), &f, 0), 1.0);
    }

    #[test]
    fn test_keyword_containment_both_directions() {
        // "rev" is contained in fact keyword "revenue"; no content hit.
        let f = fact("sales grew", &["revenue"], 1.0, 0);
        assert_eq!(score_at(&kw(&["rev"]), &f, 0), 0.5);
        // query keyword contains fact keyword "rev".
        let g = fact("sales grew", &["rev"], 1.0, 0);
        assert_eq!(score_at(&kw(&["revenue"]), &g, 0), 0.5);
    }

    #[test]
    fn test_keyword_list_counts_once_per_query_keyword() {
        let f = fact("nothing here", &["margin", "margins", "gross margin"], 1.0, 0);
        assert_eq!(score_at(&kw(&["margin"]), &f, 0), 0.5);
    }

    #[test]
    fn test_weight_floor() {
        let f = fact("revenue", &["revenue"], 0.1, 0);
        assert_eq!(score_at(&kw(&["revenue"]), &f, 0), 0.5);
        let g = fact("revenue", &["revenue"], 0.8, 0);
        assert_eq!(score_at(&kw(&["revenue"]), &g, 0), 0.8);
    }

    #[test]
    fn test_time_decay_curve() {
        assert_eq!(time_decay(0.0), 1.0);
        assert_eq!(time_decay(7.0), 1.0);
        assert!((time_decay(9.0) - 0.9).abs() < 1e-9);
        assert!((time_decay(17.0) - 0.5).abs() < 1e-9);
        assert_eq!(time_decay(30.0), 0.3);
        assert_eq!(time_decay(10_000.0), 0.3);
        // future timestamps are not penalised
        assert_eq!(time_decay(-3.0), 1.0);
    }

    #[test]
    fn test_extreme_timestamp_clamps_to_floor() {
        let f = fact("revenue up", &["revenue"], 1.0, i64::MIN);
        let s = score_at(&kw(&["revenue"]), &f, 1_700_000_000_000);
        assert!((s - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_fresh_heavy_beats_old_light() {
        let now = 100 * DAY;
        let fresh = fact("revenue up", &["revenue"], 1.0, now);
        let stale = fact("revenue up", &["revenue"], 0.1, now - 30 * DAY);
        let q = kw(&["revenue", "margin"]);
        assert!(score_at(&q, &fresh, now) >= score_at(&q, &stale, now));
    }

    #[test]
    fn test_find_relevant_filters_sorts_and_limits() {
        let scorer = RelevanceScorer::new(Arc::new(SimpleTokenizer::new()));
        let now = now_millis();
        let facts = vec![
            fact("dividend raised", &["dividend"], 1.0, now),
            fact("revenue up strongly", &["revenue"], 0.6, now),
            fact("revenue margin both improved", &["revenue", "margin"], 1.0, now),
            fact("unrelated note", &["weather"], 1.0, now),
        ];

        let hits = scorer.find_relevant(&facts, "revenue margin", 5);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["revenue margin both improved", "revenue up strongly"]);

        let hits = scorer.find_relevant(&facts, "revenue margin", 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_find_relevant_stable_on_ties() {
        let scorer = RelevanceScorer::new(Arc::new(SimpleTokenizer::new()));
        let now = now_millis();
        let facts = vec![
            fact("first revenue", &["revenue"], 1.0, now),
            fact("second revenue", &["revenue"], 1.0, now),
            fact("third revenue", &["revenue"], 1.0, now),
        ];
        let hits = scorer.find_relevant(&facts, "revenue", 10);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["first revenue", "second revenue", "third revenue"]);
    }

    #[test]
    fn test_find_relevant_empty_inputs() {
        let scorer = RelevanceScorer::new(Arc::new(SimpleTokenizer::new()));
        assert!(scorer.find_relevant(&[], "revenue", 5).is_empty());

        let facts = vec![fact("revenue", &["revenue"], 1.0, now_millis())];
        // Only stopwords: no effective keywords.
        assert!(scorer.find_relevant(&facts, "the of a", 5).is_empty());
    }
}
