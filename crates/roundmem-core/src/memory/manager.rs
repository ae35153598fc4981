//! Memory lifecycle: context assembly, round ingestion, compression and fact bounding.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::instrument;

use super::config::MemoryConfig;
use super::error::{MemoryError, MemoryResult};
use super::model::{now_millis, DiscussionInput, MemoryEntry, RoundMemory, SubjectMemory};
use super::relevance::RelevanceScorer;
use super::store::{FileMemoryStore, MemoryStore};
use super::summarizer::Summarizer;
use super::tokenizer::{SimpleTokenizer, Tokenizer};
use crate::metrics::METRICS;
use crate::obs::{
    emit_compress_failed, emit_compressed, emit_facts_trimmed, emit_memory_deleted,
    emit_memory_saved, emit_round_recorded, SubjectSpan,
};

/// Facts included in an assembled context.
pub const CONTEXT_FACT_LIMIT: usize = 5;

/// Characters of agent content kept by the fallback key-point extractor.
pub const KEY_POINT_CHARS: usize = 80;

const SUMMARY_HEADER: &str = "[History Summary]";
const FACTS_HEADER: &str = "[Relevant Facts]";
const ROUNDS_HEADER: &str = "[Recent Discussion]";
const SUMMARY_SEPARATOR: &str = "\n";

fn format_millis(millis: i64, fmt: &str) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(ts) => ts.with_timezone(&Local).format(fmt).to_string(),
        None => millis.to_string(),
    }
}

/// Keep the last `max_chars` characters of `s`.
fn tail_chars(s: &str, max_chars: usize) -> &str {
    let len = s.chars().count();
    if len <= max_chars {
        return s;
    }
    match s.char_indices().nth(len - max_chars) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Key points without a summarizer: `"<agent>: <content>"`, content cut to
/// [`KEY_POINT_CHARS`] characters with a trailing `...` when longer.
pub fn fallback_key_points(discussions: &[DiscussionInput]) -> Vec<String> {
    discussions
        .iter()
        .map(|d| {
            let content = if d.content.chars().count() > KEY_POINT_CHARS {
                let head: String = d.content.chars().take(KEY_POINT_CHARS).collect();
                format!("{head}...")
            } else {
                d.content.clone()
            };
            format!("{}: {}", d.agent_name, content)
        })
        .collect()
}

/// Orchestrates the lifecycle of per-subject memory records.
///
/// Records handed out by [`get_or_create`](Self::get_or_create) are owned
/// copies. Concurrent writers to the same subject race with last-writer-wins
/// semantics; serialize them externally if that matters.
pub struct MemoryManager {
    config: MemoryConfig,
    store: Arc<dyn MemoryStore>,
    tokenizer: Arc<dyn Tokenizer>,
    relevance: RelevanceScorer,
    summarizer: Option<Arc<dyn Summarizer>>,
    closed: AtomicBool,
}

impl MemoryManager {
    /// File-backed manager under `data_dir` with default configuration and
    /// no summarizer.
    pub fn new(data_dir: impl AsRef<Path>) -> MemoryResult<Self> {
        Self::with_config(data_dir, MemoryConfig::default())
    }

    /// File-backed manager under `data_dir` with a custom configuration.
    pub fn with_config(data_dir: impl AsRef<Path>, config: MemoryConfig) -> MemoryResult<Self> {
        let store = Arc::new(FileMemoryStore::new(data_dir)?);
        Self::with_store(store, Arc::new(SimpleTokenizer::new()), config)
    }

    /// Manager over an arbitrary store and tokenizer.
    pub fn with_store(
        store: Arc<dyn MemoryStore>,
        tokenizer: Arc<dyn Tokenizer>,
        config: MemoryConfig,
    ) -> MemoryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            relevance: RelevanceScorer::new(Arc::clone(&tokenizer)),
            tokenizer,
            summarizer: None,
            closed: AtomicBool::new(false),
        })
    }

    /// Enable summarizer-backed compression and extraction.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn set_summarizer(&mut self, summarizer: Arc<dyn Summarizer>) {
        self.summarizer = Some(summarizer);
    }

    pub fn has_summarizer(&self) -> bool {
        self.summarizer.is_some()
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Load the record for `code`, or start a fresh one.
    ///
    /// Any load failure, including an unreadable record, yields a fresh
    /// record rather than an error.
    pub fn get_or_create(&self, code: &str, name: &str) -> SubjectMemory {
        match self.store.load(code) {
            Ok(shared) => Arc::unwrap_or_clone(shared),
            Err(e) => {
                if e.is_not_found() {
                    tracing::debug!(code = %code, "no stored memory, creating");
                } else {
                    tracing::warn!(code = %code, error = %e, "failed to load memory, starting fresh");
                }
                SubjectMemory::new(code, name)
            }
        }
    }

    /// Stamp `updated_at` and persist.
    pub fn save(&self, memory: &mut SubjectMemory) -> MemoryResult<()> {
        memory.updated_at = now_millis();
        self.store.save(memory)?;
        emit_memory_saved(&memory.code, memory.total_rounds);
        Ok(())
    }

    /// Assemble prompt context for `query`: running summary, relevant facts,
    /// then recent rounds. Empty sections are left out.
    pub fn build_context(&self, memory: &SubjectMemory, query: &str) -> String {
        let _span = SubjectSpan::enter(&memory.code);
        let mut out = String::new();

        if !memory.summary.is_empty() {
            out.push_str(SUMMARY_HEADER);
            out.push('\n');
            out.push_str(&memory.summary);
            out.push_str("\n\n");
        }

        let facts = self
            .relevance
            .find_relevant(&memory.key_facts, query, CONTEXT_FACT_LIMIT);
        if !facts.is_empty() {
            out.push_str(FACTS_HEADER);
            out.push('\n');
            for fact in &facts {
                let _ = writeln!(
                    out,
                    "- [{}] {}",
                    format_millis(fact.timestamp, "%Y-%m-%d"),
                    fact.content
                );
            }
            out.push('\n');
        }

        if !memory.recent_rounds.is_empty() {
            out.push_str(ROUNDS_HEADER);
            out.push('\n');
            for round in &memory.recent_rounds {
                let _ = writeln!(
                    out,
                    "[{}] Query: {}",
                    format_millis(round.timestamp, "%Y-%m-%d %H:%M"),
                    round.query
                );
                let _ = writeln!(out, "Conclusion: {}\n", round.consensus);
            }
        }

        out
    }

    /// Record a finished round, compress if the threshold is reached, and save.
    ///
    /// A compression failure is logged and otherwise ignored; only the final
    /// save can fail this call.
    #[instrument(skip_all, fields(code = %memory.code))]
    pub async fn add_round(
        &self,
        memory: &mut SubjectMemory,
        query: &str,
        consensus: &str,
        key_points: Vec<String>,
    ) -> MemoryResult<()> {
        memory.total_rounds += 1;
        memory.recent_rounds.push(RoundMemory {
            round: memory.total_rounds,
            query: query.to_string(),
            consensus: consensus.to_string(),
            key_points,
            timestamp: now_millis(),
        });
        METRICS.inc_rounds_recorded();
        emit_round_recorded(&memory.code, memory.total_rounds, memory.recent_rounds.len());

        if memory.recent_rounds.len() >= self.config.compress_threshold {
            if let Err(e) = self.compress(memory).await {
                METRICS.inc_compression_failures();
                emit_compress_failed(&memory.code, &e);
            }
        }

        self.save(memory)
    }

    /// Fold all but the last `max_recent_rounds` rounds into the summary.
    ///
    /// Without a summarizer the older rounds are simply dropped. If the
    /// summarizer fails, the record is left untouched.
    pub async fn compress(&self, memory: &mut SubjectMemory) -> MemoryResult<()> {
        let keep = self.config.max_recent_rounds;
        if memory.recent_rounds.len() <= keep {
            return Ok(());
        }
        let split = memory.recent_rounds.len() - keep;

        let summarized = match &self.summarizer {
            None => false,
            Some(summarizer) => {
                let fresh = summarizer
                    .summarize_rounds(&memory.recent_rounds[..split])
                    .await?;
                memory.summary = self.merge_summaries(&memory.summary, &fresh);
                true
            }
        };

        memory.recent_rounds.drain(..split);
        METRICS.inc_compressions();
        emit_compressed(&memory.code, split, memory.recent_rounds.len(), summarized);
        Ok(())
    }

    /// Append `new` to `old`, keeping at most twice `max_summary_length`
    /// characters; the oldest text goes first.
    pub fn merge_summaries(&self, old: &str, new: &str) -> String {
        if old.is_empty() {
            return new.to_string();
        }
        if new.is_empty() {
            return old.to_string();
        }

        let merged = format!("{old}{SUMMARY_SEPARATOR}{new}");
        tail_chars(&merged, self.config.max_summary_length * 2).to_string()
    }

    /// Append facts, then drop the oldest beyond `max_key_facts`.
    pub fn add_facts(&self, memory: &mut SubjectMemory, facts: Vec<MemoryEntry>) {
        memory.key_facts.extend(facts);

        let max = self.config.max_key_facts;
        if memory.key_facts.len() > max {
            let dropped = memory.key_facts.len() - max;
            memory.key_facts.drain(..dropped);
            METRICS.add_facts_evicted(dropped as u64);
            emit_facts_trimmed(&memory.code, dropped, memory.key_facts.len());
        }
    }

    /// Have the summarizer pull facts out of `content`, then [`add_facts`](Self::add_facts).
    ///
    /// Fails with [`MemoryError::SummarizerUnavailable`] when no summarizer is set.
    pub async fn extract_and_add_facts(
        &self,
        memory: &mut SubjectMemory,
        content: &str,
        source: &str,
    ) -> MemoryResult<()> {
        let summarizer = self
            .summarizer
            .as_ref()
            .ok_or(MemoryError::SummarizerUnavailable)?;
        let facts = summarizer.extract_facts(content, source).await?;
        self.add_facts(memory, facts);
        Ok(())
    }

    /// Key points for a set of agent contributions; falls back to
    /// [`fallback_key_points`] when no summarizer is set.
    pub async fn extract_key_points(
        &self,
        discussions: &[DiscussionInput],
    ) -> MemoryResult<Vec<String>> {
        match &self.summarizer {
            Some(summarizer) => Ok(summarizer.extract_key_points(discussions).await?),
            None => Ok(fallback_key_points(discussions)),
        }
    }

    pub fn delete_memory(&self, code: &str) -> MemoryResult<()> {
        let _span = SubjectSpan::enter(code);
        self.store.delete(code)?;
        emit_memory_deleted(code);
        Ok(())
    }

    /// Codes of every stored subject.
    pub fn list_memories(&self) -> MemoryResult<Vec<String>> {
        self.store.list()
    }

    /// Release the tokenizer. Only the first call has any effect.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.tokenizer.release();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("config", &self.config)
            .field("has_summarizer", &self.summarizer.is_some())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
