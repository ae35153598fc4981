//! Summarization capability, usually backed by a language model.
//!
//! The manager holds an optional summarizer; every operation that uses one
//! defines its own behavior for when none is configured.

use async_trait::async_trait;

use super::error::SummarizerError;
use super::model::{DiscussionInput, MemoryEntry, RoundMemory};

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense older rounds into free-text summary.
    async fn summarize_rounds(&self, rounds: &[RoundMemory]) -> Result<String, SummarizerError>;

    /// Pull discrete facts out of raw content attributed to `source`.
    async fn extract_facts(
        &self,
        content: &str,
        source: &str,
    ) -> Result<Vec<MemoryEntry>, SummarizerError>;

    /// Condense agent contributions into key points, preserving input order.
    async fn extract_key_points(
        &self,
        discussions: &[DiscussionInput],
    ) -> Result<Vec<String>, SummarizerError>;
}
