//! Structured observability hooks for memory lifecycle events.
//!
//! This module provides:
//! - Subject-scoped tracing spans via the `SubjectSpan` RAII guard
//! - Emission functions for round ingestion, compression, saves and deletes
//!
//! Events are emitted at `info!` level except failures, which use `warn!`.

use tracing::info;

/// RAII guard that enters a subject-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = SubjectSpan::enter("600519");
/// // tracing calls made here carry code = "600519"
/// ```
pub struct SubjectSpan {
    _span: tracing::span::EnteredSpan,
}

impl SubjectSpan {
    /// Create and enter a span tagged with the subject code.
    pub fn enter(code: &str) -> Self {
        let span = tracing::info_span!("roundmem.subject", code = %code);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a discussion round was appended.
pub fn emit_round_recorded(code: &str, round: u64, recent_rounds: usize) {
    info!(
        event = "memory.round_recorded",
        code = %code,
        round = round,
        recent_rounds = recent_rounds,
    );
}

/// Emit event: older rounds were folded away.
pub fn emit_compressed(code: &str, compressed: usize, kept: usize, summarized: bool) {
    info!(
        event = "memory.compressed",
        code = %code,
        compressed = compressed,
        kept = kept,
        summarized = summarized,
    );
}

/// Emit event: compression failed and rounds were left as they were (warning level).
pub fn emit_compress_failed(code: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "memory.compress_failed", code = %code, error = %error);
}

/// Emit event: facts beyond the bound were dropped.
pub fn emit_facts_trimmed(code: &str, dropped: usize, retained: usize) {
    info!(
        event = "memory.facts_trimmed",
        code = %code,
        dropped = dropped,
        retained = retained,
    );
}

/// Emit event: a record was durably saved.
pub fn emit_memory_saved(code: &str, total_rounds: u64) {
    tracing::debug!(event = "memory.saved", code = %code, total_rounds = total_rounds);
}

/// Emit event: a record was deleted.
pub fn emit_memory_deleted(code: &str) {
    info!(event = "memory.deleted", code = %code);
}
