//! Roundmem Core Library
//!
//! Long-running conversational memory for independent discussion subjects.
//! Each subject accumulates rounds and facts; old rounds are compressed into
//! a running summary so storage stays bounded while relevant history remains
//! retrievable.

pub mod memory;
pub mod metrics;
pub mod obs;
pub mod telemetry;

pub use memory::{
    fallback_key_points, DiscussionInput, EntryKind, FileMemoryStore, MemoryConfig, MemoryEntry,
    MemoryError, MemoryManager, MemoryResult, MemoryStore, RelevanceScorer, RoundMemory,
    SimpleTokenizer, SubjectMemory, Summarizer, SummarizerError, Tokenizer,
};

pub use metrics::METRICS;
pub use obs::{
    emit_compress_failed, emit_compressed, emit_facts_trimmed, emit_memory_deleted,
    emit_memory_saved, emit_round_recorded, SubjectSpan,
};
pub use telemetry::init_tracing;

/// Roundmem version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
