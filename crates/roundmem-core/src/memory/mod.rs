//! Memory subsystem for per-subject discussion history.
//!
//! Provides the subject memory data model, keyword relevance scoring with
//! time decay, a cached file-backed record store, and the lifecycle manager
//! that compresses old rounds into a bounded running summary.

pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod relevance;
pub mod store;
pub mod summarizer;
pub mod tokenizer;

pub use config::MemoryConfig;
pub use error::{MemoryError, MemoryResult, SummarizerError};
pub use manager::{fallback_key_points, MemoryManager};
pub use model::{DiscussionInput, EntryKind, MemoryEntry, RoundMemory, SubjectMemory};
pub use relevance::{score, score_at, time_decay, RelevanceScorer};
pub use store::{FileMemoryStore, MemoryStore};
pub use summarizer::Summarizer;
pub use tokenizer::{SimpleTokenizer, Tokenizer};
