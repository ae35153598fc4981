//! Error types for the memory subsystem.

/// Errors reported by a [`Summarizer`](super::summarizer::Summarizer).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizerError {
    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Errors produced by memory operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("memory not found: {code}")]
    NotFound { code: String },

    #[error("invalid subject code: {0:?}")]
    InvalidCode(String),

    #[error("invalid memory config: {0}")]
    InvalidConfig(String),

    #[error("no summarizer configured")]
    SummarizerUnavailable,

    #[error("summarizer error: {0}")]
    Summarizer(#[from] SummarizerError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MemoryError {
    /// True when the error only means "no record exists for this code".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for memory operations.
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;
