//! Bounds that keep a subject's memory from growing without limit.

use serde::{Deserialize, Serialize};

use super::error::{MemoryError, MemoryResult};

/// Memory lifecycle configuration, fixed for the lifetime of a manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Rounds kept verbatim after compression.
    pub max_recent_rounds: usize,
    /// Facts kept per subject (oldest dropped first).
    pub max_key_facts: usize,
    /// Character budget for the running summary; merged summaries may reach twice this.
    pub max_summary_length: usize,
    /// Recent-round count that triggers a compression check.
    pub compress_threshold: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_recent_rounds: 3,
            max_key_facts: 20,
            max_summary_length: 300,
            compress_threshold: 5,
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> MemoryResult<()> {
        if self.compress_threshold == 0 {
            return Err(MemoryError::InvalidConfig(
                "compress_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_max_recent_rounds(mut self, n: usize) -> Self {
        self.max_recent_rounds = n;
        self
    }

    pub fn with_max_key_facts(mut self, n: usize) -> Self {
        self.max_key_facts = n;
        self
    }

    pub fn with_max_summary_length(mut self, n: usize) -> Self {
        self.max_summary_length = n;
        self
    }

    pub fn with_compress_threshold(mut self, n: usize) -> Self {
        self.compress_threshold = n;
        self
    }
}
