//! Data model for per-subject discussion memory.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The kind of a remembered fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Fact,
    Opinion,
    Decision,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fact => write!(f, "fact"),
            Self::Opinion => write!(f, "opinion"),
            Self::Decision => write!(f, "decision"),
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fact" => Ok(Self::Fact),
            "opinion" => Ok(Self::Opinion),
            "decision" => Ok(Self::Decision),
            other => Err(format!("unknown entry kind: {other}")),
        }
    }
}

/// An atomic remembered fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub content: String,
    /// Name of the agent the fact came from.
    pub source: String,
    /// Precomputed keywords used for matching.
    pub keywords: Vec<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Importance in `[0, 1]`.
    pub weight: f64,
}

impl MemoryEntry {
    /// Create an entry stamped with a fresh id and the current time.
    ///
    /// `weight` is clamped to `[0, 1]`; NaN becomes 0.
    pub fn new(
        kind: EntryKind,
        content: impl Into<String>,
        source: impl Into<String>,
        keywords: Vec<String>,
        weight: f64,
    ) -> Self {
        let weight = if weight.is_nan() {
            0.0
        } else {
            weight.clamp(0.0, 1.0)
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            source: source.into(),
            keywords,
            timestamp: now_millis(),
            weight,
        }
    }
}

/// One completed discussion round. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMemory {
    pub round: u64,
    pub query: String,
    /// Conclusion the round arrived at.
    pub consensus: String,
    pub key_points: Vec<String>,
    pub timestamp: i64,
}

/// One agent's contribution to a discussion, input to key-point extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionInput {
    pub agent_name: String,
    pub content: String,
}

impl DiscussionInput {
    pub fn new(agent_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            content: content.into(),
        }
    }
}

/// Memory record for a single discussion subject.
///
/// `total_rounds` counts every round ever ingested; it is unaffected by
/// compression dropping rounds from `recent_rounds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMemory {
    #[serde(alias = "stock_code")]
    pub code: String,
    #[serde(alias = "stock_name")]
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_facts: Vec<MemoryEntry>,
    #[serde(default)]
    pub recent_rounds: Vec<RoundMemory>,
    #[serde(default)]
    pub total_rounds: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SubjectMemory {
    /// Fresh record with no history.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            code: code.into(),
            name: name.into(),
            summary: String::new(),
            key_facts: Vec::new(),
            recent_rounds: Vec::new(),
            total_rounds: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
