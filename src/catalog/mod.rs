//! Topic catalog: content records, category aggregation, index and queries.
//!
//! ```text
//! content modules ──► Category ──► master catalog ──► CatalogIndex ──► query::evaluate
//!   (Vec<Topic>)     (concat)       (concat)          (built once)      (per input)
//! ```
//!
//! Everything here is pure and synchronous. The index is immutable once
//! built; queries borrow it.

pub mod content;
pub mod index;
pub mod query;

pub use index::CatalogIndex;
pub use query::{DifficultyFilter, ProgressFilter, Query};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable topic key, used for lookup, persistence and links.
pub type TopicId = String;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate topic id '{id}'")]
    DuplicateId { id: TopicId },
}

// ── Difficulty ────────────────────────────────────────────────────────────────

/// Ordered difficulty level. Unknown strings fail deserialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

// ── Topic ─────────────────────────────────────────────────────────────────────

/// A titled code sample attached to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    pub title: String,
    pub code: String,
}

/// One educational article.
///
/// `related_topics` and `next_topic_id` are weak references: they are
/// resolved through [`CatalogIndex`] on demand and may dangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    #[serde(default)]
    pub additional_description: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Matched as a set; kept in authored order for display.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<CodeExample>,
    #[serde(default)]
    pub related_topics: Vec<TopicId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_topic_id: Option<TopicId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_frontend_essential: Option<bool>,
}

impl Topic {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

// ── Category aggregation ──────────────────────────────────────────────────────

/// Named, ordered grouping of topics for browsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub topics: Vec<Topic>,
}

impl Category {
    /// Concatenate independently authored topic lists into one category.
    ///
    /// Order is the concatenation order; nothing is deduplicated or validated.
    pub fn from_modules<I>(name: impl Into<String>, modules: I) -> Self
    where
        I: IntoIterator<Item = Vec<Topic>>,
    {
        Self {
            name: name.into(),
            topics: modules.into_iter().flatten().collect(),
        }
    }
}

/// Flatten categories into the master catalog, preserving category order.
///
/// Uniqueness is checked later by [`CatalogIndex::build`].
pub fn aggregate(categories: &[Category]) -> Vec<Topic> {
    categories
        .iter()
        .flat_map(|c| c.topics.iter().cloned())
        .collect()
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Minimal topic for tests: empty body, no links.
#[cfg(test)]
pub(crate) fn test_topic(id: &str, title: &str, difficulty: Difficulty, tags: &[&str]) -> Topic {
    Topic {
        id: id.into(),
        title: title.into(),
        difficulty,
        description: String::new(),
        additional_description: String::new(),
        key_points: Vec::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        examples: Vec::new(),
        related_topics: Vec::new(),
        next_topic_id: None,
        fun_fact: None,
        is_frontend_essential: None,
    }
}
