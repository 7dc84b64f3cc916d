//! Canonical translation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which resolution tier produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    Generated,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Generated => "generated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "generated" => Some(Self::Generated),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The path a successful lookup took. `Persisted` hits still carry
/// `Source::Generated` on the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Local,
    Persisted,
    Generated,
}

impl Tier {
    pub fn counter_name(&self) -> &'static str {
        match self {
            Self::Local => "local_hits",
            Self::Persisted => "cache_hits",
            Self::Generated => "generated_count",
        }
    }

    /// Provenance of the record this tier returns.
    pub fn source(&self) -> Source {
        match self {
            Self::Local => Source::Local,
            Self::Persisted | Self::Generated => Source::Generated,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Persisted => f.write_str("cached"),
            Self::Generated => f.write_str("generated"),
        }
    }
}

/// A fully populated dictionary entry. The field names on the wire follow
/// the client contract, hence `bengaliTranslation` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub word: String,
    #[serde(rename = "bengaliTranslation")]
    pub translated_text: String,
    pub pronunciation: String,
    pub part_of_speech: String,
    pub definition: String,
    pub examples: Vec<String>,
    pub source: Source,
    #[serde(rename = "timestamp")]
    pub resolved_at: DateTime<Utc>,
}
