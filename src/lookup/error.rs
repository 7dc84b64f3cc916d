//! Error taxonomy for word resolution

use thiserror::Error;

use super::schema::SchemaError;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream model unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    SchemaValidation(#[from] SchemaError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl LookupError {
    /// Stable identifier used in JSON failure responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::SchemaValidation(_) => "schema_validation",
            Self::Persistence(_) => "persistence",
        }
    }
}

/// Failure of the generative fallback tier.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Upstream(String),

    /// The client cannot make the call at all; retrying will not help.
    #[error("{0}")]
    Misconfigured(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

impl From<GenerationError> for LookupError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Upstream(msg) | GenerationError::Misconfigured(msg) => {
                Self::UpstreamUnavailable(msg)
            }
            GenerationError::Schema(e) => Self::SchemaValidation(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt stored value: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("corrupt stored value: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,
}
