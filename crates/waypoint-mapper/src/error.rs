//! Error types for the mapper crate.

use thiserror::Error;

/// Errors raised while registering a route.
///
/// Matching never fails: a path that fits no route simply yields `None`.
#[derive(Debug, Error)]
pub enum MapperError {
    /// A `:name` or `*name` segment has an empty or non-identifier name.
    #[error("invalid segment name '{0}' (expected [A-Za-z_][A-Za-z0-9_]*)")]
    InvalidSegmentName(String),

    /// A pattern declares more than one `*name` wildcard.
    #[error("pattern '{0}' declares more than one wildcard segment")]
    MisplacedWildcard(String),

    /// A per-segment rule is not a valid regular expression.
    #[error("invalid rule for segment '{name}': {source}")]
    InvalidRule {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// The compiled route expression was rejected by the regex engine.
    #[error("invalid route pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for mapper operations.
pub type Result<T> = std::result::Result<T, MapperError>;
