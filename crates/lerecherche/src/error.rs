// Search errors

use thiserror::Error;

/// Errors raised before a query reaches the matcher.
///
/// Matching itself never fails; these are boundary guards and pattern
/// construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Query was empty or only whitespace
    #[error("Empty query")]
    EmptyQuery,

    /// Unquoted query shorter than the minimum length
    #[error("Query too short: at least {min} characters are required")]
    QueryTooShort {
        /// Minimum number of characters
        min: usize,
    },

    /// Query has only excluded terms
    #[error("Query has no required or optional terms")]
    NoSearchTerms,

    /// A term did not compile
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, Error>;
