// Errors raised while preparing recognition

/// Result type for recognition setup
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building recognizers or parsing keys.
///
/// Scanning text never fails; only pattern construction and explicit key
/// parsing report errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The combined mention pattern could not be compiled
    #[error("Invalid mention pattern: {0}")]
    InvalidPattern(String),

    /// A composite key string was malformed
    #[error("Invalid reference key: {0}")]
    InvalidKey(String),

    /// A lexicon identifier did not have the `G123`/`H123` shape
    #[error("Invalid lexicon identifier: {0}")]
    InvalidLexiconId(String),
}
