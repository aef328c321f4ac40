// Error Handling
//
// *La Gestion des Erreurs* (The Error Management) - Error taxonomy of the LeVerbe engine

use thiserror::Error;

/// Result type for LeVerbe operations
pub type Result<T> = std::result::Result<T, LeVerbeError>;

/// LeVerbe error types
#[derive(Debug, Error)]
pub enum LeVerbeError {
    /// Mention pattern construction or key parsing failed
    #[error("Recognition error: {0}")]
    Recognition(#[from] leparse::Error),

    /// Query was rejected
    #[error("Search error: {0}")]
    Search(#[from] lerecherche::Error),

    /// Collection store failure
    #[error("Storage error: {0}")]
    Storage(#[from] lestockage::StoreError),

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,

        /// How to fix it
        suggestion: Option<String>,
    },

    /// No entry with this id
    #[error("Entry not found: {id}")]
    EntryNotFound {
        /// Requested id
        id: String,
    },

    /// Entry refers to a book missing from the registry
    #[error("Entry {id} refers to an unknown book")]
    UnknownBook {
        /// Entry id
        id: String,
    },

    /// Text did not resolve to any verse or chapter
    #[error("No reference found in '{input}'")]
    ReferenceNotFound {
        /// Input text
        input: String,
    },

    /// No translation with this id
    #[error("Translation not found: {id}")]
    TranslationNotFound {
        /// Requested id
        id: String,
    },
}

impl LeVerbeError {
    /// Create a config error
    pub fn config_error(message: impl Into<String>, suggestion: Option<String>) -> Self {
        LeVerbeError::Config {
            message: message.into(),
            suggestion,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors concern a single request; the engine state is intact.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LeVerbeError::Search(_)
            | LeVerbeError::EntryNotFound { .. }
            | LeVerbeError::ReferenceNotFound { .. }
            | LeVerbeError::TranslationNotFound { .. } => true,
            LeVerbeError::Recognition(leparse::Error::InvalidKey(_) | leparse::Error::InvalidLexiconId(_)) => true,
            LeVerbeError::Recognition(leparse::Error::InvalidPattern(_))
            | LeVerbeError::Storage(_)
            | LeVerbeError::Config { .. }
            | LeVerbeError::UnknownBook { .. } => false,
        }
    }

    /// Get user-friendly suggestion for recovery
    pub fn suggestion(&self) -> Option<String> {
        match self {
            LeVerbeError::Config { suggestion, .. } => suggestion.clone(),
            LeVerbeError::Search(lerecherche::Error::QueryTooShort { .. }) => {
                Some("Use a longer query or quote it, e.g. \"er\".".to_string())
            }
            LeVerbeError::Search(lerecherche::Error::NoSearchTerms) => {
                Some("Add at least one term without a '-' prefix.".to_string())
            }
            LeVerbeError::Recognition(leparse::Error::InvalidPattern(_)) => {
                Some("Check the book short names and the [recognition] vocabulary.".to_string())
            }
            LeVerbeError::Recognition(leparse::Error::InvalidLexiconId(_)) => {
                Some("Lexicon ids look like G26 or H430.".to_string())
            }
            LeVerbeError::ReferenceNotFound { .. } => {
                Some("Use a key like 500-3-16 or 500-3, or a citation like 'Joh 3,16'.".to_string())
            }
            LeVerbeError::Storage(_) => Some("Check the data directory and its JSON collections.".to_string()),
            LeVerbeError::UnknownBook { .. } => Some("Add the book to books.json.".to_string()),
            _ => None,
        }
    }
}

/// Format an error with its suggestion for display
pub fn format_error(error: &LeVerbeError) -> String {
    match error.suggestion() {
        Some(suggestion) => format!("{error}\n  Suggestion: {suggestion}"),
        None => error.to_string(),
    }
}
