// lerecherche - Note Search
//
// *La Recherche* (The Search) - Boolean and phrase queries over verses and entries with highlighted snippets

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Search layer of LeVerbe.
//!
//! A query string is compiled once into required, optional and excluded
//! terms ([`compile`]), evaluated against the searchable projection of each
//! document, and every hit is cut into a highlighted excerpt by the
//! [`SnippetBuilder`]. The [`SearchEngine`] adds the boundary guards,
//! filters and pagination.

/// Search error type.
pub mod error;
/// Query compiler and matcher.
pub mod query;
/// Search engine over documents.
pub mod search;
/// Highlighted excerpts.
pub mod snippet;

pub use error::{Error, Result};
pub use query::{compile, CompiledQuery, SearchableText, Term, TermRole};
pub use search::{
    DocumentKind, SearchConfig, SearchDocument, SearchEngine, SearchFilter, SearchHit, SearchPage, TestamentFilter,
};
pub use snippet::{SnippetBuilder, SnippetConfig};

/// Search library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
