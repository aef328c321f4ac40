// leparse - Reference Recognition
//
// *Le Parseur* (The Parser) - Finds Scripture citations and lexicon numbers in free text

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Reference recognition for LeVerbe.
//!
//! The crate turns arbitrary text into an ordered list of [`Span`]s. Each span
//! is either literal text or a typed mention (verse list, chapter, lexicon
//! number). Partial citations are completed from the most recent explicit
//! citation of the same scan via a [`ScanContext`].
//!
//! ```rust,ignore
//! let registry = BookRegistry::new(books);
//! let bounds = ChapterBoundMap::from_keys(verse_keys);
//! let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default())?;
//! let spans = Recognizer::new(&pattern, &registry, &bounds).scan("Rom 8:1. Also verse 2.");
//! ```

/// Book metadata and alias lookup.
pub mod book;
/// Highest verse per chapter, used to validate mentions.
pub mod bounds;
/// Crate error type.
pub mod error;
/// Lexicon (Strong's) identifiers and testament prefixes.
pub mod lexicon;
/// Combined mention pattern and its alias-list cache.
pub mod pattern;
/// Span recognizer over text fragments.
pub mod recognizer;
/// Composite verse and chapter keys.
pub mod reference;
/// Citation completion and verse queries.
pub mod resolver;
/// Verse list normalisation.
pub mod verse_list;
/// Configurable words for relative citations.
pub mod vocabulary;

pub use book::{Book, BookRecord, BookRegistry, PrefixMatch};
pub use bounds::ChapterBoundMap;
pub use error::{Error, Result};
pub use lexicon::{LexiconId, Testament, TestamentBoundary};
pub use pattern::{build_mention_pattern, MentionPattern, PatternCache};
pub use recognizer::{Recognizer, Span, SpanKind};
pub use reference::{ChapterKey, VerseKey};
pub use resolver::{ReferenceResolver, ScanContext};
pub use verse_list::parse_verse_list;
pub use vocabulary::ImplicitVocabulary;

/// Parser library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
