// lelien - Reference Linking
//
// *Le Lien* (The Link) - Turns recognized mentions into navigable rich text

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Rich-text annotation for LeVerbe.
//!
//! `lelien` sits between the recognizer of [`leparse`] and storage: it walks
//! rendered HTML, leaves anchors and scripts alone, rewrites the structured
//! `B:`/`S:` links of imported material, embeds media links, marks verse,
//! chapter and lexicon mentions, and links free words that a dictionary
//! defines. The result of one pass is an [`Annotation`].
//!
//! Verse texts with lexicon markers (`<S>26</S>`) and words-of-Jesus markup
//! are handled separately by [`verse_text`].

/// Single-pass annotation of rich text.
pub mod annotator;
/// Dictionary sources, topic resolution and the word index.
pub mod dictionary;
/// `B:` and `S:` structured links.
pub mod links;
/// Authoring markup to rich text.
pub mod markdown;
/// Minimal HTML tokenizer and text escaping.
pub mod markup;
/// Media embedding and file resources.
pub mod media;
/// Plain-text projection of rich text.
pub mod plain;
/// Markup for recognized mentions.
pub mod render;
/// Suffix stripping for dictionary words.
pub mod stemming;
/// Verse text markers.
pub mod verse_text;

pub use annotator::{
    Annotation, Annotator, ChapterLink, ContentFlags, DictionaryMention, LexiconMention, VerseLink,
};
pub use dictionary::{DictionaryCatalog, DictionarySource, DictionaryTopic, DictionaryWordIndex};
pub use links::{parse_structured_link, LinkTarget};
pub use markdown::{HtmlPassthrough, MarkdownRenderer, MarkupRenderer};
pub use media::{MediaEmbed, MediaKind, Resource};
pub use plain::plain_text;
pub use stemming::{LinkerConfig, WordMatcher};
pub use verse_text::{lexicon_markers, render_verse_html, segment_verse_text, verse_plain_text, VerseSegment};

/// Linking library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
