// Rich-text annotation
//
// *L'Annotateur* (The Annotator) - Media, structured links, mentions and dictionary words in one pass

use crate::dictionary::{DictionaryCatalog, DictionaryWordIndex};
use crate::links::{parse_structured_link, LinkTarget, BOOK_LINK_PREFIX, TOPIC_LINK_PREFIX};
use crate::markup::{decode_entities, escape_text, tokenize, SkipTracker, Tag, TagKind, Token};
use crate::media::{embed_media, extract_resources, MediaEmbed, MediaKind, Resource};
use crate::plain::plain_text;
use crate::render::{render_dictionary_link, render_mark, Mark};
use crate::stemming::{word_ranges, WordMatcher};
use leparse::{ChapterKey, LexiconId, Recognizer, ScanContext, SpanKind, VerseKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

/// Content flags of an annotated text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFlags {
    /// Contains an embedded YouTube video
    pub has_youtube: bool,

    /// Contains an embedded audio file
    pub has_audio: bool,

    /// Contains an embedded video file
    pub has_video: bool,

    /// Mentions at least one verse or chapter
    pub has_cross_reference: bool,
}

impl ContentFlags {
    /// Any embedded media
    pub fn has_media(&self) -> bool {
        self.has_youtube || self.has_audio || self.has_video
    }
}

/// A referenced verse with the text that referenced it first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseLink {
    /// Verse coordinates
    pub key: VerseKey,

    /// Text of the first mention
    pub matched_text: String,
}

/// A referenced chapter with the text that referenced it first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterLink {
    /// Chapter coordinates
    pub key: ChapterKey,

    /// Text of the first mention
    pub matched_text: String,
}

/// A lexicon id mentioned in the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconMention {
    /// Lexicon identifier
    pub id: LexiconId,

    /// Text of the first mention
    pub matched_text: String,
}

/// A dictionary topic mentioned in the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryMention {
    /// Lower-cased topic word
    pub topic: String,

    /// Source defining the topic
    pub source: String,

    /// Text of the first mention
    pub matched_text: String,
}

/// Everything derived from one rich text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Rich text with mentions and embeds marked up
    pub processed_content: String,

    /// Content flags
    pub flags: ContentFlags,

    /// Distinct verses in first-mention order
    pub internal_links: Vec<VerseLink>,

    /// Distinct chapters in first-mention order
    pub chapter_links: Vec<ChapterLink>,

    /// Distinct lexicon ids in first-mention order
    pub lexicon_mentions: Vec<LexiconMention>,

    /// Distinct dictionary topics in first-mention order
    pub dictionary_mentions: Vec<DictionaryMention>,

    /// Embedded media
    pub media: Vec<MediaEmbed>,

    /// Attached files
    pub resources: Vec<Resource>,

    /// Plain-text projection of the processed content
    pub plain_text: String,
}

/// Annotates rich text with one recognizer and dictionary setup.
///
/// The carried citation context is scoped to one [`Annotator::annotate_html`]
/// call and shared by all text runs of that document.
#[derive(Debug, Clone, Copy)]
pub struct Annotator<'a> {
    recognizer: Recognizer<'a>,
    catalog: &'a DictionaryCatalog,
    words: Option<(&'a DictionaryWordIndex, &'a WordMatcher)>,
    default_dictionary: &'a str,
}

impl<'a> Annotator<'a> {
    /// Create an annotator without dictionary word detection
    pub fn new(recognizer: Recognizer<'a>, catalog: &'a DictionaryCatalog) -> Self {
        Self {
            recognizer,
            catalog,
            words: None,
            default_dictionary: "",
        }
    }

    /// Enable detection of free dictionary words
    pub fn with_word_linking(mut self, index: &'a DictionaryWordIndex, matcher: &'a WordMatcher) -> Self {
        self.words = Some((index, matcher));
        self
    }

    /// Source used for topic links when no dictionary is loaded
    pub fn with_default_dictionary(mut self, source: &'a str) -> Self {
        self.default_dictionary = source;
        self
    }

    /// Annotate rendered rich text
    pub fn annotate_html(&self, html: &str) -> Annotation {
        let (embedded, media) = embed_media(html);
        let mut doc = Document::default();
        let mut ctx = ScanContext::new();
        let mut tracker = SkipTracker::new();

        let tokens = tokenize(&embedded);
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Tag(tag) if is_structured_anchor(tag) => {
                    let close = closing_anchor(&tokens, i + 1);
                    let replaced = self.rewrite_anchor(tag, &tokens[i + 1..close], &mut doc);
                    if let (false, Some(Token::Tag(end))) = (replaced, tokens.get(close)) {
                        doc.out.push_str(end.raw);
                    }
                    i = close + 1;
                    continue;
                }
                Token::Tag(tag) => {
                    tracker.observe(tag);
                    doc.out.push_str(tag.raw);
                }
                Token::Text(text) if tracker.is_skipping() => doc.out.push_str(text),
                Token::Text(text) => self.annotate_text(&decode_entities(text), &mut ctx, &mut doc),
            }
            i += 1;
        }

        let flags = ContentFlags {
            has_youtube: media.iter().any(|m| m.kind == MediaKind::Youtube),
            has_audio: media.iter().any(|m| m.kind == MediaKind::Audio),
            has_video: media.iter().any(|m| m.kind == MediaKind::Video),
            has_cross_reference: !doc.verses.is_empty() || !doc.chapters.is_empty(),
        };
        trace!(
            "Annotated {} bytes: {} verses, {} chapters, {} lexicon ids, {} dictionary words",
            html.len(),
            doc.verses.len(),
            doc.chapters.len(),
            doc.lexicon.len(),
            doc.dictionary.len()
        );

        Annotation {
            plain_text: plain_text(&doc.out),
            processed_content: doc.out,
            flags,
            internal_links: doc.verses,
            chapter_links: doc.chapters,
            lexicon_mentions: doc.lexicon,
            dictionary_mentions: doc.dictionary,
            media,
            resources: extract_resources(html),
        }
    }

    /// Replace a `B:`/`S:` anchor; returns `false` when the anchor did not
    /// parse and was copied through without its closing tag.
    fn rewrite_anchor(&self, open: &Tag<'_>, inner: &[Token<'_>], doc: &mut Document) -> bool {
        let inner_raw: String = inner.iter().map(token_raw).collect();
        let text = plain_text(&inner_raw);
        let href = open.attr("href").unwrap_or_default();

        match parse_structured_link(href, &text, self.catalog, self.default_dictionary) {
            Some(LinkTarget::Verses {
                book,
                chapter,
                verses,
            }) => {
                let bounds = self.recognizer.resolver().bounds();
                let keys: Vec<VerseKey> = verses
                    .into_iter()
                    .map(|verse| VerseKey::new(book, chapter, verse))
                    .filter(|key| bounds.contains_verse(*key))
                    .collect();
                if keys.is_empty() {
                    doc.out.push_str(&escape_text(&text));
                } else {
                    doc.add_verses(&keys, &text);
                    doc.out.push_str(&render_mark(&Mark::Verses(keys), &text));
                }
                true
            }
            Some(LinkTarget::Lexicon(id)) => {
                doc.add_lexicon(&id, &text);
                doc.out.push_str(&render_mark(&Mark::Lexicon(id), &text));
                true
            }
            Some(LinkTarget::Dictionary { source, topic }) => {
                doc.add_dictionary(&topic, &source, &text);
                doc.out.push_str(&render_dictionary_link(&source, &topic, &inner_raw));
                true
            }
            None => {
                doc.out.push_str(open.raw);
                doc.out.push_str(&inner_raw);
                false
            }
        }
    }

    fn annotate_text(&self, text: &str, ctx: &mut ScanContext, doc: &mut Document) {
        for span in self.recognizer.scan_fragment(text, ctx) {
            let piece = span.text(text);
            let mark = match span.kind {
                SpanKind::Literal => {
                    self.link_words(piece, doc);
                    continue;
                }
                SpanKind::Verses(keys) => {
                    doc.add_verses(&keys, piece);
                    Mark::Verses(keys)
                }
                SpanKind::Chapter(key) => {
                    doc.add_chapter(key, piece);
                    Mark::Chapter(key)
                }
                SpanKind::Lexicon(id) => {
                    doc.add_lexicon(&id, piece);
                    Mark::Lexicon(id)
                }
            };
            doc.out.push_str(&render_mark(&mark, piece));
        }
    }

    /// Mark dictionary words inside literal text
    fn link_words(&self, text: &str, doc: &mut Document) {
        let Some((index, matcher)) = self.words else {
            doc.out.push_str(&escape_text(text));
            return;
        };

        let mut cursor = 0;
        for (start, end) in word_ranges(text) {
            let word = &text[start..end];
            let Some(topic) = matcher.lookup(word, index) else {
                continue;
            };
            // a word no source defines gets no link at all
            let Some(source) = self.catalog.source_for_word(&topic) else {
                continue;
            };
            let source = source.id.clone();
            doc.out.push_str(&escape_text(&text[cursor..start]));
            doc.add_dictionary(&topic, &source, word);
            doc.out
                .push_str(&render_mark(&Mark::DictionaryWord { topic, source }, word));
            cursor = end;
        }
        doc.out.push_str(&escape_text(&text[cursor..]));
    }
}

fn is_structured_anchor(tag: &Tag<'_>) -> bool {
    tag.kind == TagKind::Open
        && tag.name == "a"
        && tag
            .attr("href")
            .map(str::trim_start)
            .is_some_and(|href| href.starts_with(BOOK_LINK_PREFIX) || href.starts_with(TOPIC_LINK_PREFIX))
}

/// Index of the `</a>` closing the anchor whose content starts at `from`,
/// or `tokens.len()` when it is never closed.
fn closing_anchor(tokens: &[Token<'_>], from: usize) -> usize {
    tokens[from..]
        .iter()
        .position(|token| matches!(token, Token::Tag(tag) if tag.kind == TagKind::Close && tag.name == "a"))
        .map_or(tokens.len(), |pos| from + pos)
}

fn token_raw<'t>(token: &'t Token<'_>) -> &'t str {
    match token {
        Token::Text(text) => text,
        Token::Tag(tag) => tag.raw,
    }
}

/// Output and first-seen link collections of one annotation run
#[derive(Default)]
struct Document {
    out: String,
    verses: Vec<VerseLink>,
    chapters: Vec<ChapterLink>,
    lexicon: Vec<LexiconMention>,
    dictionary: Vec<DictionaryMention>,
    seen_verses: HashSet<VerseKey>,
    seen_chapters: HashSet<ChapterKey>,
    seen_lexicon: HashSet<LexiconId>,
    seen_topics: HashSet<(String, String)>,
}

impl Document {
    fn add_verses(&mut self, keys: &[VerseKey], text: &str) {
        for key in keys {
            if self.seen_verses.insert(*key) {
                self.verses.push(VerseLink {
                    key: *key,
                    matched_text: text.to_string(),
                });
            }
        }
    }

    fn add_chapter(&mut self, key: ChapterKey, text: &str) {
        if self.seen_chapters.insert(key) {
            self.chapters.push(ChapterLink {
                key,
                matched_text: text.to_string(),
            });
        }
    }

    fn add_lexicon(&mut self, id: &LexiconId, text: &str) {
        if self.seen_lexicon.insert(id.clone()) {
            self.lexicon.push(LexiconMention {
                id: id.clone(),
                matched_text: text.to_string(),
            });
        }
    }

    fn add_dictionary(&mut self, topic: &str, source: &str, text: &str) {
        if self.seen_topics.insert((source.to_string(), topic.to_string())) {
            self.dictionary.push(DictionaryMention {
                topic: topic.to_string(),
                source: source.to_string(),
                matched_text: text.to_string(),
            });
        }
    }
}
