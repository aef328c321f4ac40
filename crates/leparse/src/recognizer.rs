// Entity recognizer
//
// *Le Repérage* (The Spotting) - Scans text into literal and mention spans

use crate::book::BookRegistry;
use crate::bounds::ChapterBoundMap;
use crate::lexicon::LexiconId;
use crate::pattern::MentionPattern;
use crate::reference::{ChapterKey, VerseKey};
use crate::resolver::{ReferenceResolver, ScanContext};
use regex::Captures;

/// What a span of the input is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    /// Unmatched text
    Literal,

    /// Resolved verse mention; never empty, every verse exists
    Verses(Vec<VerseKey>),

    /// Chapter mention of an existing chapter
    Chapter(ChapterKey),

    /// Lexicon number mention
    Lexicon(LexiconId),
}

/// A byte range of the scanned text with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,

    /// Classification
    pub kind: SpanKind,
}

impl Span {
    /// Text covered by this span
    pub fn text<'t>(&self, source: &'t str) -> &'t str {
        &source[self.start..self.end]
    }

    /// Whether the span is a mention rather than literal text
    pub fn is_mention(&self) -> bool {
        !matches!(self.kind, SpanKind::Literal)
    }
}

/// Recognizes mentions with one compiled pattern.
///
/// Spans returned by a scan are ordered, contiguous and cover the whole
/// input. Nothing in here fails: anything that does not resolve is literal.
#[derive(Debug, Clone, Copy)]
pub struct Recognizer<'a> {
    pattern: &'a MentionPattern,
    resolver: ReferenceResolver<'a>,
}

impl<'a> Recognizer<'a> {
    /// Create a recognizer over reference data
    pub fn new(
        pattern: &'a MentionPattern,
        registry: &'a BookRegistry,
        bounds: &'a ChapterBoundMap,
    ) -> Self {
        Self {
            pattern,
            resolver: ReferenceResolver::new(registry, bounds),
        }
    }

    /// Underlying resolver
    pub fn resolver(&self) -> ReferenceResolver<'a> {
        self.resolver
    }

    /// Scan a whole text with a fresh context
    pub fn scan(&self, text: &str) -> Vec<Span> {
        let mut ctx = ScanContext::new();
        self.scan_fragment(text, &mut ctx)
    }

    /// Scan one fragment of a longer text, carrying `ctx` across fragments
    pub fn scan_fragment(&self, text: &str, ctx: &mut ScanContext) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut cursor = 0;

        for caps in self.pattern.mentions.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let Some(kind) = self.classify(&caps, &text[whole.end()..], ctx) else {
                continue;
            };
            push_literal(&mut spans, cursor, whole.start());
            spans.push(Span {
                start: whole.start(),
                end: whole.end(),
                kind,
            });
            cursor = whole.end();
        }

        push_literal(&mut spans, cursor, text.len());
        spans
    }

    fn classify(&self, caps: &Captures<'_>, rest: &str, ctx: &mut ScanContext) -> Option<SpanKind> {
        if let Some(id) = caps.name("lexicon") {
            return LexiconId::parse(id.as_str()).map(SpanKind::Lexicon);
        }

        if caps.name("explicit").is_some() {
            let chapter = number(caps, "chapter")?;
            let verses = caps.name("verses").map_or("", |m| m.as_str());
            let alias = caps.name("book").map(|m| m.as_str());
            return self
                .resolver
                .resolve_explicit(alias, chapter, verses, ctx)
                .map(SpanKind::Verses);
        }

        if let Some(verses) = caps.name("rel_verses") {
            return self
                .resolver
                .resolve_relative_verses(verses.as_str(), ctx)
                .map(SpanKind::Verses);
        }

        if caps.name("shift").is_some() {
            let delta = if caps.name("shift_next").is_some() { 1 } else { -1 };
            let verses = caps.name("shift_verses").map(|m| m.as_str());
            return self
                .resolver
                .resolve_chapter_shift(delta, verses, ctx)
                .map(SpanKind::Verses);
        }

        if let Some(alias) = caps.name("chap_book") {
            // "Rom 8" directly followed by ":" or "," is a broken citation
            if rest.trim_start().starts_with([':', ',']) {
                return None;
            }
            let chapter = number(caps, "chap_num")?;
            return self
                .resolver
                .resolve_chapter_only(alias.as_str(), chapter)
                .map(SpanKind::Chapter);
        }

        None
    }
}

fn number(caps: &Captures<'_>, group: &str) -> Option<u32> {
    caps.name(group)?.as_str().parse().ok()
}

fn push_literal(spans: &mut Vec<Span>, start: usize, end: usize) {
    if start < end {
        spans.push(Span {
            start,
            end,
            kind: SpanKind::Literal,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use crate::pattern::build_mention_pattern;
    use crate::vocabulary::ImplicitVocabulary;
    use proptest::prelude::*;

    fn fixture() -> (BookRegistry, ChapterBoundMap, MentionPattern) {
        let registry = BookRegistry::new(vec![
            Book::new(10, "1. Mose", "1Mo, Gen"),
            Book::new(500, "Johannes", "Joh, John"),
            Book::new(520, "Römer", "Röm, Rom, Ro"),
        ]);
        let bounds = ChapterBoundMap::from_keys(vec![
            VerseKey::new(10, 1, 31),
            VerseKey::new(500, 3, 36),
            VerseKey::new(520, 8, 39),
            VerseKey::new(520, 9, 33),
        ]);
        let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
        (registry, bounds, pattern)
    }

    fn mentions(spans: &[Span]) -> Vec<SpanKind> {
        spans
            .iter()
            .filter(|s| s.is_mention())
            .map(|s| s.kind.clone())
            .collect()
    }

    #[test]
    fn test_anaphora_carries_book_and_chapter() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);

        let spans = recognizer.scan("Rom 8:1. Also verse 2 and verse 3.");
        assert_eq!(
            mentions(&spans),
            vec![
                SpanKind::Verses(vec![VerseKey::new(520, 8, 1)]),
                SpanKind::Verses(vec![VerseKey::new(520, 8, 2)]),
                SpanKind::Verses(vec![VerseKey::new(520, 8, 3)]),
            ]
        );
        assert_eq!(spans[0].text("Rom 8:1. Also verse 2 and verse 3."), "Rom 8:1");
    }

    #[test]
    fn test_out_of_range_verse_is_literal() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);

        let spans = recognizer.scan("John 3:9999");
        assert!(mentions(&spans).is_empty());
        assert_eq!(spans.len(), 1);

        let spans = recognizer.scan("John 3:36");
        assert_eq!(mentions(&spans), vec![SpanKind::Verses(vec![VerseKey::new(500, 3, 36)])]);
    }

    #[test]
    fn test_relative_without_context_is_literal() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);
        assert!(mentions(&recognizer.scan("see verse 2")).is_empty());
    }

    #[test]
    fn test_longer_alias_wins() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);

        let text = "Römer 8,28";
        let spans = recognizer.scan(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Verses(vec![VerseKey::new(520, 8, 28)]));
    }

    #[test]
    fn test_lexicon_mention() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);

        let spans = recognizer.scan("agape (g26) and H2617");
        assert_eq!(
            mentions(&spans),
            vec![
                SpanKind::Lexicon(LexiconId::parse("G26").unwrap()),
                SpanKind::Lexicon(LexiconId::parse("H2617").unwrap()),
            ]
        );
    }

    #[test]
    fn test_chapter_only_mention_keeps_context() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);

        let spans = recognizer.scan("Read Rom 9 today. Then verse 2.");
        assert_eq!(mentions(&spans), vec![SpanKind::Chapter(ChapterKey::new(520, 9))]);

        assert!(mentions(&recognizer.scan("Rom 12 is missing")).is_empty());
    }

    #[test]
    fn test_chapter_shift() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);

        let spans = recognizer.scan("Röm 8,1 und im nächsten Kapitel, Vers 4");
        assert_eq!(
            mentions(&spans),
            vec![
                SpanKind::Verses(vec![VerseKey::new(520, 8, 1)]),
                SpanKind::Verses(vec![VerseKey::new(520, 9, 4)]),
            ]
        );

        let spans = recognizer.scan("Rom 9:3, see the previous chapter");
        assert_eq!(
            mentions(&spans)[1],
            SpanKind::Verses(vec![VerseKey::new(520, 8, 1)])
        );
    }

    #[test]
    fn test_digit_alias_with_space() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);
        assert_eq!(
            mentions(&recognizer.scan("1 Mo 1,1")),
            vec![SpanKind::Verses(vec![VerseKey::new(10, 1, 1)])]
        );
    }

    #[test]
    fn test_context_spans_fragments() {
        let (registry, bounds, pattern) = fixture();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);

        let mut ctx = ScanContext::new();
        recognizer.scan_fragment("Joh 3,16", &mut ctx);
        let spans = recognizer.scan_fragment("Vers 17", &mut ctx);
        assert_eq!(mentions(&spans), vec![SpanKind::Verses(vec![VerseKey::new(500, 3, 17)])]);

        // a new scan starts without context
        assert!(mentions(&recognizer.scan("Vers 17")).is_empty());
    }

    static FIXTURE: once_cell::sync::Lazy<(BookRegistry, ChapterBoundMap, MentionPattern)> =
        once_cell::sync::Lazy::new(fixture);

    proptest! {
        #[test]
        fn prop_spans_cover_input(text in "[ a-zA-Zö0-9:,.;\\-]{0,60}") {
            let (registry, bounds, pattern) = &*FIXTURE;
            let recognizer = Recognizer::new(pattern, registry, bounds);
            let spans = recognizer.scan(&text);

            let mut cursor = 0;
            for span in &spans {
                prop_assert_eq!(span.start, cursor);
                prop_assert!(span.end > span.start);
                cursor = span.end;
            }
            prop_assert_eq!(cursor, text.len());
        }

        #[test]
        fn prop_verse_recognized_iff_within_bounds(verse in 0u32..=41) {
            let (registry, bounds, pattern) = &*FIXTURE;
            let recognizer = Recognizer::new(pattern, registry, bounds);
            let found = mentions(&recognizer.scan(&format!("John 3:{verse}")));

            if (1..=36).contains(&verse) {
                prop_assert_eq!(found, vec![SpanKind::Verses(vec![VerseKey::new(500, 3, verse)])]);
            } else {
                prop_assert!(found.is_empty());
            }
        }
    }
}
