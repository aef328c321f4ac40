// Reference resolution
//
// *Le Résolveur* (The Resolver) - Completes partial citations from the carried context

use crate::book::BookRegistry;
use crate::bounds::ChapterBoundMap;
use crate::pattern::MentionPattern;
use crate::reference::{ChapterKey, VerseKey};
use crate::verse_list::parse_verse_list;
use once_cell::sync::Lazy;
use regex::Regex;

static CHAPTER_VERSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]+)\s*[,:\s]\s*([0-9]+)").expect("chapter/verse pattern is valid")
});

/// Carried "last seen" book and chapter of one scan.
///
/// Created fresh for every entry; the state only ever moves forward within a
/// scan and is never shared between entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanContext {
    /// Book of the most recent resolved verse mention
    pub last_book: Option<u32>,

    /// Chapter of the most recent resolved verse mention
    pub last_chapter: Option<u32>,
}

impl ScanContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Carry the coordinates of a resolved mention's first verse
    pub fn remember(&mut self, key: VerseKey) {
        self.last_book = Some(key.book);
        self.last_chapter = Some(key.chapter);
    }

    fn current(&self) -> Option<(u32, u32)> {
        Some((self.last_book?, self.last_chapter?))
    }
}

/// Resolves citations against the registry and the chapter bound map.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    registry: &'a BookRegistry,
    bounds: &'a ChapterBoundMap,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver over reference data
    pub fn new(registry: &'a BookRegistry, bounds: &'a ChapterBoundMap) -> Self {
        Self { registry, bounds }
    }

    /// Book registry
    pub fn registry(&self) -> &'a BookRegistry {
        self.registry
    }

    /// Chapter bound map
    pub fn bounds(&self) -> &'a ChapterBoundMap {
        self.bounds
    }

    /// `[alias] chapter sep verses`.
    ///
    /// A named alias that is not registered never falls back to the carried
    /// book. Returns `None` when no verse survives the bounds check.
    pub fn resolve_explicit(
        &self,
        alias: Option<&str>,
        chapter: u32,
        verse_list: &str,
        ctx: &mut ScanContext,
    ) -> Option<Vec<VerseKey>> {
        let book = match alias {
            Some(alias) => self.registry.find_by_alias(alias)?.book_number,
            None => ctx.last_book?,
        };
        self.commit(book, chapter, verse_list, ctx)
    }

    /// `verse N` in the carried book and chapter
    pub fn resolve_relative_verses(
        &self,
        verse_list: &str,
        ctx: &mut ScanContext,
    ) -> Option<Vec<VerseKey>> {
        let (book, chapter) = ctx.current()?;
        self.commit(book, chapter, verse_list, ctx)
    }

    /// `next/previous chapter [, verse N]`; the verse defaults to 1
    pub fn resolve_chapter_shift(
        &self,
        delta: i32,
        verse_list: Option<&str>,
        ctx: &mut ScanContext,
    ) -> Option<Vec<VerseKey>> {
        let (book, chapter) = ctx.current()?;
        let chapter = chapter.checked_add_signed(delta).filter(|&c| c > 0)?;
        self.commit(book, chapter, verse_list.unwrap_or("1"), ctx)
    }

    /// `<alias> <chapter>`; the chapter must exist. Leaves the context alone.
    pub fn resolve_chapter_only(&self, alias: &str, chapter: u32) -> Option<ChapterKey> {
        let book = self.registry.find_by_alias(alias)?.book_number;
        let key = ChapterKey::new(book, chapter);
        self.bounds.contains_chapter(key).then_some(key)
    }

    /// Parse one stored verse string such as `"Joh 3,16"` or `"1Mo 1:1"`.
    ///
    /// Only the first verse is taken; the result is not bounds checked.
    pub fn parse_verse_string(&self, raw: &str) -> Option<VerseKey> {
        let hit = self.registry.find_prefix_match(raw)?;
        let caps = CHAPTER_VERSE.captures(hit.rest)?;
        let chapter = caps[1].parse().ok()?;
        let verse = caps[2].parse().ok()?;
        Some(VerseKey::new(hit.book.book_number, chapter, verse))
    }

    /// Resolve a free-form citation list (`"Joh 3,16-18; Röm 8,1"`).
    ///
    /// The book carries across chunks until another one is named. Only
    /// existing verses are returned, in input order without duplicates.
    pub fn resolve_verse_query(&self, pattern: &MentionPattern, query: &str) -> Vec<VerseKey> {
        let mut book: Option<u32> = None;
        let mut keys: Vec<VerseKey> = Vec::new();

        for caps in pattern.verse_query.captures_iter(query) {
            if let Some(alias) = caps.name("book") {
                book = self
                    .registry
                    .find_by_alias(alias.as_str())
                    .map(|b| b.book_number);
            }
            let (Some(book), Some(chapter)) = (
                book,
                caps.name("chapter").and_then(|c| c.as_str().parse::<u32>().ok()),
            ) else {
                continue;
            };
            let verses = caps.name("verses").map_or("", |m| m.as_str());
            for key in self.retain(book, chapter, verses) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    fn commit(
        &self,
        book: u32,
        chapter: u32,
        verse_list: &str,
        ctx: &mut ScanContext,
    ) -> Option<Vec<VerseKey>> {
        let keys = self.retain(book, chapter, verse_list);
        let first = keys.first()?;
        ctx.remember(*first);
        Some(keys)
    }

    fn retain(&self, book: u32, chapter: u32, verse_list: &str) -> Vec<VerseKey> {
        parse_verse_list(verse_list)
            .into_iter()
            .map(|verse| VerseKey::new(book, chapter, verse))
            .filter(|key| self.bounds.contains_verse(*key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use crate::pattern::build_mention_pattern;
    use crate::vocabulary::ImplicitVocabulary;

    fn fixture() -> (BookRegistry, ChapterBoundMap) {
        let registry = BookRegistry::new(vec![
            Book::new(500, "Johannes", "Joh, John"),
            Book::new(520, "Römer", "Röm, Rom"),
        ]);
        let bounds = ChapterBoundMap::from_keys(vec![
            VerseKey::new(500, 3, 36),
            VerseKey::new(500, 4, 54),
            VerseKey::new(520, 8, 39),
            VerseKey::new(520, 9, 33),
        ]);
        (registry, bounds)
    }

    #[test]
    fn test_explicit_updates_context() {
        let (registry, bounds) = fixture();
        let resolver = ReferenceResolver::new(&registry, &bounds);
        let mut ctx = ScanContext::new();

        let keys = resolver.resolve_explicit(Some("Rom"), 8, "1-3", &mut ctx).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(ctx.last_book, Some(520));
        assert_eq!(ctx.last_chapter, Some(8));
    }

    #[test]
    fn test_unknown_alias_does_not_fall_back() {
        let (registry, bounds) = fixture();
        let resolver = ReferenceResolver::new(&registry, &bounds);
        let mut ctx = ScanContext::new();
        ctx.remember(VerseKey::new(520, 8, 1));

        assert!(resolver.resolve_explicit(Some("Xyz"), 8, "2", &mut ctx).is_none());
        assert!(resolver.resolve_explicit(None, 8, "2", &mut ctx).is_some());
    }

    #[test]
    fn test_out_of_range_leaves_context() {
        let (registry, bounds) = fixture();
        let resolver = ReferenceResolver::new(&registry, &bounds);
        let mut ctx = ScanContext::new();

        assert!(resolver.resolve_explicit(Some("Joh"), 3, "9999", &mut ctx).is_none());
        assert_eq!(ctx, ScanContext::new());
    }

    #[test]
    fn test_relative_requires_context() {
        let (registry, bounds) = fixture();
        let resolver = ReferenceResolver::new(&registry, &bounds);
        let mut ctx = ScanContext::new();

        assert!(resolver.resolve_relative_verses("2", &mut ctx).is_none());
        ctx.remember(VerseKey::new(500, 3, 16));
        assert_eq!(
            resolver.resolve_relative_verses("2", &mut ctx).unwrap(),
            vec![VerseKey::new(500, 3, 2)]
        );
    }

    #[test]
    fn test_chapter_shift() {
        let (registry, bounds) = fixture();
        let resolver = ReferenceResolver::new(&registry, &bounds);
        let mut ctx = ScanContext::new();
        ctx.remember(VerseKey::new(520, 8, 1));

        let next = resolver.resolve_chapter_shift(1, None, &mut ctx).unwrap();
        assert_eq!(next, vec![VerseKey::new(520, 9, 1)]);
        assert_eq!(ctx.last_chapter, Some(9));

        let previous = resolver.resolve_chapter_shift(-1, Some("5"), &mut ctx).unwrap();
        assert_eq!(previous, vec![VerseKey::new(520, 8, 5)]);

        let mut first = ScanContext::new();
        first.remember(VerseKey::new(520, 1, 1));
        assert!(resolver.resolve_chapter_shift(-1, None, &mut first).is_none());
    }

    #[test]
    fn test_chapter_only_requires_existing_chapter() {
        let (registry, bounds) = fixture();
        let resolver = ReferenceResolver::new(&registry, &bounds);
        assert_eq!(resolver.resolve_chapter_only("Röm", 8), Some(ChapterKey::new(520, 8)));
        assert_eq!(resolver.resolve_chapter_only("Röm", 20), None);
    }

    #[test]
    fn test_parse_verse_string() {
        let (registry, bounds) = fixture();
        let resolver = ReferenceResolver::new(&registry, &bounds);
        assert_eq!(resolver.parse_verse_string("Joh 3,16"), Some(VerseKey::new(500, 3, 16)));
        assert_eq!(resolver.parse_verse_string("Johannes 4:1"), Some(VerseKey::new(500, 4, 1)));
        assert_eq!(resolver.parse_verse_string("Johannes"), None);
    }

    #[test]
    fn test_verse_query_carries_book() {
        let (registry, bounds) = fixture();
        let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
        let resolver = ReferenceResolver::new(&registry, &bounds);

        let keys = resolver.resolve_verse_query(&pattern, "Joh 3,16-17; 4,1; Röm 8,39-41");
        assert_eq!(
            keys,
            vec![
                VerseKey::new(500, 3, 16),
                VerseKey::new(500, 3, 17),
                VerseKey::new(500, 4, 1),
                VerseKey::new(520, 8, 39),
            ]
        );
    }
}
