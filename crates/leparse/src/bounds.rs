// Chapter bound map

use crate::reference::{ChapterKey, VerseKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Highest verse number observed per book and chapter.
///
/// A recognized verse only counts as a mention when it exists here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterBoundMap {
    books: BTreeMap<u32, BTreeMap<u32, u32>>,
}

impl ChapterBoundMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from every verse coordinate of a translation
    pub fn from_keys<I: IntoIterator<Item = VerseKey>>(keys: I) -> Self {
        let mut map = Self::new();
        for key in keys {
            map.observe(key);
        }
        map
    }

    /// Record that a verse exists
    pub fn observe(&mut self, key: VerseKey) {
        let max = self
            .books
            .entry(key.book)
            .or_default()
            .entry(key.chapter)
            .or_insert(key.verse);
        if key.verse > *max {
            *max = key.verse;
        }
    }

    /// Highest verse of a chapter
    pub fn max_verse(&self, book: u32, chapter: u32) -> Option<u32> {
        self.books.get(&book)?.get(&chapter).copied()
    }

    /// Whether `1 <= verse <= max_verse(book, chapter)`
    pub fn contains_verse(&self, key: VerseKey) -> bool {
        key.verse >= 1
            && self
                .max_verse(key.book, key.chapter)
                .is_some_and(|max| key.verse <= max)
    }

    /// Whether the chapter has any verse
    pub fn contains_chapter(&self, key: ChapterKey) -> bool {
        self.max_verse(key.book, key.chapter).is_some()
    }

    /// Number of chapters observed for a book
    pub fn chapter_count(&self, book: u32) -> usize {
        self.books.get(&book).map_or(0, BTreeMap::len)
    }

    /// Whether the book has exactly one chapter
    pub fn is_single_chapter(&self, book: u32) -> bool {
        self.chapter_count(book) == 1
    }

    /// Books with exactly one chapter
    pub fn single_chapter_books(&self) -> BTreeSet<u32> {
        self.books
            .iter()
            .filter(|(_, chapters)| chapters.len() == 1)
            .map(|(&book, _)| book)
            .collect()
    }

    /// Whether nothing was observed
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
