// Reference data and the whole corpus
//
// *Le Corpus* (The Corpus) - Books, translations, lexicon, dictionaries and entries as loaded

use crate::entry::Entry;
use crate::error::Result;
use crate::store::{read_collection, write_collection, Collection, CollectionStore};
use leparse::{Book, BookRegistry, ChapterBoundMap, LexiconId, VerseKey};
use lelien::DictionaryCatalog;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One verse of a translation; `text` may carry lexicon markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    /// Book number
    pub book_number: u32,

    /// Chapter number
    pub chapter: u32,

    /// Verse number
    pub verse: u32,

    /// Raw verse markup
    #[serde(default)]
    pub text: String,
}

impl VerseRecord {
    /// Composite key of this verse
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.book_number, self.chapter, self.verse)
    }
}

/// A Bible translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Translation id
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Verse texts carry `<S>n</S>` lexicon markers
    #[serde(default, alias = "hasStrongs")]
    pub has_strongs: bool,

    /// Verses in canonical order
    #[serde(default)]
    pub data: Vec<VerseRecord>,
}

/// A lexicon (Strong's) entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Lexicon id (`G26`)
    #[serde(alias = "topic")]
    pub id: LexiconId,

    /// Original-language word
    #[serde(default)]
    pub lexeme: String,

    /// Transliteration
    #[serde(default)]
    pub transliteration: String,

    /// Definition markup
    #[serde(default)]
    pub definition: String,
}

/// Everything the engine works on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    /// Canonical books
    pub books: Vec<Book>,

    /// Bible translations; the first one is the reading translation
    pub translations: Vec<Translation>,

    /// Authored entries
    pub entries: Vec<Entry>,

    /// Dictionary sources in priority order
    pub dictionaries: DictionaryCatalog,

    /// Lexicon entries
    pub lexicon: Vec<LexiconEntry>,
}

impl Dataset {
    /// Read every collection from a store; missing collections are empty
    pub fn load(store: &dyn CollectionStore) -> Result<Self> {
        let dataset = Self {
            books: read_collection(store, Collection::Books)?,
            translations: read_collection(store, Collection::Translations)?,
            entries: read_collection(store, Collection::Entries)?,
            dictionaries: DictionaryCatalog::new(read_collection(store, Collection::Dictionaries)?),
            lexicon: read_collection(store, Collection::Lexicon)?,
        };
        debug!(
            "Loaded dataset: {} books, {} translations, {} entries, {} dictionaries, {} lexicon entries",
            dataset.books.len(),
            dataset.translations.len(),
            dataset.entries.len(),
            dataset.dictionaries.sources().len(),
            dataset.lexicon.len()
        );
        Ok(dataset)
    }

    /// Replace every collection in a store
    pub fn save(&self, store: &dyn CollectionStore) -> Result<()> {
        write_collection(store, Collection::Books, &self.books)?;
        write_collection(store, Collection::Translations, &self.translations)?;
        write_collection(store, Collection::Entries, &self.entries)?;
        write_collection(store, Collection::Dictionaries, self.dictionaries.sources())?;
        write_collection(store, Collection::Lexicon, &self.lexicon)
    }

    /// Alias registry over the books
    pub fn registry(&self) -> BookRegistry {
        BookRegistry::new(self.books.clone())
    }

    /// Highest verse per chapter over all translations
    pub fn chapter_bounds(&self) -> ChapterBoundMap {
        ChapterBoundMap::from_keys(
            self.translations
                .iter()
                .flat_map(|t| t.data.iter().map(VerseRecord::key)),
        )
    }

    /// Translation by id, or the reading translation
    pub fn translation(&self, id: Option<&str>) -> Option<&Translation> {
        match id {
            Some(id) => self.translations.iter().find(|t| t.id == id),
            None => self.translations.first(),
        }
    }

    /// Entry by id
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Lexicon entry by id
    pub fn lexicon_entry(&self, id: &LexiconId) -> Option<&LexiconEntry> {
        self.lexicon.iter().find(|e| &e.id == id)
    }
}
