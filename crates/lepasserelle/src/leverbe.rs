// leverbe - Core Orchestration
//
// *Le Verbe* (The Word) - Unified API that brings together all LeVerbe crates

use crate::config::EngineConfig;
use crate::errors::{LeVerbeError, Result};
use lelien::{verse_plain_text, Annotator, DictionaryWordIndex, MarkdownRenderer, WordMatcher};
use leparse::{BookRegistry, ChapterBoundMap, ChapterKey, LexiconId, PatternCache, Recognizer, VerseKey};
use lerecherche::{SearchDocument, SearchEngine, SearchFilter, SearchPage};
use lestockage::{
    verse_link, AnnotationBundle, AnnotationCache, AnnotationPipeline, CacheStats, Collection, CollectionStore,
    Dataset, Entry, EntryLabel, IndexBuilder, IndexStats, IndexStore, JsonDirStore, LexiconEntry,
    RefRecord, ReferenceFingerprint, VerseMetadata,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// LeVerbe - Main orchestration struct
///
/// Owns the dataset and everything derived from it: the alias registry,
/// chapter bounds, the compiled mention pattern, the annotation cache, the
/// reverse indices and the search documents. Any change to the dataset goes
/// through [`LeVerbe::rebuild`].
///
/// # Example
///
/// ```ignore
/// let mut leverbe = LeVerbe::open("/path/to/data")?;
/// let refs = leverbe.refs("Joh 3,16")?;
/// let page = leverbe.search("+glaube -werke", SearchFilter::All, 1)?;
/// ```
pub struct LeVerbe {
    /// Collection store the dataset is read from and written to
    store: Box<dyn CollectionStore>,

    /// Engine configuration
    config: EngineConfig,

    /// Loaded collections
    dataset: Dataset,

    /// Alias registry over the dataset's books
    registry: BookRegistry,

    /// Highest verse per chapter
    bounds: ChapterBoundMap,

    /// Dictionary words eligible for free-word linking
    words: DictionaryWordIndex,

    /// Inflection matcher for free-word linking
    matcher: WordMatcher,

    /// Mention pattern, rebuilt only when books or vocabulary change
    patterns: PatternCache,

    /// Annotation bundles per entry
    cache: AnnotationCache,

    /// Fingerprint of the reference data of the last rebuild
    reference: Option<ReferenceFingerprint>,

    /// Reverse indices of the last rebuild
    index: IndexStore,

    /// Search over verses and entries
    search: SearchEngine,
}

/// Verse with its text in the reading translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseView {
    /// Verse key
    pub key: VerseKey,

    /// `"<long name> <chapter>:<verse>"`
    #[serde(rename = "ref")]
    pub reference: String,

    /// Reader link
    pub link: String,

    /// Plain verse text, empty when the translation lacks the verse
    pub text: String,
}

/// Everything known about one verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseReport {
    /// The verse
    pub verse: VerseView,

    /// Entries citing the verse
    pub entries: Vec<RefRecord>,

    /// Sermons preached on the verse
    pub sermons: Vec<RefRecord>,

    /// Derived flags
    pub metadata: VerseMetadata,
}

/// Entries citing one chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterReport {
    /// The chapter
    pub key: ChapterKey,

    /// `"<long name> <chapter>"`
    #[serde(rename = "ref")]
    pub reference: String,

    /// Entries citing the chapter
    pub entries: Vec<RefRecord>,
}

/// Result of a reference lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefLookup {
    /// One or more verses
    Verses {
        /// Reports in input order
        verses: Vec<VerseReport>,
    },

    /// A whole chapter
    Chapter(ChapterReport),
}

/// Lexicon entry with its occurrences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconReport {
    /// Normalized id
    pub id: LexiconId,

    /// Lexicon entry, when the lexicon has one
    pub entry: Option<LexiconEntry>,

    /// Verses carrying the marker, per translation
    pub occurrences: BTreeMap<String, Vec<VerseKey>>,
}

/// Diagnostics about the loaded dataset and derived state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    /// Books in the registry
    pub books: usize,

    /// Loaded translations
    pub translations: usize,

    /// Loaded entries
    pub entries: usize,

    /// Searchable documents
    pub search_documents: usize,

    /// Index sizes
    pub index: IndexStats,

    /// Annotation cache counters
    pub cache: CacheStats,
}

impl LeVerbe {
    /// Open a data directory: configuration from `.leverbe/config.toml`,
    /// collections from `<name>.json` files
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let config = EngineConfig::load(data_dir).map_err(|e| {
            LeVerbeError::config_error(
                format!("{e:#}"),
                Some("Fix or delete .leverbe/config.toml to use the defaults.".to_string()),
            )
        })?;
        Self::with_store(Box::new(JsonDirStore::new(data_dir)), config)
    }

    /// Load the dataset from a store and build every index
    pub fn with_store(store: Box<dyn CollectionStore>, config: EngineConfig) -> Result<Self> {
        let mut leverbe = Self {
            store,
            cache: AnnotationCache::new(config.cache.capacity),
            matcher: WordMatcher::new(&config.linking),
            search: SearchEngine::new(config.search.clone(), config.testament),
            config,
            dataset: Dataset::default(),
            registry: BookRegistry::default(),
            bounds: ChapterBoundMap::default(),
            words: DictionaryWordIndex::default(),
            patterns: PatternCache::new(),
            reference: None,
            index: IndexStore::default(),
        };
        leverbe.reload()?;
        Ok(leverbe)
    }

    /// Re-read every collection and rebuild
    pub fn reload(&mut self) -> Result<IndexStats> {
        self.dataset = Dataset::load(self.store.as_ref())?;
        self.rebuild()
    }

    /// Rebuild registry, bounds, indices and search documents from the dataset.
    ///
    /// Cached bundles are reused only while both the entry and the reference
    /// data (books, bounds, dictionaries, linker settings) are unchanged.
    pub fn rebuild(&mut self) -> Result<IndexStats> {
        let started = Instant::now();
        self.registry = self.dataset.registry();
        self.bounds = self.dataset.chapter_bounds();
        self.words = DictionaryWordIndex::from_catalog(&self.dataset.dictionaries);

        let pattern = self.patterns.get_or_build(&self.registry, &self.config.recognition)?;
        let reference = self.reference.insert(ReferenceFingerprint::new(
            pattern,
            &self.bounds,
            &self.dataset.dictionaries,
            &self.config.linking,
        ));
        let recognizer = Recognizer::new(pattern, &self.registry, &self.bounds);
        let annotator = Annotator::new(recognizer, &self.dataset.dictionaries)
            .with_word_linking(&self.words, &self.matcher)
            .with_default_dictionary(&self.config.linking.default_dictionary);
        let pipeline = AnnotationPipeline::new(&MarkdownRenderer, annotator).with_reference(reference);

        let builder = IndexBuilder::new(self.config.index, self.config.testament);
        self.index = builder.rebuild(&self.dataset, recognizer.resolver(), &mut self.cache, &pipeline);

        let documents = self.search_documents();
        self.search.index_documents(documents);

        let stats = self.index.stats();
        info!(
            "LeVerbe ready: {} books, {} entries, {} search documents in {}ms",
            self.registry.len(),
            stats.entries,
            self.search.documents().len(),
            started.elapsed().as_millis()
        );
        Ok(stats)
    }

    /// Verses of the reading translation followed by every indexed entry
    fn search_documents(&self) -> Vec<SearchDocument> {
        let verses = self
            .dataset
            .translation(self.config.reading.translation.as_deref())
            .into_iter()
            .flat_map(|t| t.data.iter())
            .filter_map(|record| {
                let key = record.key();
                let book = self.registry.get(key.book)?;
                Some(SearchDocument::verse(
                    key,
                    format!("{} {}:{}", book.long_name, key.chapter, key.verse),
                    verse_link(book.primary_short_name(), key),
                    verse_plain_text(&record.text),
                ))
            });
        let entries = self
            .index
            .entries()
            .iter()
            .map(|indexed| SearchDocument::from_bundle(indexed.entry_type(), &indexed.bundle));
        verses.chain(entries).collect()
    }

    /// Configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loaded dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Reverse indices of the last rebuild
    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    /// Annotation bundle of an entry
    pub fn annotate(&mut self, entry_id: &str) -> Result<Arc<AnnotationBundle>> {
        let entry = self
            .dataset
            .entry(entry_id)
            .ok_or_else(|| LeVerbeError::EntryNotFound { id: entry_id.to_string() })?;
        let label = EntryLabel::for_entry(entry, &self.registry).ok_or_else(|| LeVerbeError::UnknownBook {
            id: entry_id.to_string(),
        })?;

        let pattern = self.patterns.get_or_build(&self.registry, &self.config.recognition)?;
        let recognizer = Recognizer::new(pattern, &self.registry, &self.bounds);
        let annotator = Annotator::new(recognizer, &self.dataset.dictionaries)
            .with_word_linking(&self.words, &self.matcher)
            .with_default_dictionary(&self.config.linking.default_dictionary);
        let pipeline = AnnotationPipeline::new(&MarkdownRenderer, annotator);
        let pipeline = match &self.reference {
            Some(reference) => pipeline.with_reference(reference),
            None => pipeline,
        };
        Ok(self.cache.get_or_annotate(entry, &label, &pipeline))
    }

    /// Insert or replace an entry, persist the entry collection and rebuild
    pub fn save_entry(&mut self, entry: Entry) -> Result<IndexStats> {
        self.cache.invalidate(&entry.id);
        match self.dataset.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.dataset.entries.push(entry),
        }
        self.persist_entries()?;
        self.rebuild()
    }

    /// Remove an entry, persist the entry collection and rebuild
    pub fn remove_entry(&mut self, entry_id: &str) -> Result<IndexStats> {
        let before = self.dataset.entries.len();
        self.dataset.entries.retain(|e| e.id != entry_id);
        if self.dataset.entries.len() == before {
            return Err(LeVerbeError::EntryNotFound { id: entry_id.to_string() });
        }
        self.cache.invalidate(entry_id);
        self.persist_entries()?;
        self.rebuild()
    }

    fn persist_entries(&self) -> Result<()> {
        debug!("Writing {} entries", self.dataset.entries.len());
        lestockage::write_collection(self.store.as_ref(), Collection::Entries, &self.dataset.entries)?;
        Ok(())
    }

    /// Look up what cites a verse or chapter.
    ///
    /// Accepts a verse key (`500-3-16`), a chapter key (`500-3`), or
    /// citation text (`Joh 3,16-18; Röm 8,1`).
    pub fn refs(&self, target: &str) -> Result<RefLookup> {
        let target = target.trim();
        if let Ok(key) = target.parse::<VerseKey>() {
            return Ok(RefLookup::Verses {
                verses: vec![self.verse_report(key)],
            });
        }
        if let Ok(key) = target.parse::<ChapterKey>() {
            return Ok(RefLookup::Chapter(self.chapter_report(key)));
        }

        let keys = self.resolve(target)?;
        if !keys.is_empty() {
            return Ok(RefLookup::Verses {
                verses: keys.into_iter().map(|key| self.verse_report(key)).collect(),
            });
        }
        let chapter = self.registry.find_prefix_match(target).and_then(|hit| {
            let chapter = hit.rest.trim().parse().ok()?;
            let key = ChapterKey::new(hit.book.book_number, chapter);
            self.bounds.contains_chapter(key).then_some(key)
        });
        chapter
            .map(|key| RefLookup::Chapter(self.chapter_report(key)))
            .ok_or_else(|| LeVerbeError::ReferenceNotFound {
                input: target.to_string(),
            })
    }

    /// Resolve a citation list to existing verses
    fn resolve(&self, citation: &str) -> Result<Vec<VerseKey>> {
        let pattern = self.patterns.current().ok_or_else(|| {
            leparse::Error::InvalidPattern("mention pattern has not been built".to_string())
        })?;
        let recognizer = Recognizer::new(pattern, &self.registry, &self.bounds);
        Ok(recognizer.resolver().resolve_verse_query(pattern, citation))
    }

    /// Everything known about one verse
    pub fn verse_report(&self, key: VerseKey) -> VerseReport {
        VerseReport {
            verse: self.verse_view(key),
            entries: self.index.verse_refs(key).to_vec(),
            sermons: self.index.sermons(key).to_vec(),
            metadata: self.index.verse_metadata(key),
        }
    }

    /// Entries citing one chapter
    pub fn chapter_report(&self, key: ChapterKey) -> ChapterReport {
        let reference = match self.registry.get(key.book) {
            Some(book) => format!("{} {}", book.long_name, key.chapter),
            None => key.to_string(),
        };
        ChapterReport {
            key,
            reference,
            entries: self.index.chapter_refs(key).to_vec(),
        }
    }

    /// Verse text in the reading translation
    pub fn verse_view(&self, key: VerseKey) -> VerseView {
        let text = self
            .dataset
            .translation(self.config.reading.translation.as_deref())
            .and_then(|t| t.data.iter().find(|record| record.key() == key))
            .map(|record| verse_plain_text(&record.text))
            .unwrap_or_default();
        let (reference, link) = match self.registry.get(key.book) {
            Some(book) => (
                format!("{} {}:{}", book.long_name, key.chapter, key.verse),
                verse_link(book.primary_short_name(), key),
            ),
            None => (key.to_string(), String::new()),
        };
        VerseView {
            key,
            reference,
            link,
            text,
        }
    }

    /// Verses of a citation list with their texts
    pub fn verses(&self, citation: &str) -> Result<Vec<VerseView>> {
        let keys = self.resolve(citation)?;
        if keys.is_empty() {
            return Err(LeVerbeError::ReferenceNotFound {
                input: citation.to_string(),
            });
        }
        Ok(keys.into_iter().map(|key| self.verse_view(key)).collect())
    }

    /// Lexicon entry and occurrences, optionally for one translation
    pub fn lexicon(&self, id: &str, translation: Option<&str>) -> Result<LexiconReport> {
        let id = LexiconId::parse(id).ok_or_else(|| leparse::Error::InvalidLexiconId(id.to_string()))?;
        let occurrences = match translation {
            Some(name) => {
                if self.dataset.translation(Some(name)).is_none() {
                    return Err(LeVerbeError::TranslationNotFound { id: name.to_string() });
                }
                let found = self.index.lexicon_occurrences_in(name, &id);
                if found.is_empty() {
                    BTreeMap::new()
                } else {
                    BTreeMap::from([(name.to_string(), found.to_vec())])
                }
            }
            None => self
                .index
                .lexicon_occurrences(&id)
                .into_iter()
                .map(|(name, keys)| (name.to_string(), keys.to_vec()))
                .collect(),
        };
        Ok(LexiconReport {
            entry: self.dataset.lexicon_entry(&id).cloned(),
            id,
            occurrences,
        })
    }

    /// Search verses and entries
    pub fn search(&self, query: &str, filter: SearchFilter, page: usize) -> Result<SearchPage> {
        Ok(self.search.search(query, filter, page)?)
    }

    /// Diagnostics
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            books: self.registry.len(),
            translations: self.dataset.translations.len(),
            entries: self.dataset.entries.len(),
            search_documents: self.search.documents().len(),
            index: self.index.stats(),
            cache: self.cache.stats(),
        }
    }
}
