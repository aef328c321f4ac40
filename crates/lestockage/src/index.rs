// Reverse indices
//
// *L'Index* (The Index) - Which entries cite a verse, where a lexicon id occurs, which words a dictionary defines

use crate::cache::{AnnotationBundle, AnnotationCache, AnnotationPipeline};
use crate::dataset::Dataset;
use crate::entry::{EntryKind, EntryLabel, EntryType};
use lelien::{lexicon_markers, DictionaryWordIndex};
use leparse::{ChapterKey, LexiconId, ReferenceResolver, TestamentBoundary, VerseKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Default length of reference snippets, in characters
pub const DEFAULT_SNIPPET_LENGTH: usize = 100;

/// Index builder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Characters of plain text kept in a reference snippet
    pub snippet_length: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            snippet_length: DEFAULT_SNIPPET_LENGTH,
        }
    }
}

/// An entry citing a verse or chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRecord {
    /// Citing entry
    pub entry_id: String,

    /// Reference label of the citing entry
    #[serde(rename = "ref")]
    pub reference: String,

    /// Link to the citing entry
    pub link: String,

    /// Start of the entry's plain text
    pub snippet: String,
}

/// Flags of a verse derived from notes and indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseMetadata {
    /// At least one note is attached
    pub has_note: bool,

    /// At least one sermon preaches on it
    pub has_sermon: bool,

    /// At least one entry cites it
    pub has_cross_reference: bool,

    /// An attached note embeds a YouTube video
    pub has_youtube: bool,

    /// An attached note embeds audio
    pub has_audio: bool,

    /// An attached note embeds video
    pub has_video: bool,

    /// An attached note has file resources
    pub has_resource: bool,

    /// Any of the media flags
    pub has_media: bool,
}

/// Sizes of a built index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Indexed entries
    pub entries: usize,

    /// Verses cited by at least one entry
    pub verse_buckets: usize,

    /// Chapters cited by at least one entry
    pub chapter_buckets: usize,

    /// Verses preached on by at least one sermon
    pub sermon_buckets: usize,

    /// Translations with lexicon markers
    pub lexicon_translations: usize,

    /// Distinct lexicon ids over all translations
    pub lexicon_ids: usize,

    /// Words of the dictionary word index
    pub dictionary_words: usize,
}

/// An indexed entry with its bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntry {
    /// Entry attachment
    pub kind: EntryKind,

    /// Bundle of the entry
    pub bundle: Arc<AnnotationBundle>,
}

impl IndexedEntry {
    /// Entry kind tag
    pub fn entry_type(&self) -> EntryType {
        self.kind.entry_type()
    }
}

/// Every reverse index, built in one pass and replaced as a whole
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStore {
    entries: Vec<IndexedEntry>,
    verse_refs: BTreeMap<VerseKey, Vec<RefRecord>>,
    chapter_refs: BTreeMap<ChapterKey, Vec<RefRecord>>,
    sermons: BTreeMap<VerseKey, Vec<RefRecord>>,
    lexicon_occurrences: BTreeMap<String, BTreeMap<LexiconId, Vec<VerseKey>>>,
    dictionary_words: DictionaryWordIndex,
    verse_metadata: BTreeMap<VerseKey, VerseMetadata>,
    stats: IndexStats,
}

impl IndexStore {
    /// Indexed entries in processing order
    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    /// Entries citing a verse
    pub fn verse_refs(&self, key: VerseKey) -> &[RefRecord] {
        self.verse_refs.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Entries citing a chapter
    pub fn chapter_refs(&self, key: ChapterKey) -> &[RefRecord] {
        self.chapter_refs.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Sermons preaching on a verse
    pub fn sermons(&self, key: VerseKey) -> &[RefRecord] {
        self.sermons.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Verses containing a lexicon id, per translation
    pub fn lexicon_occurrences(&self, id: &LexiconId) -> BTreeMap<&str, &[VerseKey]> {
        self.lexicon_occurrences
            .iter()
            .filter_map(|(translation, ids)| ids.get(id).map(|keys| (translation.as_str(), keys.as_slice())))
            .collect()
    }

    /// Verses containing a lexicon id in one translation
    pub fn lexicon_occurrences_in(&self, translation: &str, id: &LexiconId) -> &[VerseKey] {
        self.lexicon_occurrences
            .get(translation)
            .and_then(|ids| ids.get(id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Dictionary word index
    pub fn dictionary_words(&self) -> &DictionaryWordIndex {
        &self.dictionary_words
    }

    /// Flags of a verse; all false when nothing is attached
    pub fn verse_metadata(&self, key: VerseKey) -> VerseMetadata {
        self.verse_metadata.get(&key).copied().unwrap_or_default()
    }

    /// Index sizes
    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

/// Builds an [`IndexStore`] from a whole dataset. There is no incremental
/// update: any change to the dataset means a full rebuild.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexBuilder {
    config: IndexConfig,
    boundary: TestamentBoundary,
}

impl IndexBuilder {
    /// Create a builder
    pub fn new(config: IndexConfig, boundary: TestamentBoundary) -> Self {
        Self { config, boundary }
    }

    /// Rebuild every index. Entries without a label (unknown book) are
    /// skipped; bundles come from the cache.
    pub fn rebuild(
        &self,
        dataset: &Dataset,
        resolver: ReferenceResolver<'_>,
        cache: &mut AnnotationCache,
        pipeline: &AnnotationPipeline<'_>,
    ) -> IndexStore {
        let started = Instant::now();
        let mut store = IndexStore {
            dictionary_words: DictionaryWordIndex::from_catalog(&dataset.dictionaries),
            ..IndexStore::default()
        };

        for entry in &dataset.entries {
            let Some(label) = EntryLabel::for_entry(entry, resolver.registry()) else {
                continue;
            };
            let bundle = cache.get_or_annotate(entry, &label, pipeline);
            let record = self.ref_record(&bundle);

            for link in &bundle.annotation.internal_links {
                store.verse_refs.entry(link.key).or_default().push(record.clone());
            }
            for link in &bundle.annotation.chapter_links {
                store.chapter_refs.entry(link.key).or_default().push(record.clone());
            }
            if let EntryKind::Sermon { bible_verses } = &entry.kind {
                for key in bible_verses.iter().filter_map(|v| resolver.parse_verse_string(v)) {
                    store.sermons.entry(key).or_default().push(record.clone());
                }
            }

            store.entries.push(IndexedEntry {
                kind: entry.kind.clone(),
                bundle,
            });
        }

        self.index_lexicon(dataset, &mut store);
        store.verse_metadata = verse_metadata(&store, resolver);

        store.stats = IndexStats {
            entries: store.entries.len(),
            verse_buckets: store.verse_refs.len(),
            chapter_buckets: store.chapter_refs.len(),
            sermon_buckets: store.sermons.len(),
            lexicon_translations: store.lexicon_occurrences.len(),
            lexicon_ids: store
                .lexicon_occurrences
                .values()
                .flat_map(BTreeMap::keys)
                .collect::<BTreeSet<_>>()
                .len(),
            dictionary_words: store.dictionary_words.len(),
        };
        info!(
            "Rebuilt indices: {} entries, {} verse buckets, {} chapter buckets, {} lexicon ids in {:.2}ms",
            store.stats.entries,
            store.stats.verse_buckets,
            store.stats.chapter_buckets,
            store.stats.lexicon_ids,
            started.elapsed().as_secs_f64() * 1000.0
        );
        store
    }

    fn ref_record(&self, bundle: &AnnotationBundle) -> RefRecord {
        RefRecord {
            entry_id: bundle.entry_id.clone(),
            reference: bundle.label.reference.clone(),
            link: bundle.label.link.clone(),
            snippet: snippet(&bundle.annotation.plain_text, self.config.snippet_length),
        }
    }

    /// Lexicon occurrences straight from verse texts of marked translations
    fn index_lexicon(&self, dataset: &Dataset, store: &mut IndexStore) {
        for translation in dataset.translations.iter().filter(|t| t.has_strongs) {
            if translation.data.is_empty() {
                continue;
            }
            let ids = store.lexicon_occurrences.entry(translation.id.clone()).or_default();
            for verse in &translation.data {
                for id in lexicon_markers(&verse.text, verse.book_number, &self.boundary) {
                    ids.entry(id).or_default().push(verse.key());
                }
            }
        }
    }
}

/// First `length` characters, with `...` only when something was cut
fn snippet(text: &str, length: usize) -> String {
    match text.char_indices().nth(length) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn verse_metadata(store: &IndexStore, resolver: ReferenceResolver<'_>) -> BTreeMap<VerseKey, VerseMetadata> {
    let mut notes: BTreeMap<VerseKey, Vec<&AnnotationBundle>> = BTreeMap::new();
    for entry in &store.entries {
        if let EntryKind::Note { verse } = &entry.kind {
            notes.entry(*verse).or_default().push(&entry.bundle);
        }
    }

    let candidates: BTreeSet<VerseKey> = notes
        .keys()
        .chain(store.sermons.keys())
        .chain(store.verse_refs.keys())
        .copied()
        .filter(|key| resolver.bounds().contains_verse(*key))
        .collect();

    candidates
        .into_iter()
        .map(|key| {
            let attached = notes.get(&key).map(Vec::as_slice).unwrap_or_default();
            let any = |f: fn(&AnnotationBundle) -> bool| attached.iter().any(|b| f(b));
            let has_youtube = any(|b| b.annotation.flags.has_youtube);
            let has_audio = any(|b| b.annotation.flags.has_audio);
            let has_video = any(|b| b.annotation.flags.has_video);
            let metadata = VerseMetadata {
                has_note: !attached.is_empty(),
                has_sermon: store.sermons.contains_key(&key),
                has_cross_reference: store.verse_refs.contains_key(&key),
                has_youtube,
                has_audio,
                has_video,
                has_resource: any(|b| !b.annotation.resources.is_empty()),
                has_media: has_youtube || has_audio || has_video,
            };
            (key, metadata)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Translation, VerseRecord};
    use crate::entry::Entry;
    use lelien::{Annotator, DictionaryCatalog, DictionarySource, DictionaryTopic, MarkdownRenderer};
    use leparse::{build_mention_pattern, Book, ImplicitVocabulary, MentionPattern, Recognizer};
    use rstest::rstest;

    fn verse(book_number: u32, chapter: u32, verse: u32, text: &str) -> VerseRecord {
        VerseRecord {
            book_number,
            chapter,
            verse,
            text: text.to_string(),
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            books: vec![
                Book::new(10, "1. Mose", "1Mo"),
                Book::new(500, "Johannes", "Joh"),
                Book::new(520, "Römer", "Röm, Rom"),
            ],
            translations: vec![
                Translation {
                    id: "elb".to_string(),
                    name: "Elberfelder".to_string(),
                    has_strongs: true,
                    data: vec![
                        verse(10, 1, 1, "Im Anfang<S>7225</S> schuf<S>1254</S> Gott<S>430</S>"),
                        verse(500, 3, 16, "Denn so hat Gott<S>2316</S> die Welt geliebt<S>25</S>"),
                        verse(500, 3, 17, "Denn Gott<S>2316</S> hat seinen Sohn nicht gesandt"),
                        verse(520, 8, 1, "Also gibt es jetzt keine Verdammnis"),
                        verse(520, 8, 28, "Wir wissen aber"),
                    ],
                },
                Translation {
                    id: "lut".to_string(),
                    name: "Luther".to_string(),
                    has_strongs: false,
                    data: vec![verse(500, 3, 16, "Also hat Gott<S>2316</S> die Welt geliebt")],
                },
            ],
            entries: vec![
                Entry::new("n1", EntryKind::Note { verse: VerseKey::new(500, 3, 16) }, "Vgl. Röm 8,28 und https://youtu.be/dQw4w9WgXcQ"),
                Entry::new("j1", EntryKind::Journal { journal: "Studium".into() }, "Röm 8,1 und Röm 8,28; ganz Joh 3")
                    .with_title("Gnade"),
                Entry::new(
                    "s1",
                    EntryKind::Sermon {
                        bible_verses: vec!["Joh 3,16".to_string(), "Unbekannt 1,1".to_string()],
                    },
                    "Über Joh 3,16",
                )
                .with_title("Liebe"),
                Entry::new("x1", EntryKind::BookNote { book: 999 }, "Joh 3,17"),
            ],
            dictionaries: DictionaryCatalog::new(vec![DictionarySource {
                id: "jma".to_string(),
                name: String::new(),
                data: vec![DictionaryTopic {
                    topic: "Gnade; Huld".to_string(),
                    definition: String::new(),
                }],
            }]),
            lexicon: Vec::new(),
        }
    }

    fn build(dataset: &Dataset, cache: &mut AnnotationCache) -> IndexStore {
        let registry = dataset.registry();
        let bounds = dataset.chapter_bounds();
        let pattern: MentionPattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
        let recognizer = Recognizer::new(&pattern, &registry, &bounds);
        let pipeline = AnnotationPipeline::new(&MarkdownRenderer, Annotator::new(recognizer, &dataset.dictionaries));
        IndexBuilder::default().rebuild(dataset, recognizer.resolver(), cache, &pipeline)
    }

    #[rstest]
    #[case("kurz", 10, "kurz")]
    #[case("genau zehn", 10, "genau zehn")]
    #[case("etwas mehr als zehn", 10, "etwas mehr...")]
    #[case("Größenänderung", 5, "Größe...")]
    fn test_snippet(#[case] text: &str, #[case] length: usize, #[case] expected: &str) {
        assert_eq!(snippet(text, length), expected);
    }

    #[test]
    fn test_verse_and_chapter_buckets() {
        let index = build(&dataset(), &mut AnnotationCache::default());

        let refs: Vec<&str> = index
            .verse_refs(VerseKey::new(520, 8, 28))
            .iter()
            .map(|r| r.reference.as_str())
            .collect();
        assert_eq!(refs, vec!["Johannes 3:16", "Gnade"]);

        let chapter = index.chapter_refs(ChapterKey::new(500, 3));
        assert_eq!(chapter.len(), 1);
        assert_eq!(chapter[0].link, "/journal/view/Studium/entry/j1");
        assert!(index.verse_refs(VerseKey::new(500, 3, 17)).is_empty());
        assert_eq!(index.stats().entries, 3);
    }

    #[test]
    fn test_sermon_index() {
        let index = build(&dataset(), &mut AnnotationCache::default());
        let sermons = index.sermons(VerseKey::new(500, 3, 16));
        assert_eq!(sermons.len(), 1);
        assert_eq!(sermons[0].reference, "Predigt: Liebe");
        assert_eq!(sermons[0].link, "/sermons/view/s1");
        assert_eq!(index.stats().sermon_buckets, 1);
    }

    #[test]
    fn test_lexicon_occurrences_only_from_marked_translations() {
        let index = build(&dataset(), &mut AnnotationCache::default());
        let g2316 = LexiconId::parse("G2316").unwrap();

        assert_eq!(
            index.lexicon_occurrences_in("elb", &g2316),
            &[VerseKey::new(500, 3, 16), VerseKey::new(500, 3, 17)]
        );
        assert!(index.lexicon_occurrences_in("lut", &g2316).is_empty());
        assert_eq!(
            index.lexicon_occurrences_in("elb", &LexiconId::parse("H430").unwrap()),
            &[VerseKey::new(10, 1, 1)]
        );
        assert_eq!(index.lexicon_occurrences(&g2316).len(), 1);
        assert_eq!(index.stats().lexicon_ids, 5);
    }

    #[test]
    fn test_verse_metadata() {
        let index = build(&dataset(), &mut AnnotationCache::default());

        let john = index.verse_metadata(VerseKey::new(500, 3, 16));
        assert!(john.has_note);
        assert!(john.has_sermon);
        assert!(john.has_youtube);
        assert!(john.has_media);
        assert!(john.has_cross_reference);

        let romans = index.verse_metadata(VerseKey::new(520, 8, 28));
        assert!(!romans.has_note);
        assert!(romans.has_cross_reference);

        assert_eq!(index.verse_metadata(VerseKey::new(10, 1, 1)), VerseMetadata::default());
    }

    #[test]
    fn test_dictionary_words() {
        let index = build(&dataset(), &mut AnnotationCache::default());
        assert!(index.dictionary_words().contains("gnade"));
        assert!(index.dictionary_words().contains("huld"));
        assert_eq!(index.stats().dictionary_words, 2);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let dataset = dataset();
        let first = build(&dataset, &mut AnnotationCache::default());
        let mut cache = AnnotationCache::default();
        let second = build(&dataset, &mut cache);
        let third = build(&dataset, &mut cache);

        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(cache.stats().hits, 3);
    }

    #[test]
    fn test_empty_dataset_gives_empty_indices() {
        let index = build(&Dataset::default(), &mut AnnotationCache::default());
        assert_eq!(index.stats(), IndexStats::default());
        assert!(index.entries().is_empty());
    }
}
