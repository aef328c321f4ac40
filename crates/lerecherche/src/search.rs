// Search engine over verses and entries

use crate::error::{Error, Result};
use crate::query::{compile, CompiledQuery, SearchableText};
use crate::snippet::{SnippetBuilder, SnippetConfig};
use leparse::{Testament, TestamentBoundary, VerseKey};
use lestockage::{AnnotationBundle, EntryType};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

/// What a search document stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentKind {
    /// A verse of the reading translation
    Verse {
        /// Verse key
        key: VerseKey,
    },

    /// An authored entry
    Entry {
        /// Entry kind
        entry_type: EntryType,
    },
}

/// One searchable document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    /// Kind of document
    pub kind: DocumentKind,

    /// Reference label shown in results
    pub reference: String,

    /// Navigation link
    pub link: String,

    /// Text the snippet is cut from
    pub plain_text: String,

    /// Text the query is matched against
    pub searchable: SearchableText,
}

impl SearchDocument {
    /// Verse document; searchable as `"<reference> <plain text>"`
    pub fn verse(key: VerseKey, reference: impl Into<String>, link: impl Into<String>, plain_text: impl Into<String>) -> Self {
        let reference = reference.into();
        let plain_text = plain_text.into();
        Self {
            kind: DocumentKind::Verse { key },
            searchable: SearchableText::new(&format!("{reference} {plain_text}")),
            reference,
            link: link.into(),
            plain_text,
        }
    }

    /// Entry document built from its cached annotation
    pub fn from_bundle(entry_type: EntryType, bundle: &AnnotationBundle) -> Self {
        Self {
            kind: DocumentKind::Entry { entry_type },
            reference: bundle.label.reference.clone(),
            link: bundle.label.link.clone(),
            plain_text: bundle.annotation.plain_text.clone(),
            searchable: SearchableText::from_parts(&bundle.searchable_text, &bundle.searchable_text_lower),
        }
    }
}

/// Testament restriction for Bible searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestamentFilter {
    /// Both testaments
    #[default]
    All,

    /// Old Testament only
    Old,

    /// New Testament only
    New,
}

impl FromStr for TestamentFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TestamentFilter::All),
            "old" | "ot" | "at" => Ok(TestamentFilter::Old),
            "new" | "nt" => Ok(TestamentFilter::New),
            other => Err(format!("unknown testament filter '{other}'")),
        }
    }
}

/// Which documents a search covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilter {
    /// Every document
    #[default]
    All,

    /// Verses only
    Bible(TestamentFilter),

    /// Entries of one kind only
    Entries(EntryType),
}

impl SearchFilter {
    /// Whether a document kind passes the filter
    pub fn accepts(&self, kind: &DocumentKind, boundary: &TestamentBoundary) -> bool {
        match (self, kind) {
            (SearchFilter::All, _) => true,
            (SearchFilter::Bible(testament), DocumentKind::Verse { key }) => {
                match (testament, boundary.testament_of(key.book)) {
                    (TestamentFilter::All, _) => true,
                    (TestamentFilter::Old, found) => found == Testament::Old,
                    (TestamentFilter::New, found) => found == Testament::New,
                }
            }
            (SearchFilter::Entries(wanted), DocumentKind::Entry { entry_type }) => wanted == entry_type,
            _ => false,
        }
    }
}

impl FromStr for SearchFilter {
    type Err = String;

    /// `all`, `bible`, or an entry type name
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(SearchFilter::All),
            "bible" => Ok(SearchFilter::Bible(TestamentFilter::All)),
            other => EntryType::parse(other)
                .map(SearchFilter::Entries)
                .ok_or_else(|| format!("unknown search filter '{other}'")),
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchFilter::All => f.write_str("all"),
            SearchFilter::Bible(TestamentFilter::All) => f.write_str("bible"),
            SearchFilter::Bible(TestamentFilter::Old) => f.write_str("bible/old"),
            SearchFilter::Bible(TestamentFilter::New) => f.write_str("bible/new"),
            SearchFilter::Entries(entry_type) => write!(f, "{entry_type}"),
        }
    }
}

/// Search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Characters in a result snippet
    pub snippet_length: usize,

    /// Characters of context before the first hit
    pub context_before: usize,

    /// Hits per page
    pub page_size: usize,

    /// Minimum length of an unquoted query
    pub min_query_length: usize,

    /// Marker inserted before a highlighted term
    pub highlight_open: String,

    /// Marker inserted after a highlighted term
    pub highlight_close: String,

    /// Number of compiled queries kept
    pub query_cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let snippet = SnippetConfig::default();
        Self {
            snippet_length: snippet.length,
            context_before: snippet.context_before,
            page_size: 10,
            min_query_length: 3,
            highlight_open: snippet.highlight_open,
            highlight_close: snippet.highlight_close,
            query_cache_capacity: 64,
        }
    }
}

impl SearchConfig {
    /// Snippet part of the settings
    pub fn snippet(&self) -> SnippetConfig {
        SnippetConfig {
            length: self.snippet_length,
            context_before: self.context_before,
            highlight_open: self.highlight_open.clone(),
            highlight_close: self.highlight_close.clone(),
        }
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Kind of the matched document
    pub kind: DocumentKind,

    /// Reference label
    #[serde(rename = "ref")]
    pub reference: String,

    /// Navigation link
    pub link: String,

    /// Highlighted excerpt
    pub snippet: String,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Number of matching documents over all pages
    pub total: usize,

    /// Page number, starting at 1
    pub page: usize,

    /// Hits per page
    pub page_size: usize,

    /// Hits of this page in document order
    pub hits: Vec<SearchHit>,
}

impl SearchPage {
    /// Number of pages
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size.max(1))
    }
}

/// Boolean and phrase search over a document list.
///
/// Results keep the order in which documents were added; there is no
/// ranking. Compiled queries are kept in a small LRU cache.
pub struct SearchEngine {
    config: SearchConfig,
    boundary: TestamentBoundary,
    snippets: SnippetBuilder,
    documents: Vec<SearchDocument>,
    queries: Mutex<LruCache<String, Arc<CompiledQuery>>>,
}

impl SearchEngine {
    /// Create an empty engine
    pub fn new(config: SearchConfig, boundary: TestamentBoundary) -> Self {
        let capacity = NonZeroUsize::new(config.query_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            snippets: SnippetBuilder::new(config.snippet()),
            config,
            boundary,
            documents: Vec::new(),
            queries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Replace all documents
    pub fn index_documents(&mut self, documents: Vec<SearchDocument>) {
        debug!(documents = documents.len(), "search documents replaced");
        self.documents = documents;
    }

    /// Indexed documents
    pub fn documents(&self) -> &[SearchDocument] {
        &self.documents
    }

    /// Settings in use
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Guard and compile a query, reusing a cached compilation
    pub fn prepare(&self, query: &str) -> Result<Arc<CompiledQuery>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if !trimmed.contains('"') && trimmed.chars().count() < self.config.min_query_length {
            return Err(Error::QueryTooShort {
                min: self.config.min_query_length,
            });
        }

        let mut queries = self.queries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(compiled) = queries.get(trimmed) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = compile(trimmed)?;
        if !compiled.has_search_terms() {
            return Err(Error::NoSearchTerms);
        }
        let compiled = Arc::new(compiled);
        queries.put(trimmed.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Run a query and return one page of hits.
    ///
    /// Pages start at 1; page 0 is read as the first page.
    pub fn search(&self, query: &str, filter: SearchFilter, page: usize) -> Result<SearchPage> {
        let started = Instant::now();
        let compiled = self.prepare(query)?;
        let page = page.max(1);
        let page_size = self.config.page_size.max(1);

        let matching: Vec<&SearchDocument> = self
            .documents
            .iter()
            .filter(|doc| filter.accepts(&doc.kind, &self.boundary))
            .filter(|doc| compiled.matches(&doc.searchable))
            .collect();

        let hits = matching
            .iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(|doc| self.hit(doc, &compiled))
            .collect();

        info!(
            query = query.trim(),
            %filter,
            total = matching.len(),
            page,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(SearchPage {
            total: matching.len(),
            page,
            page_size,
            hits,
        })
    }

    fn hit(&self, doc: &SearchDocument, query: &CompiledQuery) -> SearchHit {
        let source = if doc.plain_text.trim().is_empty() {
            &doc.searchable.text
        } else {
            &doc.plain_text
        };
        SearchHit {
            kind: doc.kind,
            reference: doc.reference.clone(),
            link: doc.link.clone(),
            snippet: self.snippets.build(source, query),
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchConfig::default(), TestamentBoundary::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn verse(book: u32, chapter: u32, verse: u32, name: &str, text: &str) -> SearchDocument {
        SearchDocument::verse(
            VerseKey::new(book, chapter, verse),
            format!("{name} {chapter}:{verse}"),
            format!("/bible/{name}/{chapter}/{verse}"),
            text,
        )
    }

    fn entry(entry_type: EntryType, reference: &str, text: &str) -> SearchDocument {
        SearchDocument {
            kind: DocumentKind::Entry { entry_type },
            reference: reference.to_string(),
            link: format!("/entry/{reference}"),
            plain_text: text.to_string(),
            searchable: SearchableText::new(&format!("{reference} {text}")),
        }
    }

    fn engine() -> SearchEngine {
        let mut engine = SearchEngine::default();
        engine.index_documents(vec![
            verse(10, 15, 6, "1Mo", "Abram glaubte dem HERRN, und er rechnete es ihm zur Gerechtigkeit"),
            verse(520, 4, 3, "Röm", "Abraham aber glaubte Gott, und es wurde ihm zur Gerechtigkeit gerechnet"),
            verse(660, 2, 17, "Jak", "So ist auch der Glaube, wenn er keine Werke hat, tot"),
            entry(EntryType::Journal, "Glaube", "Glaube und Gerechtigkeit hängen zusammen"),
            entry(EntryType::Sermon, "Predigt: Werke", "Werke folgen dem Glauben"),
        ]);
        engine
    }

    #[rstest]
    #[case("", Error::EmptyQuery)]
    #[case("   ", Error::EmptyQuery)]
    #[case("ab", Error::QueryTooShort { min: 3 })]
    #[case("-werke -tot", Error::NoSearchTerms)]
    fn test_query_guards(#[case] query: &str, #[case] expected: Error) {
        assert_eq!(engine().search(query, SearchFilter::All, 1).unwrap_err(), expected);
    }

    #[test]
    fn test_quoted_short_query_is_allowed() {
        let page = engine().search("\"er\"", SearchFilter::All, 1).unwrap();
        assert!(page.total > 0);
    }

    #[test]
    fn test_results_keep_document_order() {
        let page = engine().search("gerechtigkeit", SearchFilter::All, 1).unwrap();
        let refs: Vec<&str> = page.hits.iter().map(|h| h.reference.as_str()).collect();
        assert_eq!(refs, vec!["1Mo 15:6", "Röm 4:3", "Glaube"]);
        assert!(page.hits[1].snippet.contains("<mark>Gerechtigkeit</mark>"));
    }

    #[rstest]
    #[case(SearchFilter::Bible(TestamentFilter::All), 3)]
    #[case(SearchFilter::Bible(TestamentFilter::Old), 1)]
    #[case(SearchFilter::Bible(TestamentFilter::New), 2)]
    #[case(SearchFilter::Entries(EntryType::Sermon), 1)]
    #[case(SearchFilter::Entries(EntryType::Note), 0)]
    #[case(SearchFilter::All, 5)]
    fn test_filters(#[case] filter: SearchFilter, #[case] expected: usize) {
        let page = engine().search("glaub abra* werke", filter, 1).unwrap();
        assert_eq!(page.total, expected, "{filter}");
    }

    #[test]
    fn test_pagination() {
        let mut engine = SearchEngine::new(
            SearchConfig {
                page_size: 2,
                ..SearchConfig::default()
            },
            TestamentBoundary::default(),
        );
        engine.index_documents((1..=5).map(|v| verse(500, 1, v, "Joh", "Das Wort")).collect());

        let first = engine.search("wort", SearchFilter::All, 0).unwrap();
        assert_eq!((first.total, first.page, first.hits.len()), (5, 1, 2));
        assert_eq!(first.total_pages(), 3);
        let last = engine.search("wort", SearchFilter::All, 3).unwrap();
        assert_eq!(last.hits.len(), 1);
        assert_eq!(last.hits[0].reference, "Joh 1:5");
        assert!(engine.search("wort", SearchFilter::All, 4).unwrap().hits.is_empty());

        let beyond = engine.search("wort", SearchFilter::All, usize::MAX).unwrap();
        assert_eq!((beyond.total, beyond.page), (5, usize::MAX));
        assert!(beyond.hits.is_empty());
    }

    #[test]
    fn test_compiled_queries_are_reused() {
        let engine = engine();
        let first = engine.prepare("glaube").unwrap();
        let second = engine.prepare("  glaube ").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[rstest]
    #[case("all", SearchFilter::All)]
    #[case("bible", SearchFilter::Bible(TestamentFilter::All))]
    #[case("chapter_note", SearchFilter::Entries(EntryType::ChapterNote))]
    fn test_filter_parsing(#[case] raw: &str, #[case] expected: SearchFilter) {
        assert_eq!(raw.parse::<SearchFilter>().unwrap(), expected);
        assert!("verses".parse::<SearchFilter>().is_err());
        assert_eq!("NT".parse::<TestamentFilter>().unwrap(), TestamentFilter::New);
    }
}
