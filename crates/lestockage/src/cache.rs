// Annotation cache
//
// *La Mémoire* (The Memory) - One annotation bundle per entry, recomputed only when the entry changes

use crate::entry::{Entry, EntryLabel};
use lelien::{Annotation, Annotator, DictionaryCatalog, LinkerConfig, MarkupRenderer};
use leparse::{ChapterBoundMap, MentionPattern};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Default number of cached bundles
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// BLAKE3 hash of everything a bundle is derived from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash the parts of an entry that feed its bundle
    pub fn of_entry(entry: &Entry, label: &EntryLabel) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in [entry.content.as_str(), label.reference.as_str(), label.link.as_str()] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        for tag in &entry.tags {
            hasher.update(tag.as_bytes());
            hasher.update(&[0]);
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// BLAKE3 hash of the reference data every bundle depends on: the mention
/// pattern (books and vocabulary), the chapter bounds, the dictionaries and
/// the linker settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceFingerprint(String);

impl ReferenceFingerprint {
    /// Fingerprint the reference data of one rebuild
    pub fn new(
        pattern: &MentionPattern,
        bounds: &ChapterBoundMap,
        dictionaries: &DictionaryCatalog,
        linker: &LinkerConfig,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(pattern.version().as_bytes());
        hasher.update(&[0]);
        hash_json(&mut hasher, bounds);
        hash_json(&mut hasher, dictionaries);
        hash_json(&mut hasher, linker);
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn hash_json<T: Serialize>(hasher: &mut blake3::Hasher, value: &T) {
    if let Ok(bytes) = serde_json::to_vec(value) {
        hasher.update(&bytes);
    }
    hasher.update(&[0]);
}

/// Annotation of one entry plus its search projections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBundle {
    /// Entry id
    pub entry_id: String,

    /// Reference label and link
    pub label: EntryLabel,

    /// Annotation of the rendered content
    pub annotation: Annotation,

    /// `"<ref> <plain text> <tags>"`
    pub searchable_text: String,

    /// Lower-cased searchable text
    pub searchable_text_lower: String,

    /// Hash of the inputs
    pub content_hash: ContentHash,
}

/// Renderer and annotator used to build bundles
#[derive(Clone, Copy)]
pub struct AnnotationPipeline<'a> {
    renderer: &'a dyn MarkupRenderer,
    annotator: Annotator<'a>,
    reference: Option<&'a ReferenceFingerprint>,
}

impl<'a> AnnotationPipeline<'a> {
    /// Create a pipeline
    pub fn new(renderer: &'a dyn MarkupRenderer, annotator: Annotator<'a>) -> Self {
        Self {
            renderer,
            annotator,
            reference: None,
        }
    }

    /// Tag the pipeline with the fingerprint of its reference data
    pub fn with_reference(mut self, reference: &'a ReferenceFingerprint) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Fingerprint of the reference data, if tagged
    pub fn reference(&self) -> Option<&ReferenceFingerprint> {
        self.reference
    }

    /// Build the bundle of an entry without consulting any cache
    pub fn annotate(&self, entry: &Entry, label: &EntryLabel) -> AnnotationBundle {
        let html = self.renderer.render(&entry.content);
        let annotation = self.annotator.annotate_html(&html);
        let searchable_text = format!(
            "{} {} {}",
            label.reference,
            annotation.plain_text,
            entry.tags.join(" ")
        );

        AnnotationBundle {
            entry_id: entry.id.clone(),
            label: label.clone(),
            searchable_text_lower: searchable_text.to_lowercase(),
            searchable_text,
            annotation,
            content_hash: ContentHash::of_entry(entry, label),
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that annotated
    pub misses: u64,

    /// Bundles currently cached
    pub entries: usize,

    /// Maximum number of bundles
    pub capacity: usize,
}

/// Least-recently-used map from entry id to bundle.
///
/// A cached bundle is reused while the entry's [`ContentHash`] and the
/// pipeline's [`ReferenceFingerprint`] are unchanged; a new fingerprint
/// empties the cache. [`AnnotationCache::invalidate`] drops a bundle
/// explicitly after an edit.
pub struct AnnotationCache {
    bundles: LruCache<String, Arc<AnnotationBundle>>,
    reference: Option<ReferenceFingerprint>,
    hits: u64,
    misses: u64,
}

impl AnnotationCache {
    /// Create a cache holding at most `capacity` bundles (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            bundles: LruCache::new(capacity),
            reference: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached bundle of an entry, annotating it on a miss
    pub fn get_or_annotate(
        &mut self,
        entry: &Entry,
        label: &EntryLabel,
        pipeline: &AnnotationPipeline<'_>,
    ) -> Arc<AnnotationBundle> {
        if pipeline.reference() != self.reference.as_ref() {
            if !self.bundles.is_empty() {
                debug!("Reference data changed, dropping {} cached bundles", self.bundles.len());
            }
            self.bundles.clear();
            self.reference = pipeline.reference().cloned();
        }

        let hash = ContentHash::of_entry(entry, label);
        if let Some(bundle) = self.bundles.get(&entry.id) {
            if bundle.content_hash == hash {
                self.hits += 1;
                return Arc::clone(bundle);
            }
        }

        self.misses += 1;
        debug!("Annotating entry {} ({} bytes)", entry.id, entry.content.len());
        let bundle = Arc::new(pipeline.annotate(entry, label));
        self.bundles.put(entry.id.clone(), Arc::clone(&bundle));
        bundle
    }

    /// Cached bundle without annotating
    pub fn peek(&self, entry_id: &str) -> Option<Arc<AnnotationBundle>> {
        self.bundles.peek(entry_id).cloned()
    }

    /// Drop the bundle of an edited or removed entry
    pub fn invalidate(&mut self, entry_id: &str) -> bool {
        self.bundles.pop(entry_id).is_some()
    }

    /// Drop every bundle
    pub fn clear(&mut self) {
        self.bundles.clear();
    }

    /// Counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.bundles.len(),
            capacity: self.bundles.cap().get(),
        }
    }
}

impl Default for AnnotationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use lelien::{DictionaryCatalog, MarkdownRenderer};
    use leparse::{build_mention_pattern, Book, BookRegistry, ChapterBoundMap, ImplicitVocabulary, Recognizer, VerseKey};

    struct Fixture {
        registry: BookRegistry,
        bounds: ChapterBoundMap,
        pattern: leparse::MentionPattern,
        catalog: DictionaryCatalog,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = BookRegistry::new(vec![Book::new(520, "Römer", "Röm, Rom")]);
            let bounds = ChapterBoundMap::from_keys(vec![VerseKey::new(520, 8, 39)]);
            let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
            Self {
                registry,
                bounds,
                pattern,
                catalog: DictionaryCatalog::default(),
            }
        }

        fn pipeline(&self) -> AnnotationPipeline<'_> {
            let recognizer = Recognizer::new(&self.pattern, &self.registry, &self.bounds);
            AnnotationPipeline::new(&MarkdownRenderer, Annotator::new(recognizer, &self.catalog))
        }
    }

    fn entry(content: &str) -> (Entry, EntryLabel) {
        let entry = Entry::new("j1", EntryKind::Journal { journal: "Studium".into() }, content)
            .with_title("Römerbrief")
            .with_tags(["Paulus", "Gnade"]);
        let label = EntryLabel {
            reference: "Römerbrief".to_string(),
            link: "/journal/view/Studium/entry/j1".to_string(),
        };
        (entry, label)
    }

    #[test]
    fn test_bundle_projections() {
        let fixture = Fixture::new();
        let (entry, label) = entry("Lies **Röm 8,1** und Röm 8,1.");
        let bundle = fixture.pipeline().annotate(&entry, &label);

        assert_eq!(bundle.annotation.internal_links.len(), 1);
        assert_eq!(bundle.annotation.internal_links[0].key, VerseKey::new(520, 8, 1));
        assert_eq!(bundle.searchable_text, "Römerbrief Lies Röm 8,1 und Röm 8,1. Paulus Gnade");
        assert_eq!(bundle.searchable_text_lower, bundle.searchable_text.to_lowercase());
    }

    #[test]
    fn test_second_lookup_is_a_hit() {
        let fixture = Fixture::new();
        let pipeline = fixture.pipeline();
        let mut cache = AnnotationCache::new(8);
        let (entry, label) = entry("Röm 8,28");

        let first = cache.get_or_annotate(&entry, &label, &pipeline);
        let second = cache.get_or_annotate(&entry, &label, &pipeline);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_edit_recomputes_bundle() {
        let fixture = Fixture::new();
        let pipeline = fixture.pipeline();
        let mut cache = AnnotationCache::new(8);
        let (mut entry, label) = entry("Röm 8,28");

        let before = cache.get_or_annotate(&entry, &label, &pipeline);
        entry.content = "Röm 8,31".to_string();
        let after = cache.get_or_annotate(&entry, &label, &pipeline);

        assert_ne!(before.content_hash, after.content_hash);
        assert_eq!(after.annotation.internal_links[0].key, VerseKey::new(520, 8, 31));
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_invalidate_and_capacity() {
        let fixture = Fixture::new();
        let pipeline = fixture.pipeline();
        let mut cache = AnnotationCache::new(0);
        assert_eq!(cache.stats().capacity, 1);

        let (entry, label) = entry("Röm 8,1");
        cache.get_or_annotate(&entry, &label, &pipeline);
        assert!(cache.peek("j1").is_some());
        assert!(cache.invalidate("j1"));
        assert!(!cache.invalidate("j1"));
        assert!(cache.peek("j1").is_none());
    }

    #[test]
    fn test_reference_change_drops_bundles() {
        let mut fixture = Fixture::new();
        let mut cache = AnnotationCache::new(8);
        let (entry, label) = entry("Röm 8,39 und Röm 9,1");

        let before = ReferenceFingerprint::new(&fixture.pattern, &fixture.bounds, &fixture.catalog, &LinkerConfig::default());
        let first = cache.get_or_annotate(&entry, &label, &fixture.pipeline().with_reference(&before));
        assert_eq!(first.annotation.internal_links.len(), 1);

        fixture.bounds.observe(VerseKey::new(520, 9, 1));
        let after = ReferenceFingerprint::new(&fixture.pattern, &fixture.bounds, &fixture.catalog, &LinkerConfig::default());
        assert_ne!(before, after);

        let second = cache.get_or_annotate(&entry, &label, &fixture.pipeline().with_reference(&after));
        assert_eq!(second.annotation.internal_links.len(), 2);
        assert_eq!(cache.stats().misses, 2);

        let third = cache.get_or_annotate(&entry, &label, &fixture.pipeline().with_reference(&after));
        assert!(Arc::ptr_eq(&second, &third));
    }
}
