// lestockage - Annotation Storage
//
// *Le Stockage* (The Storage) - Entry bundles, reverse indices and whole-collection persistence

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Storage layer of LeVerbe.
//!
//! Entries are annotated once into an [`AnnotationBundle`] held by the
//! [`AnnotationCache`]; the [`IndexBuilder`] folds all bundles and verse texts
//! into an [`IndexStore`] that is always rebuilt as a whole. Collections are
//! read and replaced through a [`CollectionStore`].

/// Entry bundles and the LRU annotation cache.
pub mod cache;
/// Books, translations, lexicon, dictionaries and entries.
pub mod dataset;
/// Authored entries and their labels.
pub mod entry;
/// Store error type.
pub mod error;
/// Reverse indices and their builder.
pub mod index;
/// Whole-collection persistence.
pub mod store;

pub use cache::{AnnotationBundle, AnnotationCache, AnnotationPipeline, CacheStats, ContentHash, ReferenceFingerprint};
pub use dataset::{Dataset, LexiconEntry, Translation, VerseRecord};
pub use entry::{verse_link, Entry, EntryKind, EntryLabel, EntryType};
pub use error::{Result, StoreError};
pub use index::{IndexBuilder, IndexConfig, IndexStats, IndexStore, IndexedEntry, RefRecord, VerseMetadata};
pub use store::{read_collection, write_collection, Collection, CollectionStore, JsonDirStore, MemoryStore};

/// Storage library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
