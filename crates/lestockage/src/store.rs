// Whole-collection persistence
//
// *Le Magasin* (The Store) - Reads and replaces entire collections, never single records

use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Named collections of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Canonical books
    Books,

    /// Bible translations with their verses
    Translations,

    /// Authored entries
    Entries,

    /// Dictionary sources
    Dictionaries,

    /// Lexicon entries
    Lexicon,
}

impl Collection {
    /// Every collection
    pub const ALL: [Collection; 5] = [
        Collection::Books,
        Collection::Translations,
        Collection::Entries,
        Collection::Dictionaries,
        Collection::Lexicon,
    ];

    /// Stable collection name
    pub fn name(self) -> &'static str {
        match self {
            Collection::Books => "books",
            Collection::Translations => "translations",
            Collection::Entries => "entries",
            Collection::Dictionaries => "dictionaries",
            Collection::Lexicon => "lexicon",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Persistence collaborator: a read returns the whole collection and a
/// write replaces it. A collection that was never written reads as empty.
pub trait CollectionStore: Send + Sync {
    /// Read all items of a collection
    fn read(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Replace all items of a collection
    fn write(&self, collection: Collection, items: Vec<Value>) -> Result<()>;
}

/// Read a collection into typed items
pub fn read_collection<T: DeserializeOwned>(store: &dyn CollectionStore, collection: Collection) -> Result<Vec<T>> {
    store
        .read(collection)?
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|source| serialization(collection, source)))
        .collect()
}

/// Replace a collection with typed items
pub fn write_collection<T: Serialize>(store: &dyn CollectionStore, collection: Collection, items: &[T]) -> Result<()> {
    let values = items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(|source| serialization(collection, source)))
        .collect::<Result<Vec<_>>>()?;
    store.write(collection, values)
}

fn serialization(collection: Collection, source: serde_json::Error) -> StoreError {
    StoreError::Serialization {
        collection: collection.name().to_string(),
        source,
    }
}

/// In-memory store, used by tests and embedders that own persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for MemoryStore {
    fn read(&self, collection: Collection) -> Result<Vec<Value>> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    fn write(&self, collection: Collection, items: Vec<Value>) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        collections.insert(collection, items);
        Ok(())
    }
}

/// One JSON array file per collection (`<root>/<name>.json`)
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Store rooted at a directory; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding a collection
    pub fn path_of(&self, collection: Collection) -> PathBuf {
        self.root.join(format!("{}.json", collection.name()))
    }
}

impl CollectionStore for JsonDirStore {
    fn read(&self, collection: Collection) -> Result<Vec<Value>> {
        let path = self.path_of(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let items: Vec<Value> = serde_json::from_str(&raw).map_err(|source| serialization(collection, source))?;
        debug!("Read {} items from {}", items.len(), path.display());
        Ok(items)
    }

    fn write(&self, collection: Collection, items: Vec<Value>) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let path = self.path_of(collection);
        let json = serde_json::to_string_pretty(&items).map_err(|source| serialization(collection, source))?;

        // write a sibling file, then rename over the collection
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {} items to {}", items.len(), path.display());
        Ok(())
    }
}
