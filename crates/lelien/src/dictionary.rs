// Dictionary sources and the word index

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum length (in characters) of an indexed dictionary word, exclusive
const MIN_INDEXED_WORD: usize = 2;

/// A topic defined by one dictionary source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryTopic {
    /// Topic text; may list several aliases separated by `,` or `;`
    pub topic: String,

    /// Definition markup
    #[serde(default)]
    pub definition: String,
}

impl DictionaryTopic {
    /// Lower-cased index words of this topic (longer than two characters)
    pub fn index_words(&self) -> impl Iterator<Item = String> + '_ {
        self.topic
            .split([',', ';'])
            .map(|t| t.trim().to_lowercase())
            .filter(|t| t.chars().count() > MIN_INDEXED_WORD)
    }
}

/// One dictionary with its topics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionarySource {
    /// Source id used in dictionary links
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Topics in source order
    #[serde(default)]
    pub data: Vec<DictionaryTopic>,
}

/// Ordered dictionary sources. Earlier sources win topic resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DictionaryCatalog {
    sources: Vec<DictionarySource>,
}

impl DictionaryCatalog {
    /// Create a catalog
    pub fn new(sources: Vec<DictionarySource>) -> Self {
        Self { sources }
    }

    /// All sources in priority order
    pub fn sources(&self) -> &[DictionarySource] {
        &self.sources
    }

    /// Source by id
    pub fn get(&self, id: &str) -> Option<&DictionarySource> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// First source with a topic equal (case-insensitively) to `topic`
    pub fn source_for_topic(&self, topic: &str) -> Option<&DictionarySource> {
        let wanted = topic.trim().to_lowercase();
        self.sources.iter().find(|source| {
            source
                .data
                .iter()
                .any(|entry| entry.topic.trim().to_lowercase() == wanted)
        })
    }

    /// First source with a topic whose index words include `word`
    pub fn source_for_word(&self, word: &str) -> Option<&DictionarySource> {
        self.sources.iter().find(|source| {
            source
                .data
                .iter()
                .any(|entry| entry.index_words().any(|w| w == word))
        })
    }

    /// Source for a structured topic link: the defining source, else the
    /// first source, else `fallback`.
    pub fn resolve_link_source<'a>(&'a self, topic: &str, fallback: &'a str) -> &'a str {
        self.source_for_topic(topic)
            .or_else(|| self.sources.first())
            .map_or(fallback, |source| source.id.as_str())
    }

    /// Topic entry of a source (case-insensitive)
    pub fn lookup(&self, source_id: &str, topic: &str) -> Option<&DictionaryTopic> {
        let wanted = topic.trim().to_lowercase();
        self.get(source_id)?
            .data
            .iter()
            .find(|entry| entry.topic.trim().to_lowercase() == wanted)
    }
}

/// Flat set of lower-cased dictionary words used for stemmed matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DictionaryWordIndex {
    words: BTreeSet<String>,
}

impl DictionaryWordIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from every topic of every source
    pub fn from_catalog(catalog: &DictionaryCatalog) -> Self {
        let words = catalog
            .sources()
            .iter()
            .flat_map(|source| source.data.iter())
            .flat_map(DictionaryTopic::index_words)
            .collect();
        Self { words }
    }

    /// Add one word (lower-cased)
    pub fn insert(&mut self, word: &str) {
        self.words.insert(word.to_lowercase());
    }

    /// Membership test; `word` must already be lower-cased
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl FromIterator<String> for DictionaryWordIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DictionaryCatalog {
        DictionaryCatalog::new(vec![
            DictionarySource {
                id: "jma".to_string(),
                name: "Jüdisches Wörterbuch".to_string(),
                data: vec![DictionaryTopic {
                    topic: "Gnade; Huld".to_string(),
                    definition: String::new(),
                }],
            },
            DictionarySource {
                id: "bk".to_string(),
                name: "Begriffe".to_string(),
                data: vec![
                    DictionaryTopic {
                        topic: "Glaube".to_string(),
                        definition: String::new(),
                    },
                    DictionaryTopic {
                        topic: "Ur, Ai".to_string(),
                        definition: String::new(),
                    },
                ],
            },
        ])
    }

    #[test]
    fn test_word_index_splits_topics() {
        let index = DictionaryWordIndex::from_catalog(&catalog());
        let words: Vec<&str> = index.iter().collect();
        // "ur" and "ai" are too short
        assert_eq!(words, vec!["glaube", "gnade", "huld"]);
    }

    #[test]
    fn test_source_resolution() {
        let catalog = catalog();
        assert_eq!(catalog.source_for_topic("GLAUBE").unwrap().id, "bk");
        assert_eq!(catalog.source_for_word("huld").unwrap().id, "jma");
        assert!(catalog.source_for_word("liebe").is_none());

        assert_eq!(catalog.resolve_link_source("Glaube", "fallback"), "bk");
        assert_eq!(catalog.resolve_link_source("Liebe", "fallback"), "jma");
        assert_eq!(
            DictionaryCatalog::default().resolve_link_source("Liebe", "fallback"),
            "fallback"
        );
    }
}
