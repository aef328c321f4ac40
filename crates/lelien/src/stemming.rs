// Dictionary word matching
//
// *La Racine* (The Root) - Suffix stripping against the dictionary word index

use crate::dictionary::DictionaryWordIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Characters separating words in free text, besides whitespace
const WORD_PUNCTUATION: &[char] = &[
    '.', ',', ';', '!', '?', '(', ')', ':', '"', '“', '„', '”', '«', '»',
];

/// Linking settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Common words never linked to the dictionary
    pub stop_words: Vec<String>,

    /// Suffixes tried in order when the full word is not indexed
    pub suffixes: Vec<String>,

    /// Words shorter than this (in characters) are ignored
    pub min_word_length: usize,

    /// Stems must be at least this long (in characters)
    pub min_stem_length: usize,

    /// Dictionary used for topic links when no source is loaded
    pub default_dictionary: String,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            stop_words: GERMAN_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            suffixes: ["es", "en", "er", "em", "e", "s"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_word_length: 3,
            min_stem_length: 3,
            default_dictionary: "jma".to_string(),
        }
    }
}

const GERMAN_STOP_WORDS: &[&str] = &[
    "der", "die", "das", "ein", "eine", "einer", "eines", "einem", "einen", "und", "oder", "aber",
    "sondern", "als", "dass", "wenn", "weil", "ich", "du", "er", "sie", "es", "wir", "ihr", "sich",
    "mich", "dich", "uns", "euch", "mein", "dein", "sein", "unser", "euer", "bin", "bist", "ist",
    "sind", "seid", "war", "warst", "waren", "wart", "habe", "hast", "hat", "haben", "habt", "in",
    "an", "auf", "für", "von", "zu", "mit", "nach", "bei", "seit", "aus", "durch", "gegen", "ohne",
    "um", "während", "nicht", "auch", "noch", "schon", "sehr", "nur", "so", "wie", "hier", "dort",
    "da", "wo", "was", "wer", "wen", "wem", "wessen",
];

/// Matches inflected words against the dictionary word index.
#[derive(Debug, Clone)]
pub struct WordMatcher {
    stop_words: HashSet<String>,
    suffixes: Vec<String>,
    min_word_length: usize,
    min_stem_length: usize,
}

impl Default for WordMatcher {
    fn default() -> Self {
        Self::new(&LinkerConfig::default())
    }
}

impl WordMatcher {
    /// Build from linker settings
    pub fn new(config: &LinkerConfig) -> Self {
        Self {
            stop_words: config.stop_words.iter().map(|w| w.to_lowercase()).collect(),
            suffixes: config.suffixes.clone(),
            min_word_length: config.min_word_length,
            min_stem_length: config.min_stem_length,
        }
    }

    /// Indexed word matched by `word`, exactly or after stripping one suffix.
    ///
    /// The word is case-folded first; short words and stop words never match.
    pub fn lookup(&self, word: &str, index: &DictionaryWordIndex) -> Option<String> {
        let word = word.trim().to_lowercase();
        if word.chars().count() < self.min_word_length || self.stop_words.contains(&word) {
            return None;
        }
        if index.contains(&word) {
            return Some(word);
        }

        self.suffixes.iter().find_map(|suffix| {
            let stem = word.strip_suffix(suffix.as_str())?;
            if self.is_indexed_stem(stem, index) {
                return Some(stem.to_string());
            }
            // the leading `e` of a suffix may belong to the stem (gnad-en -> gnade)
            let tail = suffix.strip_prefix('e').filter(|tail| !tail.is_empty())?;
            let stem = word.strip_suffix(tail)?;
            self.is_indexed_stem(stem, index).then(|| stem.to_string())
        })
    }

    fn is_indexed_stem(&self, stem: &str, index: &DictionaryWordIndex) -> bool {
        stem.chars().count() >= self.min_stem_length && index.contains(stem)
    }
}

/// Byte ranges of the words of `text`; whitespace and common punctuation
/// separate words.
pub fn word_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;

    for (pos, c) in text.char_indices() {
        let separator = c.is_whitespace() || WORD_PUNCTUATION.contains(&c);
        match (separator, start) {
            (true, Some(s)) => {
                ranges.push((s, pos));
                start = None;
            }
            (false, None) => start = Some(pos),
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push((s, text.len()));
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn index() -> DictionaryWordIndex {
        ["gnade", "glaube", "haus", "abend"]
            .iter()
            .map(|w| w.to_string())
            .collect()
    }

    #[rstest]
    #[case("gnade", Some("gnade"))]
    #[case("Gnaden", Some("gnade"))]
    #[case("Glaubens", None)]
    #[case("Glauben", Some("glaube"))]
    #[case("Hauses", Some("haus"))]
    #[case("Abende", Some("abend"))]
    #[case("ab", None)]
    #[case("die", None)]
    #[case("Liebe", None)]
    fn test_lookup(#[case] word: &str, #[case] expected: Option<&str>) {
        let matcher = WordMatcher::default();
        assert_eq!(matcher.lookup(word, &index()).as_deref(), expected);
    }

    #[test]
    fn test_stem_must_stay_long_enough() {
        let index: DictionaryWordIndex = ["ab"].iter().map(|w| w.to_string()).collect();
        assert_eq!(WordMatcher::default().lookup("abes", &index), None);
    }

    #[test]
    fn test_word_ranges() {
        let text = "Die „Gnade“ (Röm 5), ja.";
        let words: Vec<&str> = word_ranges(text).iter().map(|&(s, e)| &text[s..e]).collect();
        assert_eq!(words, vec!["Die", "Gnade", "Röm", "5", "ja"]);
    }
}
