// Book registry
//
// *Le Registre* (The Registry) - Canonical books and every name they are cited by

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Book record as it is stored: short names as one comma separated string,
/// optionally wrapped in brackets (`"[Joh, Jn]"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Canonical book number
    pub book_number: u32,

    /// Full book name
    pub long_name: String,

    /// Comma separated short names
    #[serde(default)]
    pub short_name: String,
}

/// A canonical book with its parsed aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BookRecord", into = "BookRecord")]
pub struct Book {
    /// Canonical book number; ordering defines book sequence
    pub book_number: u32,

    /// Full book name
    pub long_name: String,

    /// Short names in source order
    pub short_names: Vec<String>,
}

impl Book {
    /// Create a book from its stored short-name string
    pub fn new(book_number: u32, long_name: impl Into<String>, short_name: &str) -> Self {
        Self {
            book_number,
            long_name: long_name.into(),
            short_names: parse_short_names(short_name),
        }
    }

    /// First short name, used for links
    pub fn primary_short_name(&self) -> &str {
        self.short_names.first().map(String::as_str).unwrap_or("")
    }

    /// Long name followed by all short names
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.long_name.as_str())
            .chain(self.short_names.iter().map(String::as_str))
            .filter(|alias| !alias.trim().is_empty())
    }
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Book::new(record.book_number, record.long_name, &record.short_name)
    }
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        BookRecord {
            book_number: book.book_number,
            long_name: book.long_name,
            short_name: book.short_names.join(", "),
        }
    }
}

/// Split a stored short-name string into aliases.
pub fn parse_short_names(raw: &str) -> Vec<String> {
    raw.replace(['[', ']'], "")
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lookup form of an alias: lower-cased with all whitespace removed, so that
/// `"1 Mo"` and `"1Mo"` resolve to the same book.
pub fn normalize_alias(alias: &str) -> String {
    alias
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Result of a prefix alias match
#[derive(Debug, Clone, Copy)]
pub struct PrefixMatch<'a> {
    /// Matched book
    pub book: &'a Book,

    /// Input text that matched the alias
    pub matched: &'a str,

    /// Remaining input after the alias
    pub rest: &'a str,
}

/// Read-only registry of books and their aliases.
#[derive(Debug, Clone, Default)]
pub struct BookRegistry {
    books: Vec<Book>,
    by_number: HashMap<u32, usize>,
    by_alias: HashMap<String, usize>,
    /// Lower-cased aliases, longest first
    prefix_aliases: Vec<(String, usize)>,
    fingerprint: String,
}

impl BookRegistry {
    /// Build a registry; books are ordered by book number and the first book
    /// registering an alias keeps it.
    pub fn new(mut books: Vec<Book>) -> Self {
        books.sort_by_key(|b| b.book_number);

        let mut by_number = HashMap::new();
        let mut by_alias = HashMap::new();
        let mut prefix_aliases = Vec::new();

        for (idx, book) in books.iter().enumerate() {
            by_number.entry(book.book_number).or_insert(idx);
            for alias in book.aliases() {
                by_alias.entry(normalize_alias(alias)).or_insert(idx);
                prefix_aliases.push((alias.trim().to_lowercase(), idx));
            }
        }

        prefix_aliases.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut hasher = blake3::Hasher::new();
        for book in &books {
            hasher.update(&book.book_number.to_le_bytes());
            for alias in book.aliases() {
                hasher.update(alias.as_bytes());
                hasher.update(&[0]);
            }
        }
        let fingerprint = hasher.finalize().to_hex().to_string();

        Self {
            books,
            by_number,
            by_alias,
            prefix_aliases,
            fingerprint,
        }
    }

    /// All books in canonical order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Number of registered books
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Book by canonical number
    pub fn get(&self, book_number: u32) -> Option<&Book> {
        self.by_number.get(&book_number).map(|&idx| &self.books[idx])
    }

    /// Exact, case-insensitive alias lookup (long or short name)
    pub fn find_by_alias(&self, alias: &str) -> Option<&Book> {
        self.by_alias
            .get(&normalize_alias(alias))
            .map(|&idx| &self.books[idx])
    }

    /// Longest alias that prefixes `input` and is not followed by a letter.
    pub fn find_prefix_match<'a>(&'a self, input: &'a str) -> Option<PrefixMatch<'a>> {
        let trimmed = input.trim();
        let lowered = trimmed.to_lowercase();

        for (alias, idx) in &self.prefix_aliases {
            if !lowered.starts_with(alias.as_str()) {
                continue;
            }
            let alias_chars = alias.chars().count();
            if lowered
                .chars()
                .nth(alias_chars)
                .is_some_and(char::is_alphabetic)
            {
                continue;
            }
            let split = trimmed
                .char_indices()
                .nth(alias_chars)
                .map(|(pos, _)| pos)
                .unwrap_or(trimmed.len());
            return Some(PrefixMatch {
                book: &self.books[*idx],
                matched: &trimmed[..split],
                rest: &trimmed[split..],
            });
        }
        None
    }

    /// Every alias used for recognition, longest first.
    pub fn pattern_aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .books
            .iter()
            .flat_map(|book| book.aliases())
            .map(str::trim)
            .collect();
        aliases.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        aliases.dedup();
        aliases
    }

    /// Stable hash of the alias list, used as the pattern cache version
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BookRegistry {
        BookRegistry::new(vec![
            Book::new(520, "Römer", "[Röm, Rom, Ro]"),
            Book::new(500, "Johannes", "Joh, John, Jn"),
            Book::new(10, "1. Mose", "1Mo, Gen"),
        ])
    }

    #[test]
    fn test_short_names_are_parsed() {
        let book = Book::new(520, "Römer", "[Röm, Rom, , Ro]");
        assert_eq!(book.short_names, vec!["Röm", "Rom", "Ro"]);
        assert_eq!(book.primary_short_name(), "Röm");
    }

    #[test]
    fn test_alias_lookup_is_case_and_space_insensitive() {
        let registry = registry();
        assert_eq!(registry.find_by_alias("rom").unwrap().book_number, 520);
        assert_eq!(registry.find_by_alias("JOHANNES").unwrap().book_number, 500);
        assert_eq!(registry.find_by_alias("1 Mo").unwrap().book_number, 10);
        assert!(registry.find_by_alias("Xyz").is_none());
    }

    #[test]
    fn test_books_sorted_by_number() {
        let registry = registry();
        let numbers: Vec<u32> = registry.books().iter().map(|b| b.book_number).collect();
        assert_eq!(numbers, vec![10, 500, 520]);
    }

    #[test]
    fn test_prefix_match_prefers_longest_alias() {
        let registry = registry();
        let hit = registry.find_prefix_match("Johannes 3,16").unwrap();
        assert_eq!(hit.book.book_number, 500);
        assert_eq!(hit.matched, "Johannes");
        assert_eq!(hit.rest.trim(), "3,16");
    }

    #[test]
    fn test_prefix_match_rejects_letter_continuation() {
        let registry = registry();
        // "Rob" starts with "Ro" but continues with a letter
        assert!(registry.find_prefix_match("Robert 3").is_none());
    }

    #[test]
    fn test_pattern_aliases_longest_first() {
        let registry = registry();
        let aliases = registry.pattern_aliases();
        let ro = aliases.iter().position(|a| *a == "Ro").unwrap();
        let rom = aliases.iter().position(|a| *a == "Rom").unwrap();
        let roemer = aliases.iter().position(|a| *a == "Römer").unwrap();
        assert!(roemer < rom);
        assert!(rom < ro);
    }

    #[test]
    fn test_fingerprint_tracks_aliases() {
        let a = registry();
        let b = registry();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = BookRegistry::new(vec![Book::new(520, "Römer", "Röm")]);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_book_record_conversion() {
        let book = Book::from(BookRecord {
            book_number: 470,
            long_name: "Matthäus".to_string(),
            short_name: "[Mt, Mat]".to_string(),
        });
        assert_eq!(book.short_names, vec!["Mt", "Mat"]);

        let record = BookRecord::from(book);
        assert_eq!(record.short_name, "Mt, Mat");
    }
}
