// Lexicon identifiers
//
// *Le Lexique* (The Lexicon) - Strong's numbers with their testament prefix

use crate::error::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static LEXICON_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:[GH])\d{1,5}$").expect("lexicon id pattern is valid"));

/// Testament a book (and thus a lexicon number) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Testament {
    /// Hebrew lexicon, prefix `H`
    Old,

    /// Greek lexicon, prefix `G`
    New,
}

impl Testament {
    /// Lexicon prefix letter
    pub fn prefix(self) -> char {
        match self {
            Testament::Old => 'H',
            Testament::New => 'G',
        }
    }
}

/// Book number separating the testaments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestamentBoundary {
    /// Highest Old Testament book number; every larger number is New Testament
    pub last_old_testament_book: u32,
}

impl Default for TestamentBoundary {
    fn default() -> Self {
        Self {
            last_old_testament_book: 460,
        }
    }
}

impl TestamentBoundary {
    /// Testament of a book
    pub fn testament_of(&self, book_number: u32) -> Testament {
        if book_number > self.last_old_testament_book {
            Testament::New
        } else {
            Testament::Old
        }
    }
}

/// Normalized lexicon identifier such as `G26` or `H2617`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LexiconId(String);

impl LexiconId {
    /// Parse `G123`/`h123` (1-5 digits); the prefix is upper-cased.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !LEXICON_ID.is_match(raw) {
            return None;
        }
        Some(Self(raw.to_uppercase()))
    }

    /// Identifier for a bare marker number found in the text of a verse.
    pub fn from_marker(number: &str, book_number: u32, boundary: &TestamentBoundary) -> Option<Self> {
        let prefix = boundary.testament_of(book_number).prefix();
        Self::parse(&format!("{prefix}{}", number.trim()))
    }

    /// String form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Testament encoded by the prefix
    pub fn testament(&self) -> Testament {
        if self.0.starts_with('G') {
            Testament::New
        } else {
            Testament::Old
        }
    }

    /// Numeric part
    pub fn number(&self) -> u32 {
        self.0[1..].parse().unwrap_or(0)
    }
}

impl fmt::Display for LexiconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LexiconId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LexiconId::parse(&value).ok_or(Error::InvalidLexiconId(value))
    }
}

impl From<LexiconId> for String {
    fn from(id: LexiconId) -> Self {
        id.0
    }
}
