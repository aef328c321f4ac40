// Composite reference keys

use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single verse coordinate, rendered as `"<book>-<chapter>-<verse>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseKey {
    /// Canonical book number
    pub book: u32,

    /// Chapter number (1-based)
    pub chapter: u32,

    /// Verse number (1-based)
    pub verse: u32,
}

impl VerseKey {
    /// Create a new verse key
    pub fn new(book: u32, chapter: u32, verse: u32) -> Self {
        Self {
            book,
            chapter,
            verse,
        }
    }

    /// Key of the chapter containing this verse
    pub fn chapter_key(&self) -> ChapterKey {
        ChapterKey::new(self.book, self.chapter)
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.book, self.chapter, self.verse)
    }
}

impl FromStr for VerseKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_parts::<3>(s) {
            Some([book, chapter, verse]) => Ok(Self::new(book, chapter, verse)),
            None => Err(Error::InvalidKey(s.to_string())),
        }
    }
}

/// A chapter coordinate, rendered as `"<book>-<chapter>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChapterKey {
    /// Canonical book number
    pub book: u32,

    /// Chapter number (1-based)
    pub chapter: u32,
}

impl ChapterKey {
    /// Create a new chapter key
    pub fn new(book: u32, chapter: u32) -> Self {
        Self { book, chapter }
    }

    /// Key of a verse inside this chapter
    pub fn verse(&self, verse: u32) -> VerseKey {
        VerseKey::new(self.book, self.chapter, verse)
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.book, self.chapter)
    }
}

impl FromStr for ChapterKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_parts::<2>(s) {
            Some([book, chapter]) => Ok(Self::new(book, chapter)),
            None => Err(Error::InvalidKey(s.to_string())),
        }
    }
}

fn parse_parts<const N: usize>(s: &str) -> Option<[u32; N]> {
    let mut out = [0u32; N];
    let mut parts = s.trim().split('-');
    for slot in out.iter_mut() {
        *slot = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

// Keys serialize as their display string so they can be used as JSON map keys.
macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(VerseKey);
string_serde!(ChapterKey);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_key_display_and_parse() {
        let key = VerseKey::new(520, 8, 1);
        assert_eq!(key.to_string(), "520-8-1");
        assert_eq!("520-8-1".parse::<VerseKey>().unwrap(), key);
        assert_eq!(key.chapter_key().to_string(), "520-8");
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        assert!("520-8".parse::<VerseKey>().is_err());
        assert!("520-8-1-2".parse::<VerseKey>().is_err());
        assert!("a-b".parse::<ChapterKey>().is_err());
        assert!("".parse::<ChapterKey>().is_err());
    }

    #[test]
    fn test_keys_order_canonically() {
        let mut keys = vec![
            VerseKey::new(520, 8, 10),
            VerseKey::new(470, 5, 3),
            VerseKey::new(520, 8, 2),
        ];
        keys.sort();
        assert_eq!(keys[0], VerseKey::new(470, 5, 3));
        assert_eq!(keys[2], VerseKey::new(520, 8, 10));
    }
}
