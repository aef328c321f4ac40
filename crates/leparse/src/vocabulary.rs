// Relative citation vocabulary

use serde::{Deserialize, Serialize};

/// Words that trigger relative citations such as `verse 3` or
/// `im nächsten Kapitel, Vers 2`.
///
/// This is language dependent and therefore configuration; the defaults
/// cover German and English. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImplicitVocabulary {
    /// Optional words preceding a relative citation (`in`, `im`)
    pub lead_ins: Vec<String>,

    /// Words for "verse"
    pub verse_words: Vec<String>,

    /// Words for "chapter"
    pub chapter_words: Vec<String>,

    /// Words selecting the following chapter
    pub next_words: Vec<String>,

    /// Words selecting the preceding chapter
    pub previous_words: Vec<String>,
}

impl Default for ImplicitVocabulary {
    fn default() -> Self {
        Self {
            lead_ins: strings(&["in", "im", "in the"]),
            verse_words: strings(&["Vers", "Verse"]),
            chapter_words: strings(&["Kapitel", "chapter"]),
            next_words: strings(&["nächsten", "next", "following"]),
            previous_words: strings(&["vorherigen", "previous", "preceding"]),
        }
    }
}

impl ImplicitVocabulary {
    /// Vocabulary that recognizes no relative citations
    pub fn disabled() -> Self {
        Self {
            lead_ins: Vec::new(),
            verse_words: Vec::new(),
            chapter_words: Vec::new(),
            next_words: Vec::new(),
            previous_words: Vec::new(),
        }
    }

    /// Stable text used to version compiled patterns
    pub(crate) fn fingerprint_input(&self) -> String {
        [
            &self.lead_ins,
            &self.verse_words,
            &self.chapter_words,
            &self.next_words,
            &self.previous_words,
        ]
        .iter()
        .map(|words| words.join("\u{1f}"))
        .collect::<Vec<_>>()
        .join("\u{1e}")
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
