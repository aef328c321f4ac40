// Verse text segmentation
//
// *Le Verset* (The Verse) - Lexicon markers and editorial markup inside translation text

use crate::markup::{escape_attr, escape_text};
use leparse::{LexiconId, TestamentBoundary};
use once_cell::sync::Lazy;
use regex::Regex;

/// Editorial notes and layout markers that never reach the reader
static EDITORIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)〈.*?〉|\[.*?\]|<pb\s*/?>|<br\s*/?>").expect("editorial pattern is valid")
});

static MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<S>\s*(?P<number>[0-9]{1,5})\s*</S>|(?P<open><J>)|(?P<close></J>)")
        .expect("verse markup pattern is valid")
});

/// One piece of a verse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerseSegment {
    /// Reader-visible text
    Text {
        /// Text content (may contain other inline markup)
        text: String,

        /// Inside `<J>...</J>`
        words_of_jesus: bool,
    },

    /// `<S>n</S>` marker attached to the preceding word
    Lexicon {
        /// Identifier with the testament prefix
        id: LexiconId,

        /// Inside `<J>...</J>`
        words_of_jesus: bool,
    },
}

/// Split raw verse text into text and lexicon marker segments.
///
/// The lexicon prefix follows the testament of `book_number`.
pub fn segment_verse_text(
    raw: &str,
    book_number: u32,
    boundary: &TestamentBoundary,
) -> Vec<VerseSegment> {
    let cleaned = EDITORIAL.replace_all(raw, "");
    let mut segments = Vec::new();
    let mut words_of_jesus = false;
    let mut cursor = 0;

    for caps in MARKUP.captures_iter(&cleaned) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_text(&mut segments, &cleaned[cursor..whole.start()], words_of_jesus);
        cursor = whole.end();

        if let Some(number) = caps.name("number") {
            if let Some(id) = LexiconId::from_marker(number.as_str(), book_number, boundary) {
                segments.push(VerseSegment::Lexicon { id, words_of_jesus });
            }
        } else {
            words_of_jesus = caps.name("open").is_some();
        }
    }
    push_text(&mut segments, &cleaned[cursor..], words_of_jesus);
    segments
}

fn push_text(segments: &mut Vec<VerseSegment>, text: &str, words_of_jesus: bool) {
    if text.is_empty() {
        return;
    }
    if let Some(VerseSegment::Text {
        text: last,
        words_of_jesus: last_jesus,
    }) = segments.last_mut()
    {
        if *last_jesus == words_of_jesus {
            last.push_str(text);
            return;
        }
    }
    segments.push(VerseSegment::Text {
        text: text.to_string(),
        words_of_jesus,
    });
}

/// Lexicon identifiers of a verse in text order (duplicates kept)
pub fn lexicon_markers(raw: &str, book_number: u32, boundary: &TestamentBoundary) -> Vec<LexiconId> {
    segment_verse_text(raw, book_number, boundary)
        .into_iter()
        .filter_map(|segment| match segment {
            VerseSegment::Lexicon { id, .. } => Some(id),
            VerseSegment::Text { .. } => None,
        })
        .collect()
}

/// Reader-visible verse text without markers or markup
pub fn verse_plain_text(raw: &str) -> String {
    let segments = segment_verse_text(raw, 0, &TestamentBoundary::default());
    let joined: String = segments
        .iter()
        .filter_map(|segment| match segment {
            VerseSegment::Text { text, .. } => Some(text.as_str()),
            VerseSegment::Lexicon { .. } => None,
        })
        .collect();
    crate::plain::plain_text(&joined)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Verse text as HTML with lexicon markers and words of Jesus marked up
pub fn render_verse_html(raw: &str, book_number: u32, boundary: &TestamentBoundary) -> String {
    let mut out = String::with_capacity(raw.len());
    for segment in segment_verse_text(raw, book_number, boundary) {
        match segment {
            VerseSegment::Text {
                text,
                words_of_jesus: true,
            } => {
                out.push_str(r#"<span class="words-of-jesus">"#);
                out.push_str(&text);
                out.push_str("</span>");
            }
            VerseSegment::Text { text, .. } => out.push_str(&text),
            VerseSegment::Lexicon { id, .. } => {
                out.push_str(&format!(
                    r#"<sup><span class="lexicon-mention" data-lexicon-id="{}">{}</span></sup>"#,
                    escape_attr(id.as_str()),
                    escape_text(&id.number().to_string())
                ));
            }
        }
    }
    out.trim().to_string()
}
