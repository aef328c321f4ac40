// Structured link rewriting
//
// *Le Renvoi* (The Cross-Reference) - `B:` and `S:` hrefs from imported lexicon and dictionary markup

use crate::dictionary::DictionaryCatalog;
use leparse::{parse_verse_list, LexiconId};
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of a "jump to book/chapter" href (`B:500 3`, `B:500:3:16`)
pub const BOOK_LINK_PREFIX: &str = "B:";

/// Prefix of a "jump to topic" href (`S:G26`, `S:Gnade`)
pub const TOPIC_LINK_PREFIX: &str = "S:";

static BOOK_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"B:([0-9]+)(?:\s*:\s*|\s+)([0-9]+)").expect("book href pattern is valid"));

static BOOK_HREF_VERSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"B:[0-9]+(?:\s*:\s*|\s+)[0-9]+(?:\s*:\s*|\s+)([0-9]+)$").expect("book href verse pattern is valid")
});

static TRAILING_VERSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9\-–—.,;\s]+)$").expect("trailing verse pattern is valid"));

/// Target of a structured link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Verses of one chapter (not yet bounds checked)
    Verses {
        /// Book number from the href
        book: u32,

        /// Chapter from the href
        chapter: u32,

        /// Verse numbers, never empty
        verses: Vec<u32>,
    },

    /// Lexicon entry
    Lexicon(LexiconId),

    /// Dictionary topic in a resolved source
    Dictionary {
        /// Source id containing the topic (or the fallback)
        source: String,

        /// Lower-cased topic
        topic: String,
    },
}

impl LinkTarget {
    /// Navigable href of a dictionary target
    pub fn dictionary_href(source: &str, topic: &str) -> String {
        format!("/dictionary/{}/{}", source, urlencoding::encode(topic))
    }
}

/// Interpret a structured href. `text` is the visible link text.
///
/// Returns `None` for hrefs that are not structured links or do not parse;
/// such links are left untouched.
pub fn parse_structured_link(
    href: &str,
    text: &str,
    catalog: &DictionaryCatalog,
    fallback_source: &str,
) -> Option<LinkTarget> {
    let href = href.trim();
    if href.starts_with(BOOK_LINK_PREFIX) {
        return parse_book_link(href, text.trim());
    }
    let topic = href.strip_prefix(TOPIC_LINK_PREFIX)?;
    let topic = urlencoding::decode(topic).map_or_else(|_| topic.to_string(), |t| t.into_owned());
    let topic = topic.trim();
    if topic.is_empty() {
        return None;
    }

    if let Some(id) = LexiconId::parse(topic) {
        return Some(LinkTarget::Lexicon(id));
    }
    Some(LinkTarget::Dictionary {
        source: catalog.resolve_link_source(topic, fallback_source).to_string(),
        topic: topic.to_lowercase(),
    })
}

/// Verse list of a book link: from the visible text after the chapter
/// number, else a trailing verse list of the text, else the href's own
/// verse, else verse 1.
fn parse_book_link(href: &str, text: &str) -> Option<LinkTarget> {
    let caps = BOOK_HREF.captures(href)?;
    let book: u32 = caps[1].parse().ok()?;
    let chapter: u32 = caps[2].parse().ok()?;

    let verse_list = verses_after_chapter(text, chapter)
        .or_else(|| trailing_verses(text, chapter))
        .or_else(|| {
            BOOK_HREF_VERSE
                .captures(href)
                .map(|c| c[1].to_string())
        })
        .unwrap_or_else(|| "1".to_string());

    let mut verses = parse_verse_list(&verse_list);
    if verses.is_empty() {
        verses.push(1);
    }
    Some(LinkTarget::Verses {
        book,
        chapter,
        verses,
    })
}

fn verses_after_chapter(text: &str, chapter: u32) -> Option<String> {
    let pattern = Regex::new(&format!(r"\b{chapter}\s*[,.:]?\s*([0-9\-–—.,;\s]+)\b")).ok()?;
    pattern
        .captures(text)
        .map(|c| c[1].to_string())
        .filter(|list| !list.trim().is_empty())
}

fn trailing_verses(text: &str, chapter: u32) -> Option<String> {
    let list = TRAILING_VERSES.captures(text)?.get(1)?;
    if list.as_str().trim().is_empty() {
        return None;
    }
    // "Johannes 3" names the chapter itself, not a verse
    let names_chapter = list.as_str().trim() == chapter.to_string()
        && text[..list.start()].chars().any(char::is_alphabetic);
    (!names_chapter).then(|| list.as_str().to_string())
}
