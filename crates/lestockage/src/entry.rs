// Authored entries
//
// *L'Entrée* (The Entry) - Notes, journals and sermons with their reference label and link

use chrono::{DateTime, Utc};
use leparse::{BookRegistry, ChapterKey, VerseKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an entry is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    /// Note on one verse
    Note {
        /// Annotated verse
        verse: VerseKey,
    },

    /// Item of a named journal
    Journal {
        /// Journal name
        journal: String,
    },

    /// Note on a whole book
    BookNote {
        /// Book number
        book: u32,
    },

    /// Note on one chapter
    ChapterNote {
        /// Annotated chapter
        chapter: ChapterKey,
    },

    /// Sermon with the verses it preaches on
    Sermon {
        /// Verse citations as entered (`"Joh 3,16"`)
        #[serde(default)]
        bible_verses: Vec<String>,
    },
}

impl EntryKind {
    /// Kind without its payload
    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryKind::Note { .. } => EntryType::Note,
            EntryKind::Journal { .. } => EntryType::Journal,
            EntryKind::BookNote { .. } => EntryType::BookNote,
            EntryKind::ChapterNote { .. } => EntryType::ChapterNote,
            EntryKind::Sermon { .. } => EntryType::Sermon,
        }
    }
}

/// Entry kind tag, used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Verse note
    Note,

    /// Journal item
    Journal,

    /// Book note
    BookNote,

    /// Chapter note
    ChapterNote,

    /// Sermon
    Sermon,
}

impl EntryType {
    /// All entry types
    pub const ALL: [EntryType; 5] = [
        EntryType::Note,
        EntryType::Journal,
        EntryType::BookNote,
        EntryType::ChapterNote,
        EntryType::Sermon,
    ];

    /// Stable name, as used in serialized data
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Note => "note",
            EntryType::Journal => "journal",
            EntryType::BookNote => "book_note",
            EntryType::ChapterNote => "chapter_note",
            EntryType::Sermon => "sermon",
        }
    }

    /// Parse a stable name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authored unit of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique id
    pub id: String,

    /// Attachment
    #[serde(flatten)]
    pub kind: EntryKind,

    /// Optional title
    #[serde(default)]
    pub title: Option<String>,

    /// Source markup
    #[serde(default)]
    pub content: String,

    /// Free tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creation or sermon date
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create an untitled entry without tags
    pub fn new(id: impl Into<String>, kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            content: content.into(),
            tags: Vec::new(),
            timestamp: None,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Reference label and navigation link of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLabel {
    /// Human readable reference (`"Römer 8:1"`, `"Predigt: Gnade"`)
    #[serde(rename = "ref")]
    pub reference: String,

    /// Navigation link
    pub link: String,
}

impl EntryLabel {
    /// Label of an entry. `None` when the entry points at a book the
    /// registry does not know; such entries are not indexed.
    pub fn for_entry(entry: &Entry, registry: &BookRegistry) -> Option<Self> {
        let label = match &entry.kind {
            EntryKind::Note { verse } => {
                let book = registry.get(verse.book)?;
                Self {
                    reference: format!("{} {}:{}", book.long_name, verse.chapter, verse.verse),
                    link: verse_link(book.primary_short_name(), *verse),
                }
            }
            EntryKind::Journal { journal } => Self {
                reference: entry.title().unwrap_or(journal).to_string(),
                link: format!(
                    "/journal/view/{}/entry/{}",
                    urlencoding::encode(journal),
                    entry.id
                ),
            },
            EntryKind::BookNote { book } => {
                let record = registry.get(*book)?;
                Self {
                    reference: format!("Buch-Notiz: {}", entry.title().unwrap_or(&record.long_name)),
                    link: format!("/journal/book/{}/entry/{}", book, entry.id),
                }
            }
            EntryKind::ChapterNote { chapter } => {
                let book = registry.get(chapter.book)?;
                let title = entry
                    .title()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{} {}", book.long_name, chapter.chapter));
                Self {
                    reference: format!("Kapitel-Notiz: {title}"),
                    link: format!("/journal/chapter/{}/entry/{}", chapter, entry.id),
                }
            }
            EntryKind::Sermon { .. } => Self {
                reference: format!("Predigt: {}", entry.title().unwrap_or_default()),
                link: format!("/sermons/view/{}", entry.id),
            },
        };
        Some(label)
    }
}

/// Reader link of a verse
pub fn verse_link(primary_short_name: &str, key: VerseKey) -> String {
    format!("/bible/{}/{}/{}", primary_short_name, key.chapter, key.verse)
}
