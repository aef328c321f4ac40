// Span renderer
//
// Turns recognized spans back into rich text; recognition itself never
// touches markup.

use crate::links::LinkTarget;
use crate::markup::{escape_attr, escape_text};
use leparse::{ChapterKey, LexiconId, VerseKey};

/// A rendered annotation over a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    /// Verse mention
    Verses(Vec<VerseKey>),

    /// Chapter mention
    Chapter(ChapterKey),

    /// Lexicon mention
    Lexicon(LexiconId),

    /// Free dictionary word
    DictionaryWord {
        /// Indexed word the text matched
        topic: String,

        /// Source defining the topic
        source: String,
    },
}

/// Render `text` (unescaped) wrapped in the element for `mark`
pub fn render_mark(mark: &Mark, text: &str) -> String {
    let text = escape_text(text);
    match mark {
        Mark::Verses(keys) => {
            let keys = keys
                .iter()
                .map(VerseKey::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            format!(r#"<span class="verse-mention" data-verses="{}">{text}</span>"#, escape_attr(&keys))
        }
        Mark::Chapter(key) => format!(
            r#"<span class="chapter-mention" data-chapter="{}">{text}</span>"#,
            escape_attr(&key.to_string())
        ),
        Mark::Lexicon(id) => format!(
            r#"<span class="lexicon-mention" data-lexicon-id="{}">{text}</span>"#,
            escape_attr(id.as_str())
        ),
        Mark::DictionaryWord { topic, source } => format!(
            r#"<span class="dictionary-mention" data-topic="{}" data-source="{}">{text}</span>"#,
            escape_attr(topic),
            escape_attr(source)
        ),
    }
}

/// Dictionary link element replacing a `S:` topic anchor; `inner` is the
/// anchor's original inner markup.
pub fn render_dictionary_link(source: &str, topic: &str, inner: &str) -> String {
    format!(
        r#"<a href="{}" data-link>{inner}</a>"#,
        escape_attr(&LinkTarget::dictionary_href(source, topic))
    )
}
