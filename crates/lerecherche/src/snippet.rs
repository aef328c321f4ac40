// Highlighted snippets

use crate::query::CompiledQuery;
use serde::{Deserialize, Serialize};

/// Snippet settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Characters in a snippet window
    pub length: usize,

    /// Characters of context kept before the first hit
    pub context_before: usize,

    /// Marker inserted before a highlighted term
    pub highlight_open: String,

    /// Marker inserted after a highlighted term
    pub highlight_close: String,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            length: 200,
            context_before: 30,
            highlight_open: "<mark>".to_string(),
            highlight_close: "</mark>".to_string(),
        }
    }
}

/// Builds excerpts around the earliest hit of a query
#[derive(Debug, Clone, Default)]
pub struct SnippetBuilder {
    config: SnippetConfig,
}

impl SnippetBuilder {
    /// Create a builder
    pub fn new(config: SnippetConfig) -> Self {
        Self { config }
    }

    /// Excerpt of `text` with every highlight term marked.
    ///
    /// Without a hit the excerpt is the start of the text. Otherwise the
    /// window starts `context_before` characters ahead of the earliest hit,
    /// moved back to just after a space, and `...` marks cut ends.
    pub fn build(&self, text: &str, query: &CompiledQuery) -> String {
        if text.is_empty() {
            return String::new();
        }

        let earliest = query
            .highlight_terms()
            .filter_map(|term| term.pattern().find(text))
            .map(|m| m.start())
            .min();
        let Some(hit) = earliest else {
            let end = byte_offset(text, self.config.length);
            let ellipsis = if end < text.len() { "..." } else { "" };
            return format!("{}{}", &text[..end], ellipsis);
        };

        let hit_char = text[..hit].chars().count();
        let mut start_char = hit_char.saturating_sub(self.config.context_before);
        if start_char > 0 {
            if let Some(space) = last_space_at_or_before(text, start_char) {
                start_char = space + 1;
            }
        }
        let start = byte_offset(text, start_char);
        let end = byte_offset(text, start_char + self.config.length);

        let mut out = String::with_capacity(end - start + 32);
        if start > 0 {
            out.push_str("...");
        }
        out.push_str(&self.highlight(&text[start..end], query));
        if end < text.len() {
            out.push_str("...");
        }
        out
    }

    /// Mark every highlight term in `window`; overlapping hits are merged
    fn highlight(&self, window: &str, query: &CompiledQuery) -> String {
        let mut ranges: Vec<(usize, usize)> = query
            .highlight_terms()
            .flat_map(|term| {
                term.pattern()
                    .captures_iter(window)
                    .filter_map(|caps| caps.get(2))
                    .filter(|m| !m.is_empty())
                    .map(|m| (m.start(), m.end()))
                    .collect::<Vec<_>>()
            })
            .collect();
        ranges.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        let mut out = String::with_capacity(window.len() + merged.len() * 16);
        let mut cursor = 0;
        for (start, end) in merged {
            out.push_str(&window[cursor..start]);
            out.push_str(&self.config.highlight_open);
            out.push_str(&window[start..end]);
            out.push_str(&self.config.highlight_close);
            cursor = end;
        }
        out.push_str(&window[cursor..]);
        out
    }
}

/// Byte offset of the `chars`-th character, clamped to the text length
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Character index of the last space at or before character `at`
fn last_space_at_or_before(text: &str, at: usize) -> Option<usize> {
    text.chars()
        .take(at + 1)
        .enumerate()
        .filter(|(_, c)| *c == ' ')
        .map(|(i, _)| i)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile;

    fn snippet(text: &str, query: &str) -> String {
        SnippetBuilder::default().build(text, &compile(query).unwrap())
    }

    #[test]
    fn test_highlights_every_term() {
        assert_eq!(
            snippet("faith produces good deeds daily", r#"+faith -works "good deeds""#),
            "<mark>faith</mark> produces <mark>good deeds</mark> daily"
        );
    }

    #[test]
    fn test_no_hit_gives_prefix() {
        let text = "a".repeat(250);
        let out = snippet(&text, "zzz");
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(snippet("kurz", "zzz"), "kurz");
    }

    #[test]
    fn test_window_snaps_to_space() {
        let text = format!("{} Anfang der Gnade und mehr", "wort ".repeat(20));
        let out = snippet(&text, "gnade");
        assert!(out.starts_with("...wort "), "{out}");
        assert!(out.contains("der <mark>Gnade</mark> und"));
        assert!(!out.ends_with("..."));
    }

    #[test]
    fn test_window_end_is_marked() {
        let builder = SnippetBuilder::new(SnippetConfig {
            length: 10,
            ..SnippetConfig::default()
        });
        let out = builder.build("Gnade sei mit euch allen", &compile("gnade").unwrap());
        assert_eq!(out, "<mark>Gnade</mark> sei ...");
    }

    #[test]
    fn test_overlapping_terms_are_merged() {
        let out = snippet("Gnadenzeit", "gnade gnadenzeit");
        assert_eq!(out, "<mark>Gnadenzeit</mark>");
    }

    #[test]
    fn test_multibyte_text() {
        let text = format!("{}Größe und Güte", "ä".repeat(40));
        let out = snippet(&text, "güte");
        assert!(out.contains("<mark>Güte</mark>"));
        assert!(out.starts_with("..."));
    }

    #[test]
    fn test_custom_markers() {
        let builder = SnippetBuilder::new(SnippetConfig {
            highlight_open: "**".to_string(),
            highlight_close: "**".to_string(),
            ..SnippetConfig::default()
        });
        assert_eq!(builder.build("die Liebe", &compile("liebe").unwrap()), "die **Liebe**");
    }
}
