// Mention pattern composition
//
// *Le Motif* (The Pattern) - One alternation over every citation form, built from the alias list

use crate::book::BookRegistry;
use crate::error::{Error, Result};
use crate::vocabulary::ImplicitVocabulary;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Alternative that can never match; stands in for an empty word list.
const NEVER: &str = r"[^\s\S]";

/// Compiled alias lists can get large; the default limit is too tight for
/// registries with several hundred aliases under case folding.
const PATTERN_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Compiled recognition patterns for one alias list and vocabulary.
///
/// Families are tried left to right at each position: lexicon number,
/// explicit citation, relative verse, chapter shift, chapter only.
#[derive(Debug, Clone)]
pub struct MentionPattern {
    pub(crate) mentions: Regex,
    pub(crate) verse_query: Regex,
    version: String,
}

impl MentionPattern {
    /// Version string (alias list + vocabulary hash) this pattern was built for
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Source of the combined mention pattern
    pub fn as_str(&self) -> &str {
        self.mentions.as_str()
    }
}

/// Build the combined mention pattern from the current alias list.
pub fn build_mention_pattern(
    registry: &BookRegistry,
    vocabulary: &ImplicitVocabulary,
) -> Result<MentionPattern> {
    let aliases = alias_alternation(registry);

    let mut families = vec![
        r"(?P<lexicon>\b[GH][0-9]{1,5}\b)".to_string(),
        format!(
            r"(?P<explicit>\b(?:(?P<book>{aliases})\s*)?(?P<chapter>[0-9]+)(?::|,|\s)\s*(?P<verses>[0-9\-–—.,;f]+)\b)"
        ),
    ];

    let lead_in = word_alternation(&vocabulary.lead_ins)
        .map(|words| format!(r"(?:\b(?:{words})\s+)?"))
        .unwrap_or_default();
    let verse_words = word_alternation(&vocabulary.verse_words);

    if let Some(verse) = &verse_words {
        families.push(format!(
            r"(?P<relverse>{lead_in}\b(?:{verse})\s+(?P<rel_verses>[0-9\-–—]+)\b)"
        ));
    }

    let next = word_alternation(&vocabulary.next_words);
    let previous = word_alternation(&vocabulary.previous_words);
    if let (Some(chapter), true) = (
        word_alternation(&vocabulary.chapter_words),
        next.is_some() || previous.is_some(),
    ) {
        let next = next.as_deref().unwrap_or(NEVER);
        let previous = previous.as_deref().unwrap_or(NEVER);
        let separator = match &verse_words {
            Some(verse) => format!(r"(?:\s*,\s*(?:(?:{verse})\s+)?|\s+(?:{verse})\s+|\s+)"),
            None => r"(?:\s*,\s*|\s+)".to_string(),
        };
        families.push(format!(
            r"(?P<shift>{lead_in}\b(?:(?P<shift_next>{next})|(?P<shift_prev>{previous}))\s+(?:{chapter})(?:{separator}(?P<shift_verses>[0-9\-–—]+))?\b)"
        ));
    }

    families.push(format!(
        r"(?P<chaponly>\b(?P<chap_book>{aliases})\s+(?P<chap_num>[0-9]+)\b)"
    ));

    let source = format!("(?i){}", families.join("|"));
    let mentions = compile(&source)?;

    let verse_query = compile(&format!(
        r"(?i)(?:\b(?P<book>{aliases})\s*)?(?P<chapter>[0-9]+)\s*(?:,|:|\s)\s*(?P<verses>[0-9,.\-–—;]+)"
    ))?;

    let version = pattern_version(registry, vocabulary);
    debug!(
        "Built mention pattern for {} books ({} bytes, version {})",
        registry.len(),
        source.len(),
        &version[..12]
    );

    Ok(MentionPattern {
        mentions,
        verse_query,
        version,
    })
}

fn compile(source: &str) -> Result<Regex> {
    RegexBuilder::new(source)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| Error::InvalidPattern(e.to_string()))
}

/// Version of the pattern for a registry and vocabulary
pub fn pattern_version(registry: &BookRegistry, vocabulary: &ImplicitVocabulary) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(registry.fingerprint().as_bytes());
    hasher.update(vocabulary.fingerprint_input().as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Alias alternatives, longest first so a short alias never shadows a longer
/// one sharing its prefix.
fn alias_alternation(registry: &BookRegistry) -> String {
    let aliases: Vec<String> = registry
        .pattern_aliases()
        .into_iter()
        .map(alias_source)
        .collect();
    if aliases.is_empty() {
        NEVER.to_string()
    } else {
        aliases.join("|")
    }
}

/// Escaped alias; the first digit may be followed by a space (`1Mo` / `1 Mo`)
/// and inner spaces match any whitespace run.
fn alias_source(alias: &str) -> String {
    let escaped = regex::escape(alias.trim());
    let mut out = String::with_capacity(escaped.len() + 8);
    let mut digit_seen = false;
    for c in escaped.chars() {
        if c.is_whitespace() {
            if !out.ends_with(r"\s+") {
                out.push_str(r"\s+");
            }
            continue;
        }
        out.push(c);
        if !digit_seen && c.is_ascii_digit() {
            out.push_str(r"\s?");
            digit_seen = true;
        }
    }
    out
}

fn word_alternation(words: &[String]) -> Option<String> {
    let mut words: Vec<&str> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }
    words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    words.dedup();
    Some(
        words
            .iter()
            .map(|w| {
                regex::escape(w)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|"),
    )
}

/// Compiled pattern cached per alias-list version.
#[derive(Debug, Default)]
pub struct PatternCache {
    current: Option<MentionPattern>,
}

impl PatternCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pattern, rebuilt only when the registry or vocabulary changed
    pub fn get_or_build(
        &mut self,
        registry: &BookRegistry,
        vocabulary: &ImplicitVocabulary,
    ) -> Result<&MentionPattern> {
        let version = pattern_version(registry, vocabulary);
        let fresh = matches!(&self.current, Some(p) if p.version == version);
        if !fresh {
            self.current = Some(build_mention_pattern(registry, vocabulary)?);
        }
        self.current
            .as_ref()
            .ok_or_else(|| Error::InvalidPattern("pattern cache is empty".to_string()))
    }

    /// Pattern of the last build, if any
    pub fn current(&self) -> Option<&MentionPattern> {
        self.current.as_ref()
    }

    /// Drop the cached pattern
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;

    fn registry() -> BookRegistry {
        BookRegistry::new(vec![
            Book::new(10, "1. Mose", "1Mo, Gen"),
            Book::new(520, "Römer", "Röm, Rom"),
        ])
    }

    #[test]
    fn test_alias_source_allows_space_after_digit() {
        assert_eq!(alias_source("1Mo"), r"1\s?Mo");
        assert_eq!(alias_source("Song of Songs"), r"Song\s+of\s+Songs");
    }

    #[test]
    fn test_pattern_builds_for_empty_registry() {
        let pattern = build_mention_pattern(&BookRegistry::default(), &ImplicitVocabulary::default());
        assert!(pattern.is_ok());
    }

    #[test]
    fn test_pattern_builds_without_vocabulary() {
        let pattern = build_mention_pattern(&registry(), &ImplicitVocabulary::disabled()).unwrap();
        assert!(!pattern.as_str().contains("relverse"));
        assert!(!pattern.as_str().contains("shift"));
    }

    #[test]
    fn test_longer_alias_listed_first() {
        let pattern = build_mention_pattern(&registry(), &ImplicitVocabulary::default()).unwrap();
        let src = pattern.as_str();
        let roemer = src.find("Römer").unwrap();
        let rom = src.find("|Rom|").unwrap();
        assert!(roemer < rom);
    }

    #[test]
    fn test_cache_rebuilds_only_on_change() {
        let registry = registry();
        let vocabulary = ImplicitVocabulary::default();
        let mut cache = PatternCache::new();

        let first = cache.get_or_build(&registry, &vocabulary).unwrap().version().to_string();
        let second = cache.get_or_build(&registry, &vocabulary).unwrap().version().to_string();
        assert_eq!(first, second);

        let other = BookRegistry::new(vec![Book::new(500, "Johannes", "Joh")]);
        let third = cache.get_or_build(&other, &vocabulary).unwrap().version().to_string();
        assert_ne!(first, third);
    }
}
