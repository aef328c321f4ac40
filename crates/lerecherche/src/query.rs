// Search query compiler
//
// *La Requête* (The Query) - Required, optional and excluded terms with phrases and open suffixes

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use unicode_normalization::UnicodeNormalization;

/// Query tokens: quoted phrases (optionally prefixed) or whitespace-free runs
static QUERY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[+-]?"[^"]+"\*?|\S+"#).expect("query token pattern is valid"));

/// Letters a bare term may be followed by (inflection suffixes)
const OPEN_SUFFIX: &str = "[a-zäöüßàâçéèêëîïôûùÿñæœ]*";

/// How a term takes part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermRole {
    /// Must match (`+term`)
    Required,

    /// At least one optional term must match when any exist
    Optional,

    /// Must not match (`-term`)
    Excluded,
}

/// One compiled query term
#[derive(Debug, Clone)]
pub struct Term {
    /// Term text without prefix, suffix or quotes
    pub text: String,

    /// Whether the term was a quoted phrase
    pub phrase: bool,

    /// Role in matching
    pub role: TermRole,

    pattern: Regex,
}

impl Term {
    /// Compiled pattern; group 2 is the term without its leading boundary
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// Searchable projection of a document: the text as is and lower-cased
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchableText {
    /// NFC-normalized text
    pub text: String,

    /// Lower-cased text, used for matching
    pub lower: String,
}

impl SearchableText {
    /// Normalize a text and derive its lower-cased form
    pub fn new(text: &str) -> Self {
        let text: String = text.nfc().collect();
        Self {
            lower: text.to_lowercase(),
            text,
        }
    }

    /// Use precomputed projections (normalized on the way in)
    pub fn from_parts(text: &str, lower: &str) -> Self {
        Self {
            text: text.nfc().collect(),
            lower: lower.nfc().collect(),
        }
    }
}

/// A compiled query
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
    terms: Vec<Term>,
}

impl CompiledQuery {
    /// All terms in query order
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Terms with a role
    pub fn terms_with(&self, role: TermRole) -> impl Iterator<Item = &Term> {
        self.terms.iter().filter(move |t| t.role == role)
    }

    /// Required and optional terms in query order
    pub fn highlight_terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter().filter(|t| t.role != TermRole::Excluded)
    }

    /// Whether anything besides exclusions was given
    pub fn has_search_terms(&self) -> bool {
        self.highlight_terms().next().is_some()
    }

    /// Evaluate against a document.
    ///
    /// Excluded terms veto, every required term must match, and when optional
    /// terms exist at least one of them must match. Callers guard against
    /// queries without search terms.
    pub fn matches(&self, text: &SearchableText) -> bool {
        let hit = |t: &Term| t.pattern.is_match(&text.lower);

        if self.terms_with(TermRole::Excluded).any(hit) {
            return false;
        }
        if !self.terms_with(TermRole::Required).all(hit) {
            return false;
        }
        let mut optional = self.terms_with(TermRole::Optional).peekable();
        optional.peek().is_none() || optional.any(hit)
    }
}

/// Compile a query string
pub fn compile(query: &str) -> Result<CompiledQuery> {
    let query: String = query.nfc().collect();
    let mut terms = Vec::new();

    for token in QUERY_TOKEN.find_iter(&query) {
        let mut token = token.as_str();
        let mut role = TermRole::Optional;
        if let Some(rest) = token.strip_prefix('+') {
            role = TermRole::Required;
            token = rest;
        }
        if let Some(rest) = token.strip_prefix('-') {
            role = TermRole::Excluded;
            token = rest;
        }
        token = token.strip_suffix('*').unwrap_or(token);

        let quoted = token.len() >= 2 && token.starts_with('"') && token.ends_with('"');
        let (text, source) = if quoted {
            let words: Vec<&str> = token[1..token.len() - 1].split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            let source = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join(r"\s+");
            (words.join(" "), source)
        } else {
            if token.is_empty() {
                continue;
            }
            (token.to_string(), format!("{}{OPEN_SUFFIX}", regex::escape(token)))
        };

        let pattern = RegexBuilder::new(&format!(r"(^|\W)({source})\b"))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidPattern(e.to_string()))?;
        terms.push(Term {
            text,
            phrase: quoted,
            role,
            pattern,
        });
    }

    Ok(CompiledQuery { terms })
}
