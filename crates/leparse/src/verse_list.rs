// Verse list normalisation

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[-–—]\s*(\d+)$").expect("verse range pattern is valid"));

/// Ranges spanning more verses than this are treated as malformed; no chapter
/// comes close, and it keeps a stray `1-999999999` from allocating.
const MAX_RANGE_LEN: u32 = 400;

/// Turn a verse list such as `3-5,7,9ff` into sorted unique verse numbers.
///
/// Tokens are separated by `;`, `.` or `,`. A token is either a range with
/// any of `-`, `–`, `—`, or a number whose trailing non-digits (`ff`) are
/// ignored. Malformed or empty tokens are skipped.
pub fn parse_verse_list(raw: &str) -> Vec<u32> {
    let mut verses = BTreeSet::new();

    for token in raw.split([';', '.', ',']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some(caps) = RANGE.captures(token) {
            let start = caps[1].parse::<u32>().ok();
            let end = caps[2].parse::<u32>().ok();
            if let (Some(start), Some(end)) = (start, end) {
                if start <= end && end - start <= MAX_RANGE_LEN {
                    verses.extend(start..=end);
                }
            }
            continue;
        }

        if let Some(verse) = leading_number(token) {
            verses.insert(verse);
        }
    }

    verses.into_iter().collect()
}

/// Leading decimal digits of a token (`"9ff"` -> 9).
fn leading_number(token: &str) -> Option<u32> {
    let end = token
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(token.len(), |(pos, _)| pos);
    token[..end].parse().ok()
}
