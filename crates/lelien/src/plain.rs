// Plain-text projection

use crate::markup::{tokenize, SkipTracker, Token};
use html2text::config;
use tracing::warn;

/// Text content of rich text: tags dropped, entities decoded, file resources
/// removed. Blocks are separated by line breaks; trailing whitespace is
/// trimmed.
pub fn plain_text(html: &str) -> String {
    let visible = strip_file_resources(html);
    match config::plain_no_decorate().string_from_read(visible.as_bytes(), usize::MAX) {
        Ok(text) => text.trim_end().to_string(),
        Err(e) => {
            warn!("Plain-text projection failed: {}", e);
            String::new()
        }
    }
}

/// Markup without file resource elements; anchors are unwrapped so only
/// their text remains.
fn strip_file_resources(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut tracker = SkipTracker::new();

    for token in tokenize(html) {
        match token {
            Token::Tag(tag) => {
                let was_inside = tracker.in_file_resource();
                tracker.observe(&tag);
                if !was_inside && !tracker.in_file_resource() && tag.name != "a" {
                    out.push_str(tag.raw);
                }
            }
            Token::Text(_) if tracker.in_file_resource() => {}
            Token::Text(text) => out.push_str(text),
        }
    }
    out
}
