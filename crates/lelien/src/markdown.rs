// Authoring markup renderer

use pulldown_cmark::{html, Options, Parser};

/// Converts authoring markup to rich text (HTML).
///
/// Structured links (`B:`/`S:` hrefs), file resources and media URLs must
/// survive the conversion textually.
pub trait MarkupRenderer: Send + Sync {
    /// Render `content` to HTML
    fn render(&self, content: &str) -> String;
}

/// CommonMark renderer; inline HTML passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkupRenderer for MarkdownRenderer {
    fn render(&self, content: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(content, options);
        let mut out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Renderer for content that is already HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPassthrough;

impl MarkupRenderer for HtmlPassthrough {
    fn render(&self, content: &str) -> String {
        content.to_string()
    }
}
