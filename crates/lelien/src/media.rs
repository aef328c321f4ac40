// Embedded media and file resources

use crate::markup::{escape_attr, escape_text, tokenize, SkipTracker, Tag, TagKind, Token, FILE_RESOURCE_CLASS};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static MEDIA_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:watch\?v=|embed/)|youtu\.be/)(?P<youtube>[a-zA-Z0-9_-]{11})",
        r"|(?P<file>https?://[^\s<]+\.(?:mp4|mp3))\b",
    ))
    .expect("media link pattern is valid")
});

/// Kind of an embedded media link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// YouTube video (by id)
    Youtube,

    /// `.mp4` file
    Video,

    /// `.mp3` file
    Audio,
}

/// A media link found in the text and replaced by an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEmbed {
    /// Media kind
    pub kind: MediaKind,

    /// YouTube id or file URL
    pub source: String,
}

impl MediaEmbed {
    fn to_html(&self) -> String {
        match self.kind {
            MediaKind::Youtube => {
                let id = escape_attr(&self.source);
                format!(
                    concat!(
                        r#"<div class="media-container auto-embedded" data-media="youtube">"#,
                        r#"<iframe src="https://www.youtube-nocookie.com/embed/{id}" title="YouTube video player" allowfullscreen></iframe>"#,
                        r#"<a href="https://www.youtube.com/watch?v={id}" target="_blank" rel="noopener noreferrer">https://www.youtube.com/watch?v={id}</a>"#,
                        "</div>"
                    ),
                    id = id
                )
            }
            MediaKind::Video | MediaKind::Audio => {
                let element = if self.kind == MediaKind::Video { "video" } else { "audio" };
                let url = escape_attr(&self.source);
                format!(
                    concat!(
                        r#"<div class="media-container auto-embedded" data-media="{element}">"#,
                        r#"<{element} controls src="{url}"></{element}>"#,
                        r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{text}</a>"#,
                        "</div>"
                    ),
                    element = element,
                    url = url,
                    text = escape_text(&self.source)
                )
            }
        }
    }
}

/// Replace media links in visible text by embeds.
///
/// Links inside anchors and other skipped elements are left alone.
pub fn embed_media(html: &str) -> (String, Vec<MediaEmbed>) {
    let mut out = String::with_capacity(html.len());
    let mut embeds = Vec::new();
    let mut tracker = SkipTracker::new();

    for token in tokenize(html) {
        match token {
            Token::Tag(tag) => {
                tracker.observe(&tag);
                out.push_str(tag.raw);
            }
            Token::Text(text) if tracker.is_skipping() => out.push_str(text),
            Token::Text(text) => {
                let replaced = MEDIA_LINK.replace_all(text, |caps: &Captures<'_>| {
                    let embed = if let Some(id) = caps.name("youtube") {
                        MediaEmbed {
                            kind: MediaKind::Youtube,
                            source: id.as_str().to_string(),
                        }
                    } else {
                        let url = caps.name("file").map_or("", |m| m.as_str());
                        let kind = if url.ends_with(".mp4") {
                            MediaKind::Video
                        } else {
                            MediaKind::Audio
                        };
                        MediaEmbed {
                            kind,
                            source: url.to_string(),
                        }
                    };
                    let html = embed.to_html();
                    embeds.push(embed);
                    html
                });
                out.push_str(&replaced);
            }
        }
    }

    (out, embeds)
}

/// File attached to an entry (`class="file-resource"` element)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Download URL (`data-url`)
    pub url: String,

    /// File name (`data-filename`)
    pub name: String,

    /// Size in bytes (`data-filesize`), when it parses
    pub size: Option<u64>,
}

impl Resource {
    fn from_tag(tag: &Tag<'_>) -> Self {
        Self {
            url: tag.attr("data-url").unwrap_or_default().to_string(),
            name: tag.attr("data-filename").unwrap_or_default().to_string(),
            size: tag
                .attr("data-filesize")
                .and_then(|size| size.trim().parse().ok()),
        }
    }
}

/// File resources of a rich text, in document order
pub fn extract_resources(html: &str) -> Vec<Resource> {
    tokenize(html)
        .iter()
        .filter_map(|token| match token {
            Token::Tag(tag)
                if matches!(tag.kind, TagKind::Open | TagKind::SelfClosing)
                    && tag.has_class(FILE_RESOURCE_CLASS) =>
            {
                Some(Resource::from_tag(tag))
            }
            _ => None,
        })
        .collect()
}
