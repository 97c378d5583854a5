//! Markdown image references and rendering
//!
//! Editors embed media as `![alt](/img/photos/<file>)`. Before a body is
//! rendered those references are rewritten to URLs the browser can load.

use std::collections::HashMap;

use folio_store::RepositoryEntry;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Prefix of references that point into the media folder.
pub const MEDIA_PREFIX: &str = "/img/photos/";

const THUMBNAIL_ALT: &str = "thumbnail";

static IMAGE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("image reference pattern"));

/// Markdown to HTML, supplied by the embedding application.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

impl<F> MarkdownRenderer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn render(&self, markdown: &str) -> String {
        self(markdown)
    }
}

/// Returns the Markdown unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl MarkdownRenderer for Passthrough {
    fn render(&self, markdown: &str) -> String {
        markdown.to_string()
    }
}

/// Where media references resolve to: the listing's download URLs first,
/// then the raw-content root of the repository.
#[derive(Debug, Clone, Default)]
pub struct MediaIndex {
    by_name: HashMap<String, String>,
    raw_root: Option<String>,
}

impl MediaIndex {
    pub fn new(media: &[RepositoryEntry], raw_root: Option<String>) -> Self {
        let by_name = media
            .iter()
            .filter_map(|entry| {
                entry
                    .download_url
                    .as_ref()
                    .map(|url| (entry.name.clone(), url.clone()))
            })
            .collect();
        Self { by_name, raw_root }
    }

    /// URL for a `/img/photos/...` reference. Without a listing match or a
    /// raw root the site-relative reference is kept.
    pub fn resolve(&self, reference: &str) -> String {
        let filename = reference.rsplit('/').next().unwrap_or(reference);
        if let Some(url) = self.by_name.get(filename) {
            return url.clone();
        }
        match &self.raw_root {
            Some(root) => format!(
                "{}/{}",
                root.trim_end_matches('/'),
                reference.trim_start_matches('/')
            ),
            None => reference.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMarkdown {
    pub markdown: String,
    /// The image tagged `thumbnail`, otherwise the first media image.
    pub highlight_img: Option<String>,
}

/// Rewrite media references in `markdown` to resolved URLs and pick the
/// highlight image. The `thumbnail` alt text is dropped from the output.
pub fn resolve_images(markdown: &str, media: &MediaIndex) -> ResolvedMarkdown {
    let mut first_found = None;
    let mut tagged = None;

    let rewritten = IMAGE_REF.replace_all(markdown, |caps: &Captures<'_>| {
        let alt = &caps[1];
        let target = &caps[2];
        if !target.starts_with(MEDIA_PREFIX) {
            return caps[0].to_string();
        }

        let url = media.resolve(target);
        if first_found.is_none() {
            first_found = Some(url.clone());
        }
        if alt.eq_ignore_ascii_case(THUMBNAIL_ALT) {
            tagged = Some(url.clone());
            format!("![]({})", url)
        } else {
            format!("![{}]({})", alt, url)
        }
    });

    ResolvedMarkdown {
        markdown: rewritten.into_owned(),
        highlight_img: tagged.or(first_found),
    }
}

/// Markdown snippet that embeds an uploaded media file.
pub fn image_snippet(filename: &str, alt: &str) -> String {
    format!("![{}]({}{})", alt, MEDIA_PREFIX, filename)
}

/// Snippet tagging the image as the item's thumbnail.
pub fn thumbnail_snippet(filename: &str) -> String {
    image_snippet(filename, THUMBNAIL_ALT)
}

/// Whether text contains Arabic-script characters and should be laid out
/// right to left.
pub fn is_rtl(text: &str) -> bool {
    text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(name: &str, url: &str) -> RepositoryEntry {
        let mut entry = RepositoryEntry::file(format!("img/photos/{}", name), "sha");
        entry.download_url = Some(url.to_string());
        entry
    }

    #[test]
    fn test_thumbnail_wins_over_first_image() {
        let media = MediaIndex::new(
            &[
                listed("first.jpg", "https://cdn.test/first.jpg"),
                listed("cake.jpg", "https://cdn.test/cake.jpg"),
            ],
            None,
        );
        let body = "Intro ![plated](/img/photos/first.jpg)\n\n![thumbnail](/img/photos/cake.jpg)";

        let resolved = resolve_images(body, &media);
        assert_eq!(resolved.highlight_img.as_deref(), Some("https://cdn.test/cake.jpg"));
        assert_eq!(
            resolved.markdown,
            "Intro ![plated](https://cdn.test/first.jpg)\n\n![](https://cdn.test/cake.jpg)"
        );
    }

    #[test]
    fn test_first_image_without_thumbnail() {
        let media = MediaIndex::new(&[], Some("https://raw.test/o/r/main/".to_string()));
        let resolved = resolve_images(
            "![a](/img/photos/a.png) ![b](/img/photos/b.png)",
            &media,
        );
        assert_eq!(
            resolved.highlight_img.as_deref(),
            Some("https://raw.test/o/r/main/img/photos/a.png")
        );
    }

    #[test]
    fn test_foreign_images_are_untouched() {
        let media = MediaIndex::default();
        let body = "![logo](https://example.com/logo.png)";
        let resolved = resolve_images(body, &media);
        assert_eq!(resolved.markdown, body);
        assert_eq!(resolved.highlight_img, None);
    }

    #[test]
    fn test_thumbnail_tag_is_case_insensitive() {
        let media = MediaIndex::default();
        let resolved = resolve_images("![Thumbnail](/img/photos/x.jpg)", &media);
        assert_eq!(resolved.markdown, "![](/img/photos/x.jpg)");
        assert_eq!(resolved.highlight_img.as_deref(), Some("/img/photos/x.jpg"));
    }

    #[test]
    fn test_snippets() {
        assert_eq!(thumbnail_snippet("1-cake.jpg"), "![thumbnail](/img/photos/1-cake.jpg)");
        assert_eq!(image_snippet("1-cake.jpg", "cake.jpg"), "![cake.jpg](/img/photos/1-cake.jpg)");
    }

    #[test]
    fn test_renderers() {
        assert_eq!(Passthrough.render("# Hi"), "# Hi");
        let shout = |md: &str| md.to_uppercase();
        assert_eq!(shout.render("hi"), "HI");
    }

    #[test]
    fn test_is_rtl() {
        assert!(is_rtl("العلم نور"));
        assert!(is_rtl("Said by محمد"));
        assert!(!is_rtl("Nelson Mandela"));
        assert!(!is_rtl("שלום"));
    }
}
