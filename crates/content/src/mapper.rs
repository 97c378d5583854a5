//! Translation between content items and repository files
//!
//! Nothing here performs I/O. Timestamps for kinds that need them are passed
//! in by the caller, usually from a [`StampSource`](crate::naming::StampSource).

use folio_store::FileBody;
use folio_store::entry::join_path;
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, Result};
use crate::kind::{ContentKind, MediaKind, NamingRule, SinglePage};
use crate::naming::{display_title, sanitize_media_name, slugify};

/// Markdown document with a title (blog posts and recipes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub author: String,
}

/// Uploaded image or video, held in transport (base64) encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub kind: MediaKind,
    pub original_name: String,
    pub encoded: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    BlogPost(Article),
    Recipe(Article),
    Quote(Quote),
    Media(MediaAsset),
    Page { page: SinglePage, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    Create,
    Update,
    Upload,
    Delete,
}

impl CommitAction {
    fn verb(self) -> &'static str {
        match self {
            CommitAction::Create => "Create",
            CommitAction::Update => "Update",
            CommitAction::Upload => "Upload",
            CommitAction::Delete => "Delete",
        }
    }
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::BlogPost(_) => ContentKind::BlogPost,
            ContentItem::Recipe(_) => ContentKind::Recipe,
            ContentItem::Quote(_) => ContentKind::Quote,
            ContentItem::Media(asset) => ContentKind::Media(asset.kind),
            ContentItem::Page { page, .. } => ContentKind::Page(*page),
        }
    }
}

/// Repository path of `filename` in the kind's folder.
pub fn to_path(kind: ContentKind, filename: &str) -> String {
    join_path(kind.folder(), filename)
}

/// Filename for a new item. `stamp` is only used by kinds without a natural
/// unique key (quotes and media).
pub fn filename_for(item: &ContentItem, stamp: i64) -> String {
    match (item.kind().rule().naming, item) {
        (NamingRule::TitleSlug, ContentItem::BlogPost(article))
        | (NamingRule::TitleSlug, ContentItem::Recipe(article)) => {
            format!("{}.md", slugify(&article.title))
        }
        (NamingRule::AuthorStamp, ContentItem::Quote(quote)) => {
            format!("{}-{}.json", slugify(&quote.author), stamp)
        }
        (NamingRule::StampedUpload, ContentItem::Media(asset)) => {
            format!("{}-{}", stamp, sanitize_media_name(&asset.original_name))
        }
        (NamingRule::Fixed, ContentItem::Page { page, .. }) => {
            format!("{}.md", page.kind().name())
        }
        (_, other) => format!("{}.md", slugify(other.kind().name())),
    }
}

/// File body for an item.
pub fn serialize(item: &ContentItem) -> Result<FileBody> {
    match item {
        ContentItem::BlogPost(article) | ContentItem::Recipe(article) => {
            Ok(FileBody::text(article.body.clone()))
        }
        ContentItem::Quote(quote) => {
            let json = serde_json::to_string_pretty(quote).map_err(|e| ContentError::Malformed {
                kind: "quote",
                path: String::new(),
                reason: e.to_string(),
            })?;
            Ok(FileBody::Text(json))
        }
        ContentItem::Media(asset) => Ok(FileBody::Encoded(asset.encoded.clone())),
        ContentItem::Page { body, .. } => Ok(FileBody::text(body.clone())),
    }
}

/// Item stored at `filename` with decoded text `body`.
///
/// Titles of articles come from the filename. A quote that is not valid JSON
/// is reported as [`ContentError::Malformed`] so callers can skip it and keep
/// the rest of a listing.
pub fn deserialize(kind: ContentKind, filename: &str, body: &str) -> Result<ContentItem> {
    match kind {
        ContentKind::BlogPost => Ok(ContentItem::BlogPost(Article {
            title: display_title(filename),
            body: body.to_string(),
        })),
        ContentKind::Recipe => Ok(ContentItem::Recipe(Article {
            title: display_title(filename),
            body: body.to_string(),
        })),
        ContentKind::Quote => {
            let quote: Quote =
                serde_json::from_str(body).map_err(|e| ContentError::Malformed {
                    kind: kind.label(),
                    path: to_path(kind, filename),
                    reason: e.to_string(),
                })?;
            Ok(ContentItem::Quote(quote))
        }
        ContentKind::Media(media) => Ok(ContentItem::Media(MediaAsset {
            kind: media,
            original_name: filename.to_string(),
            encoded: body.to_string(),
        })),
        ContentKind::Page(page) => Ok(ContentItem::Page {
            page,
            body: body.to_string(),
        }),
    }
}

/// Commit message for an action on `filename`, e.g. `Create quote: x.json`.
pub fn commit_message(action: CommitAction, kind: ContentKind, filename: &str) -> String {
    format!("{} {}: {}", action.verb(), kind.label(), filename)
}

pub fn inline_image_message(filename: &str) -> String {
    format!("Upload inline image: {}", filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, body: &str) -> Article {
        Article {
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            to_path(ContentKind::Quote, "nelson-mandela.json"),
            "content/quotes/nelson-mandela.json"
        );
        assert_eq!(
            to_path(MediaKind::Image.kind(), "1-cake.jpg"),
            "img/photos/1-cake.jpg"
        );
    }

    #[test]
    fn test_filenames_per_kind() {
        let stamp = 1_772_000_000_123;
        assert_eq!(
            filename_for(&ContentItem::Recipe(article("Chocolate Cake!", "")), stamp),
            "chocolate-cake.md"
        );
        assert_eq!(
            filename_for(
                &ContentItem::Quote(Quote {
                    quote: "q".into(),
                    author: "Nelson Mandela".into()
                }),
                stamp
            ),
            "nelson-mandela-1772000000123.json"
        );
        assert_eq!(
            filename_for(
                &ContentItem::Media(MediaAsset {
                    kind: MediaKind::Image,
                    original_name: "Birthday Cake.JPG".into(),
                    encoded: String::new(),
                }),
                stamp
            ),
            "1772000000123-birthday-cake.jpg"
        );
        assert_eq!(
            filename_for(
                &ContentItem::Page {
                    page: SinglePage::About,
                    body: String::new()
                },
                stamp
            ),
            "about.md"
        );
    }

    #[test]
    fn test_filename_of_slugged_title_is_stable() {
        let first = filename_for(&ContentItem::BlogPost(article("My Best  Cake", "")), 0);
        let stem = first.trim_end_matches(".md");
        let second = filename_for(&ContentItem::BlogPost(article(stem, "")), 0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_quote_round_trip() {
        let quote = ContentItem::Quote(Quote {
            quote: "العلم نور".into(),
            author: "Nelson \"Madiba\" Mandela".into(),
        });
        let body = serialize(&quote).unwrap();
        let FileBody::Text(text) = body else {
            panic!("quotes are text");
        };
        assert!(text.contains("\n  \"quote\""));
        assert_eq!(deserialize(ContentKind::Quote, "x.json", &text).unwrap(), quote);
    }

    #[test]
    fn test_malformed_quote_is_soft_failure() {
        let err = deserialize(ContentKind::Quote, "broken.json", "{not json").unwrap_err();
        match err {
            ContentError::Malformed { kind, path, .. } => {
                assert_eq!(kind, "quote");
                assert_eq!(path, "content/quotes/broken.json");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_markdown_passes_through() {
        let item = deserialize(ContentKind::Recipe, "chocolate-cake.md", "# Cake 🎂").unwrap();
        assert_eq!(item, ContentItem::Recipe(article("Chocolate Cake", "# Cake 🎂")));
        assert_eq!(serialize(&item).unwrap(), FileBody::text("# Cake 🎂"));
    }

    #[test]
    fn test_media_passes_encoded_bytes() {
        let item = ContentItem::Media(MediaAsset {
            kind: MediaKind::Video,
            original_name: "clip.mp4".into(),
            encoded: "AAAA".into(),
        });
        let body = serialize(&item).unwrap();
        assert_eq!(body, FileBody::Encoded("AAAA".to_string()));
        assert!(item.kind().is_media());
    }

    #[test]
    fn test_commit_messages() {
        assert_eq!(
            commit_message(CommitAction::Create, ContentKind::Quote, "a.json"),
            "Create quote: a.json"
        );
        assert_eq!(
            commit_message(CommitAction::Upload, MediaKind::Image.kind(), "1-a.png"),
            "Upload image: 1-a.png"
        );
        assert_eq!(
            commit_message(CommitAction::Delete, SinglePage::Store.kind(), "store.md"),
            "Delete store: store.md"
        );
        assert_eq!(inline_image_message("1-a.png"), "Upload inline image: 1-a.png");
    }
}
