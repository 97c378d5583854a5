//! Content kinds and their per-kind repository rules
//!
//! Every kind is described by one [`KindRule`] row: where its files live,
//! how bodies are encoded and how filenames are chosen. Everything else in
//! the crate dispatches through [`ContentKind::rule`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinglePage {
    About,
    Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    BlogPost,
    Recipe,
    Quote,
    Media(MediaKind),
    Page(SinglePage),
}

/// How a kind's file body is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Markdown,
    Json,
    Binary,
}

/// How a kind's filename is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    /// `slug(title).md`
    TitleSlug,
    /// `slug(author)-<stamp>.json`
    AuthorStamp,
    /// `<stamp>-<sanitized original name>`
    StampedUpload,
    /// `<folder>.md`, one file per folder
    Fixed,
}

#[derive(Debug)]
pub struct KindRule {
    /// Admin tab / public section name.
    pub name: &'static str,
    pub folder: &'static str,
    /// Singular noun used in commit messages.
    pub label: &'static str,
    pub format: BodyFormat,
    pub naming: NamingRule,
}

static BLOG_POST: KindRule = KindRule {
    name: "blogs",
    folder: "content/blogs",
    label: "blog",
    format: BodyFormat::Markdown,
    naming: NamingRule::TitleSlug,
};

static RECIPE: KindRule = KindRule {
    name: "recipes",
    folder: "content/recipes",
    label: "recipe",
    format: BodyFormat::Markdown,
    naming: NamingRule::TitleSlug,
};

static QUOTE: KindRule = KindRule {
    name: "quotes",
    folder: "content/quotes",
    label: "quote",
    format: BodyFormat::Json,
    naming: NamingRule::AuthorStamp,
};

static IMAGE: KindRule = KindRule {
    name: "images",
    folder: "img/photos",
    label: "image",
    format: BodyFormat::Binary,
    naming: NamingRule::StampedUpload,
};

static VIDEO: KindRule = KindRule {
    name: "videos",
    folder: "content/videos",
    label: "video",
    format: BodyFormat::Binary,
    naming: NamingRule::StampedUpload,
};

static ABOUT: KindRule = KindRule {
    name: "about",
    folder: "content/about",
    label: "about",
    format: BodyFormat::Markdown,
    naming: NamingRule::Fixed,
};

static STORE: KindRule = KindRule {
    name: "store",
    folder: "content/store",
    label: "store",
    format: BodyFormat::Markdown,
    naming: NamingRule::Fixed,
};

impl ContentKind {
    pub const ALL: [ContentKind; 7] = [
        ContentKind::BlogPost,
        ContentKind::Recipe,
        ContentKind::Quote,
        ContentKind::Media(MediaKind::Image),
        ContentKind::Media(MediaKind::Video),
        ContentKind::Page(SinglePage::About),
        ContentKind::Page(SinglePage::Store),
    ];

    pub fn rule(self) -> &'static KindRule {
        match self {
            ContentKind::BlogPost => &BLOG_POST,
            ContentKind::Recipe => &RECIPE,
            ContentKind::Quote => &QUOTE,
            ContentKind::Media(MediaKind::Image) => &IMAGE,
            ContentKind::Media(MediaKind::Video) => &VIDEO,
            ContentKind::Page(SinglePage::About) => &ABOUT,
            ContentKind::Page(SinglePage::Store) => &STORE,
        }
    }

    pub fn folder(self) -> &'static str {
        self.rule().folder
    }

    pub fn label(self) -> &'static str {
        self.rule().label
    }

    pub fn name(self) -> &'static str {
        self.rule().name
    }

    pub fn is_media(self) -> bool {
        self.rule().format == BodyFormat::Binary
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentKind {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim().to_lowercase())
            .ok_or_else(|| ContentError::validation(format!("Unknown content kind: {}", s)))
    }
}

impl SinglePage {
    pub fn kind(self) -> ContentKind {
        ContentKind::Page(self)
    }
}

impl MediaKind {
    pub fn kind(self) -> ContentKind {
        ContentKind::Media(self)
    }
}
