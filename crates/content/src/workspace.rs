//! Admin editing operations
//!
//! [`Workspace`] turns editor input into repository writes: it validates
//! forms, chooses filenames and commit messages, and uploads media batches
//! one file at a time.

use std::sync::Arc;
use std::time::Duration;

use folio_store::config::UploadConfig;
use folio_store::{
    ContentsApi, FileBody, FolioConfig, GitHubContentsApi, RepositoryClient, RepositoryEntry,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ContentError, Result};
use crate::kind::{ContentKind, MediaKind, SinglePage};
use crate::mapper::{
    self, Article, CommitAction, ContentItem, MediaAsset, Quote, commit_message,
    inline_image_message,
};
use crate::markdown::{image_snippet, thumbnail_snippet};
use crate::naming::{StampSource, display_title, sanitize_media_name};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub blogs: usize,
    pub recipes: usize,
    pub quotes: usize,
    /// Images and videos together.
    pub media: usize,
    pub about: usize,
    pub store: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit,
}

/// Fields of the item editor.
///
/// For quotes `content` holds the quote text. Media items carry only a
/// preview URL; their bytes are never downloaded for editing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorForm {
    pub filename: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub media_preview: Option<String>,
    pub sha: Option<String>,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpload {
    pub name: String,
    pub data: Vec<u8>,
    /// Playback length, known only for videos.
    pub duration_secs: Option<f64>,
}

impl MediaUpload {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            duration_secs: None,
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub entry: RepositoryEntry,
    /// Markdown to insert at the editor cursor.
    pub markdown: String,
}

pub struct Workspace<A: ContentsApi = GitHubContentsApi> {
    client: RepositoryClient<A>,
    stamps: Arc<StampSource>,
    spacing: Duration,
    max_video_secs: f64,
}

impl<A: ContentsApi> Clone for Workspace<A> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            stamps: Arc::clone(&self.stamps),
            spacing: self.spacing,
            max_video_secs: self.max_video_secs,
        }
    }
}

impl<A: ContentsApi> Workspace<A> {
    pub fn new(client: RepositoryClient<A>) -> Self {
        let uploads = UploadConfig::default();
        Self {
            client,
            stamps: Arc::new(StampSource::new()),
            spacing: uploads.spacing(),
            max_video_secs: uploads.max_video_secs,
        }
    }

    pub fn from_config(client: RepositoryClient<A>, config: &FolioConfig) -> Self {
        Self::new(client)
            .with_spacing(config.uploads.spacing())
            .with_max_video_secs(config.uploads.max_video_secs)
    }

    /// Delay before each write of a media batch.
    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_max_video_secs(mut self, secs: f64) -> Self {
        self.max_video_secs = secs;
        self
    }

    pub fn client(&self) -> &RepositoryClient<A> {
        &self.client
    }

    /// Item counts per section. A section that cannot be listed counts as
    /// zero without affecting the others.
    pub async fn dashboard(&self) -> DashboardStats {
        let (blogs, recipes, quotes, images, videos, about, store) = futures::join!(
            self.count(ContentKind::BlogPost),
            self.count(ContentKind::Recipe),
            self.count(ContentKind::Quote),
            self.count(MediaKind::Image.kind()),
            self.count(MediaKind::Video.kind()),
            self.count(SinglePage::About.kind()),
            self.count(SinglePage::Store.kind()),
        );

        DashboardStats {
            blogs,
            recipes,
            quotes,
            media: images + videos,
            about,
            store,
        }
    }

    async fn count(&self, kind: ContentKind) -> usize {
        match self.client.list(kind.folder()).await {
            Ok(entries) => entries.len(),
            Err(e) => {
                warn!("Could not count {}: {}", kind, e);
                0
            }
        }
    }

    /// Entries of a section, newest (highest name) first.
    pub async fn list(&self, kind: ContentKind) -> Result<Vec<RepositoryEntry>> {
        let mut entries = self.client.list(kind.folder()).await?;
        entries.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(entries)
    }

    /// Load an entry into editor fields.
    pub async fn open_for_edit(
        &self,
        kind: ContentKind,
        entry: &RepositoryEntry,
    ) -> Result<EditorForm> {
        if kind.is_media() {
            return Ok(EditorForm {
                filename: entry.name.clone(),
                media_preview: entry.download_url.clone(),
                sha: Some(entry.sha.clone()),
                ..EditorForm::default()
            });
        }

        let read = self.client.read(&mapper::to_path(kind, &entry.name)).await?;
        let mut form = EditorForm {
            filename: entry.name.clone(),
            title: display_title(&entry.name),
            content: read.text().to_string(),
            sha: Some(read.sha.clone()),
            ..EditorForm::default()
        };

        if kind == ContentKind::Quote {
            match mapper::deserialize(kind, &entry.name, read.text()) {
                Ok(ContentItem::Quote(quote)) => {
                    form.author = quote.author;
                    form.content = quote.quote;
                }
                Ok(_) => {}
                Err(e) => warn!("Opening raw body of {}: {}", entry.name, e),
            }
        }

        Ok(form)
    }

    /// Validate and write a text item.
    ///
    /// On create the filename is derived from the fields and must not exist
    /// yet; on edit the form's filename and SHA are used as loaded. Media is
    /// added with [`Self::upload_media`] instead.
    pub async fn save(
        &self,
        kind: ContentKind,
        form: &EditorForm,
        mode: EditMode,
    ) -> Result<RepositoryEntry> {
        let item = item_from_form(kind, form)?;

        let filename = match (kind, mode) {
            (ContentKind::Page(_), _) | (_, EditMode::Create) => {
                mapper::filename_for(&item, self.stamps.next())
            }
            (_, EditMode::Edit) if form.filename.trim().is_empty() => {
                return Err(ContentError::validation("Filename is required"));
            }
            (_, EditMode::Edit) => form.filename.clone(),
        };

        if mode == EditMode::Create {
            let existing = self.client.list(kind.folder()).await?;
            if existing.iter().any(|entry| entry.name == filename) {
                return Err(ContentError::validation(format!(
                    "A file with this name already exists: {}",
                    filename
                )));
            }
        }

        let action = match mode {
            EditMode::Create => CommitAction::Create,
            EditMode::Edit => CommitAction::Update,
        };
        let path = mapper::to_path(kind, &filename);
        let message = commit_message(action, kind, &filename);
        let expected_sha = match mode {
            EditMode::Create => None,
            EditMode::Edit => form.sha.as_deref(),
        };

        let entry = self
            .client
            .write(&path, mapper::serialize(&item)?, &message, expected_sha)
            .await?;
        info!("{}", message);
        Ok(entry)
    }

    /// Upload a batch of media files one after another.
    ///
    /// Writes are never issued concurrently and each file gets its own
    /// timestamp prefix. Every video is checked against the duration limit
    /// before the first write.
    pub async fn upload_media(
        &self,
        media: MediaKind,
        uploads: Vec<MediaUpload>,
    ) -> Result<Vec<RepositoryEntry>> {
        if uploads.is_empty() {
            return Err(ContentError::validation(
                "Please select at least one file to upload",
            ));
        }
        if media == MediaKind::Video {
            for upload in &uploads {
                self.check_duration(upload)?;
            }
        }

        let kind = media.kind();
        let mut written = Vec::with_capacity(uploads.len());
        for upload in uploads {
            tokio::time::sleep(self.spacing).await;

            let item = ContentItem::Media(MediaAsset {
                kind: media,
                original_name: upload.name,
                encoded: folio_store::encoding::encode_bytes(&upload.data),
            });
            let filename = mapper::filename_for(&item, self.stamps.next());
            let path = mapper::to_path(kind, &filename);
            let message = commit_message(CommitAction::Upload, kind, &filename);

            let entry = self
                .client
                .write(&path, mapper::serialize(&item)?, &message, None)
                .await?;
            debug!("{}", message);
            written.push(entry);
        }

        info!("Uploaded {} {} file(s)", written.len(), kind.label());
        Ok(written)
    }

    /// Upload an image from the Markdown editor and return the snippet that
    /// embeds it. A thumbnail snippet marks the item's highlight image.
    pub async fn upload_inline_image(
        &self,
        upload: MediaUpload,
        as_thumbnail: bool,
    ) -> Result<InlineImage> {
        let clean_name = sanitize_media_name(&upload.name);
        let item = ContentItem::Media(MediaAsset {
            kind: MediaKind::Image,
            original_name: upload.name,
            encoded: folio_store::encoding::encode_bytes(&upload.data),
        });
        let filename = mapper::filename_for(&item, self.stamps.next());
        let path = mapper::to_path(item.kind(), &filename);

        let entry = self
            .client
            .write(
                &path,
                mapper::serialize(&item)?,
                &inline_image_message(&filename),
                None,
            )
            .await?;

        let markdown = if as_thumbnail {
            thumbnail_snippet(&filename)
        } else {
            image_snippet(&filename, &clean_name)
        };
        info!("Uploaded inline image {}", filename);
        Ok(InlineImage { entry, markdown })
    }

    /// Delete a listed entry using the SHA it was listed with.
    pub async fn delete(&self, kind: ContentKind, entry: &RepositoryEntry) -> Result<()> {
        let message = commit_message(CommitAction::Delete, kind, &entry.name);
        self.client
            .delete(&mapper::to_path(kind, &entry.name), &message, &entry.sha)
            .await?;
        info!("{}", message);
        Ok(())
    }

    fn check_duration(&self, upload: &MediaUpload) -> Result<()> {
        match upload.duration_secs {
            Some(secs) if secs > self.max_video_secs => Err(ContentError::validation(format!(
                "Video is too long ({:.1}s). Max allowed is {:.1} seconds.",
                secs, self.max_video_secs
            ))),
            _ => Ok(()),
        }
    }
}

/// Build the item for a text form, rejecting missing fields.
fn item_from_form(kind: ContentKind, form: &EditorForm) -> Result<ContentItem> {
    let require_body = || {
        if form.content.trim().is_empty() {
            Err(ContentError::validation("Content cannot be empty"))
        } else {
            Ok(form.content.clone())
        }
    };

    match kind {
        ContentKind::BlogPost | ContentKind::Recipe => {
            if form.title.trim().is_empty() {
                return Err(ContentError::validation("Title is required"));
            }
            let article = Article {
                title: form.title.trim().to_string(),
                body: require_body()?,
            };
            Ok(if kind == ContentKind::BlogPost {
                ContentItem::BlogPost(article)
            } else {
                ContentItem::Recipe(article)
            })
        }
        ContentKind::Quote => {
            if form.author.trim().is_empty() || form.content.trim().is_empty() {
                return Err(ContentError::validation(
                    "Author Name and Quote Text are required",
                ));
            }
            Ok(ContentItem::Quote(Quote {
                quote: form.content.clone(),
                author: form.author.clone(),
            }))
        }
        ContentKind::Page(page) => Ok(ContentItem::Page {
            page,
            body: require_body()?,
        }),
        ContentKind::Media(_) => Err(ContentError::validation(
            "Media files are added by uploading; to rename, upload a new file and delete this one",
        )),
    }
}
