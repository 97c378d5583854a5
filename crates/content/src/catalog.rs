//! Public site content
//!
//! [`Catalog::load`] fetches every category at once. A category that fails
//! to load is logged and left empty; items that fail individually are
//! skipped without affecting their siblings.

use folio_store::{ContentsApi, RepositoryClient, RepositoryEntry};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::{ContentError, Result};
use crate::kind::{ContentKind, MediaKind, SinglePage};
use crate::mapper::{self, ContentItem};
use crate::markdown::{MarkdownRenderer, MediaIndex, is_rtl, resolve_images};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteCard {
    pub filename: String,
    pub quote: String,
    pub author: String,
    pub is_rtl: bool,
}

/// A blog post or recipe ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArticle {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub html: String,
    pub highlight_img: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeHighlight {
    pub img: String,
    pub recipe_file: String,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Newest first.
    pub images: Vec<RepositoryEntry>,
    pub quotes: Vec<QuoteCard>,
    pub recipes: Vec<RenderedArticle>,
    pub blogs: Vec<RenderedArticle>,
    pub recipe_highlights: Vec<RecipeHighlight>,
    pub about: Option<String>,
    pub store: Option<String>,
}

/// Markdown file fetched but not yet resolved against the media listing.
struct RawArticle {
    entry: RepositoryEntry,
    title: String,
    body: String,
}

impl Catalog {
    pub async fn load<A, R>(client: &RepositoryClient<A>, renderer: &R) -> Self
    where
        A: ContentsApi,
        R: MarkdownRenderer + ?Sized,
    {
        let (images, quotes, recipes, blogs, about, store) = futures::join!(
            degrade(MediaKind::Image.kind(), load_images(client)),
            degrade(ContentKind::Quote, load_quotes(client)),
            degrade(ContentKind::Recipe, load_articles(client, ContentKind::Recipe)),
            degrade(ContentKind::BlogPost, load_articles(client, ContentKind::BlogPost)),
            degrade(SinglePage::About.kind(), load_page(client, SinglePage::About)),
            degrade(SinglePage::Store.kind(), load_page(client, SinglePage::Store)),
        );

        let media = MediaIndex::new(&images, client.raw_url("").await);
        let recipes = render_articles(recipes, &media, renderer);
        let blogs = render_articles(blogs, &media, renderer);

        let recipe_highlights = recipes
            .iter()
            .filter_map(|recipe| {
                recipe.highlight_img.as_ref().map(|img| RecipeHighlight {
                    img: img.clone(),
                    recipe_file: recipe.filename.clone(),
                })
            })
            .collect();

        debug!(
            "Catalog loaded: {} images, {} quotes, {} recipes, {} blogs",
            images.len(),
            quotes.len(),
            recipes.len(),
            blogs.len()
        );

        Catalog {
            images,
            quotes,
            recipes,
            blogs,
            recipe_highlights,
            about: about.map(|body| renderer.render(&body)),
            store: store.map(|body| renderer.render(&body)),
        }
    }
}

async fn degrade<T, F>(kind: ContentKind, load: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match load.await {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not load {}: {}", kind, e);
            T::default()
        }
    }
}

async fn load_images<A: ContentsApi>(client: &RepositoryClient<A>) -> Result<Vec<RepositoryEntry>> {
    let mut images = client.list(MediaKind::Image.kind().folder()).await?;
    images.sort_by(|a, b| b.name.cmp(&a.name));
    Ok(images)
}

async fn load_quotes<A: ContentsApi>(client: &RepositoryClient<A>) -> Result<Vec<QuoteCard>> {
    let files = client.list(ContentKind::Quote.folder()).await?;
    let reads = files.iter().map(|file| read_quote(client, file));
    Ok(keep_loaded(join_all(reads).await))
}

async fn read_quote<A: ContentsApi>(
    client: &RepositoryClient<A>,
    file: &RepositoryEntry,
) -> Result<QuoteCard> {
    let read = client.read(&file.path).await?;
    match mapper::deserialize(ContentKind::Quote, &file.name, read.text())? {
        ContentItem::Quote(quote) => Ok(QuoteCard {
            filename: file.name.clone(),
            is_rtl: is_rtl(&quote.quote) || is_rtl(&quote.author),
            quote: quote.quote,
            author: quote.author,
        }),
        other => Err(ContentError::Malformed {
            kind: "quote",
            path: file.path.clone(),
            reason: format!("decoded as {}", other.kind()),
        }),
    }
}

async fn load_articles<A: ContentsApi>(
    client: &RepositoryClient<A>,
    kind: ContentKind,
) -> Result<Vec<RawArticle>> {
    let files = client.list(kind.folder()).await?;
    let reads = files
        .into_iter()
        .map(|entry| read_article(client, kind, entry));
    Ok(keep_loaded(join_all(reads).await))
}

async fn read_article<A: ContentsApi>(
    client: &RepositoryClient<A>,
    kind: ContentKind,
    entry: RepositoryEntry,
) -> Result<RawArticle> {
    let read = client.read(&entry.path).await?;
    match mapper::deserialize(kind, &entry.name, read.text())? {
        ContentItem::BlogPost(article) | ContentItem::Recipe(article) => Ok(RawArticle {
            entry,
            title: article.title,
            body: article.body,
        }),
        other => Err(ContentError::Malformed {
            kind: kind.label(),
            path: entry.path,
            reason: format!("decoded as {}", other.kind()),
        }),
    }
}

/// Body of the first file in a single-page folder.
async fn load_page<A: ContentsApi>(
    client: &RepositoryClient<A>,
    page: SinglePage,
) -> Result<Option<String>> {
    let files = client.list(page.kind().folder()).await?;
    let Some(first) = files.first() else {
        return Ok(None);
    };
    let read = client.read(&first.path).await?;
    Ok(Some(read.text().to_string()))
}

fn render_articles<R>(raw: Vec<RawArticle>, media: &MediaIndex, renderer: &R) -> Vec<RenderedArticle>
where
    R: MarkdownRenderer + ?Sized,
{
    raw.into_iter()
        .map(|article| {
            let resolved = resolve_images(&article.body, media);
            RenderedArticle {
                id: article.entry.sha,
                filename: article.entry.name,
                title: article.title,
                html: renderer.render(&resolved.markdown),
                highlight_img: resolved.highlight_img,
            }
        })
        .collect()
}

fn keep_loaded<T>(results: Vec<Result<T>>) -> Vec<T> {
    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping item: {}", e);
                None
            }
        })
        .collect()
}
