//! Folio Content - site content on top of the repository client
//!
//! Maps blog posts, recipes, quotes, media and the single pages onto
//! repository files and back, and provides the two consumers of that
//! mapping: the public [`Catalog`] and the admin [`Workspace`].
//!
//! # Examples
//!
//! ```no_run
//! use folio_content::{ContentKind, EditMode, EditorForm, Workspace};
//! use folio_store::{Credentials, FolioConfig, RepositoryClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FolioConfig::load().await?;
//! let credentials = Credentials::open(config.storage.data_path().join("repository.json")).await?;
//! let client = RepositoryClient::from_config(&config, credentials).await?;
//! let workspace = Workspace::from_config(client, &config);
//!
//! let form = EditorForm {
//!     author: "Nelson Mandela".to_string(),
//!     content: "It always seems impossible until it's done.".to_string(),
//!     ..EditorForm::default()
//! };
//! workspace.save(ContentKind::Quote, &form, EditMode::Create).await?;
//! # Ok(())
//! # }
//! ```
pub mod catalog;
pub mod error;
pub mod kind;
pub mod mapper;
pub mod markdown;
pub mod naming;
pub mod workspace;

pub use catalog::{Catalog, QuoteCard, RecipeHighlight, RenderedArticle};
pub use error::{ContentError, Result};
pub use kind::{ContentKind, MediaKind, SinglePage};
pub use mapper::{Article, ContentItem, MediaAsset, Quote};
pub use markdown::{MarkdownRenderer, Passthrough};
pub use workspace::{DashboardStats, EditMode, EditorForm, InlineImage, MediaUpload, Workspace};
