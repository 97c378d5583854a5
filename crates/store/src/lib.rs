//! Folio Store - content repository access for a static site
//!
//! Content for the site (posts, recipes, quotes, media, single pages) lives as
//! files in a hosted git repository and is read and written through the
//! provider's contents API. This crate provides:
//!
//! - **Credentials**: the session token and the persisted repository coordinates
//! - **Repository client**: list/read/write/delete by path with SHA-based
//!   optimistic concurrency
//! - **Emulation store**: a durable local stand-in used for writes when no
//!   token is configured
//! - **Transport encoding**: base64 that round-trips multi-byte text
//!
//! # Examples
//!
//! ```no_run
//! use folio_store::{Credentials, FileBody, FolioConfig, RepositoryClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FolioConfig::load().await?;
//! let credentials = Credentials::open(config.storage.data_path().join("repository.json")).await?;
//! let client = RepositoryClient::from_config(&config, credentials).await?;
//!
//! client.sign_in("ghp_example").await?;
//! let about = client.read("content/about/about.md").await?;
//! client
//!     .write(
//!         "content/about/about.md",
//!         FileBody::text("Hello again"),
//!         "Update about: about.md",
//!         Some(about.sha.as_str()),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod emulation;
pub mod encoding;
pub mod entry;
pub mod error;

pub use api::{AuthenticatedUser, ContentsApi, GitHubContentsApi, InMemoryContentsApi};
pub use client::{EMULATED_LOGIN, FileBody, RepositoryClient};
pub use config::FolioConfig;
pub use credentials::{Credentials, RepoCoordinates};
pub use emulation::{EMULATION_DB_FILE, EmulationStore, LEGACY_EMULATION_DB_FILE};
pub use entry::{EntryKind, RepositoryEntry};
pub use error::{Result, StoreError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
