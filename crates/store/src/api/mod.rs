//! Contents API seam
//!
//! The repository client speaks to the hosting provider through
//! [`ContentsApi`]. [`github::GitHubContentsApi`] is the HTTP implementation;
//! [`memory::InMemoryContentsApi`] keeps the same versioning rules in process.

pub mod github;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::RepoCoordinates;
use crate::entry::RepositoryEntry;
use crate::error::Result;

pub use github::GitHubContentsApi;
pub use memory::InMemoryContentsApi;

/// The account a token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
}

/// Result of a contents lookup: a single file, or a directory listing.
#[derive(Debug, Clone)]
pub enum Contents {
    File {
        entry: RepositoryEntry,
        /// Base64 body as sent by the provider, possibly line-wrapped.
        encoded_content: String,
    },
    Directory(Vec<RepositoryEntry>),
}

/// Body of a create-or-update request.
#[derive(Debug, Clone, Serialize)]
pub struct PutContents {
    pub message: String,
    /// Base64 body.
    pub content: String,
    /// Current SHA of the file; absent when creating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Body of a delete request.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteContents {
    pub message: String,
    pub sha: String,
}

#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Identify the owner of `token`.
    async fn current_user(&self, token: Option<&str>) -> Result<AuthenticatedUser>;

    async fn get_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
    ) -> Result<Contents>;

    /// Create or replace a file, returning its new entry.
    async fn put_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
        request: &PutContents,
    ) -> Result<RepositoryEntry>;

    async fn delete_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
        request: &DeleteContents,
    ) -> Result<()>;

    /// Raw download URL for a path on `branch`, used when a listing does not
    /// provide one.
    fn raw_url(&self, repo: &RepoCoordinates, branch: &str, path: &str) -> String;
}
