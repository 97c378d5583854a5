//! Path-addressed access to the content repository
//!
//! [`RepositoryClient`] decides per call whether to reach the provider or the
//! local emulation store:
//!
//! - `list` and `read` always try the provider first so anonymous visitors see
//!   the published repository. Without a token they fall back to the
//!   emulation store when the provider has nothing at the path or cannot be
//!   reached.
//! - `write` and `delete` go to the provider only when a token is held.
//!   Otherwise they land in the emulation store and always succeed.
//!
//! Writes to the provider use optimistic concurrency: updates and deletes
//! carry the SHA last read, and a stale SHA surfaces as
//! [`StoreError::Conflict`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{
    AuthenticatedUser, Contents, ContentsApi, DeleteContents, GitHubContentsApi, PutContents,
};
use crate::config::FolioConfig;
use crate::credentials::{CredentialSnapshot, Credentials, RepoCoordinates};
use crate::emulation::{
    EMULATION_DB_FILE, EmulationStore, LEGACY_EMULATION_DB_FILE, emulated_entry,
};
use crate::encoding;
use crate::entry::{RepositoryEntry, file_name};
use crate::error::{Result, StoreError};

/// Login reported for the current user while no token is configured.
pub const EMULATED_LOGIN: &str = "local-test-user";

/// Body of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBody {
    /// UTF-8 text, transport-encoded by the client.
    Text(String),
    /// Binary content that is already transport (base64) encoded.
    Encoded(String),
}

impl FileBody {
    pub fn text(text: impl Into<String>) -> Self {
        FileBody::Text(text.into())
    }

    pub fn binary(bytes: &[u8]) -> Self {
        FileBody::Encoded(encoding::encode_bytes(bytes))
    }

    fn into_transport(self) -> String {
        match self {
            FileBody::Text(text) => encoding::encode_text(&text),
            FileBody::Encoded(encoded) => encoded,
        }
    }
}

pub struct RepositoryClient<A: ContentsApi = GitHubContentsApi> {
    api: Arc<A>,
    credentials: Credentials,
    emulation: EmulationStore,
    branch: String,
    default_repository: String,
}

impl<A: ContentsApi> Clone for RepositoryClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            credentials: self.credentials.clone(),
            emulation: self.emulation.clone(),
            branch: self.branch.clone(),
            default_repository: self.default_repository.clone(),
        }
    }
}

impl RepositoryClient<GitHubContentsApi> {
    /// Build a client against the configured provider, with the emulation
    /// store under the configured data directory. A legacy store found next
    /// to it is migrated the first time.
    pub async fn from_config(config: &FolioConfig, credentials: Credentials) -> Result<Self> {
        let api = GitHubContentsApi::new(&config.provider)?;
        let data_path = config.storage.data_path();
        let emulation = EmulationStore::open_with_legacy(
            data_path.join(EMULATION_DB_FILE),
            Some(data_path.join(LEGACY_EMULATION_DB_FILE)),
        )
        .await?;
        Ok(Self::new(api, credentials, emulation)
            .with_branch(config.provider.branch.clone())
            .with_default_repository(config.repository.default_name.clone()))
    }
}

impl<A: ContentsApi> RepositoryClient<A> {
    pub fn new(api: A, credentials: Credentials, emulation: EmulationStore) -> Self {
        Self::from_shared(Arc::new(api), credentials, emulation)
    }

    pub fn from_shared(api: Arc<A>, credentials: Credentials, emulation: EmulationStore) -> Self {
        let defaults = FolioConfig::default();
        Self {
            api,
            credentials,
            emulation,
            branch: defaults.provider.branch,
            default_repository: defaults.repository.default_name,
        }
    }

    /// Branch used for raw-content URLs.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Repository bound to the owner on sign-in.
    pub fn with_default_repository(mut self, name: impl Into<String>) -> Self {
        self.default_repository = name.into();
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn emulation(&self) -> &EmulationStore {
        &self.emulation
    }

    /// Files directly inside `folder`, without directories or placeholder
    /// files. A folder that does not exist yields an empty list.
    pub async fn list(&self, folder: &str) -> Result<Vec<RepositoryEntry>> {
        let snapshot = self.credentials.snapshot().await;

        let remote = match self.remote_contents(&snapshot, folder).await {
            Ok(Contents::Directory(entries)) => entries,
            Ok(Contents::File { entry, .. }) => vec![entry],
            Err(e) if e.is_not_found() => {
                debug!("Folder '{}' does not exist yet", folder);
                Vec::new()
            }
            Err(e) if !snapshot.is_authenticated() && is_unreachable(&e) => {
                warn!(
                    "Listing '{}' from the emulation store only: {}",
                    folder, e
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let mut by_name: BTreeMap<String, RepositoryEntry> = remote
            .into_iter()
            .filter(|entry| entry.is_file() && !entry.is_placeholder())
            .map(|entry| (entry.name.clone(), entry))
            .collect();

        if !snapshot.is_authenticated() {
            for (path, body) in self.emulation.list_prefix(folder).await {
                let entry = emulated_entry(&path, &body);
                if !entry.is_placeholder() {
                    by_name.entry(entry.name.clone()).or_insert(entry);
                }
            }
        }

        Ok(by_name.into_values().collect())
    }

    /// Read a file and decode its body as UTF-8 text into `content`.
    pub async fn read(&self, path: &str) -> Result<RepositoryEntry> {
        let (mut entry, encoded) = self.fetch_encoded(path).await?;
        entry.content = Some(encoding::decode_text(&encoded)?);
        Ok(entry)
    }

    /// Read a file's raw bytes.
    pub async fn read_bytes(&self, path: &str) -> Result<(RepositoryEntry, Vec<u8>)> {
        let (entry, encoded) = self.fetch_encoded(path).await?;
        let bytes = encoding::decode_bytes(&encoded)?;
        Ok((entry, bytes))
    }

    /// Create or replace a file.
    ///
    /// Without `expected_sha` the file must not exist yet; with it, the SHA
    /// must match the stored file. Either violation is a conflict. Without a
    /// token the body is written to the emulation store unconditionally.
    pub async fn write(
        &self,
        path: &str,
        body: FileBody,
        message: &str,
        expected_sha: Option<&str>,
    ) -> Result<RepositoryEntry> {
        validate_path(path)?;
        let snapshot = self.credentials.snapshot().await;
        let content = body.into_transport();

        if !snapshot.is_authenticated() {
            debug!("No token configured, emulating write of '{}'", path);
            self.emulation.set(path, content.clone()).await?;
            return Ok(emulated_entry(path, &content));
        }

        let repo = require_coordinates(&snapshot)?;
        let request = PutContents {
            message: message.to_string(),
            content,
            sha: expected_sha.map(str::to_string),
        };
        self.api
            .put_contents(&repo, snapshot.token.as_deref(), path, &request)
            .await
    }

    /// Delete a file that currently has `expected_sha`.
    pub async fn delete(&self, path: &str, message: &str, expected_sha: &str) -> Result<()> {
        validate_path(path)?;
        let snapshot = self.credentials.snapshot().await;

        if !snapshot.is_authenticated() {
            let existed = self.emulation.delete(path).await?;
            debug!("Emulated delete of '{}' (existed: {})", path, existed);
            return Ok(());
        }

        let repo = require_coordinates(&snapshot)?;
        let request = DeleteContents {
            message: message.to_string(),
            sha: expected_sha.to_string(),
        };
        self.api
            .delete_contents(&repo, snapshot.token.as_deref(), path, &request)
            .await
    }

    /// Owner of the current token, or the emulated user without one.
    pub async fn authenticated_user(&self) -> Result<AuthenticatedUser> {
        let snapshot = self.credentials.snapshot().await;
        if !snapshot.is_authenticated() {
            return Ok(AuthenticatedUser {
                login: EMULATED_LOGIN.to_string(),
            });
        }
        self.api.current_user(snapshot.token.as_deref()).await
    }

    /// Adopt `token`, confirm it with the provider and bind the repository
    /// coordinates to its owner.
    ///
    /// A rejected token is cleared again. Transport failures keep the token
    /// so a flaky connection does not force re-entry.
    pub async fn sign_in(&self, token: &str) -> Result<AuthenticatedUser> {
        if token.trim().is_empty() {
            return Err(StoreError::Validation(
                "An access token is required".to_string(),
            ));
        }
        self.credentials.set_token(token.trim()).await;

        match self.api.current_user(Some(token.trim())).await {
            Ok(user) => {
                self.credentials
                    .set_repository_coordinates(user.login.clone(), self.default_repository.clone())
                    .await;
                info!(
                    "Signed in as {} ({}/{})",
                    user.login, user.login, self.default_repository
                );
                Ok(user)
            }
            Err(e @ StoreError::AuthFailure(_)) => {
                warn!("Token rejected by provider: {}", e);
                self.credentials.clear_token().await;
                Err(e)
            }
            Err(e) => {
                warn!("Could not confirm token, keeping it: {}", e);
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) {
        self.credentials.clear_token().await;
        info!("Signed out");
    }

    /// Raw download URL for `path` on the configured branch, when the
    /// repository coordinates are known.
    pub async fn raw_url(&self, path: &str) -> Option<String> {
        let repo = self.credentials.coordinates().await?;
        repo.is_complete()
            .then(|| self.api.raw_url(&repo, &self.branch, path))
    }

    async fn remote_contents(&self, snapshot: &CredentialSnapshot, path: &str) -> Result<Contents> {
        let repo = require_coordinates(snapshot)?;
        self.api
            .get_contents(&repo, snapshot.token.as_deref(), path)
            .await
    }

    async fn fetch_encoded(&self, path: &str) -> Result<(RepositoryEntry, String)> {
        validate_path(path)?;
        let snapshot = self.credentials.snapshot().await;

        match self.remote_contents(&snapshot, path).await {
            Ok(Contents::File {
                entry,
                encoded_content,
            }) => Ok((entry, encoded_content)),
            Ok(Contents::Directory(_)) => Err(StoreError::Validation(format!(
                "'{}' is a directory, not a file",
                path
            ))),
            Err(e)
                if !snapshot.is_authenticated() && (e.is_not_found() || is_unreachable(&e)) =>
            {
                match self.emulation.get(path).await {
                    Some(body) => {
                        debug!("Serving '{}' from the emulation store", path);
                        let entry = emulated_entry(path, &body);
                        Ok((entry, transport_part(&body).to_string()))
                    }
                    None if matches!(e, StoreError::MissingRepository) => {
                        Err(StoreError::NotFound(path.to_string()))
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}

/// Provider unreachable or unaddressable, as opposed to a definite answer.
fn is_unreachable(error: &StoreError) -> bool {
    matches!(
        error,
        StoreError::Transport(_) | StoreError::MissingRepository
    )
}

fn require_coordinates(snapshot: &CredentialSnapshot) -> Result<RepoCoordinates> {
    snapshot
        .coordinates
        .clone()
        .filter(RepoCoordinates::is_complete)
        .ok_or(StoreError::MissingRepository)
}

fn validate_path(path: &str) -> Result<()> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || file_name(trimmed).is_empty() {
        return Err(StoreError::Validation(format!("Invalid path: '{}'", path)));
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err(StoreError::Validation(format!(
            "Directory traversal not allowed: {}",
            path
        )));
    }
    Ok(())
}

/// Base64 part of a stored body, which may be a `data:` URL.
fn transport_part(body: &str) -> &str {
    if body.starts_with("data:") {
        if let Some((_, encoded)) = body.split_once(";base64,") {
            return encoded;
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_body_transport() {
        assert_eq!(FileBody::text("Hello").into_transport(), "SGVsbG8=");
        assert_eq!(
            FileBody::Encoded("iVBORw0KGgo=".to_string()).into_transport(),
            "iVBORw0KGgo="
        );
        assert_eq!(FileBody::binary(&[0xff, 0xd8]), FileBody::Encoded("/9g=".to_string()));
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("content/blogs/a.md").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("/").is_err());
        assert!(validate_path("content/../secrets").is_err());
    }

    #[test]
    fn test_transport_part() {
        assert_eq!(transport_part("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(transport_part("AAAA"), "AAAA");
    }

    #[test]
    fn test_require_coordinates() {
        let snapshot = CredentialSnapshot {
            token: None,
            coordinates: Some(RepoCoordinates::new("owner", "")),
        };
        assert!(matches!(
            require_coordinates(&snapshot),
            Err(StoreError::MissingRepository)
        ));
    }
}
