//! Credential holder shared by every component that talks to the repository
//!
//! Constructed once at startup and cloned into the components that need it.
//! The access token lives only as long as the process session and is dropped
//! on sign-out. Repository coordinates are written through to a small JSON
//! file so they survive restarts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::Result;

/// Owner login and repository name addressed by the contents API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinates {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.owner.is_empty() && !self.name.is_empty()
    }
}

impl std::fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCoordinates {
    #[serde(flatten)]
    coordinates: RepoCoordinates,
    saved_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CredentialState {
    token: Option<String>,
    coordinates: Option<RepoCoordinates>,
}

/// Point-in-time copy of the credential state used for a single request.
#[derive(Debug, Clone, Default)]
pub struct CredentialSnapshot {
    pub token: Option<String>,
    pub coordinates: Option<RepoCoordinates>,
}

impl CredentialSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    state: Arc<RwLock<CredentialState>>,
    coordinates_path: Option<PathBuf>,
}

impl Credentials {
    /// Credentials that never touch disk.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(CredentialState::default())),
            coordinates_path: None,
        }
    }

    /// Open credentials backed by a coordinates file, restoring any
    /// coordinates saved by an earlier session.
    pub async fn open<P: AsRef<Path>>(coordinates_path: P) -> Result<Self> {
        let path = coordinates_path.as_ref().to_path_buf();
        let coordinates = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            let stored: StoredCoordinates = serde_json::from_str(&content)?;
            debug!(
                "Restored repository coordinates {} saved at {}",
                stored.coordinates, stored.saved_at
            );
            Some(stored.coordinates)
        } else {
            None
        };

        Ok(Self {
            state: Arc::new(RwLock::new(CredentialState {
                token: None,
                coordinates,
            })),
            coordinates_path: Some(path),
        })
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        let mut state = self.state.write().await;
        state.token = Some(token.into());
    }

    pub async fn clear_token(&self) {
        let mut state = self.state.write().await;
        state.token = None;
    }

    /// True when a non-empty token is held. Token validity is only known
    /// after an authenticated call succeeds.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    /// Update the repository coordinates and persist them. A failed write is
    /// logged and the in-memory coordinates still take effect.
    pub async fn set_repository_coordinates(
        &self,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) {
        let coordinates = RepoCoordinates::new(owner, name);
        {
            let mut state = self.state.write().await;
            state.coordinates = Some(coordinates.clone());
        }

        if let Some(path) = &self.coordinates_path {
            if let Err(e) = persist_coordinates(path, &coordinates).await {
                warn!(
                    "Failed to persist repository coordinates to {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    pub async fn coordinates(&self) -> Option<RepoCoordinates> {
        self.state.read().await.coordinates.clone()
    }

    pub async fn snapshot(&self) -> CredentialSnapshot {
        let state = self.state.read().await;
        CredentialSnapshot {
            token: state.token.clone(),
            coordinates: state.coordinates.clone(),
        }
    }
}

async fn persist_coordinates(path: &Path, coordinates: &RepoCoordinates) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let stored = StoredCoordinates {
        coordinates: coordinates.clone(),
        saved_at: Utc::now(),
    };
    fs::write(path, serde_json::to_string_pretty(&stored)?).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_token_lifecycle() {
        let credentials = Credentials::in_memory();
        assert!(!credentials.is_authenticated().await);

        credentials.set_token("ghp_example").await;
        assert!(credentials.is_authenticated().await);
        assert_eq!(credentials.token().await.as_deref(), Some("ghp_example"));

        credentials.clear_token().await;
        assert!(!credentials.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_empty_token_is_not_authenticated() {
        let credentials = Credentials::in_memory();
        credentials.set_token("").await;
        assert!(!credentials.is_authenticated().await);
        assert!(!credentials.snapshot().await.is_authenticated());
    }

    #[tokio::test]
    async fn test_coordinates_survive_restart_but_token_does_not() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("repository.json");

        let credentials = Credentials::open(&path).await.unwrap();
        credentials.set_token("ghp_session_only").await;
        credentials
            .set_repository_coordinates("madesh", "portfolio")
            .await;
        drop(credentials);

        let restored = Credentials::open(&path).await.unwrap();
        assert_eq!(
            restored.coordinates().await,
            Some(RepoCoordinates::new("madesh", "portfolio"))
        );
        assert!(!restored.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let credentials = Credentials::in_memory();
        let handle = credentials.clone();
        handle.set_token("shared").await;
        assert!(credentials.is_authenticated().await);
    }

    #[test]
    fn test_coordinates_display() {
        let coordinates = RepoCoordinates::new("owner", "repo");
        assert_eq!(coordinates.to_string(), "owner/repo");
        assert!(coordinates.is_complete());
        assert!(!RepoCoordinates::new("", "repo").is_complete());
    }
}
