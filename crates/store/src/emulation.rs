//! Local emulation of the repository
//!
//! Stands in for the remote repository when no token is configured so the
//! editing flow can be exercised offline. All bodies live in a single JSON
//! mapping from repository path to the transport (base64) or data-URL body,
//! written through to disk on every mutation. Writes always overwrite; there
//! is no conflict detection in emulation mode.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::entry::{file_name, RepositoryEntry};
use crate::error::{Result, StoreError};

/// File name of the emulation database inside the data directory.
pub const EMULATION_DB_FILE: &str = "emulation_db.json";

/// Capped store written by earlier releases, migrated on first open.
pub const LEGACY_EMULATION_DB_FILE: &str = "local_storage.json";

#[derive(Debug, Clone)]
pub struct EmulationStore {
    db_path: Option<PathBuf>,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl EmulationStore {
    /// A store that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Open (or create) the durable store at `db_path`.
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::open_with_legacy(db_path, None::<PathBuf>).await
    }

    /// Open the durable store, migrating a legacy capped store the first time.
    ///
    /// The legacy file is only consulted while the durable store does not
    /// exist yet; its contents are copied over and the legacy file removed.
    pub async fn open_with_legacy<P, L>(db_path: P, legacy_path: Option<L>) -> Result<Self>
    where
        P: AsRef<Path>,
        L: AsRef<Path>,
    {
        let db_path = db_path.as_ref().to_path_buf();

        let entries = if db_path.exists() {
            read_mapping(&db_path).await?
        } else {
            let migrated = match legacy_path.as_ref().map(|p| p.as_ref()) {
                Some(legacy) if legacy.exists() => {
                    let mapping = read_mapping(legacy).await?;
                    info!(
                        "Migrating {} emulated entries from legacy store {}",
                        mapping.len(),
                        legacy.display()
                    );
                    Some((legacy.to_path_buf(), mapping))
                }
                _ => None,
            };

            let mapping = migrated
                .as_ref()
                .map(|(_, mapping)| mapping.clone())
                .unwrap_or_default();
            write_mapping(&db_path, &mapping).await?;

            if let Some((legacy, _)) = migrated {
                fs::remove_file(&legacy)
                    .await
                    .map_err(|e| StoreError::IoOperation {
                        operation: "remove legacy emulation store".to_string(),
                        path: legacy,
                        source: e,
                    })?;
            }
            mapping
        };

        Ok(Self {
            db_path: Some(db_path),
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub async fn get(&self, path: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries.get(normalize(path)).cloned()
    }

    pub async fn set(&self, path: &str, body: impl Into<String>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(normalize(path).to_string(), body.into());
        self.flush(&next).await?;
        *entries = next;
        debug!("Emulated write: {}", path);
        Ok(())
    }

    /// Remove a path; returns whether anything was stored there.
    pub async fn delete(&self, path: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(normalize(path)) {
            debug!("Emulated delete: {} (nothing stored)", path);
            return Ok(false);
        }
        let mut next = entries.clone();
        next.remove(normalize(path));
        self.flush(&next).await?;
        *entries = next;
        debug!("Emulated delete: {}", path);
        Ok(true)
    }

    /// Direct children of `folder`, one path segment below it.
    pub async fn list_prefix(&self, folder: &str) -> Vec<(String, String)> {
        let prefix = format!("{}/", normalize(folder));
        let entries = self.entries.lock().await;
        entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .map(|(key, body)| (key.clone(), body.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        match &self.db_path {
            Some(path) => write_mapping(path, entries).await,
            None => Ok(()),
        }
    }
}

/// Describe an emulated body as a listing entry.
///
/// The SHA is derived from path and body so it changes whenever the body
/// does. Media entries get a `data:` URL so previews render without network.
pub fn emulated_entry(path: &str, body: &str) -> RepositoryEntry {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update([0u8]);
    hasher.update(body.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let mut entry = RepositoryEntry::file(normalize(path), format!("emulated-{}", &digest[..40]));
    entry.size = Some(body.len() as u64);
    entry.download_url = data_url(path, body);
    entry
}

fn data_url(path: &str, body: &str) -> Option<String> {
    if body.starts_with("data:") {
        return Some(body.to_string());
    }
    let mime = mime_guess::from_path(file_name(path)).first()?;
    match mime.type_().as_str() {
        "image" | "video" => Some(format!("data:{};base64,{}", mime.essence_str(), body)),
        _ => None,
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

async fn read_mapping(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::IoOperation {
            operation: "read emulation store".to_string(),
            path: path.to_path_buf(),
            source: e,
        })?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&content)?)
}

async fn write_mapping(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, serde_json::to_vec(entries)?)
        .await
        .map_err(|e| StoreError::IoOperation {
            operation: "write emulation store".to_string(),
            path: tmp_path.clone(),
            source: e,
        })?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| StoreError::IoOperation {
            operation: "replace emulation store".to_string(),
            path: path.to_path_buf(),
            source: e,
        })
}
