//! In-process contents provider
//!
//! Keeps files per repository with the same versioning rules as the hosted
//! contents API: every write produces a new SHA, updates and deletes must
//! present the current SHA, creating over an existing file requires one, and
//! writes need an accepted token.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{AuthenticatedUser, Contents, ContentsApi, DeleteContents, PutContents};
use crate::credentials::RepoCoordinates;
use crate::encoding;
use crate::entry::{EntryKind, RepositoryEntry, file_name};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    sha: String,
    size: u64,
}

#[derive(Debug)]
pub struct InMemoryContentsApi {
    login: String,
    files: Mutex<BTreeMap<String, StoredFile>>,
    accepted_tokens: Mutex<Option<HashSet<String>>>,
    offline: AtomicBool,
    requests: AtomicUsize,
}

impl Default for InMemoryContentsApi {
    fn default() -> Self {
        Self::new("octocat")
    }
}

impl InMemoryContentsApi {
    /// A provider whose tokens all belong to `login`. Any non-empty token is
    /// accepted until [`Self::accept_only`] narrows the set.
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            files: Mutex::new(BTreeMap::new()),
            accepted_tokens: Mutex::new(None),
            offline: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn accept_only<I, S>(&self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut accepted = lock(&self.accepted_tokens);
        *accepted = Some(tokens.into_iter().map(Into::into).collect());
    }

    /// Make every call fail with a transport error, as if the network dropped.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls that reached the provider.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Store a text file directly, bypassing authentication. Returns its SHA.
    pub fn seed_text(&self, repo: &RepoCoordinates, path: &str, text: &str) -> String {
        self.seed_encoded(repo, path, &encoding::encode_text(text))
    }

    /// Store an already-encoded body directly. Returns its SHA.
    pub fn seed_encoded(&self, repo: &RepoCoordinates, path: &str, encoded: &str) -> String {
        let stored = stored_file(encoded);
        let sha = stored.sha.clone();
        lock(&self.files).insert(key(repo, path), stored);
        sha
    }

    /// Current SHA of a file, if present.
    pub fn sha_of(&self, repo: &RepoCoordinates, path: &str) -> Option<String> {
        lock(&self.files).get(&key(repo, path)).map(|f| f.sha.clone())
    }

    pub fn file_count(&self) -> usize {
        lock(&self.files).len()
    }

    fn begin(&self, token: Option<&str>) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(
                "error sending request: connection refused".to_string(),
            ));
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let accepted = lock(&self.accepted_tokens);
            if let Some(accepted) = accepted.as_ref() {
                if !accepted.contains(token) {
                    return Err(StoreError::AuthFailure("Bad credentials".to_string()));
                }
            }
        }
        Ok(())
    }

    fn require_token(token: Option<&str>) -> Result<()> {
        match token.filter(|t| !t.is_empty()) {
            Some(_) => Ok(()),
            None => Err(StoreError::AuthFailure(
                "Requires authentication".to_string(),
            )),
        }
    }

    fn entry(&self, repo: &RepoCoordinates, path: &str, file: &StoredFile) -> RepositoryEntry {
        let path = path.trim_matches('/');
        let mut entry = RepositoryEntry::file(path, file.sha.clone());
        entry.size = Some(file.size);
        entry.download_url = Some(self.raw_url(repo, "main", path));
        entry
    }
}

#[async_trait]
impl ContentsApi for InMemoryContentsApi {
    async fn current_user(&self, token: Option<&str>) -> Result<AuthenticatedUser> {
        self.begin(token)?;
        Self::require_token(token)?;
        Ok(AuthenticatedUser {
            login: self.login.clone(),
        })
    }

    async fn get_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
    ) -> Result<Contents> {
        self.begin(token)?;
        if !repo.is_complete() {
            return Err(StoreError::MissingRepository);
        }

        let files = lock(&self.files);
        if let Some(file) = files.get(&key(repo, path)) {
            return Ok(Contents::File {
                entry: self.entry(repo, path, file),
                encoded_content: file.content.clone(),
            });
        }

        let prefix = format!("{}/", key(repo, path));
        let mut entries = Vec::new();
        let mut directories = BTreeSet::new();
        for (stored_key, file) in files.range(prefix.clone()..) {
            let Some(rest) = stored_key.strip_prefix(&prefix) else {
                break;
            };
            let child_path = format!("{}/{}", path.trim_matches('/'), rest);
            match rest.split_once('/') {
                None => entries.push(self.entry(repo, &child_path, file)),
                Some((dir, _)) => {
                    directories.insert(dir.to_string());
                }
            }
        }

        if entries.is_empty() && directories.is_empty() {
            return Err(StoreError::NotFound(format!("{} (Not Found)", path)));
        }

        for dir in directories {
            let dir_path = format!("{}/{}", path.trim_matches('/'), dir);
            let mut entry = RepositoryEntry::file(dir_path, String::new());
            entry.kind = EntryKind::Directory;
            entries.push(entry);
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Contents::Directory(entries))
    }

    async fn put_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
        request: &PutContents,
    ) -> Result<RepositoryEntry> {
        self.begin(token)?;
        Self::require_token(token)?;
        if !repo.is_complete() {
            return Err(StoreError::MissingRepository);
        }
        encoding::decode_bytes(&request.content)?;

        let mut files = lock(&self.files);
        let file_key = key(repo, path);
        match (files.get(&file_key), request.sha.as_deref()) {
            (Some(_), None) => {
                return Err(StoreError::conflict(
                    path,
                    "Invalid request.\n\n\"sha\" wasn't supplied.",
                ));
            }
            (Some(existing), Some(sha)) if existing.sha != sha => {
                return Err(StoreError::conflict(
                    path,
                    format!("{} does not match {}", file_name(path), sha),
                ));
            }
            (None, Some(sha)) => {
                return Err(StoreError::conflict(
                    path,
                    format!("{} does not exist; sha {} is stale", file_name(path), sha),
                ));
            }
            _ => {}
        }

        let stored = stored_file(&request.content);
        let entry = self.entry(repo, path, &stored);
        files.insert(file_key, stored);
        Ok(entry)
    }

    async fn delete_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
        request: &DeleteContents,
    ) -> Result<()> {
        self.begin(token)?;
        Self::require_token(token)?;
        if !repo.is_complete() {
            return Err(StoreError::MissingRepository);
        }

        let mut files = lock(&self.files);
        let file_key = key(repo, path);
        match files.get(&file_key) {
            None => Err(StoreError::NotFound(format!("{} (Not Found)", path))),
            Some(existing) if existing.sha != request.sha => Err(StoreError::conflict(
                path,
                format!("{} does not match {}", file_name(path), request.sha),
            )),
            Some(_) => {
                files.remove(&file_key);
                Ok(())
            }
        }
    }

    fn raw_url(&self, repo: &RepoCoordinates, branch: &str, path: &str) -> String {
        format!(
            "memory://{}/{}/{}/{}",
            repo.owner,
            repo.name,
            branch,
            path.trim_start_matches('/')
        )
    }
}

fn key(repo: &RepoCoordinates, path: &str) -> String {
    format!("{}/{}", repo, path.trim_matches('/'))
}

/// Content-addressed SHA in the style of a git blob id.
fn stored_file(encoded: &str) -> StoredFile {
    let bytes = encoding::decode_bytes(encoded).unwrap_or_else(|_| encoded.as_bytes().to_vec());
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(&bytes);
    let digest = format!("{:x}", hasher.finalize());
    StoredFile {
        content: encoded.to_string(),
        sha: digest[..40].to_string(),
        size: bytes.len() as u64,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
