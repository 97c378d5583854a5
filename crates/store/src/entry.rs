use serde::{Deserialize, Serialize};

/// Placeholder file used to keep otherwise empty folders in the repository.
pub const PLACEHOLDER_NAME: &str = ".gitkeep";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    #[serde(rename = "dir")]
    Directory,
    Symlink,
    Submodule,
}

impl EntryKind {
    /// Kind from the provider's `type` field; unknown values are treated as files.
    pub fn from_api(s: &str) -> Self {
        match s {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            "symlink" => EntryKind::Symlink,
            "submodule" => EntryKind::Submodule,
            _ => EntryKind::File,
        }
    }
}

/// A file or directory at a repository path, together with the provider's
/// version identifier for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    /// Changes on every successful write; required for updates and deletes.
    pub sha: String,
    pub size: Option<u64>,
    pub download_url: Option<String>,
    /// Decoded text body, present only on entries returned by a read.
    pub content: Option<String>,
}

impl RepositoryEntry {
    pub fn file(path: impl Into<String>, sha: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_string(),
            path,
            kind: EntryKind::File,
            sha: sha.into(),
            size: None,
            download_url: None,
            content: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == PLACEHOLDER_NAME
    }

    /// Text body of a read entry, empty for listing entries.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Last path segment of a repository path.
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// Join a folder and a file name into a repository path.
pub fn join_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    let name = name.trim_start_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}
