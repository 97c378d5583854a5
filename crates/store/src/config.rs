//! Persistent configuration for the content repository
//!
//! Configuration lives in `config.json` under the platform config directory
//! and is created with defaults on first load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, StoreError};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FolioConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub raw_url: String,
    pub branch: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepositoryConfig {
    /// Repository bound to the signed-in owner.
    pub default_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadConfig {
    pub spacing_ms: u64,
    pub max_video_secs: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            raw_url: "https://raw.githubusercontent.com".to_string(),
            branch: "main".to_string(),
            timeout_secs: 30,
            user_agent: format!("folio-store/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_name: "amna_portfolio".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            spacing_ms: 100,
            max_video_secs: 5.5,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl UploadConfig {
    pub fn spacing(&self) -> Duration {
        Duration::from_millis(self.spacing_ms)
    }
}

impl StorageConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

impl FolioConfig {
    pub fn config_path() -> PathBuf {
        default_config_dir().join("config.json")
    }

    /// Load from the default location, writing defaults if nothing exists yet.
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::IoOperation {
                operation: "read config".to_string(),
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| StoreError::IoOperation {
                operation: "write config".to_string(),
                path: path.to_path_buf(),
                source: e,
            })
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["provider", "api_url"] => self.provider.api_url = value.to_string(),
            ["provider", "raw_url"] => self.provider.raw_url = value.to_string(),
            ["provider", "branch"] => self.provider.branch = value.to_string(),
            ["provider", "timeout_secs"] => {
                self.provider.timeout_secs = value.parse::<u64>().map_err(|_| {
                    StoreError::Configuration(format!("Invalid number value: {}", value))
                })?;
            }
            ["provider", "user_agent"] => self.provider.user_agent = value.to_string(),
            ["repository", "default_name"] => self.repository.default_name = value.to_string(),
            ["storage", "data_dir"] => self.storage.data_dir = value.to_string(),
            ["uploads", "spacing_ms"] => {
                self.uploads.spacing_ms = value.parse::<u64>().map_err(|_| {
                    StoreError::Configuration(format!("Invalid number value: {}", value))
                })?;
            }
            ["uploads", "max_video_secs"] => {
                self.uploads.max_video_secs = value.parse::<f64>().map_err(|_| {
                    StoreError::Configuration(format!("Invalid number value: {}", value))
                })?;
            }
            _ => {
                return Err(StoreError::Configuration(format!(
                    "Unknown configuration key: {}",
                    key
                )));
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        let value = match parts.as_slice() {
            ["provider", "api_url"] => self.provider.api_url.clone(),
            ["provider", "raw_url"] => self.provider.raw_url.clone(),
            ["provider", "branch"] => self.provider.branch.clone(),
            ["provider", "timeout_secs"] => self.provider.timeout_secs.to_string(),
            ["provider", "user_agent"] => self.provider.user_agent.clone(),
            ["repository", "default_name"] => self.repository.default_name.clone(),
            ["storage", "data_dir"] => self.storage.data_dir.clone(),
            ["uploads", "spacing_ms"] => self.uploads.spacing_ms.to_string(),
            ["uploads", "max_video_secs"] => self.uploads.max_video_secs.to_string(),
            _ => {
                return Err(StoreError::Configuration(format!(
                    "Unknown configuration key: {}",
                    key
                )));
            }
        };

        Ok(value)
    }

    pub async fn reset() -> Result<Self> {
        let config = Self::default();
        config.save().await?;
        Ok(config)
    }
}

/// Platform config directory, falling back to `.folio/config`.
pub fn default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "folio", "folio") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        PathBuf::from(".folio").join("config")
    }
}

/// Platform data directory, falling back to `.folio/data`.
pub fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "folio", "folio") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".folio").join("data")
    }
}
