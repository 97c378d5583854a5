use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The stored file changed since it was last read, or a create targeted an
    /// existing file. Callers must not retry with a fresh hash.
    #[error("Conflict on '{path}': {message}")]
    Conflict { path: String, message: String },

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Malformed content in '{path}': {reason}")]
    MalformedContent { path: String, reason: String },

    #[error("Repository information is missing. Please configure owner and repo.")]
    MissingRepository,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid transport encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO operation '{operation}' failed on path '{path}': {source}")]
    IoOperation {
        operation: String,
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn conflict(path: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Conflict {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Transient failures that leave credentials and stored state untouched.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }

    pub fn is_user_error(&self) -> bool {
        match self {
            StoreError::NotFound(_) => true,
            StoreError::Conflict { .. } => true,
            StoreError::AuthFailure(_) => true,
            StoreError::MissingRepository => true,
            StoreError::Validation(_) => true,
            _ => false,
        }
    }
}
