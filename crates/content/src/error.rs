use folio_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(String),

    #[error("Malformed {kind} '{path}': {reason}")]
    Malformed {
        kind: &'static str,
        path: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ContentError>;

impl ContentError {
    pub fn validation(message: impl Into<String>) -> Self {
        ContentError::Validation(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ContentError::Store(e) if e.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::Store(e) if e.is_not_found())
    }

    /// Errors the editor should show as "fix your input" rather than a failure.
    pub fn is_user_error(&self) -> bool {
        match self {
            ContentError::Validation(_) => true,
            ContentError::Store(e) => e.is_user_error(),
            ContentError::Malformed { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_their_nature() {
        let conflict: ContentError = StoreError::conflict("content/blogs/a.md", "stale").into();
        assert!(conflict.is_conflict());
        assert!(!conflict.is_not_found());

        let missing: ContentError = StoreError::NotFound("content/blogs/a.md".into()).into();
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), StoreError::NotFound("content/blogs/a.md".into()).to_string());
    }

    #[test]
    fn test_validation_is_user_error() {
        assert!(ContentError::validation("Title is required").is_user_error());
        let malformed = ContentError::Malformed {
            kind: "quote",
            path: "content/quotes/x.json".into(),
            reason: "expected value".into(),
        };
        assert!(!malformed.is_user_error());
        assert!(malformed.to_string().contains("content/quotes/x.json"));
    }
}
