// ⚠️ Error Types - Directory pipeline failures
// Only the fetch boundary can fail. Search/filter/sort/display are total.

use thiserror::Error;

// ============================================================================
// DIRECTORY ERROR
// ============================================================================

/// Failures surfaced by a [`crate::directory::DirectorySource`].
///
/// Missing or malformed CMS content and unknown slice tags are NOT errors:
/// they are recovered locally by the renderer.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Backend query failed (network, upstream error response, ...)
    #[error("backend query failed: {message}")]
    Fetch { message: String },

    /// Snapshot file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Backend payload was not valid JSON at the top level
    #[error("failed to parse backend response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl DirectoryError {
    pub fn fetch(message: impl Into<String>) -> Self {
        DirectoryError::Fetch {
            message: message.into(),
        }
    }

    /// Message shown in the directory's error state
    pub fn user_message(&self) -> String {
        match self {
            DirectoryError::Fetch { .. } => {
                "We couldn't load banks right now. Please try again.".to_string()
            }
            DirectoryError::Io { .. } | DirectoryError::Parse(_) => {
                "Bank data is unavailable at the moment.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = DirectoryError::fetch("timeout");
        assert_eq!(err.to_string(), "backend query failed: timeout");
        assert!(err.user_message().contains("try again"));
    }

    #[test]
    fn test_parse_error_from_serde() {
        let err: DirectoryError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DirectoryError::Parse(_)));
        assert!(!err.user_message().is_empty());
    }
}
