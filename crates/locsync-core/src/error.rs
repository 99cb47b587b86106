use std::path::PathBuf;

use thiserror::Error;

/// Every failure an engine operation can surface.
///
/// Configuration and key-shape errors abort a whole operation before anything
/// is written. Catalog and provider-request errors are caught at the language
/// boundary by the orchestrator (see [`SyncError::is_per_language`]).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no source files left after applying ignore patterns (sources: {})", .patterns.join(", "))]
    NoSourceFiles { patterns: Vec<String> },

    #[error("catalog for `{language}` not found at {}", .path.display())]
    CatalogNotFound { language: String, path: PathBuf },

    #[error("cannot access catalog for `{language}` at {}: {source}", .path.display())]
    CatalogIo {
        language: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("catalog {} is malformed: {reason}", .path.display())]
    MalformedCatalog { path: PathBuf, reason: String },

    #[error("invalid key `{key}`: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("AI translation is not enabled in the configuration")]
    ProviderDisabled,

    #[error("no API key available for translation provider `{provider}`")]
    MissingCredential { provider: String },

    #[error("translation provider request failed: {0}")]
    ProviderRequest(String),
}

impl SyncError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Errors the orchestrator records for one language and then moves on.
    pub fn is_per_language(&self) -> bool {
        matches!(
            self,
            Self::CatalogIo { .. } | Self::MalformedCatalog { .. } | Self::ProviderRequest(_)
        )
    }
}
