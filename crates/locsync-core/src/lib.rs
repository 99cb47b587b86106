//! Shared building blocks for the locsync crates: the catalog tree, the
//! key-path codec that reads and writes it, and the error taxonomy every
//! operation reports through.

mod catalog;
mod error;
mod path;

pub use catalog::{Catalog, CatalogFormatError, TranslationNode};
pub use error::SyncError;
pub use path::{flatten, probe, read, to_path, unflatten, write, KeyPath, Probe, WriteOutcome};

/// Workspace-wide result alias.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

/// Placeholder substituted with a language code in catalog path templates.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";
