//! Orchestration layer: the operations the CLI exposes, built on the store,
//! extractor and provider crates. Every operation takes its configuration
//! by reference and returns a fresh report.

mod add_key;
mod check;
mod extract_keys;
mod resolve;
mod run;
mod store;
mod sync_all;
mod util;

#[cfg(test)]
mod testkit;

pub use add_key::{add_key, AddKeyRequest};
pub use check::check;
pub use extract_keys::{extract_keys, ExtractRequest};
pub use run::{Phase, Run};
pub use store::{CatalogStore, SaveOutcome};
pub use sync_all::{sync_all, SyncAllRequest};

pub use locsync_core::{Result, SyncError};
pub use locsync_provider::Translator;
