use locsync_config::SyncConfig;
use locsync_core::Result;
use locsync_domain::{ConsistencyReport, LanguageConsistency, SCHEMA_VERSION};
use locsync_validate::compare;

use crate::store::CatalogStore;

/// Compare every non-default catalog with the default one. Read-only.
///
/// A missing default catalog is an error; a missing target catalog counts as
/// empty, so every default key shows up as missing.
pub fn check(config: &SyncConfig) -> Result<ConsistencyReport> {
    let store = CatalogStore::new(config);
    let default = store.load(&config.default_language, false)?;

    let languages = config
        .target_languages()
        .map(|lang| match store.load(lang, true) {
            Ok(catalog) => compare(lang, &default, &catalog),
            Err(err) => {
                tracing::warn!(event = "check_load_failed", lang = lang, error = %err);
                LanguageConsistency {
                    language: lang.to_string(),
                    missing: Vec::new(),
                    extra: Vec::new(),
                    conflicts: Vec::new(),
                    placeholder_mismatches: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        })
        .collect::<Vec<_>>();

    let dirty = languages.iter().filter(|l| !l.is_clean()).count();
    tracing::info!(event = "check_done", languages = languages.len(), dirty = dirty);
    Ok(ConsistencyReport {
        schema_version: SCHEMA_VERSION,
        default_language: config.default_language.clone(),
        languages,
    })
}
