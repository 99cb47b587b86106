use locsync_config::SyncConfig;
use locsync_core::{probe, to_path, Probe, Result};
use locsync_domain::{ExtractionSummary, FileIssue, LanguageReport, Operation, OperationReport};
use locsync_extract::{extract_from_sources, Extraction, KeyPattern};

use crate::resolve::{finish_language, record_write, Resolved};
use crate::run::Run;
use crate::store::CatalogStore;

#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    /// Overrides the configured key pattern.
    pub pattern: Option<String>,
    /// Overrides the configured source globs when non-empty.
    pub source: Vec<String>,
    /// Write missing keys into the default catalog instead of only reporting them.
    pub add: bool,
    pub dry_run: bool,
}

fn summarize(extraction: &Extraction) -> ExtractionSummary {
    ExtractionSummary {
        files_scanned: extraction.files_scanned,
        keys_found: extraction.keys.len(),
        failures: extraction
            .failures
            .iter()
            .map(|f| FileIssue {
                path: f.path.display().to_string(),
                error: f.reason.clone(),
            })
            .collect(),
        rejected_keys: extraction.rejected.iter().cloned().collect(),
    }
}

/// Scan sources for keys missing from the default-language catalog.
///
/// Report-only unless `add` is set; then each missing key is written to the
/// default catalog with its own path as the value. Other languages are never
/// touched.
pub fn extract_keys(config: &SyncConfig, req: &ExtractRequest) -> Result<OperationReport> {
    let dry_run = req.dry_run || config.dry_run;
    let mut run = Run::start(Operation::ExtractKeys, dry_run);

    let pattern = KeyPattern::from_option(req.pattern.as_deref().or(config.key_pattern.as_deref()))?;
    let sources = if req.source.is_empty() {
        &config.source_patterns
    } else {
        &req.source
    };

    run.resolving();
    let extraction = extract_from_sources(&config.root, sources, &config.ignore_patterns, &pattern)?;
    tracing::info!(
        event = "keys_extracted",
        files = extraction.files_scanned,
        keys = extraction.keys.len(),
        failures = extraction.failures.len()
    );

    let store = CatalogStore::new(config);
    let lang = config.default_language.as_str();
    let mut catalog = store.load(lang, true)?;
    let mut report = LanguageReport::new(lang, store.path(lang).display().to_string());

    let mut absent = Vec::new();
    for key in &extraction.keys {
        let path = to_path(key)?;
        match probe(&catalog, &path) {
            Probe::Leaf(_) => {}
            Probe::Absent => absent.push(path),
            Probe::Branch => report
                .conflicts
                .push(format!("{key}: used as a string but is a group of nested keys")),
            Probe::BlockedByLeaf(prefix) => report
                .conflicts
                .push(format!("{key}: `{prefix}` already holds a string")),
        }
    }

    // A missing key that is also the group of another missing key cannot be
    // added alongside it. Keys are sorted, so a group's members follow it.
    let mut missing = Vec::new();
    for (i, path) in absent.iter().enumerate() {
        let nested = absent[i + 1..]
            .iter()
            .find(|other| other.segments().starts_with(path.segments()));
        match nested {
            Some(other) => report
                .conflicts
                .push(format!("{path}: also used as a group by `{other}`")),
            None => missing.push(path.clone()),
        }
    }
    tracing::info!(event = "keys_missing", lang = lang, missing = missing.len(), conflicts = report.conflicts.len());

    let mut changed = false;
    if req.add {
        missing.retain(|path| {
            if probe(&catalog, path).is_conflict() {
                report
                    .conflicts
                    .push(format!("{path}: clashes with a key added in this run"));
                return false;
            }
            changed |= record_write(&mut catalog, path, Resolved::human(path.to_string()), &mut report);
            true
        });
    }

    run.applying();
    finish_language(&store, &catalog, changed, dry_run, &mut report);

    let keys = missing.iter().map(ToString::to_string).collect();
    Ok(run.finish(OperationReport::new(
        Operation::ExtractKeys,
        dry_run,
        vec![report],
        keys,
        Some(summarize(&extraction)),
    )))
}
