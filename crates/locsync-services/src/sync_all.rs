use std::collections::HashMap;

use locsync_config::SyncConfig;
use locsync_core::{flatten, probe, to_path, Probe, Result, SyncError};
use locsync_domain::{LanguageReport, Operation, OperationReport};
use locsync_provider::{ensure_ready, Translator};

use crate::resolve::{finish_language, record_write, translate_or_fallback};
use crate::run::Run;
use crate::store::CatalogStore;

#[derive(Debug, Clone)]
pub struct SyncAllRequest {
    /// Only this language instead of every non-default one.
    pub target_language: Option<String>,
    /// Re-translate keys that already have a value.
    pub force: bool,
    /// Consult the provider; when false missing keys get the default value.
    pub translate: bool,
    pub dry_run: bool,
}

impl Default for SyncAllRequest {
    fn default() -> Self {
        Self {
            target_language: None,
            force: false,
            translate: true,
            dry_run: false,
        }
    }
}

struct LanguageJob<'a> {
    store: CatalogStore<'a>,
    default_lang: &'a str,
    pairs: &'a [(String, String)],
    force: bool,
    dry_run: bool,
    translator: Option<&'a dyn Translator>,
}

impl LanguageJob<'_> {
    /// Bring one language up to date with the default catalog and save it.
    /// Catalog failures end up in the returned report, never as an `Err`.
    fn run(&self, lang: &str) -> LanguageReport {
        let lang_path = self.store.path(lang).display().to_string();
        let mut catalog = match self.store.load(lang, true) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::error!(event = "catalog_load_failed", lang = lang, error = %err);
                return LanguageReport::failed(lang, lang_path, err);
            }
        };
        let mut report = LanguageReport::new(lang, lang_path);
        let mut changed = false;

        for (key, source) in self.pairs {
            let path = match to_path(key) {
                Ok(path) => path,
                Err(err) => {
                    report.conflicts.push(err.to_string());
                    continue;
                }
            };
            match probe(&catalog, &path) {
                Probe::Leaf(_) if !self.force => continue,
                Probe::Leaf(_) | Probe::Absent => {}
                Probe::Branch => {
                    report
                        .conflicts
                        .push(format!("{key}: is a group of nested keys here; skipped"));
                    continue;
                }
                Probe::BlockedByLeaf(prefix) => {
                    report
                        .conflicts
                        .push(format!("{key}: `{prefix}` holds a string here; skipped"));
                    continue;
                }
            }
            let resolved = translate_or_fallback(self.translator, key, source, self.default_lang, lang);
            changed |= record_write(&mut catalog, &path, resolved, &mut report);
        }

        finish_language(&self.store, &catalog, changed, self.dry_run, &mut report);
        tracing::info!(
            event = "language_synced",
            lang = lang,
            status = report.status.as_str(),
            entries = report.entries.len(),
            fallbacks = report.fallback_count()
        );
        report
    }
}

/// Fill every target language with the keys of the default catalog.
///
/// Keys already present are left alone unless `force` is set. Languages run
/// in batches of `config.concurrency`; each one is saved as soon as it is
/// done, so a failure in one language never undoes another.
pub fn sync_all(
    config: &SyncConfig,
    req: &SyncAllRequest,
    translator: &dyn Translator,
) -> Result<OperationReport> {
    let dry_run = req.dry_run || config.dry_run;
    let mut run = Run::start(Operation::SyncAll, dry_run);

    let targets: Vec<&str> = match req.target_language.as_deref() {
        Some(lang) if lang == config.default_language => {
            return Err(SyncError::config(format!(
                "`{lang}` is the default language and cannot be a sync target"
            )))
        }
        Some(lang) if !config.has_language(lang) => {
            return Err(SyncError::config(format!(
                "`{lang}` is not one of the configured languages ({})",
                config.languages.join(", ")
            )))
        }
        Some(lang) => vec![lang],
        None => config.target_languages().collect(),
    };
    if req.translate {
        let settings = ensure_ready(config)?;
        tracing::debug!(event = "provider_ready", provider = %settings.provider, model = %settings.model);
    }

    run.resolving();
    let store = CatalogStore::new(config);
    let default_catalog = store.load(&config.default_language, false)?;
    let pairs = flatten(&default_catalog);
    tracing::info!(event = "sync_start", keys = pairs.len(), languages = targets.len(), concurrency = config.concurrency);

    run.applying();
    let job = LanguageJob {
        store,
        default_lang: &config.default_language,
        pairs: &pairs,
        force: req.force,
        dry_run,
        translator: req.translate.then_some(translator),
    };
    let job = &job;
    let mut done: HashMap<&str, LanguageReport> = HashMap::new();
    for batch in targets.chunks(config.concurrency.max(1)) {
        if batch.len() == 1 {
            done.insert(batch[0], job.run(batch[0]));
            continue;
        }
        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|&lang| (lang, scope.spawn(move || job.run(lang))))
                .collect();
            for (lang, handle) in handles {
                let report = handle.join().unwrap_or_else(|_| {
                    LanguageReport::failed(lang, store.path(lang).display().to_string(), "worker panicked")
                });
                done.insert(lang, report);
            }
        });
    }

    let languages: Vec<LanguageReport> = targets
        .iter()
        .filter_map(|lang| done.remove(lang))
        .collect();
    let keys = pairs
        .iter()
        .filter(|(key, _)| {
            languages
                .iter()
                .any(|l| l.entries.iter().any(|e| &e.key == key))
        })
        .map(|(key, _)| key.clone())
        .collect();

    Ok(run.finish(OperationReport::new(
        Operation::SyncAll,
        dry_run,
        languages,
        keys,
        None,
    )))
}
