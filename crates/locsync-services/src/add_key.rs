use locsync_config::SyncConfig;
use locsync_core::{probe, to_path, Probe, Result};
use locsync_domain::{EntryReport, LanguageReport, Operation, OperationReport, Origin};
use locsync_provider::{ensure_ready, Translator};

use crate::resolve::{finish_language, record_write, translate_or_fallback, Resolved};
use crate::run::Run;
use crate::store::CatalogStore;

#[derive(Debug, Clone, Default)]
pub struct AddKeyRequest {
    pub key: String,
    /// Default-language value; the key itself when absent or empty.
    pub value: Option<String>,
    pub translate: bool,
    /// Replace existing values in the other languages.
    pub force: bool,
    pub dry_run: bool,
}

/// Add (or update) one key in every configured language.
///
/// The default language always receives the supplied value. Other languages
/// get a provider translation when `translate` is set, otherwise (or when the
/// provider fails for that language) the untranslated value. Existing values
/// in other languages are kept unless `force` is set.
pub fn add_key(
    config: &SyncConfig,
    req: &AddKeyRequest,
    translator: &dyn Translator,
) -> Result<OperationReport> {
    let dry_run = req.dry_run || config.dry_run;
    let mut run = Run::start(Operation::AddKey, dry_run);

    let path = to_path(&req.key)?;
    if req.translate {
        let settings = ensure_ready(config)?;
        tracing::debug!(event = "provider_ready", provider = %settings.provider, model = %settings.model);
    }
    let key = path.to_string();
    let value = req
        .value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(&key)
        .to_string();

    run.resolving();
    let store = CatalogStore::new(config);
    let default_lang = config.default_language.as_str();
    let provider = req.translate.then_some(translator);

    let default_catalog = store.load(default_lang, true)?;
    let mut default_report =
        LanguageReport::new(default_lang, store.path(default_lang).display().to_string());
    let mut default_next = default_catalog;
    let default_changed = record_write(
        &mut default_next,
        &path,
        Resolved::human(value.clone()),
        &mut default_report,
    );

    let mut targets = Vec::new();
    for lang in config.target_languages() {
        let lang_path = store.path(lang).display().to_string();
        let mut catalog = match store.load(lang, true) {
            Ok(catalog) => catalog,
            Err(err) if err.is_per_language() => {
                tracing::error!(event = "catalog_load_failed", lang = lang, error = %err);
                targets.push((LanguageReport::failed(lang, lang_path, err), None, false));
                continue;
            }
            Err(err) => return Err(err),
        };
        let mut report = LanguageReport::new(lang, lang_path);

        if !req.force {
            let kept = match probe(&catalog, &path) {
                Probe::Leaf(existing) => {
                    tracing::debug!(event = "translation_kept", key = %key, lang = lang);
                    report.entries.push(EntryReport {
                        key: key.clone(),
                        origin: Origin::Human,
                        value: existing.to_string(),
                        previous: None,
                        note: Some("existing value kept; use force to replace it".to_string()),
                    });
                    true
                }
                Probe::Branch => {
                    report.conflicts.push(format!(
                        "{key}: is a group of nested keys here; use force to replace it"
                    ));
                    true
                }
                Probe::BlockedByLeaf(prefix) => {
                    report.conflicts.push(format!(
                        "{key}: `{prefix}` already holds a string; use force to replace it"
                    ));
                    true
                }
                Probe::Absent => false,
            };
            if kept {
                targets.push((report, Some(catalog), false));
                continue;
            }
        }

        let resolved = translate_or_fallback(provider, &key, &value, default_lang, lang);
        let changed = record_write(&mut catalog, &path, resolved, &mut report);
        targets.push((report, Some(catalog), changed));
    }

    run.applying();
    finish_language(&store, &default_next, default_changed, dry_run, &mut default_report);
    let default_failed = default_report.error.clone();

    let mut languages = vec![default_report];
    for (mut report, catalog, changed) in targets {
        match (catalog, default_failed.as_deref()) {
            (Some(catalog), None) => {
                finish_language(&store, &catalog, changed, dry_run, &mut report)
            }
            (Some(_), Some(err)) => {
                report.fail(format!("not saved because the default catalog failed: {err}"))
            }
            (None, _) => {}
        }
        languages.push(report);
    }

    Ok(run.finish(OperationReport::new(
        Operation::AddKey,
        dry_run,
        languages,
        vec![key],
        None,
    )))
}
