//! Per-language helpers shared by add-key and sync-all: choosing a value
//! (provider or fallback), recording writes, and the final save.

use locsync_core::{write, Catalog, KeyPath, WriteOutcome};
use locsync_domain::{EntryReport, LanguageReport, LanguageStatus, Origin};
use locsync_provider::Translator;
use locsync_validate::placeholders_differ;

use crate::store::{CatalogStore, SaveOutcome};

pub(crate) struct Resolved {
    pub value: String,
    pub origin: Origin,
    pub note: Option<String>,
}

impl Resolved {
    pub fn human(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: Origin::Human,
            note: None,
        }
    }
}

/// Ask the provider when `translator` is given; any provider failure falls
/// back to `source` and the reason is kept as a note.
pub(crate) fn translate_or_fallback(
    translator: Option<&dyn Translator>,
    key: &str,
    source: &str,
    from: &str,
    to: &str,
) -> Resolved {
    let Some(translator) = translator else {
        return Resolved {
            value: source.to_string(),
            origin: Origin::Fallback,
            note: Some("translation not requested".to_string()),
        };
    };
    match translator.translate(source, from, to) {
        Ok(value) => {
            let note = placeholders_differ(source, &value).then(|| {
                tracing::warn!(event = "placeholder_mismatch", key = key, lang = to);
                "placeholders differ from the default value".to_string()
            });
            Resolved {
                value,
                origin: Origin::Ai,
                note,
            }
        }
        Err(err) => {
            tracing::warn!(event = "translation_fallback", key = key, lang = to, error = %err);
            Resolved {
                value: source.to_string(),
                origin: Origin::Fallback,
                note: Some(err.to_string()),
            }
        }
    }
}

/// Store `resolved` at `path` and record the entry. Returns whether the
/// catalog changed.
pub(crate) fn record_write(
    catalog: &mut Catalog,
    path: &KeyPath,
    resolved: Resolved,
    report: &mut LanguageReport,
) -> bool {
    let key = path.to_string();
    let (next, outcome) = write(catalog, path, &resolved.value);
    *catalog = next;
    let previous = match &outcome {
        WriteOutcome::Updated { previous } => Some(previous.clone()),
        WriteOutcome::ReplacedLeaf { prefix, previous } => {
            report.conflicts.push(format!(
                "{key}: string at `{prefix}` (\"{previous}\") became a group"
            ));
            None
        }
        WriteOutcome::ReplacedBranch => {
            report
                .conflicts
                .push(format!("{key}: group of nested keys replaced by a string"));
            None
        }
        WriteOutcome::Created | WriteOutcome::Unchanged => None,
    };
    if outcome.is_conflict() {
        tracing::warn!(event = "structural_conflict", key = %key, lang = %report.language);
    }
    report.entries.push(EntryReport {
        key,
        origin: resolved.origin,
        value: resolved.value,
        previous,
        note: resolved.note,
    });
    outcome.changed()
}

/// Settle a language's status: save when changed and not a dry run.
pub(crate) fn finish_language(
    store: &CatalogStore<'_>,
    catalog: &Catalog,
    changed: bool,
    dry_run: bool,
    report: &mut LanguageReport,
) {
    if report.status == LanguageStatus::Failed {
        return;
    }
    report.status = if !changed {
        LanguageStatus::Unchanged
    } else if dry_run {
        LanguageStatus::SkippedDryRun
    } else {
        match store.save(&report.language, catalog) {
            Ok(SaveOutcome::Written) => LanguageStatus::Written,
            Ok(SaveOutcome::Unchanged) => LanguageStatus::Unchanged,
            Err(err) => {
                tracing::error!(event = "catalog_save_failed", lang = %report.language, error = %err);
                report.fail(err);
                return;
            }
        }
    };
}
