use std::collections::BTreeSet;

use locsync_core::{flatten, probe, to_path, Catalog, Probe};
use locsync_domain::LanguageConsistency;
use once_cell::sync::Lazy;
use regex::Regex;

// {{name}}, {name}, {0}, %s, %d, $1
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*\w+\s*\}\}|\{\w+\}|%[sd]|\$\d+").expect("placeholder regex compiles")
});

/// Placeholders appearing in `text`.
pub fn placeholders(text: &str) -> BTreeSet<String> {
    PLACEHOLDER_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// True when `translated` does not carry exactly the placeholders of `source`.
pub fn placeholders_differ(source: &str, translated: &str) -> bool {
    placeholders(source) != placeholders(translated)
}

fn shape_at<'a>(catalog: &'a Catalog, key: &str) -> Probe<'a> {
    match to_path(key) {
        Ok(path) => probe(catalog, &path),
        Err(_) => Probe::Absent,
    }
}

/// Compare one language's catalog against the default catalog.
pub fn compare(language: &str, default: &Catalog, other: &Catalog) -> LanguageConsistency {
    let mut report = LanguageConsistency {
        language: language.to_string(),
        missing: Vec::new(),
        extra: Vec::new(),
        conflicts: Vec::new(),
        placeholder_mismatches: Vec::new(),
        error: None,
    };
    let mut conflicts = BTreeSet::new();

    for (key, source) in flatten(default) {
        match shape_at(other, &key) {
            Probe::Absent => report.missing.push(key),
            Probe::Leaf(value) => {
                if placeholders_differ(&source, value) {
                    report.placeholder_mismatches.push(key);
                }
            }
            Probe::Branch | Probe::BlockedByLeaf(_) => {
                conflicts.insert(key);
            }
        }
    }
    for (key, _) in flatten(other) {
        match shape_at(default, &key) {
            Probe::Absent => report.extra.push(key),
            Probe::Leaf(_) => {}
            Probe::Branch | Probe::BlockedByLeaf(_) => {
                conflicts.insert(key);
            }
        }
    }
    report.conflicts = conflicts.into_iter().collect();
    report
}
