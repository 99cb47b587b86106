//! Key extraction: resolve the candidate source files from include/ignore
//! globs, then collect every key captured by the usage pattern.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use locsync_core::{to_path, Result, SyncError};
use regex::Regex;
use walkdir::WalkDir;

/// Matches `t("key")`, `t('key')`, `$t('key')` and `i18n.t("key")`. The
/// literal must be followed by `,` or `)`; a literal holding the other quote
/// kind yields no key rather than a truncated one.
pub const DEFAULT_KEY_PATTERN: &str = r#"\bt\(\s*["']([^"'\r\n]+)["']\s*[,)]"#;

/// A compiled key-usage pattern; capture group 1 yields the key.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| SyncError::config(format!("invalid key pattern `{pattern}`: {e}")))?;
        if regex.captures_len() < 2 {
            return Err(SyncError::config(format!(
                "key pattern `{pattern}` needs a capture group for the key"
            )));
        }
        Ok(Self { regex })
    }

    /// `pattern` if given, otherwise [`DEFAULT_KEY_PATTERN`].
    pub fn from_option(pattern: Option<&str>) -> Result<Self> {
        Self::new(pattern.unwrap_or(DEFAULT_KEY_PATTERN))
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn keys_in<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Unique keys, sorted.
    pub keys: BTreeSet<String>,
    pub files_scanned: usize,
    /// Files that could not be read as text; they contribute no keys.
    pub failures: Vec<FileFailure>,
    /// Captures that are not valid key paths.
    pub rejected: BTreeSet<String>,
}

struct CompiledGlob {
    matcher: GlobMatcher,
    /// Literal directory prefix of the pattern; the walk starts there.
    base: PathBuf,
    absolute: bool,
}

fn compile_glob(pattern: &str) -> Result<CompiledGlob> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| SyncError::config(format!("invalid glob `{pattern}`: {e}")))?
        .compile_matcher();

    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(['*', '?', '[', '{']))
        .count();
    // A fully literal pattern names a file; walk its parent.
    let base_len = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };
    let base: PathBuf = components[..base_len]
        .iter()
        .filter(|c| !c.is_empty() && **c != ".")
        .collect();
    let absolute = Path::new(pattern).is_absolute();
    let base = if absolute {
        Path::new("/").join(base)
    } else {
        base
    };
    Ok(CompiledGlob {
        matcher,
        base,
        absolute,
    })
}

fn matches_any(globs: &[CompiledGlob], root: &Path, file: &Path) -> bool {
    globs.iter().any(|g| {
        if g.absolute {
            g.matcher.is_match(file)
        } else {
            file.strip_prefix(root)
                .map(|rel| g.matcher.is_match(rel))
                .unwrap_or(false)
        }
    })
}

/// Files matched by `sources` minus files matched by `ignores`, compared by
/// resolved path. Relative globs are evaluated against `root`.
///
/// Fails with [`SyncError::NoSourceFiles`] when nothing is left.
pub fn candidate_files(root: &Path, sources: &[String], ignores: &[String]) -> Result<Vec<PathBuf>> {
    let include = sources
        .iter()
        .map(|p| compile_glob(p))
        .collect::<Result<Vec<_>>>()?;
    let exclude = ignores
        .iter()
        .map(|p| compile_glob(p))
        .collect::<Result<Vec<_>>>()?;

    let mut found: BTreeSet<PathBuf> = BTreeSet::new();
    let mut ignored = 0usize;
    for glob in &include {
        let start = if glob.absolute {
            glob.base.clone()
        } else {
            root.join(&glob.base)
        };
        if !start.exists() {
            tracing::debug!(event = "glob_base_missing", base = %start.display());
            continue;
        }
        for entry in WalkDir::new(&start).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !matches_any(std::slice::from_ref(glob), root, path) {
                continue;
            }
            if matches_any(&exclude, root, path) {
                ignored += 1;
                continue;
            }
            found.insert(path.to_path_buf());
        }
    }

    tracing::debug!(event = "candidate_files", found = found.len(), ignored = ignored);
    if found.is_empty() {
        return Err(SyncError::NoSourceFiles {
            patterns: sources.to_vec(),
        });
    }
    Ok(found.into_iter().collect())
}

fn read_text(path: &Path) -> std::result::Result<String, String> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => "not valid UTF-8 text".to_string(),
        _ => e.to_string(),
    })?;
    if text.contains('\0') {
        return Err("binary content".to_string());
    }
    Ok(text)
}

/// Scan `files` and collect unique keys. A file that cannot be read counts
/// as zero keys and is listed in [`Extraction::failures`]; the scan goes on.
pub fn extract(files: &[PathBuf], pattern: &KeyPattern) -> Extraction {
    let mut out = Extraction::default();
    for path in files {
        out.files_scanned += 1;
        let text = match read_text(path) {
            Ok(text) => text,
            Err(reason) => {
                tracing::warn!(event = "extract_file_skipped", path = %path.display(), reason = %reason);
                out.failures.push(FileFailure {
                    path: path.clone(),
                    reason,
                });
                continue;
            }
        };
        let before = out.keys.len();
        for key in pattern.keys_in(&text) {
            if to_path(key).is_ok() {
                out.keys.insert(key.to_string());
            } else if out.rejected.insert(key.to_string()) {
                tracing::warn!(event = "extract_key_rejected", path = %path.display(), key = key);
            }
        }
        tracing::trace!(event = "extract_file", path = %path.display(), new_keys = out.keys.len() - before);
    }
    out
}

/// [`candidate_files`] followed by [`extract`].
pub fn extract_from_sources(
    root: &Path,
    sources: &[String],
    ignores: &[String],
    pattern: &KeyPattern,
) -> Result<Extraction> {
    let files = candidate_files(root, sources, ignores)?;
    Ok(extract(&files, pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_usages_collapse() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            "src/app.js",
            b"t('x.y');\nconst a = t('x.y');\nrender(t(\"z\"));\n",
        );
        let pattern = KeyPattern::from_option(None).unwrap();
        let out = extract_from_sources(dir.path(), &strings(&["src/**/*.js"]), &[], &pattern).unwrap();
        assert_eq!(out.keys, BTreeSet::from(["x.y".to_string(), "z".to_string()]));
        assert_eq!(out.files_scanned, 1);
    }

    #[test]
    fn default_pattern_variants() {
        let pattern = KeyPattern::from_option(None).unwrap();
        let text = r#"$t('a.one') i18n.t("a.two") t( 'a.three' ) format("no") set('no') it('no')"#;
        let keys: Vec<_> = pattern.keys_in(text).collect();
        assert_eq!(keys, vec!["a.one", "a.two", "a.three"]);
    }

    #[test]
    fn quote_inside_literal_is_skipped_not_truncated() {
        let pattern = KeyPattern::from_option(None).unwrap();
        let text = r#"t("errors.don't_panic") t("a.don't") t('menu.open', { n }) t("ok")"#;
        let keys: Vec<_> = pattern.keys_in(text).collect();
        assert_eq!(keys, vec!["menu.open", "ok"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/a.ts", b"t('b'); t('a.c');");
        touch(dir.path(), "src/nested/b.tsx", b"t(\"d.e\")");
        let pattern = KeyPattern::from_option(None).unwrap();
        let sources = strings(&["src/**/*.{ts,tsx}"]);
        let first = extract_from_sources(dir.path(), &sources, &[], &pattern).unwrap();
        let second = extract_from_sources(dir.path(), &sources, &[], &pattern).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.keys.len(), 3);
    }

    #[test]
    fn ignore_patterns_subtract_resolved_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/keep.js", b"t('keep')");
        touch(dir.path(), "src/node_modules/lib/index.js", b"t('vendor')");
        touch(dir.path(), "src/gen/out.js", b"t('generated')");
        let files = candidate_files(
            dir.path(),
            &strings(&["src/**/*.js"]),
            &strings(&["**/node_modules/**", "src/gen/*.js"]),
        )
        .unwrap();
        assert_eq!(files, vec![dir.path().join("src/keep.js")]);
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/top.js", b"t('top')");
        touch(dir.path(), "src/deep/inner.js", b"t('inner')");
        let files = candidate_files(dir.path(), &strings(&["src/*.js"]), &[]).unwrap();
        assert_eq!(files, vec![dir.path().join("src/top.js")]);
    }

    #[test]
    fn literal_file_pattern_is_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app/main.js", b"t('main')");
        let files = candidate_files(dir.path(), &strings(&["app/main.js"]), &[]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn empty_candidate_set_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/only.js", b"t('x')");
        let err = candidate_files(
            dir.path(),
            &strings(&["src/**/*.js"]),
            &strings(&["src/**"]),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::NoSourceFiles { .. }));

        let err = candidate_files(dir.path(), &strings(&["lib/**/*.js"]), &[]).unwrap_err();
        assert!(matches!(err, SyncError::NoSourceFiles { .. }));
    }

    #[test]
    fn unreadable_files_degrade_to_zero_keys() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/good.js", b"t('ok.key')");
        touch(dir.path(), "src/bad.js", &[0xff, 0xfe, 0x00, 0x74, 0x28]);
        touch(dir.path(), "src/nul.js", b"t('hidden')\0\0");
        let pattern = KeyPattern::from_option(None).unwrap();
        let out = extract_from_sources(dir.path(), &strings(&["src/*.js"]), &[], &pattern).unwrap();
        assert_eq!(out.keys, BTreeSet::from(["ok.key".to_string()]));
        assert_eq!(out.files_scanned, 3);
        assert_eq!(out.failures.len(), 2);
    }

    #[test]
    fn malformed_captures_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/a.js", b"t('good') t('bad..key') t('.lead')");
        let pattern = KeyPattern::from_option(None).unwrap();
        let out = extract_from_sources(dir.path(), &strings(&["src/*.js"]), &[], &pattern).unwrap();
        assert_eq!(out.keys.len(), 1);
        assert_eq!(
            out.rejected,
            BTreeSet::from(["bad..key".to_string(), ".lead".to_string()])
        );
    }

    #[test]
    fn custom_pattern_requires_capture_group() {
        assert!(matches!(
            KeyPattern::new(r#"i18nKey="[^"]+""#),
            Err(SyncError::Config(_))
        ));
        assert!(matches!(KeyPattern::new("t(("), Err(SyncError::Config(_))));
        let pattern = KeyPattern::new(r#"i18nKey="([^"]+)""#).unwrap();
        let keys: Vec<_> = pattern
            .keys_in(r#"<Trans i18nKey="home.title" /> t('ignored')"#)
            .collect();
        assert_eq!(keys, vec!["home.title"]);
    }
}
