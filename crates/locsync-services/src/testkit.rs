use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use locsync_config::{AiTranslationConfig, SyncConfig};
use locsync_core::{Result, SyncError};
use locsync_provider::Translator;
use tempfile::TempDir;

/// Temp project with `locales/{language}.json` catalogs and `src/` sources.
pub fn project(languages: &[&str], files: &[(&str, &str)]) -> (TempDir, SyncConfig) {
    let dir = tempfile::tempdir().unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    let config = SyncConfig {
        root: dir.path().to_path_buf(),
        default_language: languages[0].to_string(),
        languages: languages.iter().map(|l| l.to_string()).collect(),
        translation_file_path: "locales/{language}.json".into(),
        source_patterns: vec!["src/**/*.{js,ts}".into()],
        ignore_patterns: vec!["**/node_modules/**".into()],
        key_pattern: None,
        concurrency: 1,
        dry_run: false,
        ai_translation: None,
    };
    (dir, config)
}

pub fn with_ai(mut config: SyncConfig) -> SyncConfig {
    config.ai_translation = Some(AiTranslationConfig {
        enabled: true,
        provider: "openai".into(),
        api_key: Some("sk-test".into()),
        model: "gpt-4o-mini".into(),
        base_url: None,
        timeout_ms: 1_000,
        max_retries: 0,
        retry_backoff_ms: 1,
    });
    config
}

pub fn read_file(root: &Path, rel: &str) -> Option<String> {
    std::fs::read_to_string(root.join(rel)).ok()
}

/// Snapshot of every file under `locales/`, for before/after comparisons.
pub fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(root.join("locales")) {
        for entry in entries.flatten() {
            let bytes = std::fs::read(entry.path()).unwrap();
            out.push((entry.file_name().to_string_lossy().into_owned(), bytes));
        }
    }
    out.sort();
    out
}

/// Counts calls; fails for the configured target languages.
#[derive(Default)]
pub struct MockTranslator {
    calls: AtomicUsize,
    failing: Vec<String>,
    seen: Mutex<Vec<(String, String)>>,
}

impl MockTranslator {
    pub fn failing_for(languages: &[&str]) -> Self {
        Self {
            failing: languages.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(text, to)` pairs in call order.
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Translator for MockTranslator {
    fn translate(&self, text: &str, _from: &str, to: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((text.to_string(), to.to_string()));
        if self.failing.iter().any(|l| l == to) {
            return Err(SyncError::ProviderRequest(format!("mock outage for {to}")));
        }
        Ok(format!("[{to}] {text}"))
    }
}
