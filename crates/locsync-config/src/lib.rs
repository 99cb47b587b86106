use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use locsync_core::{SyncError, LANGUAGE_PLACEHOLDER};
use serde::Deserialize;

/// File names probed in the working directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["locsync.toml", "locsync.json"];

pub const DEFAULT_SOURCE_PATTERNS: [&str; 1] = ["src/**/*.{js,jsx,ts,tsx,vue,svelte,rs}"];
pub const DEFAULT_IGNORE_PATTERNS: [&str; 1] = ["**/node_modules/**"];
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const MAX_CONCURRENCY: usize = 16;

/// Configuration as written on disk. Every field is optional so several
/// layers can be merged before validation. TOML files use snake_case keys,
/// JSON files may use the camelCase spelling.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    #[serde(alias = "defaultLanguage")]
    pub default_language: Option<String>,
    pub languages: Option<Vec<String>>,
    #[serde(alias = "translationFilePath")]
    pub translation_file_path: Option<String>,
    #[serde(alias = "sourcePatterns")]
    pub source_patterns: Option<Vec<String>>,
    #[serde(alias = "ignorePatterns")]
    pub ignore_patterns: Option<Vec<String>>,
    #[serde(alias = "keyPattern")]
    pub key_pattern: Option<String>,
    pub concurrency: Option<usize>,
    #[serde(alias = "dryRun")]
    pub dry_run: Option<bool>,
    #[serde(alias = "aiTranslation")]
    pub ai_translation: Option<RawAiConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAiConfig {
    pub enabled: Option<bool>,
    pub provider: Option<String>,
    #[serde(alias = "apiKey")]
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(alias = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(alias = "timeoutMs")]
    pub timeout_ms: Option<u64>,
    #[serde(alias = "maxRetries")]
    pub max_retries: Option<u32>,
    #[serde(alias = "retryBackoffMs")]
    pub retry_backoff_ms: Option<u64>,
}

/// Validated, immutable configuration handed to every engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Directory relative paths and globs are resolved against.
    pub root: PathBuf,
    pub default_language: String,
    /// Ordered; always contains `default_language`.
    pub languages: Vec<String>,
    /// Path template containing `{language}`.
    pub translation_file_path: String,
    pub source_patterns: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub key_pattern: Option<String>,
    pub concurrency: usize,
    pub dry_run: bool,
    pub ai_translation: Option<AiTranslationConfig>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AiTranslationConfig {
    pub enabled: bool,
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl AiTranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl fmt::Debug for AiTranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiTranslationConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("no config file found (looked for {} in {})", CONFIG_FILE_NAMES.join(", "), .dir.display())]
    NotFound { dir: PathBuf },
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for SyncError {
    fn from(err: ConfigError) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl RawConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn from_json_str(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Read a config file, picking the format from its extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let parsed = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        };
        parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Check every invariant and produce the immutable configuration.
    pub fn validate(self, root: &Path) -> Result<SyncConfig, ConfigError> {
        let default_language = self
            .default_language
            .ok_or(ConfigError::Missing("default_language"))?
            .trim()
            .to_string();
        let languages: Vec<String> = self
            .languages
            .ok_or(ConfigError::Missing("languages"))?
            .into_iter()
            .map(|l| l.trim().to_string())
            .collect();
        let translation_file_path = self
            .translation_file_path
            .ok_or(ConfigError::Missing("translation_file_path"))?;

        if languages.is_empty() {
            return Err(ConfigError::Invalid("`languages` must not be empty".into()));
        }
        for (idx, code) in languages.iter().enumerate() {
            check_language_code(code)?;
            if languages[..idx].contains(code) {
                return Err(ConfigError::Invalid(format!(
                    "language `{code}` is listed more than once"
                )));
            }
        }
        if !languages.contains(&default_language) {
            return Err(ConfigError::Invalid(format!(
                "`languages` must include the default language `{default_language}`"
            )));
        }
        if !translation_file_path.contains(LANGUAGE_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "`translation_file_path` must contain the {LANGUAGE_PLACEHOLDER} placeholder"
            )));
        }

        let concurrency = self.concurrency.unwrap_or(1);
        if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(ConfigError::Invalid(format!(
                "`concurrency` must be between 1 and {MAX_CONCURRENCY}"
            )));
        }

        let ai_translation = self.ai_translation.map(validate_ai).transpose()?;

        Ok(SyncConfig {
            root: root.to_path_buf(),
            default_language,
            languages,
            translation_file_path,
            source_patterns: self
                .source_patterns
                .unwrap_or_else(|| DEFAULT_SOURCE_PATTERNS.map(String::from).to_vec()),
            ignore_patterns: self
                .ignore_patterns
                .unwrap_or_else(|| DEFAULT_IGNORE_PATTERNS.map(String::from).to_vec()),
            key_pattern: self.key_pattern.filter(|p| !p.trim().is_empty()),
            concurrency,
            dry_run: self.dry_run.unwrap_or(false),
            ai_translation,
        })
    }
}

fn check_language_code(code: &str) -> Result<(), ConfigError> {
    let bad = code.is_empty()
        || code == "."
        || code.contains("..")
        || code.chars().any(|c| c == '/' || c == '\\' || c.is_whitespace());
    if bad {
        return Err(ConfigError::Invalid(format!(
            "`{code}` is not a usable language code"
        )));
    }
    Ok(())
}

fn validate_ai(raw: RawAiConfig) -> Result<AiTranslationConfig, ConfigError> {
    let timeout_ms = raw.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "`ai_translation.timeout_ms` must be greater than zero".into(),
        ));
    }
    Ok(AiTranslationConfig {
        enabled: raw.enabled.unwrap_or(false),
        provider: raw
            .provider
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        api_key: raw.api_key.filter(|k| !k.trim().is_empty()),
        model: raw
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        base_url: raw.base_url.filter(|u| !u.trim().is_empty()),
        timeout_ms,
        max_retries: raw.max_retries.unwrap_or(DEFAULT_MAX_RETRIES).min(10),
        retry_backoff_ms: raw.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
    })
}

impl SyncConfig {
    /// Location of one language's catalog, with every `{language}` substituted.
    pub fn catalog_path(&self, language: &str) -> PathBuf {
        let rel = self
            .translation_file_path
            .replace(LANGUAGE_PLACEHOLDER, language);
        self.resolve(Path::new(&rel))
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Non-default languages in configured order.
    pub fn target_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .map(String::as_str)
            .filter(move |l| *l != self.default_language)
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }
}

/// Locate and load the project configuration.
///
/// Search order: `explicit`, else `./locsync.toml`, else `./locsync.json`.
/// Settings absent there are filled from `$CONFIG_DIR/locsync/locsync.toml`.
/// Relative paths resolve against the directory of the project file.
pub fn load_config(explicit: Option<&Path>) -> Result<SyncConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
        path: PathBuf::from("."),
        source,
    })?;
    let project_file = match explicit {
        Some(path) => cwd.join(path),
        None => CONFIG_FILE_NAMES
            .iter()
            .map(|name| cwd.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| ConfigError::NotFound { dir: cwd.clone() })?,
    };
    let mut merged = RawConfig::from_file(&project_file)?;

    if let Some(base) = dirs::config_dir() {
        let user_file = base.join("locsync").join("locsync.toml");
        if user_file.is_file() {
            merged = merge(merged, RawConfig::from_file(&user_file)?);
        }
    }

    let root = project_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(cwd);
    merged.validate(&root)
}

/// Fill settings missing in `a` from `b`.
pub fn merge(mut a: RawConfig, b: RawConfig) -> RawConfig {
    if a.default_language.is_none() {
        a.default_language = b.default_language;
    }
    if a.languages.is_none() {
        a.languages = b.languages;
    }
    if a.translation_file_path.is_none() {
        a.translation_file_path = b.translation_file_path;
    }
    if a.source_patterns.is_none() {
        a.source_patterns = b.source_patterns;
    }
    if a.ignore_patterns.is_none() {
        a.ignore_patterns = b.ignore_patterns;
    }
    if a.key_pattern.is_none() {
        a.key_pattern = b.key_pattern;
    }
    if a.concurrency.is_none() {
        a.concurrency = b.concurrency;
    }
    if a.dry_run.is_none() {
        a.dry_run = b.dry_run;
    }
    a.ai_translation = merge_opt(a.ai_translation, b.ai_translation, merge_ai);
    a
}

fn merge_opt<T>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_ai(mut a: RawAiConfig, b: RawAiConfig) -> RawAiConfig {
    if a.enabled.is_none() {
        a.enabled = b.enabled;
    }
    if a.provider.is_none() {
        a.provider = b.provider;
    }
    if a.api_key.is_none() {
        a.api_key = b.api_key;
    }
    if a.model.is_none() {
        a.model = b.model;
    }
    if a.base_url.is_none() {
        a.base_url = b.base_url;
    }
    if a.timeout_ms.is_none() {
        a.timeout_ms = b.timeout_ms;
    }
    if a.max_retries.is_none() {
        a.max_retries = b.max_retries;
    }
    if a.retry_backoff_ms.is_none() {
        a.retry_backoff_ms = b.retry_backoff_ms;
    }
    a
}
