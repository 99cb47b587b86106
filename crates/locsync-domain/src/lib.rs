use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    AddKey,
    ExtractKeys,
    SyncAll,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddKey => "add-key",
            Self::ExtractKeys => "extract-keys",
            Self::SyncAll => "sync-all",
        }
    }
}

/// Where the value written for one (key, language) pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Supplied explicitly, or an existing human value that was kept.
    Human,
    /// Produced by the translation provider.
    Ai,
    /// Default-language value copied verbatim.
    Fallback,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageStatus {
    Written,
    SkippedDryRun,
    Unchanged,
    Failed,
}

impl LanguageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::SkippedDryRun => "skipped-dry-run",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntryReport {
    pub key: String,
    pub origin: Origin,
    pub value: String,
    /// Value the catalog held before this operation replaced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    /// Why a fallback happened or a value was kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LanguageReport {
    pub language: String,
    pub path: String,
    pub status: LanguageStatus,
    pub entries: Vec<EntryReport>,
    /// Structural conflicts (a string replaced a group of keys or vice versa,
    /// or a key was skipped because it would have).
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LanguageReport {
    pub fn new(language: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            path: path.into(),
            status: LanguageStatus::Unchanged,
            entries: Vec::new(),
            conflicts: Vec::new(),
            error: None,
        }
    }

    pub fn failed(language: impl Into<String>, path: impl Into<String>, error: impl ToString) -> Self {
        let mut report = Self::new(language, path);
        report.fail(error);
        report
    }

    pub fn fail(&mut self, error: impl ToString) {
        self.status = LanguageStatus::Failed;
        self.error = Some(error.to_string());
    }

    pub fn entry(&self, key: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn fallback_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.origin == Origin::Fallback)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileIssue {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionSummary {
    pub files_scanned: usize,
    pub keys_found: usize,
    #[serde(default)]
    pub failures: Vec<FileIssue>,
    /// Captured strings that are not valid key paths.
    #[serde(default)]
    pub rejected_keys: Vec<String>,
}

/// Result of one add-key / extract-keys / sync-all run. Created fresh per
/// run and never modified after it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OperationReport {
    pub schema_version: u32,
    pub operation: Operation,
    pub dry_run: bool,
    /// Per-language outcome, in configured language order.
    pub languages: Vec<LanguageReport>,
    /// Key paths this run added, updated or (for a report-only extraction) found missing.
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionSummary>,
    pub summary: String,
}

impl OperationReport {
    /// Assemble the final report; the summary line is derived from the contents.
    pub fn new(
        operation: Operation,
        dry_run: bool,
        languages: Vec<LanguageReport>,
        keys: Vec<String>,
        extraction: Option<ExtractionSummary>,
    ) -> Self {
        let mut report = Self {
            schema_version: SCHEMA_VERSION,
            operation,
            dry_run,
            languages,
            keys,
            extraction,
            summary: String::new(),
        };
        report.summary = report.compose_summary();
        report
    }

    pub fn language(&self, code: &str) -> Option<&LanguageReport> {
        self.languages.iter().find(|l| l.language == code)
    }

    pub fn has_failures(&self) -> bool {
        self.languages
            .iter()
            .any(|l| l.status == LanguageStatus::Failed)
    }

    pub fn failed_languages(&self) -> Vec<&str> {
        self.languages_where(|l| l.status == LanguageStatus::Failed)
    }

    /// Languages where at least one entry fell back to the default value.
    pub fn fallback_languages(&self) -> Vec<&str> {
        self.languages_where(|l| l.fallback_count() > 0)
    }

    fn languages_where(&self, pred: impl Fn(&LanguageReport) -> bool) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|l| pred(l))
            .map(|l| l.language.as_str())
            .collect()
    }

    fn compose_summary(&self) -> String {
        let count = |status: LanguageStatus| {
            self.languages
                .iter()
                .filter(|l| l.status == status)
                .count()
        };
        let mut line = format!(
            "{}: {} key(s); {} written, {} dry-run, {} unchanged, {} failed",
            self.operation.as_str(),
            self.keys.len(),
            count(LanguageStatus::Written),
            count(LanguageStatus::SkippedDryRun),
            count(LanguageStatus::Unchanged),
            count(LanguageStatus::Failed),
        );
        let fallbacks = self.fallback_languages();
        if !fallbacks.is_empty() {
            line.push_str(&format!("; fallback in {}", fallbacks.join(", ")));
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LanguageConsistency {
    pub language: String,
    /// Keys present in the default catalog but absent here.
    pub missing: Vec<String>,
    /// Keys present here but not in the default catalog.
    pub extra: Vec<String>,
    /// Keys that are a string in one catalog and a group in the other.
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Keys whose placeholders differ from the default value's.
    #[serde(default)]
    pub placeholder_mismatches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LanguageConsistency {
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
            && self.missing.is_empty()
            && self.extra.is_empty()
            && self.conflicts.is_empty()
            && self.placeholder_mismatches.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConsistencyReport {
    pub schema_version: u32,
    pub default_language: String,
    pub languages: Vec<LanguageConsistency>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.languages.iter().all(LanguageConsistency::is_clean)
    }
}
