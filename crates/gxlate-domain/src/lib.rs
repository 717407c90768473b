use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// One thing that went wrong during a run. `scope` is the bundle or tab,
/// `key` the property id or row when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Failure {
    pub scope: String,
    pub key: Option<String>,
    pub message: String,
}

impl Failure {
    pub fn new(scope: impl Into<String>, key: Option<String>, message: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            key,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} [{}]: {}", self.scope, key, self.message),
            None => write!(f, "{}: {}", self.scope, self.message),
        }
    }
}

/// Reports that carry a failure list.
pub trait RunReport {
    fn failures(&self) -> &[Failure];

    fn is_success(&self) -> bool {
        self.failures().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TabUpload {
    pub tab: String,
    pub bundle: String,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Rows found stale; in check-only runs nothing is removed.
    pub stale: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadReport {
    pub schema_version: u32,
    pub document: String,
    pub check_only: bool,
    pub bundles: usize,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub tabs: Vec<TabUpload>,
    pub failures: Vec<Failure>,
}

/// Outcome counters of one language's translator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TranslationStats {
    pub language: String,
    pub placeholders: usize,
    pub errors: usize,
    pub retained: usize,
    pub updated: usize,
    pub files_written: usize,
}

impl TranslationStats {
    pub fn add(&mut self, other: &TranslationStats) {
        self.placeholders += other.placeholders;
        self.errors += other.errors;
        self.retained += other.retained;
        self.updated += other.updated;
        self.files_written += other.files_written;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DownloadReport {
    pub schema_version: u32,
    pub document: String,
    pub check_only: bool,
    pub bundles: usize,
    pub removed: usize,
    pub languages: Vec<TranslationStats>,
    pub failures: Vec<Failure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckReport {
    pub schema_version: u32,
    pub loaded: usize,
    pub files: Vec<String>,
    pub failures: Vec<Failure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ListingEntry {
    pub name: String,
    /// Data rows; only filled in the `rows` mode.
    pub rows: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkbookListing {
    pub schema_version: u32,
    pub mode: String,
    pub document: Option<String>,
    pub entries: Vec<ListingEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateReport {
    pub schema_version: u32,
    pub document: String,
    pub tab: String,
    pub headers: Vec<String>,
    pub replaced: bool,
    pub check_only: bool,
}

impl RunReport for UploadReport {
    fn failures(&self) -> &[Failure] {
        &self.failures
    }
}

impl RunReport for DownloadReport {
    fn failures(&self) -> &[Failure] {
        &self.failures
    }
}

impl RunReport for CheckReport {
    fn failures(&self) -> &[Failure] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display() {
        let f = Failure::new("chat.properties", Some("m.hi".into()), "blank translation");
        assert_eq!(f.to_string(), "chat.properties [m.hi]: blank translation");
        let f = Failure::new("chat.properties", None, "could not parse");
        assert_eq!(f.to_string(), "chat.properties: could not parse");
    }

    #[test]
    fn reports_serialize_with_version() {
        let report = CheckReport {
            schema_version: SCHEMA_VERSION,
            loaded: 2,
            files: vec!["a.properties".into(), "a_fr.properties".into()],
            failures: vec![],
        };
        assert!(report.is_success());
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["schema_version"], 1);
        assert_eq!(v["loaded"], 2);
        let back: CheckReport = serde_json::from_value(v).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn stats_accumulate() {
        let mut total = TranslationStats {
            language: "fr".into(),
            ..Default::default()
        };
        let one = TranslationStats {
            language: "fr".into(),
            placeholders: 2,
            errors: 1,
            retained: 1,
            updated: 3,
            files_written: 1,
        };
        total.add(&one);
        total.add(&one);
        assert_eq!(total.placeholders, 4);
        assert_eq!(total.files_written, 2);
    }
}
