//! Orchestration of upload, download and the maintenance commands over a
//! [`Workbook`] and a tree of bundles. Stable entry points for the CLI.

mod check;
mod discover;
mod download;
mod listing;
mod removal;
mod template;
mod translator;
mod upload;

use std::path::PathBuf;

use gxlate_core::{Field, Language};
use gxlate_domain::{Failure, RunReport};
use gxlate_sheet::Workbook;
use thiserror::Error;

pub use gxlate_core::Result;

pub use check::check_props;
pub use discover::find_all_props;
pub use download::download;
pub use listing::{describe_workbook, ListingMode};
pub use template::{create_template, template_headers, DEFAULT_TEMPLATE_TAB};
pub use translator::LanguageTranslator;
pub use upload::upload;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Some operations failed (see log)")]
    Failed,
    #[error("workbook has no documents")]
    NoDocuments,
    #[error("document '{0}' not found in workbook")]
    UnknownDocument(String),
    #[error("props path {0} does not exist")]
    MissingProps(PathBuf),
    #[error("no languages given")]
    NoLanguages,
}

/// Inputs shared by upload and download.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// A directory searched recursively, or a single bundle.
    pub props_path: PathBuf,
    pub languages: Vec<Language>,
    /// Document to work in; the workbook's first when absent.
    pub doc: Option<String>,
    pub check_only: bool,
    pub flags: u32,
    pub domain: Option<String>,
    pub key_columns: Vec<String>,
    pub remove_rows: bool,
    pub no_prepend: bool,
}

impl SyncOptions {
    pub fn new(props_path: impl Into<PathBuf>, languages: Vec<Language>) -> Self {
        Self {
            props_path: props_path.into(),
            languages,
            doc: None,
            check_only: false,
            flags: 0,
            domain: None,
            key_columns: default_key_columns(),
            remove_rows: false,
            no_prepend: false,
        }
    }
}

pub fn default_key_columns() -> Vec<String> {
    vec![Field::Id.column_name().to_string()]
}

/// Error out when a run collected failures.
pub fn ensure_success(report: &impl RunReport) -> Result<()> {
    if report.is_success() {
        Ok(())
    } else {
        Err(ServiceError::Failed.into())
    }
}

/// Named document, or the first one the workbook lists.
pub fn resolve_doc(book: &dyn Workbook, doc: Option<&str>) -> Result<String> {
    let docs = book.spreadsheets()?;
    match doc {
        Some(name) if docs.iter().any(|d| d == name) => Ok(name.to_string()),
        Some(name) => Err(ServiceError::UnknownDocument(name.to_string()).into()),
        None => docs
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NoDocuments.into()),
    }
}

/// Log a failure and add it to the run's list.
pub(crate) fn record(
    failures: &mut Vec<Failure>,
    scope: &str,
    key: Option<String>,
    message: impl Into<String>,
) {
    let failure = Failure::new(scope, key, message);
    tracing::error!(event = "failure", scope = %failure.scope, key = ?failure.key, "{}", failure.message);
    failures.push(failure);
}
