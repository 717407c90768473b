use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid language code '{0}' (expected two ASCII letters)")]
    InvalidLanguage(String),
    #[error("duplicate language '{0}'")]
    DuplicateLanguage(String),
    #[error("unknown flag '{0}'")]
    UnknownFlag(String),
}

/// A target language, identified by its two-letter code.
///
/// The code is used in file names (`foo_fr.properties`) and placeholders; the
/// uppercase stem prefixes spreadsheet columns (`FR`, `FRVerify`, `FRLastImported`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn new(code: &str) -> std::result::Result<Self, CoreError> {
        let code = code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::InvalidLanguage(code.to_string()));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    /// Lowercase code, e.g. `fr`.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Column prefix, e.g. `FR`.
    pub fn stem(&self) -> String {
        self.0.to_ascii_uppercase()
    }

    /// Column name made of the stem and a suffix, e.g. `FRLastImported`.
    pub fn column(&self, suffix: &str) -> String {
        format!("{}{}", self.stem(), suffix)
    }

    /// Parse a comma separated list such as `fr, de`. Duplicates are rejected.
    pub fn parse_list(list: &str) -> std::result::Result<Vec<Language>, CoreError> {
        let mut out: Vec<Language> = Vec::new();
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let lang = Language::new(part)?;
            if out.contains(&lang) {
                return Err(CoreError::DuplicateLanguage(lang.0));
            }
            out.push(lang);
        }
        Ok(out)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Language {
    type Err = CoreError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Language::new(s)
    }
}

impl TryFrom<String> for Language {
    type Error = CoreError;
    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Language::new(&value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

/// Suffix of the per-language column stamped when a translation is imported.
pub const LAST_IMPORTED_SUFFIX: &str = "LastImported";
/// Suffix of the per-language column reviewers use for checking notes.
pub const CHECK_SUFFIX: &str = "Check";

/// How a field's cell is brought up to date from generated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Uploaded whenever the cell differs from the candidate.
    Normal,
    /// Uploaded only into a blank cell.
    Soft,
    /// Never uploaded from generated values.
    None,
    /// Written by explicit orchestration logic only.
    Special,
}

impl UploadMode {
    /// Whether a cell holding `current` must be overwritten with `candidate`.
    /// A missing cell compares equal to the empty string.
    pub fn needs_upload(self, current: Option<&str>, candidate: &str) -> bool {
        let current = current.unwrap_or("");
        match self {
            UploadMode::Normal => current != candidate,
            UploadMode::Soft => current.trim().is_empty() && current != candidate,
            UploadMode::None | UploadMode::Special => false,
        }
    }
}

/// The fixed set of columns a generated row can populate.
///
/// Declaration order is also the order cells are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Scope,
    Id,
    English,
    LastUpdated,
    Type,
    FieldSize,
    TechNotes,
    SequenceNo,
    Verify,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Scope,
        Field::Id,
        Field::English,
        Field::LastUpdated,
        Field::Type,
        Field::FieldSize,
        Field::TechNotes,
        Field::SequenceNo,
        Field::Verify,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Field::Scope => "Context",
            Field::Id => "Id",
            Field::English => "EN",
            Field::LastUpdated => "ENLastUpdated",
            Field::Type => "Type",
            Field::FieldSize => "FieldSize",
            Field::TechNotes => "TechNotes",
            Field::SequenceNo => "SequenceNo",
            Field::Verify => "Verify",
        }
    }

    pub fn upload_mode(self) -> UploadMode {
        match self {
            Field::English => UploadMode::Normal,
            Field::FieldSize | Field::TechNotes => UploadMode::Soft,
            Field::LastUpdated | Field::SequenceNo => UploadMode::Special,
            Field::Scope | Field::Id | Field::Type | Field::Verify => UploadMode::None,
        }
    }

    /// Language fields get one column per language.
    pub fn is_language(self) -> bool {
        matches!(self, Field::Verify)
    }

    /// Column holding this field for `lang`; plain column name for non-language fields.
    pub fn language_column(self, lang: &Language) -> String {
        if self.is_language() {
            lang.column(self.column_name())
        } else {
            self.column_name().to_string()
        }
    }

    /// Value written into a language column, so each language keeps its own state.
    pub fn modify_value(self, value: &str, lang: &Language) -> String {
        format!("{}_{}", value, lang.stem())
    }
}

/// Outcome of classifying a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    /// Emitted with the English text; never uploaded.
    Ignore,
    /// Left out of translated bundles entirely; never uploaded.
    Omit,
}

impl Status {
    pub fn is_uploaded(self) -> bool {
        self == Status::Normal
    }
}

pub const NOW_FORMAT: &str = "%m/%d/%y %H:%M";

/// Current wall time in the spreadsheet's short format, e.g. `03/07/14 09:41`.
pub fn google_now() -> String {
    format_time(&chrono::Local::now().naive_local())
}

pub fn format_time(t: &chrono::NaiveDateTime) -> String {
    t.format(NOW_FORMAT).to_string()
}

/// Named bits for rule flags.
pub mod flags {
    use super::CoreError;

    pub const SUPPORT_TOOL: u32 = 1;

    pub fn parse(name: &str) -> Result<u32, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "support-tool" | "support_tool" => Ok(SUPPORT_TOOL),
            other => other
                .parse::<u32>()
                .map_err(|_| CoreError::UnknownFlag(name.to_string())),
        }
    }

    pub fn parse_all<I, S>(names: I) -> Result<u32, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(0, |acc, n| Ok(acc | parse(n.as_ref())?))
    }
}
