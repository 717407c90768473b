//! Chooses the value written for each property of a language bundle.

use std::collections::HashMap;

use gxlate_core::{google_now, Field, Language, Status, LAST_IMPORTED_SUFFIX};
use gxlate_domain::{Failure, TranslationStats};
use gxlate_props::{PropsFile, Translator};
use gxlate_rules::GeneratedRow;
use gxlate_sheet::{Index, Table};
use gxlate_validate::check_params;

use crate::record;

/// Why a sheet translation cannot be used.
enum Unusable {
    Untranslated,
    Unverified,
    Invalid(String),
}

pub struct LanguageTranslator<'a> {
    table: &'a mut Table,
    index: &'a mut Index,
    generated: &'a HashMap<String, GeneratedRow>,
    language: &'a Language,
    previous: Option<&'a PropsFile>,
    /// `[fr] `; old values starting with it are stale placeholders.
    bracket_prefix: String,
    no_prepend: bool,
    double_quotes: bool,
    check_only: bool,
    scope: String,
    pub stats: TranslationStats,
    pub failures: Vec<Failure>,
}

impl<'a> LanguageTranslator<'a> {
    pub fn new(
        table: &'a mut Table,
        index: &'a mut Index,
        generated: &'a HashMap<String, GeneratedRow>,
        language: &'a Language,
        previous: Option<&'a PropsFile>,
    ) -> Self {
        let scope = table.title().to_string();
        Self {
            table,
            index,
            generated,
            language,
            previous,
            bracket_prefix: format!("[{}] ", language.code()),
            no_prepend: false,
            double_quotes: false,
            check_only: false,
            scope,
            stats: TranslationStats {
                language: language.code().to_string(),
                ..TranslationStats::default()
            },
            failures: Vec::new(),
        }
    }

    pub fn no_prepend(mut self, on: bool) -> Self {
        self.no_prepend = on;
        self
    }

    pub fn double_quotes(mut self, on: bool) -> Self {
        self.double_quotes = on;
        self
    }

    pub fn check_only(mut self, on: bool) -> Self {
        self.check_only = on;
        self
    }

    pub fn placeholder(&self, source: &str) -> String {
        if self.no_prepend {
            source.trim().to_string()
        } else {
            format!("{}{}", self.bracket_prefix, source.trim())
        }
    }

    fn use_placeholder(&mut self, placeholder: String) -> Option<String> {
        self.stats.placeholders += 1;
        Some(placeholder)
    }

    fn resolve(&mut self, id: &str, source: &str) -> Option<String> {
        let Some(generated) = self.generated.get(id) else {
            tracing::warn!(event = "no_generated_row", id, "No generated row for {id}, using placeholder");
            let p = self.placeholder(source);
            return self.use_placeholder(p);
        };
        match generated.status {
            Status::Ignore => return Some(source.to_string()),
            Status::Omit => return None,
            Status::Normal => {}
        }
        let placeholder = self.placeholder(source);
        let map = generated.fields.to_string_map(std::slice::from_ref(self.language));
        let Some(key) = self.index.key(&map) else {
            record(
                &mut self.failures,
                &self.scope,
                Some(id.to_string()),
                "generated row lacks a key column",
            );
            return self.use_placeholder(placeholder);
        };
        let Some(row_id) = self.index.lookup(self.table, &key) else {
            tracing::error!(event = "row_missing", key = %key, "Row for {key} not yet in spreadsheet, using placeholder");
            return self.use_placeholder(placeholder);
        };

        let stem = self.language.stem();
        let row = self.table.row(row_id);
        let row_num = row.num();
        let verify = row
            .value(&Field::Verify.language_column(self.language))
            .map(str::trim)
            .unwrap_or_default();
        let new = row.value(&stem).map(str::trim).map(str::to_string);
        let old = self.previous.and_then(|p| p.value(id));

        let unusable = if !verify.is_empty() {
            Some(Unusable::Unverified)
        } else {
            match &new {
                None => Some(Unusable::Untranslated),
                Some(t) if t.is_empty() => None,
                Some(t) => check_params(source, t)
                    .err()
                    .map(|e| Unusable::Invalid(e.to_string())),
            }
        };

        if let Some(reason) = unusable {
            if let Unusable::Invalid(msg) = &reason {
                self.stats.errors += 1;
                tracing::warn!(event = "invalid_translation", key = %key, language = %self.language, "String {key} {msg}");
            }
            return match old {
                None => {
                    tracing::info!(event = "placeholder", key = %key, "String {key} not yet translated, using placeholder");
                    self.use_placeholder(placeholder)
                }
                Some(o) if o == placeholder => {
                    tracing::debug!(event = "placeholder_kept", key = %key, "String {key} not yet translated, retaining placeholder");
                    self.use_placeholder(placeholder)
                }
                Some(o) if o.starts_with(&self.bracket_prefix) => {
                    tracing::debug!(event = "placeholder_updated", key = %key, "Untranslated string {key} changed, updating placeholder");
                    self.use_placeholder(placeholder)
                }
                Some(o) => {
                    if matches!(reason, Unusable::Untranslated) {
                        tracing::warn!(event = "translation_disappeared", key = %key, "Translation for {key} has disappeared, retaining {o}");
                    } else {
                        tracing::info!(event = "translation_retained", key = %key, "Retaining previous translation for {key}");
                    }
                    self.stats.retained += 1;
                    Some(o.to_string())
                }
            };
        }

        let new = new.unwrap_or_default();
        if new.is_empty() {
            self.stats.errors += 1;
            tracing::error!(event = "blank_translation", key = %key, "String {key} has blank translation, using placeholder");
            return self.use_placeholder(placeholder);
        }
        let new = if self.double_quotes {
            new.replace('\'', "''")
        } else {
            new
        };
        if old != Some(new.as_str()) {
            self.stats.updated += 1;
            if self.check_only {
                tracing::info!(event = "translation_found", key = %key, "Found new translation for {key}");
            } else {
                tracing::info!(event = "translation_found", key = %key, "Found new translation for {key}, updating");
                let header = self.language.column(LAST_IMPORTED_SUFFIX);
                if let Err(e) = self.table.update_cell(row_id, &header, &google_now()) {
                    record(
                        &mut self.failures,
                        &self.scope,
                        Some(id.to_string()),
                        format!("Unable to update the {header} for row {row_num}: {e}"),
                    );
                }
            }
        }
        Some(new)
    }
}

impl Translator for LanguageTranslator<'_> {
    fn translate(&mut self, id: &str, source: &str) -> Option<String> {
        self.resolve(id, source)
    }
}
