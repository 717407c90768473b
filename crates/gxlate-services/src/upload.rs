use std::collections::HashSet;

use gxlate_core::{Field, Language};
use gxlate_domain::{Failure, TabUpload, UploadReport, SCHEMA_VERSION};
use gxlate_props::{bundle, PropsFile};
use gxlate_rules::{GeneratedRow, RuleSet};
use gxlate_sheet::{Index, Key, Table, Workbook};
use gxlate_validate::check_braces;

use crate::discover::{display_name, find_all_props};
use crate::removal::remove_stale_rows;
use crate::{record, resolve_doc, Result, ServiceError, SyncOptions};

/// Push new and changed English strings into the document's tabs, one tab per bundle.
pub fn upload(book: &dyn Workbook, rules: &RuleSet, opts: &SyncOptions) -> Result<UploadReport> {
    if opts.languages.is_empty() {
        return Err(ServiceError::NoLanguages.into());
    }
    let document = resolve_doc(book, opts.doc.as_deref())?;
    let domain = rules.domain(opts.domain.as_deref())?;
    if opts.check_only {
        tracing::info!(
            event = "check_only",
            "Comparing English strings to spreadsheet and reporting differences. No changes will be made."
        );
    }

    let mut report = UploadReport {
        schema_version: SCHEMA_VERSION,
        document: document.clone(),
        check_only: opts.check_only,
        ..UploadReport::default()
    };

    for path in find_all_props(&opts.props_path)? {
        let name = display_name(&path);
        let Some(tab) = bundle::base_name(&name).map(str::to_string) else {
            record(&mut report.failures, &name, None, "not a properties bundle");
            continue;
        };
        let props = match PropsFile::load(&path) {
            Ok(p) => p,
            Err(e) => {
                record(&mut report.failures, &name, None, e.to_string());
                continue;
            }
        };
        let mut table = match book.load_tab(&document, &tab) {
            Ok(t) => t,
            Err(e) => {
                record(&mut report.failures, &name, None, e.to_string());
                continue;
            }
        };
        let mut index = match Index::new(&table, opts.key_columns.as_slice()) {
            Ok(i) => i,
            Err(e) => {
                record(&mut report.failures, &tab, None, e.to_string());
                continue;
            }
        };
        tracing::debug!(event = "upload_bundle", bundle = %name, tab = %tab, rows = table.row_count());

        let rows = rules
            .generator(&domain, &name, opts.flags)
            .generate_all(&props);
        let mut tab_report = TabUpload {
            tab,
            bundle: name,
            ..TabUpload::default()
        };
        let mut bundle_run = BundleUpload {
            table: &mut table,
            index: &mut index,
            languages: &opts.languages,
            check_only: opts.check_only,
            keys_found: HashSet::new(),
            failures: &mut report.failures,
        };
        for row in rows {
            bundle_run.handle_row(row, &mut tab_report);
        }
        bundle_run.refresh();

        let keys_found = bundle_run.keys_found;
        if opts.remove_rows {
            let removal = remove_stale_rows(
                &mut table,
                &index,
                &keys_found,
                opts.check_only,
                &mut report.failures,
            );
            tab_report.stale = removal.stale;
            tab_report.removed = removal.removed;
        }

        report.bundles += 1;
        report.added += tab_report.added;
        report.updated += tab_report.updated;
        report.removed += tab_report.removed;
        report.tabs.push(tab_report);
    }

    tracing::info!(
        event = "upload_done",
        bundles = report.bundles,
        added = report.added,
        updated = report.updated,
        removed = report.removed,
        failures = report.failures.len()
    );
    Ok(report)
}

struct BundleUpload<'a> {
    table: &'a mut Table,
    index: &'a mut Index,
    languages: &'a [Language],
    check_only: bool,
    keys_found: HashSet<Key>,
    failures: &'a mut Vec<Failure>,
}

impl BundleUpload<'_> {
    fn handle_row(&mut self, mut row: GeneratedRow, out: &mut TabUpload) {
        if !row.status.is_uploaded() {
            return;
        }
        let id = row.id().to_string();
        let Some(key) = self.index.key(&row.fields.to_string_map(self.languages)) else {
            record(self.failures, &out.tab, Some(id), "generated row lacks a key column");
            return;
        };
        // Found even when invalid, so a broken string never gets its row removed.
        self.keys_found.insert(key.clone());

        if let Err(e) = check_braces(row.fields.english().unwrap_or_default()) {
            record(self.failures, &out.tab, Some(id.clone()), format!("String {id} {e}"));
            return;
        }

        match self.index.lookup(self.table, &key) {
            Some(row_id) => {
                if !row.fields.needs_upload(self.table.row(row_id)) {
                    return;
                }
                let row_name = format!("{key} (row {})", self.table.row(row_id).num());
                tracing::info!(event = "update_required", key = %key, "Update required for {row_name}");
                if self.check_only {
                    out.updated += 1;
                    return;
                }
                row.fields.set(Field::Verify, "CHANGE");
                match row.fields.upload(self.table, row_id, self.languages) {
                    Ok(cells) => {
                        tracing::debug!(event = "row_uploaded", key = %key, cells);
                        out.updated += 1;
                    }
                    Err(e) => record(
                        self.failures,
                        &out.tab,
                        Some(id),
                        format!("Failed to update {row_name}: {e}"),
                    ),
                }
            }
            None => {
                tracing::info!(event = "new_row_required", key = %key, "New row required for {key}");
                if self.check_only {
                    out.added += 1;
                    return;
                }
                row.fields.set(Field::Verify, "NEW");
                match self
                    .table
                    .add_new_row(&row.fields.to_string_map(self.languages))
                {
                    Ok(()) => out.added += 1,
                    Err(e) => record(
                        self.failures,
                        &out.tab,
                        Some(id),
                        format!("Failed to insert new row for {key}: {e}"),
                    ),
                }
            }
        }
    }

    fn refresh(&mut self) {
        if !self.table.needs_refresh() {
            return;
        }
        tracing::info!(event = "refresh", tab = %self.table.title(), "Refreshing table to incorporate added rows");
        if let Err(e) = self.table.refresh_added_rows() {
            let tab = self.table.title().to_string();
            record(self.failures, &tab, None, format!("Refresh failed: {e}"));
        }
    }
}
