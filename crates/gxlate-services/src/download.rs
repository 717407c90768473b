use std::collections::{HashMap, HashSet};

use gxlate_domain::{DownloadReport, TranslationStats, SCHEMA_VERSION};
use gxlate_props::{bundle, PropsFile};
use gxlate_rules::{GeneratedRow, RuleSet};
use gxlate_sheet::{Index, Workbook};

use crate::discover::{display_name, find_all_props};
use crate::removal::remove_stale_rows;
use crate::translator::LanguageTranslator;
use crate::{record, resolve_doc, Result, ServiceError, SyncOptions};

/// Write every language variant of every bundle from the document's translations.
pub fn download(
    book: &dyn Workbook,
    rules: &RuleSet,
    opts: &SyncOptions,
) -> Result<DownloadReport> {
    if opts.languages.is_empty() {
        return Err(ServiceError::NoLanguages.into());
    }
    let document = resolve_doc(book, opts.doc.as_deref())?;
    let domain = rules.domain(opts.domain.as_deref())?;

    let mut report = DownloadReport {
        schema_version: SCHEMA_VERSION,
        document: document.clone(),
        check_only: opts.check_only,
        languages: opts
            .languages
            .iter()
            .map(|l| TranslationStats {
                language: l.code().to_string(),
                ..TranslationStats::default()
            })
            .collect(),
        ..DownloadReport::default()
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
        report.bundles += 1;

        let generated: HashMap<String, GeneratedRow> = rules
            .generator(&domain, &name, opts.flags)
            .generate_all(&props)
            .into_iter()
            .map(|row| (row.id().to_string(), row))
            .collect();

        for (lang, total) in opts.languages.iter().zip(report.languages.iter_mut()) {
            let Some(dest) = bundle::language_path(&path, lang) else {
                continue;
            };
            let previous = if dest.is_file() {
                match PropsFile::load(&dest) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        record(
                            &mut report.failures,
                            &display_name(&dest),
                            None,
                            format!("Could not load existing props: {e}"),
                        );
                        continue;
                    }
                }
            } else {
                None
            };

            let mut translator = LanguageTranslator::new(
                &mut table,
                &mut index,
                &generated,
                lang,
                previous.as_ref(),
            )
            .no_prepend(opts.no_prepend)
            .double_quotes(domain.double_quotes)
            .check_only(opts.check_only);

            if opts.check_only {
                let text = props.render(&mut translator);
                tracing::debug!(event = "rendered", file = %dest.display(), bytes = text.len());
            } else {
                let verb = if dest.exists() { "Updating" } else { "Creating" };
                tracing::info!(event = "write_language", file = %dest.display(), "{verb} file: {}", dest.display());
                match props.write(&dest, &mut translator) {
                    Ok(()) => translator.stats.files_written += 1,
                    Err(e) => record(
                        &mut translator.failures,
                        &name,
                        None,
                        format!("Unable to write language file: {e}"),
                    ),
                }
            }
            total.add(&translator.stats);
            report.failures.append(&mut translator.failures);
        }

        if opts.remove_rows {
            let keys_found: HashSet<_> = generated
                .values()
                .filter(|row| row.status.is_uploaded())
                .filter_map(|row| index.key(&row.fields.to_string_map(&opts.languages)))
                .collect();
            let removal = remove_stale_rows(
                &mut table,
                &index,
                &keys_found,
                opts.check_only,
                &mut report.failures,
            );
            report.removed += removal.removed;
        }
    }

    for stats in &report.languages {
        tracing::info!(
            event = "download_done",
            language = %stats.language,
            placeholders = stats.placeholders,
            errors = stats.errors,
            retained = stats.retained,
            updated = stats.updated,
            files = stats.files_written,
            "{}: {} updated, {} retained, {} placeholders, {} errors",
            stats.language,
            stats.updated,
            stats.retained,
            stats.placeholders,
            stats.errors
        );
    }
    Ok(report)
}
