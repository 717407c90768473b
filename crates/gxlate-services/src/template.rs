use gxlate_core::{Field, Language, CHECK_SUFFIX, LAST_IMPORTED_SUFFIX};
use gxlate_domain::{TemplateReport, SCHEMA_VERSION};
use gxlate_sheet::Workbook;

use crate::{resolve_doc, Result, ServiceError};

pub const DEFAULT_TEMPLATE_TAB: &str = "template";

/// Filled in by hand; no generated field maps to it.
const LOCATION_IN_GAME: &str = "LocationInGame";

/// Header row of a fresh tab: the core columns, then four per language.
pub fn template_headers(languages: &[Language]) -> Vec<String> {
    let mut headers: Vec<String> = [
        Field::Scope.column_name(),
        Field::Id.column_name(),
        Field::Type.column_name(),
        Field::FieldSize.column_name(),
        LOCATION_IN_GAME,
        Field::TechNotes.column_name(),
        Field::LastUpdated.column_name(),
        Field::English.column_name(),
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    for lang in languages {
        headers.push(lang.stem());
        headers.push(Field::Verify.language_column(lang));
        headers.push(lang.column(CHECK_SUFFIX));
        headers.push(lang.column(LAST_IMPORTED_SUFFIX));
    }
    headers
}

/// Replace `tab` in the document with an empty tab holding only the header row.
pub fn create_template(
    book: &dyn Workbook,
    doc: Option<&str>,
    tab: &str,
    languages: &[Language],
    check_only: bool,
) -> Result<TemplateReport> {
    if languages.is_empty() {
        return Err(ServiceError::NoLanguages.into());
    }
    let document = resolve_doc(book, doc)?;
    let headers = template_headers(languages);

    let replaced = book.tabs(&document)?.iter().any(|t| t == tab);
    if !replaced {
        tracing::info!(event = "template_absent", tab, "Template tab not found to delete {tab}");
    } else if check_only {
        tracing::info!(event = "template_delete", tab, "Tab {tab} would be deleted");
    } else {
        tracing::info!(event = "template_delete", tab, "Deleting tab {tab}");
        book.delete_tab(&document, tab)?;
    }

    if check_only {
        tracing::info!(event = "template_create", tab, columns = headers.len(), "Tab {tab} would be created");
    } else {
        tracing::info!(event = "template_create", tab, columns = headers.len(), "Creating tab {tab}");
        book.create_tab(&document, tab, &headers)?;
        tracing::info!(
            event = "template_done",
            "Complete! Now freeze row 1, make any other adjustments, and duplicate for each properties file"
        );
    }

    Ok(TemplateReport {
        schema_version: SCHEMA_VERSION,
        document,
        tab: tab.to_string(),
        headers,
        replaced,
        check_only,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gxlate_sheet::CsvWorkbook;

    #[test]
    fn headers_per_language() {
        let langs = Language::parse_list("fr,de").unwrap();
        let headers = template_headers(&langs);
        assert_eq!(headers.len(), 16);
        assert_eq!(headers[0], "Context");
        assert_eq!(headers[7], "EN");
        assert_eq!(
            &headers[8..12],
            &["FR", "FRVerify", "FRCheck", "FRLastImported"]
        );
        assert_eq!(headers[12], "DE");
    }

    #[test]
    fn replaces_existing_tab() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("Strings");
        std::fs::create_dir(&doc).unwrap();
        std::fs::write(doc.join("template.csv"), "Old\nrow\n").unwrap();
        let book = CsvWorkbook::open(dir.path()).unwrap();
        let langs = Language::parse_list("fr").unwrap();

        let dry = create_template(&book, None, DEFAULT_TEMPLATE_TAB, &langs, true).unwrap();
        assert!(dry.replaced);
        assert_eq!(
            std::fs::read_to_string(doc.join("template.csv")).unwrap(),
            "Old\nrow\n"
        );

        let report = create_template(&book, None, DEFAULT_TEMPLATE_TAB, &langs, false).unwrap();
        assert!(report.replaced);
        let table = book.load_tab("Strings", "template").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.headers().len(), 12);
        assert_eq!(table.find_col_num("FRLastImported").unwrap(), 12);
    }
}
