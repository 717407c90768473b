use std::fmt;
use std::str::FromStr;

use gxlate_domain::{ListingEntry, WorkbookListing, SCHEMA_VERSION};
use gxlate_sheet::Workbook;

use crate::{resolve_doc, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// Document names.
    #[default]
    Docs,
    /// Tab names of one document.
    Tabs,
    /// Data row count of each tab.
    Rows,
}

impl ListingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingMode::Docs => "docs",
            ListingMode::Tabs => "tabs",
            ListingMode::Rows => "rows",
        }
    }
}

impl fmt::Display for ListingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingMode {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docs" => Ok(ListingMode::Docs),
            "tabs" => Ok(ListingMode::Tabs),
            "rows" => Ok(ListingMode::Rows),
            other => Err(format!(
                "unknown listing mode '{other}' (expected docs, tabs or rows)"
            )),
        }
    }
}

/// Connectivity check: list what the workbook holds.
pub fn describe_workbook(
    book: &dyn Workbook,
    doc: Option<&str>,
    mode: ListingMode,
) -> Result<WorkbookListing> {
    let mut listing = WorkbookListing {
        schema_version: SCHEMA_VERSION,
        mode: mode.to_string(),
        ..WorkbookListing::default()
    };
    if mode == ListingMode::Docs {
        tracing::info!(event = "list_docs", "Documents:");
        for name in book.spreadsheets()? {
            tracing::info!(event = "doc", "    {name}");
            listing.entries.push(ListingEntry { name, rows: None });
        }
        return Ok(listing);
    }

    let document = resolve_doc(book, doc)?;
    tracing::info!(event = "list_tabs", doc = %document, "Tabs of {document}:");
    for tab in book.tabs(&document)? {
        let rows = if mode == ListingMode::Rows {
            let table = book.load_tab(&document, &tab)?;
            for (_, row) in table.rows() {
                tracing::debug!(
                    event = "row",
                    tab = %tab,
                    row = row.num(),
                    "      {}::{}",
                    row.value("Context").unwrap_or_default(),
                    row.value("Id").unwrap_or_default()
                );
            }
            Some(table.row_count())
        } else {
            None
        };
        match rows {
            Some(n) => tracing::info!(event = "tab", "    {tab} ({n} rows)"),
            None => tracing::info!(event = "tab", "    {tab}"),
        }
        listing.entries.push(ListingEntry { name: tab, rows });
    }
    listing.document = Some(document);
    Ok(listing)
}
