use std::collections::{BTreeMap, BTreeSet};

use crate::sheet::{Cell, CellRange, Worksheet};
use crate::SheetError;

/// Stable handle of a row owned by a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    num: usize,
    values: BTreeMap<String, String>,
    deleted: bool,
}

impl Row {
    /// Current 1-based row number in the sheet.
    pub fn num(&self) -> usize {
        self.num
    }

    /// Present cells by header. Blank cells are absent.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn value(&self, header: &str) -> Option<&str> {
        self.values.get(header).map(String::as_str)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Decides whether a row picked for removal really goes.
pub trait DeleteVerifier {
    /// `fields` are keyed by the table's own header spelling.
    fn confirm_delete(&mut self, row: usize, fields: &BTreeMap<String, String>) -> bool;
}

impl<F> DeleteVerifier for F
where
    F: FnMut(usize, &BTreeMap<String, String>) -> bool,
{
    fn confirm_delete(&mut self, row: usize, fields: &BTreeMap<String, String>) -> bool {
        self(row, fields)
    }
}

/// In-memory view of one tab: header row plus data rows in sheet order.
pub struct Table {
    title: String,
    sheet: Box<dyn Worksheet>,
    headers: Vec<Option<String>>,
    slab: Vec<Row>,
    /// Data rows by `num - 2`; `None` for blank rows.
    order: Vec<Option<RowId>>,
    added: usize,
    poisoned: bool,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("title", &self.title)
            .field("headers", &self.headers)
            .field("rows", &self.order.len())
            .field("added", &self.added)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

impl Table {
    pub fn load(mut sheet: Box<dyn Worksheet>) -> Result<Self, SheetError> {
        let cells = sheet.query_cells(&CellRange::all(), false)?;
        let mut table = Table {
            title: sheet.title().to_string(),
            sheet,
            headers: Vec::new(),
            slab: Vec::new(),
            order: Vec::new(),
            added: 0,
            poisoned: false,
        };
        for cell in cells.iter().filter(|c| c.row == 1) {
            if table.headers.len() < cell.col {
                table.headers.resize(cell.col, None);
            }
            table.headers[cell.col - 1] = Some(cell.value.clone());
        }
        // Rows holding only headerless cells still occupy a sheet row.
        let last_row = cells.iter().map(|c| c.row).max().unwrap_or(1);
        table.fold_in(cells.into_iter().filter(|c| c.row >= 2));
        if table.order.len() < last_row - 1 {
            table.order.resize(last_row - 1, None);
        }
        tracing::debug!(
            event = "table_loaded",
            tab = %table.title,
            headers = table.headers.len(),
            rows = table.order.len()
        );
        Ok(table)
    }

    fn fold_in(&mut self, cells: impl Iterator<Item = Cell>) {
        let mut by_row: BTreeMap<usize, BTreeMap<String, String>> = BTreeMap::new();
        for cell in cells {
            let header = self.headers.get(cell.col - 1).and_then(Option::as_ref);
            match header {
                Some(h) => {
                    by_row
                        .entry(cell.row)
                        .or_default()
                        .insert(h.clone(), cell.value);
                }
                None => tracing::debug!(
                    event = "cell_without_header",
                    tab = %self.title,
                    row = cell.row,
                    col = cell.col
                ),
            }
        }
        for (num, values) in by_row {
            let idx = num - 2;
            if self.order.len() <= idx {
                self.order.resize(idx + 1, None);
            }
            let id = RowId(self.slab.len());
            self.slab.push(Row {
                num,
                values,
                deleted: false,
            });
            self.order[idx] = Some(id);
        }
    }

    fn ensure_usable(&self) -> Result<(), SheetError> {
        if self.poisoned {
            Err(SheetError::Poisoned(self.title.clone()))
        } else {
            Ok(())
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Header names in column order; gaps are `None`.
    pub fn headers(&self) -> &[Option<String>] {
        &self.headers
    }

    pub fn row(&self, id: RowId) -> &Row {
        &self.slab[id.0]
    }

    /// Live rows in sheet order.
    pub fn rows(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.order
            .iter()
            .flatten()
            .map(|id| (*id, &self.slab[id.0]))
            .filter(|(_, r)| !r.deleted)
    }

    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    /// 1-based column of `header`.
    pub fn find_col_num(&self, header: &str) -> Result<usize, SheetError> {
        self.headers
            .iter()
            .position(|h| h.as_deref() == Some(header))
            .map(|i| i + 1)
            .ok_or_else(|| SheetError::UnknownColumn(header.to_string()))
    }

    /// Write one cell of `id`. Cells not yet present are fetched as blanks first.
    pub fn update_cell(&mut self, id: RowId, header: &str, value: &str) -> Result<(), SheetError> {
        self.ensure_usable()?;
        let col = self.find_col_num(header)?;
        let row = &self.slab[id.0];
        if row.deleted {
            return Err(SheetError::RowDeleted(row.num));
        }
        let num = row.num;
        if !row.values.contains_key(header) {
            let blank = self
                .sheet
                .query_cells(&CellRange::cell(num, col), true)?
                .into_iter()
                .any(|c| c.row == num && c.col == col);
            if !blank {
                return Err(SheetError::BlankCellMissing { row: num, col });
            }
        }
        self.sheet.update_cell(num, col, value)?;
        tracing::trace!(event = "cell_updated", tab = %self.title, row = num, header = header);
        let row = &mut self.slab[id.0];
        if value.is_empty() {
            row.values.remove(header);
        } else {
            row.values.insert(header.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Append a row to the sheet. It is not visible here until
    /// [`refresh_added_rows`](Self::refresh_added_rows).
    pub fn add_new_row(&mut self, values: &BTreeMap<String, String>) -> Result<(), SheetError> {
        self.ensure_usable()?;
        if let Some(unknown) = values.keys().find(|k| self.find_col_num(k).is_err()) {
            return Err(SheetError::UnknownColumn(unknown.clone()));
        }
        self.sheet.insert_list_row(values)?;
        self.added += 1;
        Ok(())
    }

    pub fn needs_refresh(&self) -> bool {
        self.added > 0
    }

    pub fn refresh_added_rows(&mut self) -> Result<(), SheetError> {
        self.ensure_usable()?;
        if self.added == 0 {
            return Ok(());
        }
        let first = self.order.len() + 2;
        let last = self.order.len() + self.added + 1;
        let cells = self.sheet.query_cells(&CellRange::rows(first, last), false)?;
        self.fold_in(cells.into_iter());
        if self.order.len() < last - 1 {
            self.order.resize(last - 1, None);
        }
        tracing::debug!(event = "rows_refreshed", tab = %self.title, first, last);
        self.added = 0;
        Ok(())
    }

    /// Delete the rows whose numbers (as of before this call) are in `nums`,
    /// each confirmed by `verifier`. Surviving rows are renumbered.
    ///
    /// A failed delete leaves the table unusable.
    pub fn delete_rows(
        &mut self,
        nums: &BTreeSet<usize>,
        verifier: &mut dyn DeleteVerifier,
    ) -> Result<usize, SheetError> {
        self.ensure_usable()?;
        let listed = self.sheet.list_rows()?;
        let mut deleted = 0;
        for (i, entry) in listed.iter().enumerate() {
            let original = i + 2;
            let Some(Some(id)) = self.order.get(original - 2).copied() else {
                continue;
            };
            self.slab[id.0].num -= deleted;
            if !nums.contains(&original) {
                continue;
            }
            let fields: BTreeMap<String, String> = self
                .headers
                .iter()
                .flatten()
                .filter_map(|h| {
                    let v = entry.values.get(&h.to_lowercase())?;
                    Some((h.clone(), v.clone()))
                })
                .collect();
            let current = self.slab[id.0].num;
            if !verifier.confirm_delete(current, &fields) {
                tracing::warn!(event = "delete_refused", tab = %self.title, row = current);
                continue;
            }
            if let Err(e) = self.sheet.delete_list_row(current) {
                self.poisoned = true;
                self.slab.clear();
                self.order.clear();
                return Err(e);
            }
            self.slab[id.0].deleted = true;
            deleted += 1;
        }
        let slab = &self.slab;
        self.order
            .retain(|slot| slot.map_or(true, |id| !slab[id.0].deleted));
        Ok(deleted)
    }
}
