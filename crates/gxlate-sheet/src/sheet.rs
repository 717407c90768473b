//! The worksheet capability the table layer runs against, plus an in-memory grid.

use std::collections::BTreeMap;

use crate::SheetError;

/// One cell, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

/// Inclusive row/column bounds of a cell query. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellRange {
    pub min_row: Option<usize>,
    pub max_row: Option<usize>,
    pub min_col: Option<usize>,
    pub max_col: Option<usize>,
}

impl CellRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn rows(first: usize, last: usize) -> Self {
        Self {
            min_row: Some(first),
            max_row: Some(last),
            ..Self::default()
        }
    }

    pub fn cell(row: usize, col: usize) -> Self {
        Self {
            min_row: Some(row),
            max_row: Some(row),
            min_col: Some(col),
            max_col: Some(col),
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.min_row.map_or(true, |r| row >= r)
            && self.max_row.map_or(true, |r| row <= r)
            && self.min_col.map_or(true, |c| col >= c)
            && self.max_col.map_or(true, |c| col <= c)
    }
}

/// A data row as returned by the list view: its current row number and its
/// values keyed by lower-cased header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRow {
    pub row: usize,
    pub values: BTreeMap<String, String>,
}

/// A single tab of a spreadsheet. Row 1 holds headers.
pub trait Worksheet {
    fn title(&self) -> &str;

    /// Non-empty cells inside `range`; with `return_empty`, blank cells inside a
    /// bounded range are returned too, with an empty value.
    fn query_cells(&mut self, range: &CellRange, return_empty: bool)
        -> Result<Vec<Cell>, SheetError>;

    /// Append a row after the last one, values keyed by header.
    fn insert_list_row(&mut self, values: &BTreeMap<String, String>) -> Result<(), SheetError>;

    fn update_cell(&mut self, row: usize, col: usize, value: &str) -> Result<(), SheetError>;

    /// Every data row from row 2 down to the last non-empty row.
    fn list_rows(&mut self) -> Result<Vec<ListRow>, SheetError>;

    /// Remove a data row; the rows below move up by one.
    fn delete_list_row(&mut self, row: usize) -> Result<(), SheetError>;
}

/// Grid of cells held in memory. Empty values are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySheet {
    title: String,
    cells: BTreeMap<(usize, usize), String>,
}

impl MemorySheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Build from row-major text; the first row is the header row.
    pub fn from_rows<R, S>(title: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sheet = Self::new(title);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                sheet.set(r + 1, c + 1, value.as_ref());
            }
        }
        sheet
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(&(row, col)).map(String::as_str)
    }

    pub fn set(&mut self, row: usize, col: usize, value: &str) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value.to_string());
        }
    }

    pub fn row_count(&self) -> usize {
        self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0)
    }

    pub fn col_count(&self) -> usize {
        self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0)
    }

    pub fn headers(&self) -> Vec<String> {
        (1..=self.col_count())
            .map(|c| self.get(1, c).unwrap_or_default().to_string())
            .collect()
    }

    /// Values by header for one row, skipping blanks.
    pub fn row_values(&self, row: usize) -> BTreeMap<String, String> {
        self.headers()
            .into_iter()
            .enumerate()
            .filter_map(|(i, h)| Some((h, self.get(row, i + 1)?.to_string())))
            .collect()
    }

    /// Dense rows including the header row, padded to the widest column.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let width = self.col_count();
        (1..=self.row_count())
            .map(|r| {
                (1..=width)
                    .map(|c| self.get(r, c).unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }
}

impl Worksheet for MemorySheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn query_cells(
        &mut self,
        range: &CellRange,
        return_empty: bool,
    ) -> Result<Vec<Cell>, SheetError> {
        if return_empty {
            let (Some(r0), Some(r1), Some(c0), Some(c1)) =
                (range.min_row, range.max_row, range.min_col, range.max_col)
            else {
                return Err(SheetError::UnboundedQuery);
            };
            let mut out = Vec::new();
            for row in r0..=r1 {
                for col in c0..=c1 {
                    out.push(Cell {
                        row,
                        col,
                        value: self.get(row, col).unwrap_or_default().to_string(),
                    });
                }
            }
            return Ok(out);
        }
        Ok(self
            .cells
            .iter()
            .filter(|((r, c), _)| range.contains(*r, *c))
            .map(|((row, col), value)| Cell {
                row: *row,
                col: *col,
                value: value.clone(),
            })
            .collect())
    }

    fn insert_list_row(&mut self, values: &BTreeMap<String, String>) -> Result<(), SheetError> {
        let headers = self.headers();
        let row = self.row_count().max(1) + 1;
        let mut placed = Vec::with_capacity(values.len());
        for (key, value) in values {
            let Some(col) = headers.iter().position(|h| h.eq_ignore_ascii_case(key)) else {
                return Err(SheetError::UnknownColumn(key.clone()));
            };
            placed.push((col + 1, value));
        }
        for (col, value) in placed {
            self.set(row, col, value);
        }
        Ok(())
    }

    fn update_cell(&mut self, row: usize, col: usize, value: &str) -> Result<(), SheetError> {
        if row == 0 || col == 0 {
            return Err(SheetError::OutOfRange { row, col });
        }
        self.set(row, col, value);
        Ok(())
    }

    fn list_rows(&mut self) -> Result<Vec<ListRow>, SheetError> {
        let headers: Vec<String> = self.headers().iter().map(|h| h.to_lowercase()).collect();
        Ok((2..=self.row_count())
            .map(|row| ListRow {
                row,
                values: headers
                    .iter()
                    .enumerate()
                    .filter_map(|(i, h)| Some((h.clone(), self.get(row, i + 1)?.to_string())))
                    .collect(),
            })
            .collect())
    }

    fn delete_list_row(&mut self, row: usize) -> Result<(), SheetError> {
        if row < 2 || row > self.row_count() {
            return Err(SheetError::OutOfRange { row, col: 0 });
        }
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter(|((r, _), _)| *r != row)
            .map(|((r, c), v)| if r > row { ((r - 1, c), v) } else { ((r, c), v) })
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> MemorySheet {
        MemorySheet::from_rows(
            "t",
            [
                vec!["Id", "EN", "FR"],
                vec!["a", "A", ""],
                vec!["b", "B", "Bé"],
            ],
        )
    }

    #[test]
    fn query_skips_blanks_unless_asked() {
        let mut s = sheet();
        let cells = s.query_cells(&CellRange::rows(2, 2), false).unwrap();
        assert_eq!(cells.len(), 2);
        let cells = s.query_cells(&CellRange::cell(2, 3), true).unwrap();
        assert_eq!(
            cells,
            vec![Cell {
                row: 2,
                col: 3,
                value: String::new()
            }]
        );
        assert!(s.query_cells(&CellRange::all(), true).is_err());
    }

    #[test]
    fn insert_appends_and_checks_headers() {
        let mut s = sheet();
        let mut values = BTreeMap::new();
        values.insert("Id".to_string(), "c".to_string());
        values.insert("EN".to_string(), "C".to_string());
        s.insert_list_row(&values).unwrap();
        assert_eq!(s.get(4, 1), Some("c"));
        values.insert("Nope".to_string(), "x".to_string());
        assert!(matches!(
            s.insert_list_row(&values),
            Err(SheetError::UnknownColumn(c)) if c == "Nope"
        ));
        assert_eq!(s.row_count(), 4);
    }

    #[test]
    fn list_rows_use_lowercase_headers_and_delete_shifts() {
        let mut s = sheet();
        let rows = s.list_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values.get("fr").map(String::as_str), Some("Bé"));
        s.delete_list_row(2).unwrap();
        assert_eq!(s.get(2, 1), Some("b"));
        assert_eq!(s.row_count(), 2);
    }
}
