//! A workbook kept on disk: one directory per document, one `<tab>.csv` per tab.
//!
//! Every mutation is written straight back to the tab's file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sheet::{Cell, CellRange, ListRow, MemorySheet, Worksheet};
use crate::{SheetError, Workbook};

const TAB_EXT: &str = "csv";

#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    root: PathBuf,
}

impl CsvWorkbook {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SheetError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SheetError::NotFound(format!(
                "workbook directory {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn doc_dir(&self, doc: &str) -> Result<PathBuf, SheetError> {
        let dir = self.root.join(doc);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(SheetError::NotFound(format!("document '{doc}'")))
        }
    }

    fn tab_path(&self, doc: &str, tab: &str) -> Result<PathBuf, SheetError> {
        Ok(self.doc_dir(doc)?.join(format!("{tab}.{TAB_EXT}")))
    }
}

fn sorted_names(dir: &Path, want_dirs: bool) -> Result<Vec<String>, SheetError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| SheetError::io(dir, e))? {
        let entry = entry.map_err(|e| SheetError::io(dir, e))?;
        let path = entry.path();
        if want_dirs && path.is_dir() {
            out.push(entry.file_name().to_string_lossy().into_owned());
        } else if !want_dirs
            && path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(TAB_EXT)
        {
            if let Some(stem) = path.file_stem() {
                out.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    out.sort();
    Ok(out)
}

impl Workbook for CsvWorkbook {
    fn spreadsheets(&self) -> Result<Vec<String>, SheetError> {
        sorted_names(&self.root, true)
    }

    fn tabs(&self, doc: &str) -> Result<Vec<String>, SheetError> {
        sorted_names(&self.doc_dir(doc)?, false)
    }

    fn open_tab(&self, doc: &str, tab: &str) -> Result<Box<dyn Worksheet>, SheetError> {
        let path = self.tab_path(doc, tab)?;
        if !path.is_file() {
            return Err(SheetError::NotFound(format!("tab '{tab}' in document '{doc}'")));
        }
        Ok(Box::new(CsvSheet::load(tab, path)?))
    }

    fn create_tab(&self, doc: &str, tab: &str, headers: &[String]) -> Result<(), SheetError> {
        let path = self.tab_path(doc, tab)?;
        if path.exists() {
            return Err(SheetError::Exists(format!("tab '{tab}' in document '{doc}'")));
        }
        let grid = MemorySheet::from_rows(tab, [headers]);
        write_grid(&path, &grid)
    }

    fn delete_tab(&self, doc: &str, tab: &str) -> Result<(), SheetError> {
        let path = self.tab_path(doc, tab)?;
        fs::remove_file(&path).map_err(|e| SheetError::io(&path, e))
    }
}

fn write_grid(path: &Path, grid: &MemorySheet) -> Result<(), SheetError> {
    let mut w = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| SheetError::csv(path, e))?;
    for row in grid.to_rows() {
        w.write_record(&row).map_err(|e| SheetError::csv(path, e))?;
    }
    w.flush().map_err(|e| SheetError::io(path, e))
}

/// A tab backed by a CSV file.
#[derive(Debug)]
pub struct CsvSheet {
    path: PathBuf,
    grid: MemorySheet,
}

impl CsvSheet {
    pub fn load(title: &str, path: PathBuf) -> Result<Self, SheetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| SheetError::csv(&path, e))?;
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SheetError::csv(&path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        tracing::debug!(event = "csv_tab_loaded", path = %path.display(), rows = rows.len());
        Ok(Self {
            grid: MemorySheet::from_rows(title, rows),
            path,
        })
    }

    fn save(&self) -> Result<(), SheetError> {
        write_grid(&self.path, &self.grid)
    }
}

impl Worksheet for CsvSheet {
    fn title(&self) -> &str {
        self.grid.title()
    }

    fn query_cells(
        &mut self,
        range: &CellRange,
        return_empty: bool,
    ) -> Result<Vec<Cell>, SheetError> {
        self.grid.query_cells(range, return_empty)
    }

    fn insert_list_row(&mut self, values: &BTreeMap<String, String>) -> Result<(), SheetError> {
        self.grid.insert_list_row(values)?;
        self.save()
    }

    fn update_cell(&mut self, row: usize, col: usize, value: &str) -> Result<(), SheetError> {
        self.grid.update_cell(row, col, value)?;
        self.save()
    }

    fn list_rows(&mut self) -> Result<Vec<ListRow>, SheetError> {
        self.grid.list_rows()
    }

    fn delete_list_row(&mut self, row: usize) -> Result<(), SheetError> {
        self.grid.delete_list_row(row)?;
        self.save()
    }
}
