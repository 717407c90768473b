use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::table::{RowId, Table};

pub const KEY_SEPARATOR: &str = "::";
/// Indexing gives up once this many problems have been collected.
pub const MAX_INDEX_ERRORS: usize = 10;

/// Tuple of key-column values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Vec<String>);

impl Key {
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(KEY_SEPARATOR))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexProblem {
    #[error("row {row} is missing a value for {header}")]
    MissingCell { row: usize, header: String },
    #[error("rows {first} and {second} share the key {key}")]
    DuplicateKey {
        first: usize,
        second: usize,
        key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not index tab {table}: {}", describe(.problems))]
pub struct IndexError {
    pub table: String,
    pub problems: Vec<IndexProblem>,
}

fn describe(problems: &[IndexProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Lookup of table rows by the values of a fixed list of key columns.
#[derive(Debug, Clone)]
pub struct Index {
    headers: Vec<String>,
    rows: HashMap<Key, RowId>,
}

impl Index {
    pub fn new<S: AsRef<str>>(table: &Table, headers: &[S]) -> Result<Self, IndexError> {
        let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let mut rows: HashMap<Key, RowId> = HashMap::new();
        let mut problems = Vec::new();
        for (id, row) in table.rows() {
            let mut values = Vec::with_capacity(headers.len());
            for header in &headers {
                match row.value(header) {
                    Some(v) => values.push(v.to_string()),
                    None => problems.push(IndexProblem::MissingCell {
                        row: row.num(),
                        header: header.clone(),
                    }),
                }
            }
            if values.len() == headers.len() {
                let key = Key(values);
                if let Some(old) = rows.insert(key.clone(), id) {
                    problems.push(IndexProblem::DuplicateKey {
                        first: table.row(old).num(),
                        second: row.num(),
                        key: key.to_string(),
                    });
                }
            }
            if problems.len() >= MAX_INDEX_ERRORS {
                break;
            }
        }
        if !problems.is_empty() {
            return Err(IndexError {
                table: table.title().to_string(),
                problems,
            });
        }
        tracing::debug!(event = "index_built", tab = %table.title(), keys = rows.len());
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Key for a column-name map; `None` when a key column is absent.
    pub fn key(&self, values: &BTreeMap<String, String>) -> Option<Key> {
        self.headers
            .iter()
            .map(|h| values.get(h).cloned())
            .collect::<Option<Vec<_>>>()
            .map(Key)
    }

    /// Row for `key`. Rows deleted since indexing are forgotten.
    pub fn lookup(&mut self, table: &Table, key: &Key) -> Option<RowId> {
        let id = *self.rows.get(key)?;
        if table.row(id).is_deleted() {
            self.rows.remove(key);
            return None;
        }
        Some(id)
    }

    /// Indexed keys with their rows, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&Key, RowId)> {
        self.rows.iter().map(|(k, id)| (k, *id))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::sheet::MemorySheet;

    fn table(rows: Vec<Vec<&str>>) -> Table {
        Table::load(Box::new(MemorySheet::from_rows("chat", rows))).unwrap()
    }

    #[test]
    fn composite_keys() {
        let t = table(vec![
            vec!["Context", "Id", "EN"],
            vec!["Chat", "m.a", "A"],
            vec!["Help", "m.a", "A"],
        ]);
        let mut index = Index::new(&t, &["Context", "Id"]).unwrap();
        assert_eq!(index.len(), 2);
        let mut values = BTreeMap::new();
        values.insert("Context".to_string(), "Help".to_string());
        values.insert("Id".to_string(), "m.a".to_string());
        let key = index.key(&values).unwrap();
        assert_eq!(key.to_string(), "Help::m.a");
        let id = index.lookup(&t, &key).unwrap();
        assert_eq!(t.row(id).num(), 3);

        values.remove("Context");
        assert!(index.key(&values).is_none());
    }

    #[test]
    fn duplicate_keys_name_both_rows() {
        let t = table(vec![
            vec!["Id", "EN"],
            vec!["m.a", "A"],
            vec!["m.b", "B"],
            vec!["m.a", "A again"],
        ]);
        let err = Index::new(&t, &["Id"]).unwrap_err();
        assert_eq!(
            err.problems,
            vec![IndexProblem::DuplicateKey {
                first: 2,
                second: 4,
                key: "m.a".into()
            }]
        );
    }

    #[test]
    fn missing_cells_and_cutoff() {
        let mut rows = vec![vec!["Id", "EN"]];
        for _ in 0..15 {
            rows.push(vec!["", "orphan"]);
        }
        let t = table(rows);
        let err = Index::new(&t, &["Id"]).unwrap_err();
        assert_eq!(err.problems.len(), MAX_INDEX_ERRORS);
        assert_eq!(
            err.problems[0],
            IndexProblem::MissingCell {
                row: 2,
                header: "Id".into()
            }
        );
        assert!(err.to_string().starts_with("could not index tab chat: row 2"));
    }

    #[test]
    fn deleted_rows_drop_out() {
        let mut t = table(vec![vec!["Id"], vec!["m.a"], vec!["m.b"]]);
        let mut index = Index::new(&t, &["Id"]).unwrap();
        let nums: BTreeSet<usize> = [2].into_iter().collect();
        t.delete_rows(&nums, &mut |_: usize, _: &BTreeMap<String, String>| true)
            .unwrap();
        let a = Key(vec!["m.a".into()]);
        assert!(index.lookup(&t, &a).is_none());
        assert_eq!(index.len(), 1);
        let b = index.lookup(&t, &Key(vec!["m.b".into()])).unwrap();
        assert_eq!(t.row(b).num(), 2);
    }
}
