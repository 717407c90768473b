use std::collections::{BTreeMap, BTreeSet, HashSet};

use gxlate_domain::Failure;
use gxlate_sheet::{Index, Key, Table};

use crate::record;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Removal {
    pub stale: usize,
    pub removed: usize,
}

/// Remove rows whose keys were not produced this run. Check-only runs just log them.
pub(crate) fn remove_stale_rows(
    table: &mut Table,
    index: &Index,
    keys_found: &HashSet<Key>,
    check_only: bool,
    failures: &mut Vec<Failure>,
) -> Removal {
    tracing::info!(event = "removal_check", tab = %table.title(), "Checking for rows to remove");
    let mut to_remove: HashSet<Key> = HashSet::new();
    let mut nums: BTreeSet<usize> = BTreeSet::new();
    for (_, row) in table.rows() {
        let Some(key) = index.key(row.values()) else {
            continue;
        };
        if keys_found.contains(&key) {
            continue;
        }
        if check_only {
            tracing::info!(event = "removal_required", row = row.num(), key = %key, "Row {} ({}) requires removal", row.num(), key);
        }
        nums.insert(row.num());
        to_remove.insert(key);
    }
    let stale = nums.len();
    if check_only || nums.is_empty() {
        return Removal { stale, removed: 0 };
    }

    let mut verifier = |row: usize, fields: &BTreeMap<String, String>| -> bool {
        match index.key(fields) {
            None => {
                tracing::error!(
                    event = "delete_refused",
                    row,
                    "Row {row} was not formatted correctly, it did not contain all of the expected columns"
                );
                false
            }
            Some(key) if !to_remove.contains(&key) => {
                tracing::error!(
                    event = "delete_refused",
                    row,
                    key = %key,
                    "Row {row} was not found in original set of rows, maybe something changed"
                );
                false
            }
            Some(key) => {
                tracing::info!(event = "row_removed", row, key = %key, "Removing row {key} (row {row})");
                true
            }
        }
    };
    match table.delete_rows(&nums, &mut verifier) {
        Ok(removed) => Removal { stale, removed },
        Err(e) => {
            let tab = table.title().to_string();
            record(failures, &tab, None, format!("Unable to delete rows: {e}"));
            Removal { stale, removed: 0 }
        }
    }
}
