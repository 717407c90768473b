use std::collections::BTreeMap;

use gxlate_core::{Field, Language};

use crate::table::{Row, RowId, Table};
use crate::SheetError;

/// Generated values for one property, by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    values: BTreeMap<Field, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.get(Field::Id)
    }

    pub fn english(&self) -> Option<&str> {
        self.get(Field::English)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Column name to cell value, with one column per language for language fields.
    pub fn to_string_map(&self, languages: &[Language]) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (field, value) in self.iter() {
            if field.is_language() {
                for lang in languages {
                    map.insert(field.language_column(lang), field.modify_value(value, lang));
                }
            } else {
                map.insert(field.column_name().to_string(), value.to_string());
            }
        }
        map
    }

    fn field_needs_upload(&self, row: &Row, field: Field, value: &str) -> bool {
        field
            .upload_mode()
            .needs_upload(row.value(field.column_name()), value)
    }

    pub fn needs_upload(&self, row: &Row) -> bool {
        self.iter()
            .any(|(field, value)| self.field_needs_upload(row, field, value))
    }

    /// Bring `id` up to date. Language fields are written for every language;
    /// the last-updated stamp goes last and only when the English cell changed.
    /// Returns the number of cells written.
    pub fn upload(
        &self,
        table: &mut Table,
        id: RowId,
        languages: &[Language],
    ) -> Result<usize, SheetError> {
        let mut written = 0;
        let mut english_changed = false;
        for (field, value) in self.iter() {
            if field == Field::LastUpdated {
                continue;
            }
            if field.is_language() {
                for lang in languages {
                    table.update_cell(
                        id,
                        &field.language_column(lang),
                        &field.modify_value(value, lang),
                    )?;
                    written += 1;
                }
            } else if self.field_needs_upload(table.row(id), field, value) {
                table.update_cell(id, field.column_name(), value)?;
                written += 1;
                english_changed |= field == Field::English;
            }
        }
        if english_changed {
            if let Some(stamp) = self.get(Field::LastUpdated) {
                table.update_cell(id, Field::LastUpdated.column_name(), stamp)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::MemorySheet;

    fn mapping() -> FieldMapping {
        let mut m = FieldMapping::new();
        m.set(Field::Scope, "Chat");
        m.set(Field::Id, "m.hi");
        m.set(Field::English, "Hi");
        m.set(Field::LastUpdated, "01/02/24 10:00");
        m.set(Field::Type, "General");
        m.set(Field::FieldSize, "20");
        m.set(Field::Verify, "CHANGE");
        m
    }

    fn langs() -> Vec<Language> {
        Language::parse_list("fr,de").unwrap()
    }

    fn table(en: &str, size: &str) -> Table {
        let sheet = MemorySheet::from_rows(
            "chat",
            [
                vec![
                    "Context",
                    "Id",
                    "EN",
                    "ENLastUpdated",
                    "Type",
                    "FieldSize",
                    "FRVerify",
                    "DEVerify",
                ],
                vec!["Chat", "m.hi", en, "old", "Other", size, "", ""],
            ],
        );
        Table::load(Box::new(sheet)).unwrap()
    }

    #[test]
    fn string_map_expands_language_fields() {
        let map = mapping().to_string_map(&langs());
        assert_eq!(map.get("FRVerify").map(String::as_str), Some("CHANGE_FR"));
        assert_eq!(map.get("DEVerify").map(String::as_str), Some("CHANGE_DE"));
        assert_eq!(map.get("EN").map(String::as_str), Some("Hi"));
        assert!(!map.contains_key("Verify"));
    }

    #[test]
    fn unchanged_english_needs_nothing() {
        let t = table("Hi", "10");
        let (id, _) = t.rows().next().unwrap();
        assert!(!mapping().needs_upload(t.row(id)));
    }

    #[test]
    fn changed_english_stamps_last() {
        let mut t = table("Hello", "10");
        let (id, _) = t.rows().next().unwrap();
        let m = mapping();
        assert!(m.needs_upload(t.row(id)));
        let written = m.upload(&mut t, id, &langs()).unwrap();
        // EN, FRVerify, DEVerify, ENLastUpdated
        assert_eq!(written, 4);
        let row = t.row(id);
        assert_eq!(row.value("EN"), Some("Hi"));
        assert_eq!(row.value("ENLastUpdated"), Some("01/02/24 10:00"));
        assert_eq!(row.value("FRVerify"), Some("CHANGE_FR"));
        assert_eq!(row.value("FieldSize"), Some("10"));
        assert_eq!(row.value("Type"), Some("Other"));
    }

    #[test]
    fn soft_field_fills_blank_cell() {
        let mut t = table("Hi", "");
        let (id, _) = t.rows().next().unwrap();
        let m = mapping();
        assert!(m.needs_upload(t.row(id)));
        m.upload(&mut t, id, &langs()).unwrap();
        assert_eq!(t.row(id).value("FieldSize"), Some("20"));
        assert_eq!(t.row(id).value("EN"), Some("Hi"));
        // No English change, so the stamp keeps its old value.
        assert_eq!(t.row(id).value("ENLastUpdated"), Some("old"));
    }

    #[test]
    fn soft_only_fill_leaves_stamp_alone() {
        let sheet = MemorySheet::from_rows(
            "chat",
            [
                vec!["Id", "EN", "ENLastUpdated", "FieldSize", "TechNotes"],
                vec!["m.hi", "Hi", "01/01/14 10:00", "", ""],
            ],
        );
        let mut t = Table::load(Box::new(sheet)).unwrap();
        let (id, _) = t.rows().next().unwrap();
        let mut m = FieldMapping::new();
        m.set(Field::Id, "m.hi");
        m.set(Field::English, "Hi");
        m.set(Field::FieldSize, "20");
        m.set(Field::TechNotes, "Short");
        m.set(Field::LastUpdated, "02/02/24 12:00");

        let written = m.upload(&mut t, id, &[]).unwrap();
        assert_eq!(written, 2);
        let row = t.row(id);
        assert_eq!(row.value("FieldSize"), Some("20"));
        assert_eq!(row.value("TechNotes"), Some("Short"));
        assert_eq!(row.value("ENLastUpdated"), Some("01/01/14 10:00"));
    }
}
