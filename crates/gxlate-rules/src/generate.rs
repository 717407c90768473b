use gxlate_core::{google_now, Field, Status};
use gxlate_props::{Entry, PropsFile};
use gxlate_sheet::FieldMapping;

use crate::rule::{make_tech_notes, Context};
use crate::ruleset::{Domain, Scope};

/// Classification and column values for one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRow {
    pub status: Status,
    pub fields: FieldMapping,
    pub line: usize,
}

impl GeneratedRow {
    pub fn id(&self) -> &str {
        self.fields.id().unwrap_or_default()
    }
}

/// Turns the entries of one bundle into [`GeneratedRow`]s.
#[derive(Debug, Clone)]
pub struct Generator {
    domain: Domain,
    scope: Scope,
    context: Context,
}

impl Generator {
    pub fn new(domain: Domain, scope: Scope, context: Context) -> Self {
        Self {
            domain,
            scope,
            context,
        }
    }

    pub fn scope_name(&self) -> &str {
        &self.scope.name
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn generate(&mut self, entry: &Entry<'_>) -> GeneratedRow {
        let mut fields = FieldMapping::new();
        fields.set(Field::Type, "General");
        fields.set(Field::Scope, self.scope.name.clone());
        let status = self
            .context
            .apply(&self.scope.rules, entry, &mut fields)
            .unwrap_or(Status::Normal);
        fields.set(Field::LastUpdated, google_now());
        fields.set(Field::Id, entry.id);
        let english = if self.domain.double_quotes {
            entry.value.replace("''", "'")
        } else {
            entry.value.to_string()
        };
        fields.set(Field::English, english);
        fields.set(Field::TechNotes, make_tech_notes(entry.value));
        GeneratedRow {
            status,
            fields,
            line: entry.line,
        }
    }

    /// Rows in parse order.
    pub fn generate_all(&mut self, props: &PropsFile) -> Vec<GeneratedRow> {
        props.entries().map(|e| self.generate(&e)).collect()
    }
}
