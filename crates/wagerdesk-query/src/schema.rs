//! Per-report field schemas.
//!
//! A [`Schema`] names the fields a report's rows carry, which of them the
//! search box looks at, which one the date filter reads and which ones get a
//! footer total. Queries are validated against it before they run.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::value::Timestamp;

/// Declared type of a report field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    DateTime,
    Bool,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::DateTime => "date-time",
            FieldKind::Bool => "bool",
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered field list plus the roles fields play in a report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldDef>,
    /// Fields matched by the free-text search box.
    pub search_fields: Vec<String>,
    /// Field the date filter compares against.
    pub timestamp_field: Option<String>,
    /// Fields summed into the totals row.
    pub total_fields: Vec<String>,
}

impl Schema {
    /// Starts an empty schema for the named report.
    pub fn new(name: impl Into<String>) -> Self {
        Schema {
            name: name.into(),
            ..Schema::default()
        }
    }

    /// Declares a field. Declaration order is column order.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
        });
        self
    }

    /// Sets the fields the search box matches against.
    pub fn searchable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the field the date filter reads.
    pub fn timestamp(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = Some(field.into());
        self
    }

    /// Sets the fields summed in the totals row.
    pub fn totals<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.total_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Looks up a declared field.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Fails with [`QueryError::UnknownField`] if `name` is not declared.
    pub fn validate_field(&self, name: &str) -> Result<&FieldDef> {
        self.get(name).ok_or_else(|| QueryError::UnknownField {
            field: name.to_string(),
            report: self.name.clone(),
        })
    }

    /// Infers a schema from one sample JSON object.
    ///
    /// Numbers become `Number`, booleans `Bool`, strings that read as dates
    /// `DateTime`, everything else `Text`. Roles follow [`Schema::infer_roles`].
    pub fn infer(name: impl Into<String>, sample: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut schema = Schema::new(name);
        for (key, value) in sample {
            let kind = match value {
                serde_json::Value::Number(_) => FieldKind::Number,
                serde_json::Value::Bool(_) => FieldKind::Bool,
                serde_json::Value::String(s) if Timestamp::parse(s).is_some() => {
                    FieldKind::DateTime
                }
                _ => FieldKind::Text,
            };
            schema = schema.field(key.as_str(), kind);
        }
        schema.infer_roles()
    }

    /// Derives field roles from the declared kinds.
    ///
    /// Every text field (and `id`) is searchable, the first date-time field
    /// drives the date filter and every number except `id` gets a total.
    pub fn infer_roles(mut self) -> Self {
        self.search_fields = self
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Text || f.name == "id")
            .map(|f| f.name.clone())
            .collect();
        self.timestamp_field = self
            .fields
            .iter()
            .find(|f| f.kind == FieldKind::DateTime)
            .map(|f| f.name.clone());
        self.total_fields = self
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Number && f.name != "id")
            .map(|f| f.name.clone())
            .collect();
        self
    }
}
