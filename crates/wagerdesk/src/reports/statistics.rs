//! The generic statistics report builder.
//!
//! Statistics exports have no fixed shape. The schema is taken from the
//! first row: numbers become totals, the first date-like field drives the
//! date filter and every text field is searchable.

use serde_json::Value as Json;
use wagerdesk_query::{FieldKind, QueryError, Record, Scalar, Schema};

use super::ReportKind;

/// Infers the schema from the first object of a JSON array (or a lone
/// object). An empty array yields a schema with no fields.
pub fn infer_schema(json: &Json) -> Schema {
    let name = ReportKind::Statistics.as_str();
    let first = match json {
        Json::Array(items) => items.first(),
        other => Some(other),
    };
    match first.and_then(Json::as_object) {
        Some(sample) => Schema::infer(name, sample),
        None => Schema::new(name),
    }
}

/// Infers the schema, then loads every row against it.
pub fn load(json: &Json) -> Result<Vec<Record>, QueryError> {
    let schema = infer_schema(json);
    if schema.fields.is_empty() {
        return Ok(Vec::new());
    }
    Record::load_all(&schema, json)
}

/// Recovers the schema of already-loaded records from the first one.
pub fn schema_of(records: &[Record]) -> Schema {
    let Some(first) = records.first() else {
        return Schema::new(ReportKind::Statistics.as_str());
    };
    first
        .iter()
        .fold(Schema::new(ReportKind::Statistics.as_str()), |schema, (name, value)| {
            let kind = match value {
                Scalar::Number(_) => FieldKind::Number,
                Scalar::DateTime(_) => FieldKind::DateTime,
                Scalar::Bool(_) => FieldKind::Bool,
                Scalar::Text(_) | Scalar::Null => FieldKind::Text,
            };
            schema.field(name, kind)
        })
        .infer_roles()
}
