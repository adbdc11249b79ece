use serde::{Deserialize, Serialize};
use wagerdesk_query::{FieldKind, Number, Row, Schema, Timestamp, Value};

use super::{datetime, Report, ReportKind};

/// An admin edit to a user field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: u64,
    pub admin: String,
    /// Login of the edited user.
    pub target: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    #[serde(with = "datetime")]
    pub changed_at: Timestamp,
}

impl Row for ChangeLogEntry {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::U64(self.id)),
            "admin" => Value::Text(&self.admin),
            "target" => Value::Text(&self.target),
            "field" => Value::Text(&self.field),
            "old_value" => Value::Text(&self.old_value),
            "new_value" => Value::Text(&self.new_value),
            "changed_at" => Value::Timestamp(self.changed_at),
            _ => Value::None,
        }
    }
}

impl Report for ChangeLogEntry {
    const KIND: ReportKind = ReportKind::ChangeLog;

    fn schema() -> Schema {
        Schema::new(Self::KIND.as_str())
            .field("id", FieldKind::Number)
            .field("admin", FieldKind::Text)
            .field("target", FieldKind::Text)
            .field("field", FieldKind::Text)
            .field("old_value", FieldKind::Text)
            .field("new_value", FieldKind::Text)
            .field("changed_at", FieldKind::DateTime)
            .searchable(["id", "admin", "target"])
            .timestamp("changed_at")
    }
}
