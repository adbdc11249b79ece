//! Schema-driven dynamic rows.
//!
//! [`Record`] holds owned field values for reports whose shape is only known
//! at runtime, such as the statistics report builder. Records are built
//! from JSON objects and checked against a [`Schema`] on the way in.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as Json;

use crate::error::{QueryError, Result};
use crate::row::Row;
use crate::schema::{FieldKind, Schema};
use crate::value::{Number, Timestamp, Value};

/// Owned field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    DateTime(Timestamp),
}

impl Scalar {
    /// Borrows this scalar as a query [`Value`].
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Scalar::Null => Value::None,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(*n),
            Scalar::Text(s) => Value::Text(s),
            Scalar::DateTime(t) => Value::Timestamp(*t),
        }
    }

    fn from_json(field: &str, kind: FieldKind, json: &Json) -> Result<Scalar> {
        let mismatch = || QueryError::TypeMismatch {
            field: field.to_string(),
            expected: kind.as_str(),
            actual: json.to_string(),
        };

        let scalar = match (kind, json) {
            (_, Json::Null) => Scalar::Null,

            (FieldKind::Number, Json::Number(n)) => {
                Scalar::Number(json_number(n).ok_or_else(mismatch)?)
            }
            (FieldKind::Number, Json::String(s)) => {
                Scalar::Number(Number::parse(s).ok_or_else(mismatch)?)
            }

            (FieldKind::Text, Json::String(s)) => Scalar::Text(s.clone()),
            (FieldKind::Text, Json::Number(n)) => Scalar::Text(n.to_string()),
            (FieldKind::Text, Json::Bool(b)) => Scalar::Text(b.to_string()),

            (FieldKind::DateTime, Json::String(s)) => {
                Scalar::DateTime(Timestamp::parse(s).ok_or_else(mismatch)?)
            }
            (FieldKind::DateTime, Json::Number(n)) => {
                Scalar::DateTime(Timestamp::from_millis(n.as_i64().ok_or_else(mismatch)?))
            }

            (FieldKind::Bool, Json::Bool(b)) => Scalar::Bool(*b),
            (FieldKind::Bool, Json::String(s)) => match s.as_str() {
                "true" => Scalar::Bool(true),
                "false" => Scalar::Bool(false),
                _ => return Err(mismatch()),
            },

            _ => return Err(mismatch()),
        };
        Ok(scalar)
    }
}

fn json_number(n: &serde_json::Number) -> Option<Number> {
    if let Some(i) = n.as_i64() {
        Some(Number::I64(i))
    } else if let Some(u) = n.as_u64() {
        Some(Number::U64(u))
    } else {
        n.as_f64().map(Number::F64)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_none(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::DateTime(t) => serializer.collect_str(t),
        }
    }
}

/// One dynamic row, fields in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    /// Builds a record from a JSON object, coercing each declared field.
    ///
    /// Every field the schema declares must be present (it may be `null`).
    /// Keys the schema does not declare are ignored.
    pub fn from_json(schema: &Schema, json: &Json) -> Result<Record> {
        let object = match json {
            Json::Object(map) => map,
            Json::Null => return Err(QueryError::NotAnObject("null")),
            Json::Bool(_) => return Err(QueryError::NotAnObject("a boolean")),
            Json::Number(_) => return Err(QueryError::NotAnObject("a number")),
            Json::String(_) => return Err(QueryError::NotAnObject("a string")),
            Json::Array(_) => return Err(QueryError::NotAnObject("an array")),
        };

        let fields = schema
            .fields
            .iter()
            .map(|def| {
                let raw = object
                    .get(&def.name)
                    .ok_or_else(|| QueryError::MissingField(def.name.clone()))?;
                Ok((def.name.clone(), Scalar::from_json(&def.name, def.kind, raw)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Record { fields })
    }

    /// Builds records from a JSON array. The first bad element fails the load.
    pub fn load_all(schema: &Schema, json: &Json) -> Result<Vec<Record>> {
        match json {
            Json::Array(items) => items
                .iter()
                .map(|item| Record::from_json(schema, item))
                .collect(),
            other => Ok(vec![Record::from_json(schema, other)?]),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Row for Record {
    fn field_value(&self, field: &str) -> Value<'_> {
        self.get(field).map_or(Value::None, Scalar::as_value)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
