use serde::{Deserialize, Serialize};
use wagerdesk_query::{FieldKind, Number, Row, Schema, Timestamp, Value};

use super::{datetime, Report, ReportKind};

/// Two accounts seen from the same address.
///
/// There is no `id`; a row is identified by `ip` plus the login pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpIntersection {
    pub ip: String,
    pub login_a: String,
    pub login_b: String,
    /// Sessions in which both logins used the address.
    pub hits: u64,
    #[serde(with = "datetime")]
    pub last_seen: Timestamp,
}

impl Row for IpIntersection {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "ip" => Value::Text(&self.ip),
            "login_a" => Value::Text(&self.login_a),
            "login_b" => Value::Text(&self.login_b),
            "hits" => Value::Number(Number::U64(self.hits)),
            "last_seen" => Value::Timestamp(self.last_seen),
            _ => Value::None,
        }
    }
}

impl Report for IpIntersection {
    const KIND: ReportKind = ReportKind::IpIntersections;

    fn schema() -> Schema {
        Schema::new(Self::KIND.as_str())
            .field("ip", FieldKind::Text)
            .field("login_a", FieldKind::Text)
            .field("login_b", FieldKind::Text)
            .field("hits", FieldKind::Number)
            .field("last_seen", FieldKind::DateTime)
            .searchable(["ip", "login_a", "login_b"])
            .timestamp("last_seen")
            .totals(["hits"])
    }
}
