use serde::{Deserialize, Serialize};
use wagerdesk_query::{FieldKind, Number, Row, Schema, Timestamp, Value};

use super::{datetime, Report, ReportKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
        }
    }
}

/// A player account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub name: String,
    pub email: String,
    pub balance: f64,
    /// Lifetime deposits.
    pub deposit: f64,
    /// Lifetime withdrawals.
    pub withdraw: f64,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(with = "datetime")]
    pub registered_at: Timestamp,
}

impl Row for User {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::U64(self.id)),
            "login" => Value::Text(&self.login),
            "name" => Value::Text(&self.name),
            "email" => Value::Text(&self.email),
            "balance" => Value::Number(Number::F64(self.balance)),
            "deposit" => Value::Number(Number::F64(self.deposit)),
            "withdraw" => Value::Number(Number::F64(self.withdraw)),
            "status" => Value::Text(self.status.as_str()),
            "registered_at" => Value::Timestamp(self.registered_at),
            _ => Value::None,
        }
    }
}

impl Report for User {
    const KIND: ReportKind = ReportKind::Users;

    fn schema() -> Schema {
        Schema::new(Self::KIND.as_str())
            .field("id", FieldKind::Number)
            .field("login", FieldKind::Text)
            .field("name", FieldKind::Text)
            .field("email", FieldKind::Text)
            .field("balance", FieldKind::Number)
            .field("deposit", FieldKind::Number)
            .field("withdraw", FieldKind::Number)
            .field("status", FieldKind::Text)
            .field("registered_at", FieldKind::DateTime)
            .searchable(["id", "login", "name", "email"])
            .timestamp("registered_at")
            .totals(["balance", "deposit", "withdraw"])
    }
}
