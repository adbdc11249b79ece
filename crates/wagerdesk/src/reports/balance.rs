use serde::{Deserialize, Serialize};
use wagerdesk_query::{FieldKind, Number, Row, Schema, Timestamp, Value};

use super::{datetime, Report, ReportKind};

/// Kind of balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Deposit,
    Withdraw,
    Bet,
    Win,
    Bonus,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
            Operation::Bet => "bet",
            Operation::Win => "win",
            Operation::Bonus => "bonus",
        }
    }
}

/// One line of a user's balance history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub id: u64,
    pub user_id: u64,
    pub login: String,
    pub operation: Operation,
    /// Signed change: negative for withdrawals and bets.
    pub amount: f64,
    pub balance_before: f64,
    pub balance_after: f64,
    #[serde(with = "datetime")]
    pub created_at: Timestamp,
}

impl Row for BalanceEntry {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::U64(self.id)),
            "user_id" => Value::Number(Number::U64(self.user_id)),
            "login" => Value::Text(&self.login),
            "operation" => Value::Text(self.operation.as_str()),
            "amount" => Value::Number(Number::F64(self.amount)),
            "balance_before" => Value::Number(Number::F64(self.balance_before)),
            "balance_after" => Value::Number(Number::F64(self.balance_after)),
            "created_at" => Value::Timestamp(self.created_at),
            _ => Value::None,
        }
    }
}

impl Report for BalanceEntry {
    const KIND: ReportKind = ReportKind::BalanceHistory;

    fn schema() -> Schema {
        Schema::new(Self::KIND.as_str())
            .field("id", FieldKind::Number)
            .field("user_id", FieldKind::Number)
            .field("login", FieldKind::Text)
            .field("operation", FieldKind::Text)
            .field("amount", FieldKind::Number)
            .field("balance_before", FieldKind::Number)
            .field("balance_after", FieldKind::Number)
            .field("created_at", FieldKind::DateTime)
            .searchable(["id", "user_id", "login"])
            .timestamp("created_at")
            .totals(["amount"])
    }
}
