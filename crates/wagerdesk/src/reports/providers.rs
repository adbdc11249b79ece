use serde::{Deserialize, Serialize};
use wagerdesk_query::{FieldKind, Number, Row, Schema, Timestamp, Value};

use super::{datetime, Report, ReportKind};

/// Daily turnover for one game provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStat {
    pub provider: String,
    pub game_count: u64,
    pub bets: f64,
    pub wins: f64,
    /// Gross gaming revenue, `bets - wins`.
    pub ggr: f64,
    #[serde(with = "datetime")]
    pub date: Timestamp,
}

impl Row for ProviderStat {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "provider" => Value::Text(&self.provider),
            "game_count" => Value::Number(Number::U64(self.game_count)),
            "bets" => Value::Number(Number::F64(self.bets)),
            "wins" => Value::Number(Number::F64(self.wins)),
            "ggr" => Value::Number(Number::F64(self.ggr)),
            "date" => Value::Timestamp(self.date),
            _ => Value::None,
        }
    }
}

impl Report for ProviderStat {
    const KIND: ReportKind = ReportKind::ProviderStats;

    fn schema() -> Schema {
        Schema::new(Self::KIND.as_str())
            .field("provider", FieldKind::Text)
            .field("game_count", FieldKind::Number)
            .field("bets", FieldKind::Number)
            .field("wins", FieldKind::Number)
            .field("ggr", FieldKind::Number)
            .field("date", FieldKind::DateTime)
            .searchable(["provider"])
            .timestamp("date")
            .totals(["game_count", "bets", "wins", "ggr"])
    }
}
