//! Output modes and structured serialization.
//!
//! [`OutputMode::Table`] renders through [`crate::table`]; the structured
//! modes serialize command output directly.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

/// How command output is written. Backs the `--output` flag and the
/// `output` config key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Aligned terminal table with a totals footer
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Rows of the current page, without totals
    Csv,
}

impl OutputMode {
    /// JSON, YAML and CSV are structured; the table is for people.
    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputMode::Table)
    }
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("cannot write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot write YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cannot write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("table output is rendered, not serialized")]
    NotStructured,
}

/// Serializes `data` in a structured mode.
pub fn serialize_structured<T: Serialize + ?Sized>(
    data: &T,
    mode: OutputMode,
) -> Result<String, SerializeError> {
    match mode {
        OutputMode::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputMode::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputMode::Csv => serialize_csv(data),
        OutputMode::Table => Err(SerializeError::NotStructured),
    }
}

/// Writes rows as CSV.
///
/// Rows go through JSON first, so any serializable row type works. Columns
/// are the first row's keys in order; a later row missing one gets an empty
/// cell. A lone object is a one-row table. No rows means no output, not
/// even a header.
pub fn serialize_csv<T: Serialize + ?Sized>(data: &T) -> Result<String, SerializeError> {
    let rows = match serde_json::to_value(data)? {
        Json::Array(items) => items,
        other => vec![other],
    };
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let columns: Vec<String> = match first {
        Json::Object(map) => map.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in &rows {
        let cells: Vec<String> = match row {
            Json::Object(map) => columns
                .iter()
                .map(|column| map.get(column).map(cell).unwrap_or_default())
                .collect(),
            other => vec![cell(other)],
        };
        writer.write_record(&cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn cell(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}
