//! Footer totals over filtered rows.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::row::Row;

/// Per-field sums, in the order the fields were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    totals: Vec<(String, f64)>,
}

impl Aggregates {
    /// Sum for `field`, or `None` if it was not requested.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, total)| *total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.totals.iter().map(|(name, total)| (name.as_str(), *total))
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl Serialize for Aggregates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.totals.len()))?;
        for (name, total) in &self.totals {
            map.serialize_entry(name, total)?;
        }
        map.end()
    }
}

/// Sums each field over `rows`.
///
/// Pass the full filtered set here, not a page of it. Values that are not
/// numbers (or numeric text) and missing fields count as zero.
pub fn aggregate<R, S>(rows: &[R], fields: &[S]) -> Aggregates
where
    R: Row,
    S: AsRef<str>,
{
    let totals = fields
        .iter()
        .map(|field| {
            let field = field.as_ref();
            let total: f64 = rows
                .iter()
                .filter_map(|row| row.field_value(field).numeric())
                .map(|n| n.to_f64())
                .sum();
            (field.to_string(), total)
        })
        .collect();

    Aggregates { totals }
}
