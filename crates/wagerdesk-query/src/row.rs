//! The [`Row`] trait: named-field access for report rows.

use crate::value::Value;

/// Trait for types that can flow through the query pipeline.
///
/// Typed report rows implement this by matching on the field name; the
/// dynamic [`Record`](crate::Record) implements it over its own map.
///
/// ```
/// use wagerdesk_query::{Row, Value, Number};
///
/// struct Deposit {
///     login: String,
///     amount: i64,
/// }
///
/// impl Row for Deposit {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "login" => Value::Text(&self.login),
///             "amount" => Value::Number(Number::I64(self.amount)),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Row {
    /// Returns the value of a field, or [`Value::None`] if the row has no
    /// such field.
    fn field_value(&self, field: &str) -> Value<'_>;
}

impl<T: Row + ?Sized> Row for &T {
    fn field_value(&self, field: &str) -> Value<'_> {
        (**self).field_value(field)
    }
}
