//! Terminal table rendering.
//!
//! Columns follow the schema's field order. Widths are measured in terminal
//! columns (not bytes or chars), so logins and names with wide characters
//! still line up. Over-long cells are cut with an ellipsis.

use console::style;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use wagerdesk_query::{Aggregates, FieldKind, Number, Row, Schema, Value};

use crate::controller::ReportView;

/// Widest a column may grow before its cells are truncated.
pub const MAX_COLUMN_WIDTH: usize = 32;

const GAP: &str = "  ";

/// Truncates a string to fit within a maximum display width, adding `…`
/// when cut.
///
/// ```rust
/// use wagerdesk::table::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Hello", 10), "Hello");
/// assert_eq!(truncate_to_width("Hello World", 6), "Hello…");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    let limit = max_width.saturating_sub(1);

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn pad_to_width(s: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(s.width()));
    if right_align {
        format!("{fill}{s}")
    } else {
        format!("{s}{fill}")
    }
}

/// Cell text for a field value. Fractional numbers get two decimals.
pub fn cell_text(value: &Value<'_>) -> String {
    match value {
        Value::Number(Number::F64(f)) if f.fract() != 0.0 => format!("{f:.2}"),
        other => other.to_text().into_owned(),
    }
}

/// Plain rows of cells, ready for layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    /// Which columns hold numbers, and so align right.
    pub numeric: Vec<bool>,
    pub rows: Vec<Vec<String>>,
    pub footer: Option<Vec<String>>,
}

impl Table {
    /// Lays out rows under the schema's columns.
    pub fn from_rows<T: Row>(schema: &Schema, rows: &[&T]) -> Self {
        let headers: Vec<String> = schema.column_names().map(str::to_string).collect();
        let numeric = schema
            .fields
            .iter()
            .map(|f| f.kind == FieldKind::Number)
            .collect();
        let rows = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|h| cell_text(&row.field_value(h)))
                    .collect()
            })
            .collect();
        Table {
            headers,
            numeric,
            rows,
            footer: None,
        }
    }

    /// Adds a totals line: `Total` in the first column, sums under their
    /// columns.
    pub fn with_totals(mut self, totals: &Aggregates) -> Self {
        if totals.is_empty() || self.headers.is_empty() {
            return self;
        }
        let mut footer: Vec<String> = self
            .headers
            .iter()
            .map(|h| totals.get(h).map(|t| format!("{t:.2}")).unwrap_or_default())
            .collect();
        if footer[0].is_empty() {
            footer[0] = "Total".to_string();
        }
        self.footer = Some(footer);
        self
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for line in self.rows.iter().chain(self.footer.iter()) {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.width());
            }
        }
        widths
            .into_iter()
            .map(|w| w.min(MAX_COLUMN_WIDTH))
            .collect()
    }

    fn line(&self, cells: &[String], widths: &[usize]) -> String {
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, &width))| {
                let right = self.numeric.get(i).copied().unwrap_or(false);
                pad_to_width(&truncate_to_width(cell, width), width, right)
            })
            .collect::<Vec<_>>()
            .join(GAP)
            .trim_end()
            .to_string()
    }

    /// Renders the table. Styling is applied only when the terminal
    /// supports it.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = Vec::with_capacity(self.rows.len() + 4);

        out.push(style(self.line(&self.headers, &widths)).bold().to_string());
        out.push(
            widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join(GAP),
        );
        if self.rows.is_empty() {
            out.push(style("No data").dim().to_string());
        }
        for row in &self.rows {
            out.push(self.line(row, &widths));
        }
        if let Some(footer) = &self.footer {
            out.push(style(self.line(footer, &widths)).bold().to_string());
        }
        out.join("\n")
    }
}

/// Renders a report page: the table, its totals and a page line.
pub fn render_view<T: Row>(view: &ReportView<'_, T>) -> String {
    let result = &view.result;
    let table = Table::from_rows(view.schema, result.items()).with_totals(result.aggregates());
    format!(
        "{}\n{}",
        table.render(),
        style(format!(
            "Page {} of {} · {} rows",
            result.page_index(),
            result.total_pages(),
            result.total_count()
        ))
        .dim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagerdesk_query::aggregate;

    struct Player {
        login: &'static str,
        balance: f64,
    }

    impl Row for Player {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "login" => Value::Text(self.login),
                "balance" => Value::Number(Number::F64(self.balance)),
                _ => Value::None,
            }
        }
    }

    fn schema() -> Schema {
        Schema::new("players")
            .field("login", FieldKind::Text)
            .field("balance", FieldKind::Number)
            .totals(["balance"])
    }

    fn plain(text: &str) -> String {
        console::strip_ansi_codes(text).into_owned()
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("Hello", 5), "Hello");
        assert_eq!(truncate_to_width("123456", 5), "1234…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("", 3), "");
    }

    #[test]
    fn numbers_align_right_with_totals() {
        let rows = vec![
            Player { login: "alice", balance: 1200.0 },
            Player { login: "bob", balance: 35.5 },
        ];
        let refs: Vec<&Player> = rows.iter().collect();
        let table = Table::from_rows(&schema(), &refs).with_totals(&aggregate(&rows, &["balance"]));
        let text = plain(&table.render());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "login  balance");
        assert_eq!(lines[2], "alice     1200");
        assert_eq!(lines[3], "bob      35.50");
        assert_eq!(lines[4], "Total  1235.50");
    }

    #[test]
    fn empty_table_says_no_data() {
        let refs: Vec<&Player> = Vec::new();
        let text = plain(&Table::from_rows(&schema(), &refs).render());
        assert!(text.contains("No data"));
    }

    #[test]
    fn fractional_numbers_get_two_decimals() {
        assert_eq!(cell_text(&Value::Number(Number::F64(2.5))), "2.50");
        assert_eq!(cell_text(&Value::Number(Number::F64(3.0))), "3");
        assert_eq!(cell_text(&Value::Number(Number::U64(7))), "7");
        assert_eq!(cell_text(&Value::None), "");
    }
}
