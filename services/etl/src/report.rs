//! Terminal rendering for query results.

use crate::query::TopN;
use chrono::NaiveDate;

/// Format a count with thousands separators
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_value(value: Option<i64>) -> String {
    value.map(format_count).unwrap_or_else(|| "n/a".to_string())
}

/// `total_cases` -> `Total Cases`
pub fn title_case(column: &str) -> String {
    column
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn render_top_n(n: u32, metric: &str, top: &TopN) -> String {
    let mut out = format!("\nTop {} countries by '{}' from table '{}':\n", n, metric, top.table);
    out.push_str(&format!("{:<4} | {:<15} | {}\n", "Rank", "Country", title_case(metric)));
    out.push_str(&format!("{:-<43}\n", ""));
    for (idx, (country, value)) in top.rows.iter().enumerate() {
        out.push_str(&format!("{:<4} | {:<15} | {}\n", idx + 1, country, format_value(*value)));
    }
    out
}

pub fn render_trend(metric: &str, rows: &[(NaiveDate, Option<i64>)]) -> String {
    let mut out = format!("{:<10} | {}\n", "Date", metric);
    out.push_str(&format!("{:-<30}\n", ""));
    for (day, value) in rows {
        out.push_str(&format!("{} | {}\n", day.format("%Y-%m-%d"), format_value(*value)));
    }
    out
}

pub fn render_max(column: &str, country: &str, value: i64) -> String {
    format!("Max {} in {}: {}", column, country, format_count(value))
}
