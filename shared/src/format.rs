//! Display formatting for metric values

use crate::validation::finite;

/// How a metric value is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFormat {
    /// `$12,345`
    Currency,
    /// `12.3%`, input already in percent units
    Percent,
    /// `$12.3K` / `$1.2M`
    CompactCurrency,
}

impl MetricFormat {
    pub fn apply(&self, value: f64) -> String {
        match self {
            MetricFormat::Currency => format_currency(value),
            MetricFormat::Percent => format_percent(value),
            MetricFormat::CompactCurrency => format_compact_currency(value),
        }
    }
}

/// Whole-dollar currency with thousands separators
pub fn format_currency(value: f64) -> String {
    let rounded = finite(value).round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(rounded.abs() as u64))
}

/// One decimal place percent
pub fn format_percent(value: f64) -> String {
    let mut rounded = (finite(value) * 10.0).round() / 10.0;
    if rounded == 0.0 {
        // drop the sign of -0.0
        rounded = 0.0;
    }
    format!("{:.1}%", rounded)
}

/// Abbreviated currency for large amounts
pub fn format_compact_currency(value: f64) -> String {
    let v = finite(value).round();
    let abs = v.abs();
    let sign = if v < 0.0 { "-" } else { "" };

    if abs < 1_000.0 {
        return format_currency(v);
    }

    let thousands = (abs / 100.0).round() / 10.0;
    if thousands < 1_000.0 {
        return format!("{}${:.1}K", sign, thousands);
    }

    let millions = (abs / 100_000.0).round() / 10.0;
    format!("{}${:.1}M", sign, millions)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
