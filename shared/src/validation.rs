//! Input sanitization and validation
//!
//! Every number that reaches a formula passes through here first. Coercion
//! never fails: non-finite values become a safe default so that NaN and
//! Infinity can never reach the display layer.

use serde_json::Value;

use crate::types::LoanType;

// ============================================================================
// Coercion
// ============================================================================

/// Finite value of an optional number, `0` for `None`, NaN and ±Infinity
pub fn to_finite_number(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// `0` for NaN and ±Infinity, the value otherwise
pub fn finite(value: f64) -> f64 {
    to_finite_number(Some(value))
}

/// `None` for missing or non-finite values
pub fn finite_or_none(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Coerce a raw JSON value. Numbers and numeric strings pass through,
/// everything else becomes `0`.
pub fn value_to_finite(value: &Value) -> f64 {
    match value {
        Value::Number(n) => to_finite_number(n.as_f64()),
        Value::String(s) => to_finite_number(s.trim().parse::<f64>().ok()),
        _ => 0.0,
    }
}

/// Finite and non-negative
pub fn non_negative(value: f64) -> f64 {
    finite(value).max(0.0)
}

/// Finite and clamped to `[0, 1]`
pub fn clamp_fraction(value: f64) -> f64 {
    finite(value).clamp(0.0, 1.0)
}

/// Read a rate that may arrive either as a fraction or as a percent
/// (`0.72` and `72` both mean 72%).
pub fn normalize_rate(value: f64) -> f64 {
    let v = non_negative(value);
    if v > 1.0 {
        (v / 100.0).min(1.0)
    } else {
        v
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a fraction lies in `[0, 1]`
pub fn validate_fraction(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() {
        return Err("Value must be a finite number");
    }
    if !(0.0..=1.0).contains(&value) {
        return Err("Percentage must be between 0% and 100%");
    }
    Ok(())
}

/// Validate a loan term in years
pub fn validate_loan_term(years: u32) -> Result<(), &'static str> {
    if years == 0 {
        return Err("Loan term must be at least 1 year");
    }
    if years > 40 {
        return Err("Loan term cannot exceed 40 years");
    }
    Ok(())
}

/// Validate a down payment against the loan program minimum
pub fn validate_down_payment(loan_type: LoanType, down_payment_pct: f64) -> Result<(), &'static str> {
    validate_fraction(down_payment_pct)?;
    if down_payment_pct < loan_type.min_down_payment_pct() {
        return Err("Down payment is below the loan program minimum");
    }
    Ok(())
}

/// Validate a listing price is usable for gap calculations
pub fn validate_list_price(list_price: f64) -> Result<(), &'static str> {
    if !list_price.is_finite() || list_price <= 0.0 {
        return Err("List price must be a positive amount");
    }
    Ok(())
}
