//! Mortgage amortization math

use crate::validation::{finite, non_negative};

/// Annual payment per dollar of loan principal.
///
/// `r = rate / 12`, `n = years * 12`, constant `= r(1+r)^n / ((1+r)^n - 1) * 12`.
/// A non-positive rate amortizes straight-line (`1 / years`) and a
/// non-positive term is treated as a one-year loan.
pub fn mortgage_constant(interest_rate: f64, loan_term_years: f64) -> f64 {
    let years = if finite(loan_term_years) > 0.0 {
        loan_term_years
    } else {
        1.0
    };
    let rate = non_negative(interest_rate);

    if rate <= 0.0 {
        return 1.0 / years;
    }

    let r = rate / 12.0;
    let n = years * 12.0;
    let growth = (1.0 + r).powf(n);
    if !growth.is_finite() || growth - 1.0 <= 0.0 {
        return 1.0 / years;
    }

    (r * growth / (growth - 1.0)) * 12.0
}

/// Monthly principal and interest payment
pub fn monthly_payment(principal: f64, interest_rate: f64, loan_term_years: f64) -> f64 {
    annual_debt_service(principal, interest_rate, loan_term_years) / 12.0
}

/// Annual principal and interest payments
pub fn annual_debt_service(principal: f64, interest_rate: f64, loan_term_years: f64) -> f64 {
    non_negative(principal) * mortgage_constant(interest_rate, loan_term_years)
}
