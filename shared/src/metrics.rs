//! Per-strategy metric builders
//!
//! Each builder turns a raw [`StrategyResult`] into a fixed-order list of
//! formatted metrics. The order is the on-screen layout order. Thresholds are
//! hand-tuned per strategy and metric:
//!
//! | strategy   | metric                 | format  | positive when |
//! |------------|------------------------|---------|---------------|
//! | LTR        | Monthly Cash Flow      | $       | > 0           |
//! |            | Cash-on-Cash           | %       | >= 8          |
//! |            | Cap Rate               | %       | >= 6          |
//! |            | Annual NOI             | $K      | > 0           |
//! |            | Cash Needed            | $K      | <= 100,000    |
//! | STR        | Monthly Cash Flow      | $       | > 0           |
//! |            | Cash-on-Cash           | %       | >= 10         |
//! |            | Annual Revenue         | $K      | > 0           |
//! |            | Occupancy              | %       | >= 65         |
//! |            | Breakeven Occupancy    | %       | <= 60         |
//! |            | Cap Rate               | %       | >= 7          |
//! | BRRRR      | Cash Left in Deal      | $K      | <= 10,000     |
//! |            | Cash Recovered         | %       | >= 90         |
//! |            | Equity Captured        | $K      | > 0           |
//! |            | Refinance Loan         | $K      | > 0           |
//! |            | Monthly Cash Flow      | $       | > 0           |
//! |            | Cash-on-Cash           | %       | >= 12         |
//! | Flip       | Net Profit             | $K      | >= 25,000     |
//! |            | ROI                    | %       | >= 20         |
//! |            | Annualized ROI         | %       | >= 50         |
//! |            | Profit Margin          | %       | >= 10         |
//! |            | Holding Costs          | $       | <= 15,000     |
//! | House Hack | Effective Housing Cost | $       | <= 1,500      |
//! |            | Monthly Savings        | $       | > 0           |
//! |            | Rental Income          | $       | > 0           |
//! |            | Monthly Cash Flow      | $       | >= 0          |
//! |            | Cash-on-Cash           | %       | >= 5          |
//! |            | Cash Needed            | $K      | <= 50,000     |
//! | Wholesale  | Assignment Fee         | $       | >= 5,000      |
//! |            | ROI on EMD             | %       | >= 500        |
//! |            | Net Profit             | $       | > 0           |
//! |            | Investor Profit        | $K      | >= 25,000     |
//! |            | Investor ROI           | %       | >= 15         |
//! |            | Cash at Risk           | $       | <= 5,000      |

use serde::{Deserialize, Serialize};

use crate::format::MetricFormat;
use crate::format::MetricFormat::{CompactCurrency, Currency, Percent};
use crate::types::{MetricDef, StrategyId, StrategyResult};

use self::Threshold::{Above, AtLeast, AtMost};

/// Message rendered when there is nothing to show
pub const NO_ANALYSIS_DATA: &str = "No analysis data available";

/// Classification rule for a metric
#[derive(Debug, Clone, Copy, PartialEq)]
enum Threshold {
    Above(f64),
    AtLeast(f64),
    AtMost(f64),
}

impl Threshold {
    fn is_positive(&self, value: f64) -> bool {
        match *self {
            Threshold::Above(t) => value > t,
            Threshold::AtLeast(t) => value >= t,
            Threshold::AtMost(t) => value <= t,
        }
    }
}

struct MetricRow {
    label: &'static str,
    key: &'static str,
    format: MetricFormat,
    threshold: Threshold,
}

const fn row(label: &'static str, key: &'static str, format: MetricFormat, threshold: Threshold) -> MetricRow {
    MetricRow {
        label,
        key,
        format,
        threshold,
    }
}

const LTR_METRICS: &[MetricRow] = &[
    row("Monthly Cash Flow", "monthly_cash_flow", Currency, Above(0.0)),
    row("Cash-on-Cash", "cash_on_cash", Percent, AtLeast(8.0)),
    row("Cap Rate", "cap_rate", Percent, AtLeast(6.0)),
    row("Annual NOI", "noi", CompactCurrency, Above(0.0)),
    row("Cash Needed", "total_cash_needed", CompactCurrency, AtMost(100_000.0)),
];

const STR_METRICS: &[MetricRow] = &[
    row("Monthly Cash Flow", "monthly_cash_flow", Currency, Above(0.0)),
    row("Cash-on-Cash", "cash_on_cash", Percent, AtLeast(10.0)),
    row("Annual Revenue", "gross_revenue", CompactCurrency, Above(0.0)),
    row("Occupancy", "occupancy_rate", Percent, AtLeast(65.0)),
    row("Breakeven Occupancy", "break_even_occupancy", Percent, AtMost(60.0)),
    row("Cap Rate", "cap_rate", Percent, AtLeast(7.0)),
];

const BRRRR_METRICS: &[MetricRow] = &[
    row("Cash Left in Deal", "cash_left_in_deal", CompactCurrency, AtMost(10_000.0)),
    row("Cash Recovered", "cash_recovered_pct", Percent, AtLeast(90.0)),
    row("Equity Captured", "equity_captured", CompactCurrency, Above(0.0)),
    row("Refinance Loan", "refinance_loan_amount", CompactCurrency, Above(0.0)),
    row("Monthly Cash Flow", "monthly_cash_flow", Currency, Above(0.0)),
    row("Cash-on-Cash", "cash_on_cash", Percent, AtLeast(12.0)),
];

const FLIP_METRICS: &[MetricRow] = &[
    row("Net Profit", "net_profit", CompactCurrency, AtLeast(25_000.0)),
    row("ROI", "roi", Percent, AtLeast(20.0)),
    row("Annualized ROI", "annualized_roi", Percent, AtLeast(50.0)),
    row("Profit Margin", "profit_margin", Percent, AtLeast(10.0)),
    row("Holding Costs", "holding_costs", Currency, AtMost(15_000.0)),
];

const HOUSE_HACK_METRICS: &[MetricRow] = &[
    row("Effective Housing Cost", "effective_housing_cost", Currency, AtMost(1_500.0)),
    row("Monthly Savings", "housing_savings", Currency, Above(0.0)),
    row("Rental Income", "rental_income", Currency, Above(0.0)),
    row("Monthly Cash Flow", "monthly_cash_flow", Currency, AtLeast(0.0)),
    row("Cash-on-Cash", "cash_on_cash", Percent, AtLeast(5.0)),
    row("Cash Needed", "total_cash_needed", CompactCurrency, AtMost(50_000.0)),
];

const WHOLESALE_METRICS: &[MetricRow] = &[
    row("Assignment Fee", "assignment_fee", Currency, AtLeast(5_000.0)),
    row("ROI on EMD", "roi_on_emd", Percent, AtLeast(500.0)),
    row("Net Profit", "net_profit", Currency, Above(0.0)),
    row("Investor Profit", "investor_profit", CompactCurrency, AtLeast(25_000.0)),
    row("Investor ROI", "investor_roi", Percent, AtLeast(15.0)),
    row("Cash at Risk", "total_cash_at_risk", Currency, AtMost(5_000.0)),
];

fn build_from(rows: &[MetricRow], result: &StrategyResult) -> Vec<MetricDef> {
    rows.iter()
        .map(|row| {
            let value = result.number(row.key);
            MetricDef::new(row.label, row.format.apply(value), row.threshold.is_positive(value))
        })
        .collect()
}

pub fn build_ltr_metrics(result: &StrategyResult) -> Vec<MetricDef> {
    build_from(LTR_METRICS, result)
}

pub fn build_str_metrics(result: &StrategyResult) -> Vec<MetricDef> {
    build_from(STR_METRICS, result)
}

pub fn build_brrrr_metrics(result: &StrategyResult) -> Vec<MetricDef> {
    build_from(BRRRR_METRICS, result)
}

pub fn build_flip_metrics(result: &StrategyResult) -> Vec<MetricDef> {
    build_from(FLIP_METRICS, result)
}

pub fn build_house_hack_metrics(result: &StrategyResult) -> Vec<MetricDef> {
    build_from(HOUSE_HACK_METRICS, result)
}

pub fn build_wholesale_metrics(result: &StrategyResult) -> Vec<MetricDef> {
    build_from(WHOLESALE_METRICS, result)
}

pub type MetricBuilder = fn(&StrategyResult) -> Vec<MetricDef>;

/// Builder for a strategy
pub fn builder_for(strategy: StrategyId) -> MetricBuilder {
    match strategy {
        StrategyId::Ltr => build_ltr_metrics,
        StrategyId::Str => build_str_metrics,
        StrategyId::Brrrr => build_brrrr_metrics,
        StrategyId::Flip => build_flip_metrics,
        StrategyId::HouseHack => build_house_hack_metrics,
        StrategyId::Wholesale => build_wholesale_metrics,
    }
}

/// Metrics ready for display, or an explicit empty state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "metrics", rename_all = "snake_case")]
pub enum StrategyMetrics {
    Available(Vec<MetricDef>),
    NoData,
}

impl StrategyMetrics {
    pub fn metrics(&self) -> &[MetricDef] {
        match self {
            StrategyMetrics::Available(metrics) => metrics,
            StrategyMetrics::NoData => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, StrategyMetrics::Available(_))
    }

    /// Text for the empty state, if this is one
    pub fn empty_message(&self) -> Option<&'static str> {
        match self {
            StrategyMetrics::Available(_) => None,
            StrategyMetrics::NoData => Some(NO_ANALYSIS_DATA),
        }
    }
}

/// Build the metric list for a strategy result
pub fn build_metrics(strategy: StrategyId, result: Option<&StrategyResult>) -> StrategyMetrics {
    match result {
        Some(result) if !result.is_empty() => StrategyMetrics::Available(builder_for(strategy)(result)),
        _ => StrategyMetrics::NoData,
    }
}
