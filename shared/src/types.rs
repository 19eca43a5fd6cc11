//! Common types used across the engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::validation::value_to_finite;

/// Investment strategy identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    Ltr,
    Str,
    Brrrr,
    Flip,
    HouseHack,
    Wholesale,
}

impl StrategyId {
    pub const ALL: [StrategyId; 6] = [
        StrategyId::Ltr,
        StrategyId::Str,
        StrategyId::Brrrr,
        StrategyId::Flip,
        StrategyId::HouseHack,
        StrategyId::Wholesale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Ltr => "ltr",
            StrategyId::Str => "str",
            StrategyId::Brrrr => "brrrr",
            StrategyId::Flip => "flip",
            StrategyId::HouseHack => "house_hack",
            StrategyId::Wholesale => "wholesale",
        }
    }

    /// Case-insensitive lookup by route name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltr" => Some(StrategyId::Ltr),
            "str" => Some(StrategyId::Str),
            "brrrr" => Some(StrategyId::Brrrr),
            "flip" => Some(StrategyId::Flip),
            "house_hack" | "househack" => Some(StrategyId::HouseHack),
            "wholesale" => Some(StrategyId::Wholesale),
            _ => None,
        }
    }

    /// Human readable strategy name
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyId::Ltr => "Long-Term Rental",
            StrategyId::Str => "Short-Term Rental",
            StrategyId::Brrrr => "BRRRR",
            StrategyId::Flip => "Fix & Flip",
            StrategyId::HouseHack => "House Hack",
            StrategyId::Wholesale => "Wholesale",
        }
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Financing program for owner-occupied purchases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    #[default]
    Conventional,
    Fha,
    Va,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Conventional => "conventional",
            LoanType::Fha => "fha",
            LoanType::Va => "va",
        }
    }

    /// Minimum down payment fraction the program allows
    pub fn min_down_payment_pct(&self) -> f64 {
        match self {
            LoanType::Conventional => 0.05,
            LoanType::Fha => 0.035,
            LoanType::Va => 0.0,
        }
    }

    /// Annual mortgage insurance rate charged by the program
    pub fn mortgage_insurance_rate(&self) -> f64 {
        match self {
            LoanType::Conventional => 0.005,
            LoanType::Fha => 0.0055,
            LoanType::Va => 0.0,
        }
    }
}

/// A single display metric. The value is already formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDef {
    pub label: String,
    pub value: String,
    pub positive: bool,
}

impl MetricDef {
    pub fn new(label: impl Into<String>, value: impl Into<String>, positive: bool) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            positive,
        }
    }
}

/// Flat numeric record returned by the calculation endpoint.
///
/// The field set depends on the strategy and may be partial, so values are
/// kept as raw JSON and coerced on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyResult(BTreeMap<String, serde_json::Value>);

impl StrategyResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finite value of a field, `0` when missing or not numeric
    pub fn number(&self, key: &str) -> f64 {
        self.0.get(key).map(value_to_finite).unwrap_or(0.0)
    }

    /// Raw value, if the backend sent one
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, serde_json::Value)> for StrategyResult {
    fn from_iter<T: IntoIterator<Item = (String, serde_json::Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strategy_id_round_trips_through_str() {
        for id in StrategyId::ALL {
            assert_eq!(StrategyId::parse(id.as_str()), Some(id));
        }
        assert_eq!(StrategyId::parse("HOUSE_HACK"), Some(StrategyId::HouseHack));
        assert_eq!(StrategyId::parse("condo"), None);
    }

    #[test]
    fn strategy_id_parse_accepts_aliases() {
        assert_eq!(StrategyId::parse("  ltr "), Some(StrategyId::Ltr));
        assert_eq!(StrategyId::parse("HouseHack"), Some(StrategyId::HouseHack));
        assert_eq!(StrategyId::parse(""), None);
    }

    #[test]
    fn strategy_id_serializes_snake_case() {
        assert_eq!(serde_json::to_value(StrategyId::HouseHack).unwrap(), json!("house_hack"));
    }

    #[test]
    fn loan_type_minimums() {
        assert_eq!(LoanType::Fha.min_down_payment_pct(), 0.035);
        assert_eq!(LoanType::Va.min_down_payment_pct(), 0.0);
        assert!(LoanType::Conventional.min_down_payment_pct() > LoanType::Fha.min_down_payment_pct());
    }

    #[test]
    fn strategy_result_coerces_missing_and_garbage() {
        let result: StrategyResult = serde_json::from_value(json!({
            "cash_on_cash": 9.5,
            "cap_rate": null,
            "dscr": "1.3",
            "note": "n/a"
        }))
        .unwrap();

        assert_eq!(result.number("cash_on_cash"), 9.5);
        assert_eq!(result.number("cap_rate"), 0.0);
        assert_eq!(result.number("dscr"), 1.3);
        assert_eq!(result.number("note"), 0.0);
        assert_eq!(result.number("missing"), 0.0);
        assert_eq!(result.len(), 4);
    }
}
