//! Financing and operating assumptions
//!
//! Values resolve through four layers, lowest precedence first:
//! system defaults, market-region adjustments, user overrides and per-deal
//! overrides. A missing (or non-finite) value at one layer falls through to
//! the layer below it.

use serde::{Deserialize, Serialize};

use crate::validation::{clamp_fraction, finite, non_negative};

/// Fully resolved assumption bundle. All percentages are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssumptionSet {
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub closing_costs_pct: f64,
    pub vacancy_rate: f64,
    pub maintenance_pct: f64,
    pub management_pct: f64,
    pub pmi_rate: f64,
    pub selling_costs_pct: f64,
    pub holding_period_months: u32,
    pub buy_discount_pct: f64,
    pub capex_pct: f64,
    pub renovation_budget_pct: f64,
    /// Loan-to-value the refinance lender offers against ARV (BRRRR)
    pub refinance_ltv: f64,
    /// Share of ARV an end buyer will pay before rehab (wholesale 70% rule)
    pub max_offer_arv_pct: f64,
    pub utilities_monthly: f64,
    /// Platform fees, cleaning and supplies as a share of STR revenue
    pub str_operating_pct: f64,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        Self {
            down_payment_pct: 0.20,
            interest_rate: 0.06,
            loan_term_years: 30,
            closing_costs_pct: 0.03,
            vacancy_rate: 0.01,
            maintenance_pct: 0.05,
            management_pct: 0.0,
            pmi_rate: 0.005,
            selling_costs_pct: 0.06,
            holding_period_months: 6,
            buy_discount_pct: 0.05,
            capex_pct: 0.05,
            renovation_budget_pct: 0.05,
            refinance_ltv: 0.75,
            max_offer_arv_pct: 0.70,
            utilities_monthly: 0.0,
            str_operating_pct: 0.15,
        }
    }
}

impl AssumptionSet {
    /// Share of the purchase price financed
    pub fn loan_to_value(&self) -> f64 {
        1.0 - clamp_fraction(self.down_payment_pct)
    }

    /// Apply one override layer on top of this set
    pub fn apply(&self, overrides: &AssumptionOverrides) -> Self {
        let pick = |base: f64, over: Option<f64>| over.filter(|v| v.is_finite()).unwrap_or(base);
        Self {
            down_payment_pct: pick(self.down_payment_pct, overrides.down_payment_pct),
            interest_rate: pick(self.interest_rate, overrides.interest_rate),
            loan_term_years: overrides.loan_term_years.unwrap_or(self.loan_term_years),
            closing_costs_pct: pick(self.closing_costs_pct, overrides.closing_costs_pct),
            vacancy_rate: pick(self.vacancy_rate, overrides.vacancy_rate),
            maintenance_pct: pick(self.maintenance_pct, overrides.maintenance_pct),
            management_pct: pick(self.management_pct, overrides.management_pct),
            pmi_rate: pick(self.pmi_rate, overrides.pmi_rate),
            selling_costs_pct: pick(self.selling_costs_pct, overrides.selling_costs_pct),
            holding_period_months: overrides
                .holding_period_months
                .unwrap_or(self.holding_period_months),
            buy_discount_pct: pick(self.buy_discount_pct, overrides.buy_discount_pct),
            capex_pct: pick(self.capex_pct, overrides.capex_pct),
            renovation_budget_pct: pick(self.renovation_budget_pct, overrides.renovation_budget_pct),
            refinance_ltv: pick(self.refinance_ltv, overrides.refinance_ltv),
            max_offer_arv_pct: pick(self.max_offer_arv_pct, overrides.max_offer_arv_pct),
            utilities_monthly: pick(self.utilities_monthly, overrides.utilities_monthly),
            str_operating_pct: pick(self.str_operating_pct, overrides.str_operating_pct),
        }
    }

    /// Copy with every field coerced into its valid range
    pub fn sanitized(&self) -> Self {
        Self {
            down_payment_pct: clamp_fraction(self.down_payment_pct),
            interest_rate: clamp_fraction(self.interest_rate),
            loan_term_years: self.loan_term_years.max(1),
            closing_costs_pct: clamp_fraction(self.closing_costs_pct),
            vacancy_rate: clamp_fraction(self.vacancy_rate),
            maintenance_pct: clamp_fraction(self.maintenance_pct),
            management_pct: clamp_fraction(self.management_pct),
            pmi_rate: clamp_fraction(self.pmi_rate),
            selling_costs_pct: clamp_fraction(self.selling_costs_pct),
            holding_period_months: self.holding_period_months,
            buy_discount_pct: clamp_fraction(self.buy_discount_pct),
            capex_pct: clamp_fraction(self.capex_pct),
            renovation_budget_pct: clamp_fraction(self.renovation_budget_pct),
            refinance_ltv: clamp_fraction(self.refinance_ltv),
            max_offer_arv_pct: clamp_fraction(self.max_offer_arv_pct),
            utilities_monthly: non_negative(self.utilities_monthly),
            str_operating_pct: clamp_fraction(finite(self.str_operating_pct)),
        }
    }
}

/// One partial layer of assumptions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssumptionOverrides {
    pub down_payment_pct: Option<f64>,
    pub interest_rate: Option<f64>,
    pub loan_term_years: Option<u32>,
    pub closing_costs_pct: Option<f64>,
    pub vacancy_rate: Option<f64>,
    pub maintenance_pct: Option<f64>,
    pub management_pct: Option<f64>,
    pub pmi_rate: Option<f64>,
    pub selling_costs_pct: Option<f64>,
    pub holding_period_months: Option<u32>,
    pub buy_discount_pct: Option<f64>,
    pub capex_pct: Option<f64>,
    pub renovation_budget_pct: Option<f64>,
    pub refinance_ltv: Option<f64>,
    pub max_offer_arv_pct: Option<f64>,
    pub utilities_monthly: Option<f64>,
    pub str_operating_pct: Option<f64>,
}

impl AssumptionOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The override layers above the system defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssumptionLayers {
    pub market: AssumptionOverrides,
    pub user: AssumptionOverrides,
    pub deal: AssumptionOverrides,
}

impl AssumptionLayers {
    /// Resolve market < user < deal over the given defaults
    pub fn resolve(&self, defaults: &AssumptionSet) -> AssumptionSet {
        defaults
            .apply(&self.market)
            .apply(&self.user)
            .apply(&self.deal)
            .sanitized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layers_win() {
        let layers = AssumptionLayers {
            market: AssumptionOverrides {
                interest_rate: Some(0.065),
                vacancy_rate: Some(0.05),
                ..Default::default()
            },
            user: AssumptionOverrides {
                interest_rate: Some(0.07),
                ..Default::default()
            },
            deal: AssumptionOverrides {
                interest_rate: Some(0.055),
                down_payment_pct: Some(0.25),
                ..Default::default()
            },
        };

        let resolved = layers.resolve(&AssumptionSet::default());
        assert_eq!(resolved.interest_rate, 0.055);
        assert_eq!(resolved.vacancy_rate, 0.05);
        assert_eq!(resolved.down_payment_pct, 0.25);
        assert_eq!(resolved.loan_term_years, 30);
    }

    #[test]
    fn missing_and_non_finite_values_fall_through() {
        let layers = AssumptionLayers {
            market: AssumptionOverrides {
                maintenance_pct: Some(0.08),
                ..Default::default()
            },
            user: AssumptionOverrides {
                maintenance_pct: Some(f64::NAN),
                ..Default::default()
            },
            deal: AssumptionOverrides::default(),
        };

        assert_eq!(layers.resolve(&AssumptionSet::default()).maintenance_pct, 0.08);
    }

    #[test]
    fn resolve_clamps_out_of_range_values() {
        let layers = AssumptionLayers {
            deal: AssumptionOverrides {
                down_payment_pct: Some(1.5),
                vacancy_rate: Some(-0.2),
                loan_term_years: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };

        let resolved = layers.resolve(&AssumptionSet::default());
        assert_eq!(resolved.down_payment_pct, 1.0);
        assert_eq!(resolved.vacancy_rate, 0.0);
        assert_eq!(resolved.loan_term_years, 1);
        assert_eq!(resolved.loan_to_value(), 0.0);
    }

    #[test]
    fn overrides_deserialize_partially() {
        let overrides: AssumptionOverrides =
            serde_json::from_str(r#"{"interestRate": 0.0725, "loanTermYears": 15}"#).unwrap();
        assert_eq!(overrides.interest_rate, Some(0.0725));
        assert_eq!(overrides.loan_term_years, Some(15));
        assert!(overrides.down_payment_pct.is_none());
        assert!(AssumptionOverrides::default().is_empty());
    }
}
