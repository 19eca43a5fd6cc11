use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{into_patch, set_known, InputPatch, StrategyConfig};
use crate::breakeven::calculate_buy_price_for;
use crate::models::{AssumptionSet, SavedProperty, DEFAULT_STR_OCCUPANCY};
use crate::types::StrategyId;
use crate::validation::{finite, non_negative, normalize_rate, value_to_finite};

/// Furnishing budget per square foot when a listing gives its size
const FURNISHING_PER_SQFT: f64 = 10.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrInputs {
    pub purchase_price: f64,
    pub list_price: f64,
    pub average_daily_rate: f64,
    pub occupancy_rate: f64,
    pub property_taxes_annual: f64,
    pub insurance_annual: f64,
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub closing_costs_pct: f64,
    pub furnishing_budget: f64,
    pub platform_fees_pct: f64,
    pub maintenance_pct: f64,
    pub management_pct: f64,
    pub utilities_monthly: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StrWorksheet {
    assumptions: AssumptionSet,
}

impl StrWorksheet {
    pub fn new(assumptions: AssumptionSet) -> Self {
        Self { assumptions }
    }
}

impl StrategyConfig for StrWorksheet {
    type Inputs = StrInputs;

    fn strategy(&self) -> StrategyId {
        StrategyId::Str
    }

    fn default_inputs(&self) -> StrInputs {
        let a = &self.assumptions;
        StrInputs {
            purchase_price: 0.0,
            list_price: 0.0,
            average_daily_rate: 0.0,
            occupancy_rate: DEFAULT_STR_OCCUPANCY,
            property_taxes_annual: 0.0,
            insurance_annual: 0.0,
            down_payment_pct: a.down_payment_pct,
            interest_rate: a.interest_rate,
            loan_term_years: a.loan_term_years,
            closing_costs_pct: a.closing_costs_pct,
            furnishing_budget: 0.0,
            platform_fees_pct: a.str_operating_pct,
            maintenance_pct: a.maintenance_pct,
            management_pct: a.management_pct,
            utilities_monthly: a.utilities_monthly,
        }
    }

    fn initialize_from_property(&self, property: &SavedProperty, _defaults: &StrInputs) -> InputPatch {
        let facts = property.facts();
        let mut patch = InputPatch::new();
        if facts.list_price > 0.0 {
            patch.insert(
                "purchase_price".into(),
                json!(calculate_buy_price_for(StrategyId::Str, &facts, &self.assumptions)),
            );
            patch.insert("list_price".into(), json!(facts.list_price));
        }
        set_known(&mut patch, "average_daily_rate", facts.average_daily_rate);
        set_known(&mut patch, "occupancy_rate", facts.occupancy_rate);
        set_known(&mut patch, "property_taxes_annual", property.property_taxes);
        set_known(&mut patch, "insurance_annual", property.insurance);
        set_known(
            &mut patch,
            "furnishing_budget",
            facts.square_footage.map(|sqft| (sqft * FURNISHING_PER_SQFT).round()),
        );
        patch
    }

    fn build_payload(&self, inputs: &StrInputs) -> Value {
        json!({
            "purchase_price": non_negative(inputs.purchase_price),
            "list_price": non_negative(inputs.list_price),
            "average_daily_rate": non_negative(inputs.average_daily_rate),
            "occupancy_rate": normalize_rate(inputs.occupancy_rate),
            "property_taxes_annual": non_negative(inputs.property_taxes_annual),
            "insurance_annual": non_negative(inputs.insurance_annual),
            "down_payment_pct": finite(inputs.down_payment_pct),
            "interest_rate": finite(inputs.interest_rate),
            "loan_term_years": inputs.loan_term_years,
            "closing_costs_pct": finite(inputs.closing_costs_pct),
            "furnishing_budget": non_negative(inputs.furnishing_budget),
            "platform_fees_pct": finite(inputs.platform_fees_pct),
            "maintenance_pct": finite(inputs.maintenance_pct),
            "management_pct": finite(inputs.management_pct),
            "utilities_monthly": non_negative(inputs.utilities_monthly),
        })
    }

    /// Occupancy typed as a percent is stored as a fraction
    fn on_update_input(&self, key: &str, value: &Value, _previous: &StrInputs) -> Option<InputPatch> {
        if key != "occupancy_rate" {
            return None;
        }
        let raw = value_to_finite(value);
        let normalized = normalize_rate(raw);
        (normalized != raw).then(|| into_patch(json!({ "occupancy_rate": normalized })))
    }
}
