use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{reseed_rehab, set_known, InputPatch, StrategyConfig};
use crate::breakeven::{calculate_buy_price_for, rehab_budget};
use crate::models::{AssumptionSet, SavedProperty};
use crate::types::StrategyId;
use crate::validation::{finite, non_negative};

/// Short-term capital gains rate applied to flip profit
const DEFAULT_FLIP_TAX_RATE: f64 = 0.25;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipInputs {
    pub purchase_price: f64,
    pub list_price: f64,
    pub arv: f64,
    pub rehab_costs: f64,
    pub holding_months: u32,
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub closing_costs_pct: f64,
    pub selling_costs_pct: f64,
    pub property_taxes_annual: f64,
    pub insurance_annual: f64,
    pub utilities_monthly: f64,
    pub tax_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FlipWorksheet {
    assumptions: AssumptionSet,
}

impl FlipWorksheet {
    pub fn new(assumptions: AssumptionSet) -> Self {
        Self { assumptions }
    }
}

impl StrategyConfig for FlipWorksheet {
    type Inputs = FlipInputs;

    fn strategy(&self) -> StrategyId {
        StrategyId::Flip
    }

    fn default_inputs(&self) -> FlipInputs {
        let a = &self.assumptions;
        FlipInputs {
            purchase_price: 0.0,
            list_price: 0.0,
            arv: 0.0,
            rehab_costs: 0.0,
            holding_months: a.holding_period_months,
            down_payment_pct: a.down_payment_pct,
            interest_rate: a.interest_rate,
            closing_costs_pct: a.closing_costs_pct,
            selling_costs_pct: a.selling_costs_pct,
            property_taxes_annual: 0.0,
            insurance_annual: 0.0,
            utilities_monthly: a.utilities_monthly,
            tax_rate: DEFAULT_FLIP_TAX_RATE,
        }
    }

    fn initialize_from_property(&self, property: &SavedProperty, _defaults: &FlipInputs) -> InputPatch {
        let facts = property.facts();
        let mut patch = InputPatch::new();
        let arv = facts.arv_or_list_price();
        if arv > 0.0 {
            patch.insert("arv".into(), json!(arv));
            patch.insert(
                "rehab_costs".into(),
                json!(rehab_budget(arv, self.assumptions.renovation_budget_pct)),
            );
        }
        if facts.list_price > 0.0 {
            patch.insert(
                "purchase_price".into(),
                json!(calculate_buy_price_for(StrategyId::Flip, &facts, &self.assumptions)),
            );
            patch.insert("list_price".into(), json!(facts.list_price));
        }
        set_known(&mut patch, "property_taxes_annual", property.property_taxes);
        set_known(&mut patch, "insurance_annual", property.insurance);
        patch
    }

    fn build_payload(&self, inputs: &FlipInputs) -> Value {
        json!({
            "purchase_price": non_negative(inputs.purchase_price),
            "list_price": non_negative(inputs.list_price),
            "arv": non_negative(inputs.arv),
            "rehab_costs": non_negative(inputs.rehab_costs),
            "holding_months": inputs.holding_months,
            "down_payment_pct": finite(inputs.down_payment_pct),
            "interest_rate": finite(inputs.interest_rate),
            "closing_costs_pct": finite(inputs.closing_costs_pct),
            "selling_costs_pct": finite(inputs.selling_costs_pct),
            "property_taxes_annual": non_negative(inputs.property_taxes_annual),
            "insurance_annual": non_negative(inputs.insurance_annual),
            "utilities_monthly": non_negative(inputs.utilities_monthly),
            "tax_rate": finite(inputs.tax_rate),
        })
    }

    fn on_update_input(&self, key: &str, value: &Value, previous: &FlipInputs) -> Option<InputPatch> {
        match key {
            "arv" => reseed_rehab(
                value,
                previous.arv,
                previous.rehab_costs,
                self.assumptions.renovation_budget_pct,
            ),
            _ => None,
        }
    }
}
