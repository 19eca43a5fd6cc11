use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{into_patch, InputPatch, StrategyConfig};
use crate::breakeven::{calculate_buy_price_for, estimate_breakeven_for, rehab_budget};
use crate::models::{AssumptionSet, SavedProperty};
use crate::types::StrategyId;
use crate::validation::{finite, non_negative, value_to_finite};

/// Earnest money deposit as a share of the contract price
const EARNEST_MONEY_PCT: f64 = 0.01;

const DEFAULT_MARKETING_COSTS: f64 = 1_500.0;
const DEFAULT_TAX_RATE: f64 = 0.25;

fn earnest_money(contract_price: f64) -> f64 {
    (non_negative(contract_price) * EARNEST_MONEY_PCT).round()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WholesaleInputs {
    pub arv: f64,
    pub contract_price: f64,
    /// What the end buyer pays for the assignment
    pub investor_price: f64,
    pub rehab_costs: f64,
    pub assignment_fee: f64,
    pub marketing_costs: f64,
    pub earnest_money: f64,
    pub selling_costs_pct: f64,
    pub investor_down_payment_pct: f64,
    pub investor_purchase_costs_pct: f64,
    pub tax_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WholesaleWorksheet {
    assumptions: AssumptionSet,
}

impl WholesaleWorksheet {
    pub fn new(assumptions: AssumptionSet) -> Self {
        Self { assumptions }
    }
}

impl StrategyConfig for WholesaleWorksheet {
    type Inputs = WholesaleInputs;

    fn strategy(&self) -> StrategyId {
        StrategyId::Wholesale
    }

    fn default_inputs(&self) -> WholesaleInputs {
        let a = &self.assumptions;
        WholesaleInputs {
            arv: 0.0,
            contract_price: 0.0,
            investor_price: 0.0,
            rehab_costs: 0.0,
            assignment_fee: 0.0,
            marketing_costs: DEFAULT_MARKETING_COSTS,
            earnest_money: 0.0,
            selling_costs_pct: a.selling_costs_pct,
            investor_down_payment_pct: a.down_payment_pct,
            investor_purchase_costs_pct: a.closing_costs_pct,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }

    /// The investor pays the maximum allowable offer and the contract is
    /// written at the discounted buy price; the spread is the assignment fee.
    fn initialize_from_property(&self, property: &SavedProperty, _defaults: &WholesaleInputs) -> InputPatch {
        let facts = property.facts();
        let arv = facts.arv_or_list_price();
        if arv <= 0.0 {
            return InputPatch::new();
        }

        let mut patch = into_patch(json!({
            "arv": arv,
            "rehab_costs": rehab_budget(arv, self.assumptions.renovation_budget_pct),
        }));

        if facts.list_price > 0.0 {
            let investor_price = estimate_breakeven_for(StrategyId::Wholesale, &facts, &self.assumptions);
            let contract_price = calculate_buy_price_for(StrategyId::Wholesale, &facts, &self.assumptions);
            patch.extend(into_patch(json!({
                "investor_price": investor_price,
                "contract_price": contract_price,
                "assignment_fee": non_negative(investor_price - contract_price),
                "earnest_money": earnest_money(contract_price),
            })));
        }
        patch
    }

    fn build_payload(&self, inputs: &WholesaleInputs) -> Value {
        json!({
            "arv": non_negative(inputs.arv),
            "contract_price": non_negative(inputs.contract_price),
            "investor_price": non_negative(inputs.investor_price),
            "rehab_costs": non_negative(inputs.rehab_costs),
            "assignment_fee": non_negative(inputs.assignment_fee),
            "marketing_costs": non_negative(inputs.marketing_costs),
            "earnest_money": non_negative(inputs.earnest_money),
            "selling_costs_pct": finite(inputs.selling_costs_pct),
            "investor_down_payment_pct": finite(inputs.investor_down_payment_pct),
            "investor_purchase_costs_pct": finite(inputs.investor_purchase_costs_pct),
            "tax_rate": finite(inputs.tax_rate),
        })
    }

    fn on_update_input(&self, key: &str, value: &Value, _previous: &WholesaleInputs) -> Option<InputPatch> {
        match key {
            "contract_price" => Some(into_patch(json!({
                "earnest_money": earnest_money(value_to_finite(value)),
            }))),
            _ => None,
        }
    }
}
