use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{reseed_rehab, set_known, InputPatch, StrategyConfig};
use crate::breakeven::{calculate_buy_price_for, rehab_budget};
use crate::models::{AssumptionSet, SavedProperty};
use crate::types::StrategyId;
use crate::validation::{finite, non_negative};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrrrrInputs {
    pub purchase_price: f64,
    pub list_price: f64,
    pub arv: f64,
    pub rehab_costs: f64,
    pub monthly_rent: f64,
    pub property_taxes_annual: f64,
    pub insurance_annual: f64,
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub closing_costs_pct: f64,
    pub holding_months: u32,
    pub refinance_ltv: f64,
    pub refinance_rate: f64,
    pub refinance_term_years: u32,
    pub vacancy_rate: f64,
    pub maintenance_pct: f64,
    pub management_pct: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BrrrrWorksheet {
    assumptions: AssumptionSet,
}

impl BrrrrWorksheet {
    pub fn new(assumptions: AssumptionSet) -> Self {
        Self { assumptions }
    }
}

impl StrategyConfig for BrrrrWorksheet {
    type Inputs = BrrrrInputs;

    fn strategy(&self) -> StrategyId {
        StrategyId::Brrrr
    }

    fn default_inputs(&self) -> BrrrrInputs {
        let a = &self.assumptions;
        BrrrrInputs {
            purchase_price: 0.0,
            list_price: 0.0,
            arv: 0.0,
            rehab_costs: 0.0,
            monthly_rent: 0.0,
            property_taxes_annual: 0.0,
            insurance_annual: 0.0,
            down_payment_pct: a.down_payment_pct,
            interest_rate: a.interest_rate,
            closing_costs_pct: a.closing_costs_pct,
            holding_months: a.holding_period_months,
            refinance_ltv: a.refinance_ltv,
            refinance_rate: a.interest_rate,
            refinance_term_years: a.loan_term_years,
            vacancy_rate: a.vacancy_rate,
            maintenance_pct: a.maintenance_pct,
            management_pct: a.management_pct,
        }
    }

    fn initialize_from_property(&self, property: &SavedProperty, _defaults: &BrrrrInputs) -> InputPatch {
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
                json!(calculate_buy_price_for(StrategyId::Brrrr, &facts, &self.assumptions)),
            );
            patch.insert("list_price".into(), json!(facts.list_price));
        }
        set_known(&mut patch, "monthly_rent", property.monthly_rent);
        set_known(&mut patch, "property_taxes_annual", property.property_taxes);
        set_known(&mut patch, "insurance_annual", property.insurance);
        patch
    }

    fn build_payload(&self, inputs: &BrrrrInputs) -> Value {
        json!({
            "purchase_price": non_negative(inputs.purchase_price),
            "list_price": non_negative(inputs.list_price),
            "arv": non_negative(inputs.arv),
            "rehab_costs": non_negative(inputs.rehab_costs),
            "monthly_rent": non_negative(inputs.monthly_rent),
            "property_taxes_annual": non_negative(inputs.property_taxes_annual),
            "insurance_annual": non_negative(inputs.insurance_annual),
            "down_payment_pct": finite(inputs.down_payment_pct),
            "interest_rate": finite(inputs.interest_rate),
            "closing_costs_pct": finite(inputs.closing_costs_pct),
            "holding_months": inputs.holding_months,
            "refinance_ltv": finite(inputs.refinance_ltv),
            "refinance_rate": finite(inputs.refinance_rate),
            "refinance_term_years": inputs.refinance_term_years,
            "vacancy_rate": finite(inputs.vacancy_rate),
            "maintenance_pct": finite(inputs.maintenance_pct),
            "management_pct": finite(inputs.management_pct),
        })
    }

    fn on_update_input(&self, key: &str, value: &Value, previous: &BrrrrInputs) -> Option<InputPatch> {
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
