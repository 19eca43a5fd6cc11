use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{set_known, InputPatch, StrategyConfig};
use crate::breakeven::calculate_buy_price_for;
use crate::models::{AssumptionSet, SavedProperty};
use crate::types::StrategyId;
use crate::validation::{finite, non_negative};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LtrInputs {
    pub purchase_price: f64,
    pub list_price: f64,
    pub monthly_rent: f64,
    pub property_taxes_annual: f64,
    pub insurance_annual: f64,
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub closing_costs_pct: f64,
    pub vacancy_rate: f64,
    pub maintenance_pct: f64,
    pub management_pct: f64,
    pub capex_pct: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LtrWorksheet {
    assumptions: AssumptionSet,
}

impl LtrWorksheet {
    pub fn new(assumptions: AssumptionSet) -> Self {
        Self { assumptions }
    }
}

impl StrategyConfig for LtrWorksheet {
    type Inputs = LtrInputs;

    fn strategy(&self) -> StrategyId {
        StrategyId::Ltr
    }

    fn default_inputs(&self) -> LtrInputs {
        let a = &self.assumptions;
        LtrInputs {
            purchase_price: 0.0,
            list_price: 0.0,
            monthly_rent: 0.0,
            property_taxes_annual: 0.0,
            insurance_annual: 0.0,
            down_payment_pct: a.down_payment_pct,
            interest_rate: a.interest_rate,
            loan_term_years: a.loan_term_years,
            closing_costs_pct: a.closing_costs_pct,
            vacancy_rate: a.vacancy_rate,
            maintenance_pct: a.maintenance_pct,
            management_pct: a.management_pct,
            capex_pct: a.capex_pct,
        }
    }

    fn initialize_from_property(&self, property: &SavedProperty, _defaults: &LtrInputs) -> InputPatch {
        let facts = property.facts();
        let mut patch = InputPatch::new();
        if facts.list_price > 0.0 {
            patch.insert(
                "purchase_price".into(),
                json!(calculate_buy_price_for(StrategyId::Ltr, &facts, &self.assumptions)),
            );
            patch.insert("list_price".into(), json!(facts.list_price));
        }
        set_known(&mut patch, "monthly_rent", property.monthly_rent);
        set_known(&mut patch, "property_taxes_annual", property.property_taxes);
        set_known(&mut patch, "insurance_annual", property.insurance);
        patch
    }

    fn build_payload(&self, inputs: &LtrInputs) -> Value {
        json!({
            "purchase_price": non_negative(inputs.purchase_price),
            "list_price": non_negative(inputs.list_price),
            "monthly_rent": non_negative(inputs.monthly_rent),
            "property_taxes_annual": non_negative(inputs.property_taxes_annual),
            "insurance_annual": non_negative(inputs.insurance_annual),
            "down_payment_pct": finite(inputs.down_payment_pct),
            "interest_rate": finite(inputs.interest_rate),
            "loan_term_years": inputs.loan_term_years,
            "closing_costs_pct": finite(inputs.closing_costs_pct),
            "vacancy_rate": finite(inputs.vacancy_rate),
            "maintenance_pct": finite(inputs.maintenance_pct),
            "management_pct": finite(inputs.management_pct),
            "capex_pct": finite(inputs.capex_pct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worksheets::seed_inputs;

    #[test]
    fn seeds_purchase_price_from_buy_price() {
        let config = LtrWorksheet::default();
        let property = SavedProperty {
            list_price: Some(400_000.0),
            monthly_rent: Some(2_000.0),
            property_taxes: Some(4_500.0),
            insurance: Some(1_200.0),
            ..Default::default()
        };
        let inputs = seed_inputs(&config, &property).unwrap();

        let expected = calculate_buy_price_for(StrategyId::Ltr, &property.facts(), &AssumptionSet::default());
        assert_eq!(inputs.purchase_price, expected);
        assert!(inputs.purchase_price < 400_000.0);
        assert_eq!(inputs.list_price, 400_000.0);
        assert_eq!(inputs.loan_term_years, 30);
    }

    #[test]
    fn rent_only_property_seeds_rent() {
        let config = LtrWorksheet::default();
        let property = SavedProperty {
            monthly_rent: Some(1_850.0),
            ..Default::default()
        };
        let inputs = seed_inputs(&config, &property).unwrap();
        assert_eq!(inputs.monthly_rent, 1_850.0);
        assert_eq!(inputs.purchase_price, 0.0);
    }

    #[test]
    fn payload_is_pure() {
        let config = LtrWorksheet::default();
        let inputs = LtrInputs {
            purchase_price: 250_000.0,
            monthly_rent: 2_100.0,
            ..config.default_inputs()
        };
        let payload = config.build_payload(&inputs);
        assert_eq!(payload["purchase_price"], 250_000.0);
        assert_eq!(payload["loan_term_years"], 30);
        assert_eq!(payload, config.build_payload(&inputs));
    }
}
