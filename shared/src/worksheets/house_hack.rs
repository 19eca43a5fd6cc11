use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{into_patch, set_known, InputPatch, StrategyConfig};
use crate::breakeven::calculate_buy_price_for;
use crate::models::{AssumptionSet, SavedProperty, MAX_BEDROOMS};
use crate::types::{LoanType, StrategyId};
use crate::validation::{finite, non_negative, validate_down_payment, value_to_finite};

/// FHA one-unit loan limit floor
pub const DEFAULT_FHA_MAX_PRICE: f64 = 524_225.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseHackInputs {
    pub purchase_price: f64,
    /// Rent for each room or unit the owner does not occupy
    pub unit_rents: Vec<f64>,
    /// What the owner would pay to rent a comparable place
    pub owner_market_rent: f64,
    pub list_price: f64,
    pub fha_max_price: f64,
    pub property_taxes_annual: f64,
    pub insurance_annual: f64,
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub closing_costs: f64,
    pub pmi_rate: f64,
    pub vacancy_rate: f64,
    pub maintenance_pct: f64,
    pub capex_pct: f64,
    pub utilities_monthly: f64,
    pub loan_type: LoanType,
}

#[derive(Debug, Clone, Default)]
pub struct HouseHackWorksheet {
    assumptions: AssumptionSet,
}

impl HouseHackWorksheet {
    pub fn new(assumptions: AssumptionSet) -> Self {
        Self { assumptions }
    }

    fn closing_costs(&self, purchase_price: f64) -> f64 {
        (non_negative(purchase_price) * self.assumptions.closing_costs_pct).round()
    }
}

impl StrategyConfig for HouseHackWorksheet {
    type Inputs = HouseHackInputs;

    fn strategy(&self) -> StrategyId {
        StrategyId::HouseHack
    }

    fn default_inputs(&self) -> HouseHackInputs {
        let a = &self.assumptions;
        let loan_type = LoanType::Fha;
        HouseHackInputs {
            purchase_price: 0.0,
            unit_rents: Vec::new(),
            owner_market_rent: 0.0,
            list_price: 0.0,
            fha_max_price: DEFAULT_FHA_MAX_PRICE,
            property_taxes_annual: 0.0,
            insurance_annual: 0.0,
            down_payment_pct: loan_type.min_down_payment_pct(),
            interest_rate: a.interest_rate,
            loan_term_years: a.loan_term_years,
            closing_costs: 0.0,
            pmi_rate: loan_type.mortgage_insurance_rate(),
            vacancy_rate: a.vacancy_rate,
            maintenance_pct: a.maintenance_pct,
            capex_pct: a.capex_pct,
            utilities_monthly: a.utilities_monthly,
            loan_type,
        }
    }

    fn initialize_from_property(&self, property: &SavedProperty, _defaults: &HouseHackInputs) -> InputPatch {
        let facts = property.facts();
        let mut patch = InputPatch::new();

        if facts.list_price > 0.0 {
            let purchase_price = calculate_buy_price_for(StrategyId::HouseHack, &facts, &self.assumptions);
            patch.insert("purchase_price".into(), json!(purchase_price));
            patch.insert("list_price".into(), json!(facts.list_price));
            patch.insert("closing_costs".into(), json!(self.closing_costs(purchase_price)));
        }

        if facts.monthly_rent > 0.0 {
            match facts.bedrooms.map(f64::floor) {
                Some(beds) if beds > 1.0 && beds <= MAX_BEDROOMS => {
                    let room_rent = (facts.monthly_rent / beds).round();
                    let rented_rooms = beds as usize - 1;
                    patch.insert("unit_rents".into(), json!(vec![room_rent; rented_rooms]));
                    patch.insert("owner_market_rent".into(), json!(room_rent));
                }
                _ => {
                    patch.insert("owner_market_rent".into(), json!(facts.monthly_rent));
                }
            }
        }

        set_known(&mut patch, "property_taxes_annual", property.property_taxes);
        set_known(&mut patch, "insurance_annual", property.insurance);
        patch
    }

    fn build_payload(&self, inputs: &HouseHackInputs) -> Value {
        let unit_rents: Vec<f64> = inputs.unit_rents.iter().copied().map(non_negative).collect();
        json!({
            "purchase_price": non_negative(inputs.purchase_price),
            "unit_rents": unit_rents,
            "owner_market_rent": non_negative(inputs.owner_market_rent),
            "list_price": non_negative(inputs.list_price),
            "fha_max_price": non_negative(inputs.fha_max_price),
            "property_taxes_annual": non_negative(inputs.property_taxes_annual),
            "insurance_annual": non_negative(inputs.insurance_annual),
            "down_payment_pct": finite(inputs.down_payment_pct),
            "interest_rate": finite(inputs.interest_rate),
            "loan_term_years": inputs.loan_term_years,
            "closing_costs": non_negative(inputs.closing_costs),
            "pmi_rate": finite(inputs.pmi_rate),
            "vacancy_rate": finite(inputs.vacancy_rate),
            "maintenance_pct": finite(inputs.maintenance_pct),
            "capex_pct": finite(inputs.capex_pct),
            "utilities_monthly": non_negative(inputs.utilities_monthly),
            "loan_type": inputs.loan_type.as_str(),
        })
    }

    fn on_update_input(&self, key: &str, value: &Value, previous: &HouseHackInputs) -> Option<InputPatch> {
        match key {
            "loan_type" => {
                let loan_type: LoanType = serde_json::from_value(value.clone()).ok()?;
                Some(into_patch(json!({
                    "down_payment_pct": previous.down_payment_pct.max(loan_type.min_down_payment_pct()),
                    "pmi_rate": loan_type.mortgage_insurance_rate(),
                })))
            }
            "down_payment_pct" => {
                let requested = value_to_finite(value);
                if validate_down_payment(previous.loan_type, requested).is_ok() {
                    return None;
                }
                let allowed = requested.clamp(previous.loan_type.min_down_payment_pct(), 1.0);
                Some(into_patch(json!({ "down_payment_pct": allowed })))
            }
            "purchase_price" => Some(into_patch(json!({
                "closing_costs": self.closing_costs(value_to_finite(value)),
            }))),
            _ => None,
        }
    }
}
