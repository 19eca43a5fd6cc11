//! Breakeven and target purchase price estimation
//!
//! Each strategy supplies a [`BreakevenModel`] describing what makes a deal
//! break even for it: either an annual net operating income that has to cover
//! debt service, or a price ceiling computed directly from the after-repair
//! value. [`solve_breakeven`] turns either basis into a purchase price.

use serde::{Deserialize, Serialize};

use crate::amortization::mortgage_constant;
use crate::models::{AssumptionSet, PropertyFacts, MAX_BEDROOMS};
use crate::types::StrategyId;
use crate::validation::{finite, non_negative};

/// Rehab budget as a share of ARV when nothing else is known
pub const DEFAULT_RENOVATION_BUDGET_PCT: f64 = 0.05;

/// Down payment at or above which conventional loans drop PMI
pub const PMI_FREE_DOWN_PAYMENT_PCT: f64 = 0.20;

/// What a strategy needs to break even
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualifyingBasis {
    /// Annual NOI that must equal annual debt service
    Income(f64),
    /// Highest purchase price at which the deal nets zero
    Price(f64),
}

/// Per-strategy income or price ceiling behind the shared solver
pub trait BreakevenModel: Send + Sync {
    fn strategy(&self) -> StrategyId;

    /// Inputs arrive sanitized
    fn qualifying_basis(&self, facts: &PropertyFacts, assumptions: &AssumptionSet) -> QualifyingBasis;

    /// Annual debt cost per dollar of loan
    fn annual_debt_factor(&self, assumptions: &AssumptionSet) -> f64 {
        mortgage_constant(assumptions.interest_rate, f64::from(assumptions.loan_term_years))
    }
}

/// Solve a model for its breakeven purchase price.
///
/// Returns `0` when no price makes the deal break even: non-positive NOI,
/// an all-cash purchase (nothing to balance against debt service), or a
/// non-positive price ceiling. The result is always finite and rounded to
/// whole currency units.
pub fn solve_breakeven(
    model: &dyn BreakevenModel,
    facts: &PropertyFacts,
    assumptions: &AssumptionSet,
) -> f64 {
    let facts = facts.sanitized();
    let assumptions = assumptions.sanitized();

    match model.qualifying_basis(&facts, &assumptions) {
        QualifyingBasis::Income(noi) => {
            let noi = finite(noi);
            if noi <= 0.0 {
                return 0.0;
            }
            let denominator = assumptions.loan_to_value() * finite(model.annual_debt_factor(&assumptions));
            if denominator <= 0.0 {
                return 0.0;
            }
            non_negative((noi / denominator).round())
        }
        QualifyingBasis::Price(price) => non_negative(finite(price).round()),
    }
}

/// Rehab budget seeded from ARV at the default 5%
pub fn calculate_initial_rehab_budget(arv: f64) -> f64 {
    rehab_budget(arv, DEFAULT_RENOVATION_BUDGET_PCT)
}

/// Rehab budget as a share of ARV
pub fn rehab_budget(arv: f64, renovation_budget_pct: f64) -> f64 {
    non_negative((non_negative(arv) * non_negative(renovation_budget_pct)).round())
}

// ============================================================================
// Strategy models
// ============================================================================

/// Effective gross income and operating expenses for a rented share
fn rental_noi(facts: &PropertyFacts, assumptions: &AssumptionSet, rented_share: f64) -> f64 {
    let effective_gross_income =
        facts.monthly_rent * rented_share * 12.0 * (1.0 - assumptions.vacancy_rate);
    let operating_expenses = facts.property_taxes_annual
        + facts.insurance_annual
        + effective_gross_income * assumptions.maintenance_pct
        + effective_gross_income * assumptions.management_pct;
    effective_gross_income - operating_expenses
}

/// Taxes and insurance carried while a property is held before exit
fn holding_carry(facts: &PropertyFacts, assumptions: &AssumptionSet) -> f64 {
    (facts.property_taxes_annual + facts.insurance_annual) / 12.0
        * f64::from(assumptions.holding_period_months)
}

pub struct LongTermRentalModel;

impl BreakevenModel for LongTermRentalModel {
    fn strategy(&self) -> StrategyId {
        StrategyId::Ltr
    }

    fn qualifying_basis(&self, facts: &PropertyFacts, assumptions: &AssumptionSet) -> QualifyingBasis {
        QualifyingBasis::Income(rental_noi(facts, assumptions, 1.0))
    }
}

pub struct ShortTermRentalModel;

impl BreakevenModel for ShortTermRentalModel {
    fn strategy(&self) -> StrategyId {
        StrategyId::Str
    }

    fn qualifying_basis(&self, facts: &PropertyFacts, assumptions: &AssumptionSet) -> QualifyingBasis {
        let gross = facts.average_daily_rate.unwrap_or(0.0) * 365.0 * facts.occupancy_or_default();
        let operating_expenses = facts.property_taxes_annual
            + facts.insurance_annual
            + assumptions.utilities_monthly * 12.0
            + gross
                * (assumptions.maintenance_pct
                    + assumptions.management_pct
                    + assumptions.str_operating_pct);
        QualifyingBasis::Income(gross - operating_expenses)
    }
}

pub struct BrrrrModel;

impl BreakevenModel for BrrrrModel {
    fn strategy(&self) -> StrategyId {
        StrategyId::Brrrr
    }

    /// Price at which the refinance returns every dollar put in
    fn qualifying_basis(&self, facts: &PropertyFacts, assumptions: &AssumptionSet) -> QualifyingBasis {
        let arv = facts.arv_or_list_price();
        let rehab = rehab_budget(arv, assumptions.renovation_budget_pct);
        let refinance_proceeds = arv * assumptions.refinance_ltv;
        let price = (refinance_proceeds - rehab - holding_carry(facts, assumptions))
            / (1.0 + assumptions.closing_costs_pct);
        QualifyingBasis::Price(price)
    }
}

pub struct FixAndFlipModel;

impl BreakevenModel for FixAndFlipModel {
    fn strategy(&self) -> StrategyId {
        StrategyId::Flip
    }

    /// Price at which sale proceeds cover purchase, rehab and carry
    fn qualifying_basis(&self, facts: &PropertyFacts, assumptions: &AssumptionSet) -> QualifyingBasis {
        let arv = facts.arv_or_list_price();
        let rehab = rehab_budget(arv, assumptions.renovation_budget_pct);
        let net_sale = arv * (1.0 - assumptions.selling_costs_pct);
        // interest carry scales with the price itself
        let price_cost_factor = 1.0
            + assumptions.closing_costs_pct
            + assumptions.loan_to_value()
                * assumptions.interest_rate
                * f64::from(assumptions.holding_period_months)
                / 12.0;
        QualifyingBasis::Price((net_sale - rehab - holding_carry(facts, assumptions)) / price_cost_factor)
    }
}

pub struct HouseHackModel;

impl HouseHackModel {
    /// Share of rent earned while the owner occupies one bedroom.
    ///
    /// Counts above [`MAX_BEDROOMS`] are treated as unknown.
    pub fn rented_share(bedrooms: Option<f64>) -> f64 {
        match bedrooms.map(f64::floor) {
            Some(beds) if beds > 1.0 && beds <= MAX_BEDROOMS => (beds - 1.0) / beds,
            _ => 0.0,
        }
    }
}

impl BreakevenModel for HouseHackModel {
    fn strategy(&self) -> StrategyId {
        StrategyId::HouseHack
    }

    fn qualifying_basis(&self, facts: &PropertyFacts, assumptions: &AssumptionSet) -> QualifyingBasis {
        QualifyingBasis::Income(rental_noi(facts, assumptions, Self::rented_share(facts.bedrooms)))
    }

    fn annual_debt_factor(&self, assumptions: &AssumptionSet) -> f64 {
        let constant =
            mortgage_constant(assumptions.interest_rate, f64::from(assumptions.loan_term_years));
        if assumptions.down_payment_pct < PMI_FREE_DOWN_PAYMENT_PCT {
            constant + assumptions.pmi_rate
        } else {
            constant
        }
    }
}

pub struct WholesaleModel;

impl BreakevenModel for WholesaleModel {
    fn strategy(&self) -> StrategyId {
        StrategyId::Wholesale
    }

    /// Maximum allowable offer: the contract price that leaves no assignment fee
    fn qualifying_basis(&self, facts: &PropertyFacts, assumptions: &AssumptionSet) -> QualifyingBasis {
        let arv = facts.arv_or_list_price();
        let rehab = rehab_budget(arv, assumptions.renovation_budget_pct);
        QualifyingBasis::Price(arv * assumptions.max_offer_arv_pct - rehab)
    }
}

/// Model for a strategy
pub fn model_for(strategy: StrategyId) -> &'static dyn BreakevenModel {
    match strategy {
        StrategyId::Ltr => &LongTermRentalModel,
        StrategyId::Str => &ShortTermRentalModel,
        StrategyId::Brrrr => &BrrrrModel,
        StrategyId::Flip => &FixAndFlipModel,
        StrategyId::HouseHack => &HouseHackModel,
        StrategyId::Wholesale => &WholesaleModel,
    }
}

// ============================================================================
// Public estimators
// ============================================================================

/// Long-term rental breakeven price
pub fn estimate_breakeven(facts: &PropertyFacts, assumptions: &AssumptionSet) -> f64 {
    estimate_breakeven_for(StrategyId::Ltr, facts, assumptions)
}

pub fn estimate_breakeven_for(
    strategy: StrategyId,
    facts: &PropertyFacts,
    assumptions: &AssumptionSet,
) -> f64 {
    solve_breakeven(model_for(strategy), facts, assumptions)
}

/// Long-term rental target purchase price
pub fn calculate_buy_price(facts: &PropertyFacts, assumptions: &AssumptionSet) -> f64 {
    calculate_buy_price_for(StrategyId::Ltr, facts, assumptions)
}

/// Discounted breakeven, never above the list price.
///
/// When the deal cannot break even the list price is returned unchanged.
pub fn calculate_buy_price_for(
    strategy: StrategyId,
    facts: &PropertyFacts,
    assumptions: &AssumptionSet,
) -> f64 {
    let list_price = non_negative(facts.list_price);
    let breakeven = estimate_breakeven_for(strategy, facts, assumptions);
    if breakeven <= 0.0 {
        return list_price;
    }
    let discount = assumptions.sanitized().buy_discount_pct;
    let buy_price = (breakeven * (1.0 - discount)).round();
    buy_price.min(list_price)
}

/// Quick client-side estimate for one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakevenEstimate {
    pub strategy: StrategyId,
    pub list_price: f64,
    pub breakeven_price: f64,
    pub buy_price: f64,
    /// `false` when no price makes the deal break even
    pub can_break_even: bool,
}

pub fn estimate(strategy: StrategyId, facts: &PropertyFacts, assumptions: &AssumptionSet) -> BreakevenEstimate {
    let breakeven_price = estimate_breakeven_for(strategy, facts, assumptions);
    BreakevenEstimate {
        strategy,
        list_price: non_negative(facts.list_price),
        breakeven_price,
        buy_price: calculate_buy_price_for(strategy, facts, assumptions),
        can_break_even: breakeven_price > 0.0,
    }
}
