//! Breakeven, buy price and scoring properties
//!
//! Covers:
//! - Determinism of the breakeven estimate
//! - Non-negativity of breakeven and buy price
//! - Buy price never above the list price
//! - The "cannot break even" fallback
//! - Idempotent number sanitization
//! - Exact opportunity grade boundaries
//! - House Hack seeding with any bedroom count

use proptest::prelude::*;

use shared::{
    calculate_buy_price, calculate_buy_price_for, estimate_breakeven, estimate_breakeven_for,
    grade_for_score, score_opportunity, to_finite_number, AssumptionSet, ListingAvailability,
    OpportunityGrade, PropertyFacts, SavedProperty, StrategyId, MAX_BEDROOMS,
};
use shared::worksheets::{seed_inputs, HouseHackWorksheet};

fn example_facts() -> PropertyFacts {
    PropertyFacts::new(300_000.0, 2_000.0, 4_500.0, 1_200.0)
}

fn example_assumptions() -> AssumptionSet {
    AssumptionSet {
        down_payment_pct: 0.20,
        interest_rate: 0.06,
        loan_term_years: 30,
        vacancy_rate: 0.01,
        maintenance_pct: 0.05,
        management_pct: 0.0,
        buy_discount_pct: 0.05,
        ..AssumptionSet::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_example_breakeven_is_positive() {
        let breakeven = estimate_breakeven(&example_facts(), &example_assumptions());
        assert!(breakeven > 0.0);
    }

    #[test]
    fn test_example_buy_price_is_discounted_and_clamped() {
        let facts = example_facts();
        let breakeven = estimate_breakeven(&facts, &example_assumptions());
        let expected = (breakeven * 0.95).round().min(facts.list_price);
        assert_eq!(calculate_buy_price(&facts, &example_assumptions()), expected);
    }

    #[test]
    fn test_zero_rent_returns_list_price() {
        let facts = PropertyFacts {
            monthly_rent: 0.0,
            ..example_facts()
        };
        assert_eq!(estimate_breakeven(&facts, &example_assumptions()), 0.0);
        assert_eq!(calculate_buy_price(&facts, &example_assumptions()), facts.list_price);
    }

    #[test]
    fn test_sanitization_of_special_values() {
        assert_eq!(to_finite_number(Some(f64::NAN)), 0.0);
        assert_eq!(to_finite_number(Some(f64::INFINITY)), 0.0);
        assert_eq!(to_finite_number(Some(f64::NEG_INFINITY)), 0.0);
        assert_eq!(to_finite_number(None), 0.0);
    }

    #[test]
    fn test_grade_boundaries() {
        let expected = [
            (85, OpportunityGrade::APlus),
            (70, OpportunityGrade::A),
            (55, OpportunityGrade::B),
            (40, OpportunityGrade::C),
            (25, OpportunityGrade::D),
            (0, OpportunityGrade::F),
        ];
        for (score, grade) in expected {
            assert_eq!(grade_for_score(score), grade);
        }
    }

    #[test]
    fn test_scored_boundary_inputs() {
        let a_plus = score_opportunity(78_750.0, 100_000.0, ListingAvailability::BankOwned, Some(120));
        assert_eq!((a_plus.score, a_plus.grade), (85, OpportunityGrade::APlus));

        let f = score_opportunity(120_000.0, 100_000.0, ListingAvailability::Sold, Some(3));
        assert_eq!((f.score, f.grade), (0, OpportunityGrade::F));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Any f64 including NaN and the infinities
    fn any_number() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => -1_000_000.0..2_000_000.0f64,
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
            1 => Just(f64::NEG_INFINITY),
            1 => Just(0.0),
        ]
    }

    fn any_bedrooms() -> impl Strategy<Value = f64> {
        prop_oneof![
            6 => 0.0..8.0f64,
            2 => 8.0..1e20f64,
            1 => Just(1e11),
            1 => Just(1e19),
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
        ]
    }

    fn facts_strategy() -> impl Strategy<Value = PropertyFacts> {
        (
            any_number(),
            any_number(),
            any_number(),
            any_number(),
            proptest::option::of(any_bedrooms()),
            proptest::option::of(any_number()),
            proptest::option::of(any_number()),
            proptest::option::of(any_number()),
        )
            .prop_map(|(list, rent, taxes, insurance, bedrooms, arv, adr, occupancy)| PropertyFacts {
                list_price: list,
                monthly_rent: rent,
                property_taxes_annual: taxes,
                insurance_annual: insurance,
                bedrooms,
                arv,
                average_daily_rate: adr,
                occupancy_rate: occupancy,
                ..PropertyFacts::default()
            })
    }

    fn assumptions_strategy() -> impl Strategy<Value = AssumptionSet> {
        (
            any_number(),
            prop_oneof![Just(0.0), 0.0..0.15f64, Just(f64::NAN)],
            0u32..45,
            0.0..0.2f64,
            0.0..0.5f64,
            0.0..0.3f64,
            any_number(),
        )
            .prop_map(|(down, rate, term, vacancy, maintenance, discount, closing)| AssumptionSet {
                down_payment_pct: down,
                interest_rate: rate,
                loan_term_years: term,
                vacancy_rate: vacancy,
                maintenance_pct: maintenance,
                buy_discount_pct: discount,
                closing_costs_pct: closing,
                ..AssumptionSet::default()
            })
    }

    fn strategy_id() -> impl Strategy<Value = StrategyId> {
        proptest::sample::select(StrategyId::ALL.to_vec())
    }

    proptest! {
        /// Same inputs, same breakeven
        #[test]
        fn prop_breakeven_is_deterministic(
            facts in facts_strategy(),
            assumptions in assumptions_strategy(),
            strategy in strategy_id(),
        ) {
            let first = estimate_breakeven_for(strategy, &facts, &assumptions);
            let second = estimate_breakeven_for(strategy, &facts, &assumptions);
            prop_assert_eq!(first.to_bits(), second.to_bits());
        }

        /// Breakeven and buy price are finite and never negative
        #[test]
        fn prop_results_are_finite_and_non_negative(
            facts in facts_strategy(),
            assumptions in assumptions_strategy(),
            strategy in strategy_id(),
        ) {
            let breakeven = estimate_breakeven_for(strategy, &facts, &assumptions);
            let buy_price = calculate_buy_price_for(strategy, &facts, &assumptions);
            prop_assert!(breakeven.is_finite() && breakeven >= 0.0, "breakeven {}", breakeven);
            prop_assert!(buy_price.is_finite() && buy_price >= 0.0, "buy price {}", buy_price);
        }

        /// Never recommend offering above asking
        #[test]
        fn prop_buy_price_never_exceeds_list_price(
            facts in facts_strategy(),
            assumptions in assumptions_strategy(),
            strategy in strategy_id(),
        ) {
            let buy_price = calculate_buy_price_for(strategy, &facts, &assumptions);
            let list_price = to_finite_number(Some(facts.list_price)).max(0.0);
            prop_assert!(buy_price <= list_price, "{} > {}", buy_price, list_price);
        }

        /// Without rent the long-term rental cannot break even
        #[test]
        fn prop_zero_rent_falls_back_to_list_price(
            list_price in 1.0..2_000_000.0f64,
            taxes in 0.0..20_000.0f64,
            assumptions in assumptions_strategy(),
        ) {
            let facts = PropertyFacts::new(list_price, 0.0, taxes, 0.0);
            prop_assert_eq!(estimate_breakeven(&facts, &assumptions), 0.0);
            prop_assert_eq!(calculate_buy_price(&facts, &assumptions), list_price);
        }

        /// Sanitizing twice is the same as sanitizing once
        #[test]
        fn prop_sanitization_is_idempotent(value in proptest::option::of(any_number())) {
            let once = to_finite_number(value);
            prop_assert_eq!(to_finite_number(Some(once)).to_bits(), once.to_bits());
            prop_assert!(once.is_finite());
        }

        /// Scores stay in range and agree with the grade table
        #[test]
        fn prop_score_is_bounded(
            breakeven in any_number(),
            list_price in any_number(),
            days in proptest::option::of(-30i64..1_000),
        ) {
            let result = score_opportunity(breakeven, list_price, ListingAvailability::Unknown, days);
            prop_assert!(result.score <= 100);
            prop_assert_eq!(result.grade, grade_for_score(result.score));
        }

        /// Seeding never allocates more rooms than a real listing can have
        #[test]
        fn prop_house_hack_seed_bounds_rented_rooms(
            bedrooms in proptest::option::of(any_bedrooms()),
            rent in any_number(),
        ) {
            let property = SavedProperty {
                list_price: Some(300_000.0),
                monthly_rent: Some(rent),
                bedrooms,
                ..Default::default()
            };
            let inputs = seed_inputs(&HouseHackWorksheet::default(), &property).unwrap();
            prop_assert!(inputs.unit_rents.len() < MAX_BEDROOMS as usize);
            prop_assert!(inputs.owner_market_rent.is_finite());
        }
    }
}
