//! Deal opportunity scoring and verdict labels
//!
//! Two independent 0-100 scales live here. The opportunity grade combines the
//! breakeven gap, listing availability and days on market. The verdict label
//! is read off a deal score produced elsewhere. They use different
//! breakpoints and are shown in different places, so they are kept apart.

use serde::{Deserialize, Serialize};

use crate::validation::{finite, non_negative};

// ============================================================================
// Weights
// ============================================================================

/// Sub-score weights, summing to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub deal_gap: f64,
    pub availability: f64,
    pub days_on_market: f64,
}

pub const OPPORTUNITY_WEIGHTS: ScoreWeights = ScoreWeights {
    deal_gap: 0.50,
    availability: 0.30,
    days_on_market: 0.20,
};

/// Points of deal-gap score per percent of gap
const GAP_SCORE_PER_PERCENT: f64 = 4.0;

// ============================================================================
// Availability
// ============================================================================

/// Listing-status classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingAvailability {
    Withdrawn,
    PriceReduced,
    BankOwned,
    Fsbo,
    AgentListed,
    OffMarket,
    ForRent,
    Pending,
    Sold,
    Unknown,
}

/// How motivated the seller is likely to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Motivation {
    High,
    Medium,
    Low,
}

impl ListingAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingAvailability::Withdrawn => "WITHDRAWN",
            ListingAvailability::PriceReduced => "PRICE_REDUCED",
            ListingAvailability::BankOwned => "BANK_OWNED",
            ListingAvailability::Fsbo => "FSBO",
            ListingAvailability::AgentListed => "AGENT_LISTED",
            ListingAvailability::OffMarket => "OFF_MARKET",
            ListingAvailability::ForRent => "FOR_RENT",
            ListingAvailability::Pending => "PENDING",
            ListingAvailability::Sold => "SOLD",
            ListingAvailability::Unknown => "UNKNOWN",
        }
    }

    /// Parse a status name, falling back to `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "WITHDRAWN" => ListingAvailability::Withdrawn,
            "PRICE_REDUCED" => ListingAvailability::PriceReduced,
            "BANK_OWNED" | "REO" => ListingAvailability::BankOwned,
            "FSBO" => ListingAvailability::Fsbo,
            "AGENT_LISTED" => ListingAvailability::AgentListed,
            "OFF_MARKET" => ListingAvailability::OffMarket,
            "FOR_RENT" => ListingAvailability::ForRent,
            "PENDING" => ListingAvailability::Pending,
            "SOLD" => ListingAvailability::Sold,
            _ => ListingAvailability::Unknown,
        }
    }

    pub fn motivation(&self) -> Motivation {
        match self {
            ListingAvailability::Withdrawn
            | ListingAvailability::PriceReduced
            | ListingAvailability::BankOwned => Motivation::High,
            ListingAvailability::Fsbo
            | ListingAvailability::AgentListed
            | ListingAvailability::OffMarket => Motivation::Medium,
            ListingAvailability::ForRent
            | ListingAvailability::Pending
            | ListingAvailability::Sold
            | ListingAvailability::Unknown => Motivation::Low,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            ListingAvailability::Withdrawn => 100.0,
            ListingAvailability::PriceReduced => 90.0,
            ListingAvailability::BankOwned => 85.0,
            ListingAvailability::Fsbo => 70.0,
            ListingAvailability::AgentListed => 60.0,
            ListingAvailability::OffMarket => 50.0,
            ListingAvailability::ForRent => 35.0,
            ListingAvailability::Pending => 15.0,
            ListingAvailability::Sold => 0.0,
            ListingAvailability::Unknown => 40.0,
        }
    }
}

impl Default for ListingAvailability {
    fn default() -> Self {
        ListingAvailability::Unknown
    }
}

// ============================================================================
// Days on market
// ============================================================================

/// Negotiating leverage from time on market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leverage {
    High,
    Medium,
    Low,
    Unknown,
}

/// Score and leverage for days on market. Unknown days score neutrally.
pub fn days_on_market_score(days: Option<i64>) -> (f64, Leverage) {
    let Some(days) = days else {
        return (50.0, Leverage::Unknown);
    };
    match days.max(0) {
        0..=7 => (0.0, Leverage::Low),
        8..=30 => (25.0, Leverage::Low),
        31..=60 => (50.0, Leverage::Medium),
        61..=90 => (70.0, Leverage::Medium),
        91..=180 => (85.0, Leverage::High),
        _ => (100.0, Leverage::High),
    }
}

// ============================================================================
// Deal gap
// ============================================================================

/// Percent the list price sits above breakeven.
///
/// `None` when either price is non-positive.
pub fn deal_gap_percent(breakeven_price: f64, list_price: f64) -> Option<f64> {
    let breakeven = finite(breakeven_price);
    let list = finite(list_price);
    if list <= 0.0 || breakeven <= 0.0 {
        return None;
    }
    Some((list - breakeven) / list * 100.0)
}

pub fn deal_gap_score(gap_percent: Option<f64>) -> f64 {
    gap_percent
        .map(|gap| (gap * GAP_SCORE_PER_PERCENT).clamp(0.0, 100.0))
        .unwrap_or(0.0)
}

// ============================================================================
// Opportunity grade
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl OpportunityGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityGrade::APlus => "A+",
            OpportunityGrade::A => "A",
            OpportunityGrade::B => "B",
            OpportunityGrade::C => "C",
            OpportunityGrade::D => "D",
            OpportunityGrade::F => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OpportunityGrade::APlus => "Exceptional",
            OpportunityGrade::A => "Excellent",
            OpportunityGrade::B => "Good",
            OpportunityGrade::C => "Fair",
            OpportunityGrade::D => "Weak",
            OpportunityGrade::F => "Poor",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            OpportunityGrade::APlus => "#10B981",
            OpportunityGrade::A => "#22C55E",
            OpportunityGrade::B => "#84CC16",
            OpportunityGrade::C => "#EAB308",
            OpportunityGrade::D => "#F97316",
            OpportunityGrade::F => "#EF4444",
        }
    }
}

impl std::fmt::Display for OpportunityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Grade for a 0-100 opportunity score, lower bounds inclusive
pub fn grade_for_score(score: u8) -> OpportunityGrade {
    match score {
        85.. => OpportunityGrade::APlus,
        70..=84 => OpportunityGrade::A,
        55..=69 => OpportunityGrade::B,
        40..=54 => OpportunityGrade::C,
        25..=39 => OpportunityGrade::D,
        _ => OpportunityGrade::F,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealGapFactor {
    pub gap_percent: Option<f64>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityFactor {
    pub status: ListingAvailability,
    pub motivation: Motivation,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaysOnMarketFactor {
    pub days: Option<i64>,
    pub leverage: Leverage,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityFactors {
    pub deal_gap: DealGapFactor,
    pub availability: AvailabilityFactor,
    pub days_on_market: DaysOnMarketFactor,
    pub weights: ScoreWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealOpportunityScore {
    pub score: u8,
    pub grade: OpportunityGrade,
    pub label: String,
    pub color: String,
    pub factors: OpportunityFactors,
}

/// Weighted 0-100 opportunity score with letter grade
pub fn score_opportunity(
    breakeven_price: f64,
    list_price: f64,
    availability: ListingAvailability,
    days_on_market: Option<i64>,
) -> DealOpportunityScore {
    let weights = OPPORTUNITY_WEIGHTS;

    let gap_percent = deal_gap_percent(breakeven_price, list_price);
    let gap_score = deal_gap_score(gap_percent);
    let availability_score = availability.score();
    let (dom_score, leverage) = days_on_market_score(days_on_market);

    let weighted = gap_score * weights.deal_gap
        + availability_score * weights.availability
        + dom_score * weights.days_on_market;
    let score = non_negative(weighted.round()).min(100.0) as u8;
    let grade = grade_for_score(score);

    DealOpportunityScore {
        score,
        grade,
        label: grade.label().to_string(),
        color: grade.color().to_string(),
        factors: OpportunityFactors {
            deal_gap: DealGapFactor {
                gap_percent,
                score: gap_score,
            },
            availability: AvailabilityFactor {
                status: availability,
                motivation: availability.motivation(),
                score: availability_score,
            },
            days_on_market: DaysOnMarketFactor {
                days: days_on_market,
                leverage,
                score: dom_score,
            },
            weights,
        },
    }
}

// ============================================================================
// Verdict label
// ============================================================================

/// Color tokens for the verdict ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictColor {
    Green,
    AccentBlue,
    Gold,
    Orange,
    Red,
}

impl VerdictColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictColor::Green => "green",
            VerdictColor::AccentBlue => "accent-blue",
            VerdictColor::Gold => "gold",
            VerdictColor::Orange => "orange",
            VerdictColor::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: &'static str,
    pub color: VerdictColor,
}

/// Verdict for a raw 0-100 deal score
pub fn verdict_for_score(deal_score: f64) -> Verdict {
    let score = finite(deal_score);
    let (label, color) = if score >= 80.0 {
        ("Strong Opportunity", VerdictColor::Green)
    } else if score >= 65.0 {
        ("Good Opportunity", VerdictColor::AccentBlue)
    } else if score >= 50.0 {
        ("Moderate Opportunity", VerdictColor::Gold)
    } else if score >= 30.0 {
        ("Below Average", VerdictColor::Orange)
    } else {
        ("Poor Opportunity", VerdictColor::Red)
    };
    Verdict { label, color }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let w = OPPORTUNITY_WEIGHTS;
        assert!((w.deal_gap + w.availability + w.days_on_market - 1.0).abs() < 1e-12);
    }

    #[test]
    fn grade_boundaries_are_inclusive() {
        let cases = [
            (100, "A+"),
            (85, "A+"),
            (84, "A"),
            (70, "A"),
            (69, "B"),
            (55, "B"),
            (54, "C"),
            (40, "C"),
            (39, "D"),
            (25, "D"),
            (24, "F"),
            (0, "F"),
        ];
        for (score, grade) in cases {
            assert_eq!(grade_for_score(score).as_str(), grade, "score {}", score);
        }
    }

    #[test]
    fn grade_table_labels_and_colors() {
        assert_eq!(OpportunityGrade::APlus.label(), "Exceptional");
        assert_eq!(OpportunityGrade::APlus.color(), "#10B981");
        assert_eq!(OpportunityGrade::C.label(), "Fair");
        assert_eq!(OpportunityGrade::F.color(), "#EF4444");
        assert_eq!(serde_json::to_value(OpportunityGrade::APlus).unwrap(), "A+");
    }

    #[test]
    fn negative_gap_scores_zero() {
        let gap = deal_gap_percent(300_000.0, 250_000.0);
        assert!(gap.unwrap() < 0.0);
        assert_eq!(deal_gap_score(gap), 0.0);
    }

    #[test]
    fn gap_score_saturates() {
        assert_eq!(deal_gap_score(Some(40.0)), 100.0);
        assert_eq!(deal_gap_score(Some(10.0)), 40.0);
        assert_eq!(deal_gap_score(None), 0.0);
    }

    #[test]
    fn unsolvable_breakeven_has_no_gap() {
        assert_eq!(deal_gap_percent(0.0, 250_000.0), None);
        assert_eq!(deal_gap_percent(200_000.0, 0.0), None);
        assert_eq!(deal_gap_percent(f64::NAN, 250_000.0), None);
    }

    #[test]
    fn availability_table() {
        assert_eq!(ListingAvailability::Withdrawn.motivation(), Motivation::High);
        assert_eq!(ListingAvailability::Fsbo.motivation(), Motivation::Medium);
        assert_eq!(ListingAvailability::Sold.score(), 0.0);
        assert!(ListingAvailability::PriceReduced.score() > ListingAvailability::AgentListed.score());
    }

    #[test]
    fn availability_parsing() {
        assert_eq!(ListingAvailability::parse("price_reduced"), ListingAvailability::PriceReduced);
        assert_eq!(ListingAvailability::parse("Bank Owned"), ListingAvailability::BankOwned);
        assert_eq!(ListingAvailability::parse("FSBO"), ListingAvailability::Fsbo);
        assert_eq!(ListingAvailability::parse("coming soon"), ListingAvailability::Unknown);
        assert_eq!(ListingAvailability::parse(ListingAvailability::ForRent.as_str()), ListingAvailability::ForRent);
    }

    #[test]
    fn days_on_market_table() {
        assert_eq!(days_on_market_score(None), (50.0, Leverage::Unknown));
        assert_eq!(days_on_market_score(Some(-3)), (0.0, Leverage::Low));
        assert_eq!(days_on_market_score(Some(30)), (25.0, Leverage::Low));
        assert_eq!(days_on_market_score(Some(31)), (50.0, Leverage::Medium));
        assert_eq!(days_on_market_score(Some(120)), (85.0, Leverage::High));
        assert_eq!(days_on_market_score(Some(400)), (100.0, Leverage::High));
    }

    #[test]
    fn score_opportunity_reports_factors() {
        let result = score_opportunity(200_000.0, 250_000.0, ListingAvailability::PriceReduced, Some(95));
        // gap 20% -> 80; 80*0.5 + 90*0.3 + 85*0.2 = 84
        assert_eq!(result.score, 84);
        assert_eq!(result.grade, OpportunityGrade::A);
        assert_eq!(result.label, "Excellent");
        assert_eq!(result.factors.availability.motivation, Motivation::High);
        assert_eq!(result.factors.days_on_market.leverage, Leverage::High);
        assert_eq!(result.factors.weights, OPPORTUNITY_WEIGHTS);
    }

    #[test]
    fn engineered_inputs_land_on_grade_cutoffs() {
        let cases = [
            (78_750.0, ListingAvailability::BankOwned, Some(120), 85, OpportunityGrade::APlus),
            (82_500.0, ListingAvailability::Fsbo, Some(75), 70, OpportunityGrade::A),
            (86_500.0, ListingAvailability::AgentListed, Some(45), 55, OpportunityGrade::B),
            (90_000.0, ListingAvailability::OffMarket, Some(20), 40, OpportunityGrade::C),
            (92_750.0, ListingAvailability::ForRent, Some(5), 25, OpportunityGrade::D),
            (120_000.0, ListingAvailability::Sold, Some(3), 0, OpportunityGrade::F),
        ];
        for (breakeven, status, days, score, grade) in cases {
            let result = score_opportunity(breakeven, 100_000.0, status, days);
            assert_eq!(result.score, score, "{:?}", status);
            assert_eq!(result.grade, grade);
        }
    }

    #[test]
    fn verdict_table_is_distinct_from_grades() {
        let cases = [
            (80.0, "Strong Opportunity", "green"),
            (79.9, "Good Opportunity", "accent-blue"),
            (65.0, "Good Opportunity", "accent-blue"),
            (50.0, "Moderate Opportunity", "gold"),
            (30.0, "Below Average", "orange"),
            (29.0, "Poor Opportunity", "red"),
            (f64::NAN, "Poor Opportunity", "red"),
        ];
        for (score, label, color) in cases {
            let verdict = verdict_for_score(score);
            assert_eq!(verdict.label, label);
            assert_eq!(verdict.color.as_str(), color);
        }
        // 85 is the A+ cutoff for grades but only "Strong" for verdicts
        assert_eq!(verdict_for_score(85.0).label, "Strong Opportunity");
        assert_eq!(grade_for_score(80), OpportunityGrade::A);
    }
}
