//! Property snapshot and normalized property facts

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{finite_or_none, non_negative, normalize_rate, to_finite_number};

/// Occupancy assumed for short-term rentals when the market data has none
pub const DEFAULT_STR_OCCUPANCY: f64 = 0.65;

/// Largest bedroom count treated as real listing data
pub const MAX_BEDROOMS: f64 = 20.0;

/// Saved property as delivered by the property-data service.
///
/// Every field is optional because upstream records are frequently partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedProperty {
    pub id: Option<Uuid>,
    pub address: Option<String>,
    pub list_price: Option<f64>,
    pub monthly_rent: Option<f64>,
    /// Annual property taxes
    pub property_taxes: Option<f64>,
    /// Annual insurance premium
    pub insurance: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub sqft: Option<f64>,
    pub arv: Option<f64>,
    pub average_daily_rate: Option<f64>,
    pub occupancy_rate: Option<f64>,
    /// Listing status text, e.g. `PRICE_REDUCED`
    pub listing_status: Option<String>,
    pub days_on_market: Option<i64>,
}

impl SavedProperty {
    pub fn facts(&self) -> PropertyFacts {
        PropertyFacts::from_snapshot(self)
    }
}

/// Read-only financial facts about a property, normalized for formulas.
///
/// Money fields are `0` when unknown. Descriptive fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyFacts {
    pub list_price: f64,
    pub monthly_rent: f64,
    pub property_taxes_annual: f64,
    pub insurance_annual: f64,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub square_footage: Option<f64>,
    pub arv: Option<f64>,
    pub average_daily_rate: Option<f64>,
    pub occupancy_rate: Option<f64>,
}

impl PropertyFacts {
    pub fn new(list_price: f64, monthly_rent: f64, property_taxes_annual: f64, insurance_annual: f64) -> Self {
        Self {
            list_price,
            monthly_rent,
            property_taxes_annual,
            insurance_annual,
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: &SavedProperty) -> Self {
        Self {
            list_price: to_finite_number(snapshot.list_price),
            monthly_rent: to_finite_number(snapshot.monthly_rent),
            property_taxes_annual: to_finite_number(snapshot.property_taxes),
            insurance_annual: to_finite_number(snapshot.insurance),
            bedrooms: snapshot.bedrooms,
            bathrooms: snapshot.bathrooms,
            square_footage: snapshot.sqft,
            arv: snapshot.arv,
            average_daily_rate: snapshot.average_daily_rate,
            occupancy_rate: snapshot.occupancy_rate,
        }
        .sanitized()
    }

    /// Copy with every field coerced into its safe domain
    pub fn sanitized(&self) -> Self {
        let positive = |v: Option<f64>| finite_or_none(v).filter(|v| *v > 0.0);
        Self {
            list_price: non_negative(self.list_price),
            monthly_rent: non_negative(self.monthly_rent),
            property_taxes_annual: non_negative(self.property_taxes_annual),
            insurance_annual: non_negative(self.insurance_annual),
            bedrooms: positive(self.bedrooms).filter(|b| *b <= MAX_BEDROOMS),
            bathrooms: positive(self.bathrooms),
            square_footage: positive(self.square_footage),
            arv: positive(self.arv),
            average_daily_rate: positive(self.average_daily_rate),
            occupancy_rate: finite_or_none(self.occupancy_rate).map(normalize_rate),
        }
    }

    /// After-repair value, falling back to the list price
    pub fn arv_or_list_price(&self) -> f64 {
        self.arv.unwrap_or(self.list_price)
    }

    pub fn occupancy_or_default(&self) -> f64 {
        self.occupancy_rate.unwrap_or(DEFAULT_STR_OCCUPANCY)
    }

    pub fn with_arv(mut self, arv: f64) -> Self {
        self.arv = Some(arv);
        self
    }

    pub fn with_bedrooms(mut self, bedrooms: f64) -> Self {
        self.bedrooms = Some(bedrooms);
        self
    }

    pub fn with_short_term_rates(mut self, average_daily_rate: f64, occupancy_rate: f64) -> Self {
        self.average_daily_rate = Some(average_daily_rate);
        self.occupancy_rate = Some(occupancy_rate);
        self
    }
}
