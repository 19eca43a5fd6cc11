//! WebAssembly module for Deal Gap
//!
//! Exposes the shared calculation core to the web app and the mobile webview:
//! - Breakeven and buy price estimates
//! - Deal opportunity score and verdict label
//! - Metric lists for calculation results
//! - Strategy worksheet seeding, edits and payloads
//!
//! Structured values cross the boundary as JSON strings.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use shared::worksheets::{worksheet_for, DynWorksheet};
use shared::{
    build_metrics, estimate, score_opportunity, verdict_for_score, AssumptionLayers, AssumptionSet,
    ListingAvailability, PreviewSnapshot, PropertyFacts, SavedProperty, StrategyId, StrategyResult,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    log("dealgap-wasm ready");
}

fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

fn now() -> DateTime<Utc> {
    #[cfg(target_arch = "wasm32")]
    {
        DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Utc::now()
    }
}

fn to_js(message: String) -> JsValue {
    JsValue::from_str(&message)
}

fn parse<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn strategy(id: &str) -> Result<StrategyId, String> {
    StrategyId::parse(id).ok_or_else(|| format!("Unknown strategy: {}", id))
}

/// Empty input means system defaults
fn assumptions(json: &str) -> Result<AssumptionSet, String> {
    if json.trim().is_empty() {
        return Ok(AssumptionSet::default());
    }
    parse::<AssumptionSet>("assumptions", json).map(|a| a.sanitized())
}

fn worksheet(id: &str, assumptions_json: &str) -> Result<Box<dyn DynWorksheet>, String> {
    Ok(worksheet_for(strategy(id)?, &assumptions(assumptions_json)?))
}

// ============================================================================
// Breakeven
// ============================================================================

fn estimate_json(strategy_id: &str, facts_json: &str, assumptions_json: &str) -> Result<String, String> {
    let facts: PropertyFacts = parse("property facts", facts_json)?;
    to_json(&estimate(strategy(strategy_id)?, &facts, &assumptions(assumptions_json)?))
}

fn property_estimates_json(property_json: &str, assumptions_json: &str) -> Result<String, String> {
    let property: SavedProperty = parse("property", property_json)?;
    let facts = property.facts();
    let assumptions = assumptions(assumptions_json)?;
    let estimates: Vec<_> = StrategyId::ALL
        .into_iter()
        .map(|strategy| estimate(strategy, &facts, &assumptions))
        .collect();
    to_json(&estimates)
}

fn resolve_assumptions_json(layers_json: &str, defaults_json: &str) -> Result<String, String> {
    let layers: AssumptionLayers = parse("assumption layers", layers_json)?;
    to_json(&layers.resolve(&assumptions(defaults_json)?))
}

/// Coerce a JS number to a finite value (`NaN` and infinities become 0)
#[wasm_bindgen]
pub fn to_finite_number(value: f64) -> f64 {
    shared::to_finite_number(Some(value))
}

/// Breakeven estimate for one strategy, as JSON
#[wasm_bindgen]
pub fn estimate_breakeven(strategy_id: &str, facts_json: &str, assumptions_json: &str) -> Result<String, JsValue> {
    estimate_json(strategy_id, facts_json, assumptions_json).map_err(to_js)
}

/// Estimates for every strategy from a saved property, as a JSON array
#[wasm_bindgen]
pub fn estimate_property(property_json: &str, assumptions_json: &str) -> Result<String, JsValue> {
    property_estimates_json(property_json, assumptions_json).map_err(to_js)
}

/// Merge assumption layers over the given defaults
#[wasm_bindgen]
pub fn resolve_assumptions(layers_json: &str, defaults_json: &str) -> Result<String, JsValue> {
    resolve_assumptions_json(layers_json, defaults_json).map_err(to_js)
}

// ============================================================================
// Scoring
// ============================================================================

fn opportunity_json(
    breakeven_price: f64,
    list_price: f64,
    listing_status: &str,
    days_on_market: Option<i32>,
) -> Result<String, String> {
    let score = score_opportunity(
        breakeven_price,
        list_price,
        ListingAvailability::parse(listing_status),
        days_on_market.map(i64::from),
    );
    to_json(&score)
}

#[wasm_bindgen]
pub fn score_deal_opportunity(
    breakeven_price: f64,
    list_price: f64,
    listing_status: &str,
    days_on_market: Option<i32>,
) -> Result<String, JsValue> {
    opportunity_json(breakeven_price, list_price, listing_status, days_on_market).map_err(to_js)
}

#[wasm_bindgen]
pub fn verdict_label(deal_score: f64) -> String {
    verdict_for_score(deal_score).label.to_string()
}

#[wasm_bindgen]
pub fn verdict_color(deal_score: f64) -> String {
    verdict_for_score(deal_score).color.as_str().to_string()
}

// ============================================================================
// Metrics and formatting
// ============================================================================

fn metrics_json(strategy_id: &str, result_json: &str) -> Result<String, String> {
    let strategy = strategy(strategy_id)?;
    let result: Option<StrategyResult> = if result_json.trim().is_empty() {
        None
    } else {
        parse("result", result_json)?
    };
    to_json(&build_metrics(strategy, result.as_ref()))
}

/// Display metrics for a calculation result. `null` or an empty string
/// yields the no-data state.
#[wasm_bindgen]
pub fn strategy_metrics(strategy_id: &str, result_json: &str) -> Result<String, JsValue> {
    metrics_json(strategy_id, result_json).map_err(to_js)
}

#[wasm_bindgen]
pub fn format_currency(value: f64) -> String {
    shared::format_currency(value)
}

#[wasm_bindgen]
pub fn format_percent(value: f64) -> String {
    shared::format_percent(value)
}

#[wasm_bindgen]
pub fn format_compact_currency(value: f64) -> String {
    shared::format_compact_currency(value)
}

// ============================================================================
// Worksheets
// ============================================================================

fn endpoint_for(strategy_id: &str) -> Result<String, String> {
    Ok(worksheet(strategy_id, "")?.endpoint_path())
}

fn defaults_json(strategy_id: &str, assumptions_json: &str) -> Result<String, String> {
    let inputs = worksheet(strategy_id, assumptions_json)?
        .defaults()
        .map_err(|e| e.to_string())?;
    to_json(&inputs)
}

fn seed_json(strategy_id: &str, property_json: &str, assumptions_json: &str) -> Result<String, String> {
    let property: SavedProperty = parse("property", property_json)?;
    let inputs = worksheet(strategy_id, assumptions_json)?
        .seed(&property)
        .map_err(|e| e.to_string())?;
    to_json(&inputs)
}

fn update_json(
    strategy_id: &str,
    inputs_json: &str,
    key: &str,
    value_json: &str,
    assumptions_json: &str,
) -> Result<String, String> {
    let inputs: Value = parse("inputs", inputs_json)?;
    let value: Value = parse("value", value_json)?;
    let updated = worksheet(strategy_id, assumptions_json)?
        .update(&inputs, key, value)
        .map_err(|e| {
            log(&format!("Rejected {} edit: {}", key, e));
            e.to_string()
        })?;
    to_json(&updated)
}

fn payload_json(strategy_id: &str, inputs_json: &str, assumptions_json: &str) -> Result<String, String> {
    let inputs: Value = parse("inputs", inputs_json)?;
    let payload = worksheet(strategy_id, assumptions_json)?
        .payload(&inputs)
        .map_err(|e| e.to_string())?;
    to_json(&payload)
}

fn preview_fresh(snapshot_json: &str, at: DateTime<Utc>) -> Result<bool, String> {
    let snapshot: PreviewSnapshot = parse("preview", snapshot_json)?;
    Ok(snapshot.is_fresh_default(at))
}

/// Calculation endpoint path for a strategy
#[wasm_bindgen]
pub fn worksheet_endpoint(strategy_id: &str) -> Result<String, JsValue> {
    endpoint_for(strategy_id).map_err(to_js)
}

#[wasm_bindgen]
pub fn worksheet_defaults(strategy_id: &str, assumptions_json: &str) -> Result<String, JsValue> {
    defaults_json(strategy_id, assumptions_json).map_err(to_js)
}

/// Worksheet inputs seeded from a saved property
#[wasm_bindgen]
pub fn worksheet_seed(strategy_id: &str, property_json: &str, assumptions_json: &str) -> Result<String, JsValue> {
    seed_json(strategy_id, property_json, assumptions_json).map_err(to_js)
}

/// Apply one edit, including cross-field rules. `value_json` is a JSON value.
#[wasm_bindgen]
pub fn worksheet_update(
    strategy_id: &str,
    inputs_json: &str,
    key: &str,
    value_json: &str,
    assumptions_json: &str,
) -> Result<String, JsValue> {
    update_json(strategy_id, inputs_json, key, value_json, assumptions_json).map_err(to_js)
}

/// Request body for the calculation endpoint
#[wasm_bindgen]
pub fn worksheet_payload(strategy_id: &str, inputs_json: &str, assumptions_json: &str) -> Result<String, JsValue> {
    payload_json(strategy_id, inputs_json, assumptions_json).map_err(to_js)
}

/// Whether a stored preview snapshot is still usable
#[wasm_bindgen]
pub fn is_preview_fresh(snapshot_json: &str) -> Result<bool, JsValue> {
    preview_fresh(snapshot_json, now()).map_err(to_js)
}
