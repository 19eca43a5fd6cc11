//! Strategy worksheet configurations
//!
//! A worksheet is driven entirely by its [`StrategyConfig`]: the default
//! form state, how that state is seeded from a saved property, the payload
//! sent to the calculation endpoint, and cross-field rules applied while the
//! user edits. The async controller in the worksheet crate and the JS bridge
//! both work through this one contract.
//!
//! Inputs are edited as JSON patches. A patch is merged over the serialized
//! inputs and the result is deserialized back, so an edit either produces a
//! valid `Inputs` value or a typed [`InputError`].

mod brrrr;
mod flip;
mod house_hack;
mod ltr;
mod short_term;
mod wholesale;

pub use brrrr::{BrrrrInputs, BrrrrWorksheet};
pub use flip::{FlipInputs, FlipWorksheet};
pub use house_hack::{HouseHackInputs, HouseHackWorksheet, DEFAULT_FHA_MAX_PRICE};
pub use ltr::{LtrInputs, LtrWorksheet};
pub use short_term::{StrInputs, StrWorksheet};
pub use wholesale::{WholesaleInputs, WholesaleWorksheet};

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::breakeven::rehab_budget;
use crate::models::{AssumptionSet, SavedProperty};
use crate::types::StrategyId;
use crate::validation::{finite_or_none, non_negative, value_to_finite};

/// Partial inputs, keyed by input field name
pub type InputPatch = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Unknown input field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Worksheet inputs are malformed: {0}")]
    Malformed(String),
}

/// Per-strategy worksheet behaviour
pub trait StrategyConfig: Send + Sync + 'static {
    type Inputs: Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static;

    fn strategy(&self) -> StrategyId;

    fn strategy_name(&self) -> &'static str {
        self.strategy().display_name()
    }

    /// Path of the calculation endpoint, relative to the API base URL
    fn api_path(&self) -> String {
        format!("/api/v1/worksheet/{}/calculate", self.strategy().as_str())
    }

    fn default_inputs(&self) -> Self::Inputs;

    /// Fields derived from the property, merged over `defaults`
    fn initialize_from_property(&self, property: &SavedProperty, defaults: &Self::Inputs) -> InputPatch;

    /// Request body for the calculation endpoint. Must depend on `inputs` only.
    fn build_payload(&self, inputs: &Self::Inputs) -> Value;

    /// Extra fields to change alongside `key`, if any
    fn on_update_input(&self, _key: &str, _value: &Value, _previous: &Self::Inputs) -> Option<InputPatch> {
        None
    }
}

/// Convert a `json!` object literal into a patch
pub(crate) fn into_patch(value: Value) -> InputPatch {
    match value {
        Value::Object(map) => map,
        _ => InputPatch::new(),
    }
}

/// Insert a property value when it is present and finite
pub(crate) fn set_known(patch: &mut InputPatch, key: &str, value: Option<f64>) {
    if let Some(v) = finite_or_none(value) {
        patch.insert(key.to_string(), Value::from(non_negative(v)));
    }
}

/// Re-seed `rehab_costs` after an ARV edit, unless the user has changed
/// the budget away from the automatic one
pub(crate) fn reseed_rehab(
    new_arv: &Value,
    previous_arv: f64,
    previous_rehab: f64,
    renovation_budget_pct: f64,
) -> Option<InputPatch> {
    if previous_rehab != rehab_budget(previous_arv, renovation_budget_pct) {
        return None;
    }
    let rehab = rehab_budget(value_to_finite(new_arv), renovation_budget_pct);
    Some(into_patch(serde_json::json!({ "rehab_costs": rehab })))
}

fn to_object<T: Serialize>(inputs: &T) -> Result<InputPatch, InputError> {
    match serde_json::to_value(inputs) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(InputError::Malformed("inputs must serialize to an object".to_string())),
        Err(e) => Err(InputError::Malformed(e.to_string())),
    }
}

/// Merge `patch` over `inputs`
pub fn merge_patch<T>(inputs: &T, patch: &InputPatch) -> Result<T, InputError>
where
    T: Serialize + DeserializeOwned,
{
    let mut object = to_object(inputs)?;
    for (key, value) in patch {
        object.insert(key.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(object)).map_err(|e| InputError::InvalidValue {
        field: patch.keys().cloned().collect::<Vec<_>>().join(", "),
        message: e.to_string(),
    })
}

/// Default inputs with the property-derived fields applied
pub fn seed_inputs<C: StrategyConfig>(config: &C, property: &SavedProperty) -> Result<C::Inputs, InputError> {
    let defaults = config.default_inputs();
    let patch = config.initialize_from_property(property, &defaults);
    merge_patch(&defaults, &patch)
}

/// Set one field and apply the strategy's cross-field rule for it
pub fn update_input<C: StrategyConfig>(
    config: &C,
    previous: &C::Inputs,
    key: &str,
    value: Value,
) -> Result<C::Inputs, InputError> {
    if !to_object(previous)?.contains_key(key) {
        return Err(InputError::UnknownField(key.to_string()));
    }

    let synced = config.on_update_input(key, &value, previous);
    let mut patch = InputPatch::new();
    patch.insert(key.to_string(), value);
    if let Some(extra) = synced {
        patch.extend(extra);
    }

    merge_patch(previous, &patch).map_err(|e| match e {
        InputError::InvalidValue { message, .. } => InputError::InvalidValue {
            field: key.to_string(),
            message,
        },
        other => other,
    })
}

/// Deserialize inputs from a stored JSON value, e.g. a preview snapshot
pub fn inputs_from_value<T: DeserializeOwned>(value: &Value) -> Result<T, InputError> {
    serde_json::from_value(value.clone()).map_err(|e| InputError::Malformed(e.to_string()))
}

// ============================================================================
// Type-erased worksheets
// ============================================================================

/// Object-safe view of a [`StrategyConfig`] with JSON inputs
pub trait DynWorksheet: Send + Sync {
    fn strategy_id(&self) -> StrategyId;
    fn name(&self) -> &'static str;
    fn endpoint_path(&self) -> String;
    fn defaults(&self) -> Result<Value, InputError>;
    fn seed(&self, property: &SavedProperty) -> Result<Value, InputError>;
    fn update(&self, inputs: &Value, key: &str, value: Value) -> Result<Value, InputError>;
    fn payload(&self, inputs: &Value) -> Result<Value, InputError>;
}

fn to_value<T: Serialize>(inputs: &T) -> Result<Value, InputError> {
    serde_json::to_value(inputs).map_err(|e| InputError::Malformed(e.to_string()))
}

impl<C: StrategyConfig> DynWorksheet for C {
    fn strategy_id(&self) -> StrategyId {
        self.strategy()
    }

    fn name(&self) -> &'static str {
        self.strategy_name()
    }

    fn endpoint_path(&self) -> String {
        self.api_path()
    }

    fn defaults(&self) -> Result<Value, InputError> {
        to_value(&self.default_inputs())
    }

    fn seed(&self, property: &SavedProperty) -> Result<Value, InputError> {
        to_value(&seed_inputs(self, property)?)
    }

    fn update(&self, inputs: &Value, key: &str, value: Value) -> Result<Value, InputError> {
        let previous: C::Inputs = inputs_from_value(inputs)?;
        to_value(&update_input(self, &previous, key, value)?)
    }

    fn payload(&self, inputs: &Value) -> Result<Value, InputError> {
        let inputs: C::Inputs = inputs_from_value(inputs)?;
        Ok(self.build_payload(&inputs))
    }
}

/// Worksheet for a strategy, seeded from the given assumptions
pub fn worksheet_for(strategy: StrategyId, assumptions: &AssumptionSet) -> Box<dyn DynWorksheet> {
    let assumptions = assumptions.sanitized();
    match strategy {
        StrategyId::Ltr => Box::new(LtrWorksheet::new(assumptions)),
        StrategyId::Str => Box::new(StrWorksheet::new(assumptions)),
        StrategyId::Brrrr => Box::new(BrrrrWorksheet::new(assumptions)),
        StrategyId::Flip => Box::new(FlipWorksheet::new(assumptions)),
        StrategyId::HouseHack => Box::new(HouseHackWorksheet::new(assumptions)),
        StrategyId::Wholesale => Box::new(WholesaleWorksheet::new(assumptions)),
    }
}

/// All six worksheets keyed by strategy
pub struct WorksheetRegistry {
    worksheets: BTreeMap<StrategyId, Box<dyn DynWorksheet>>,
}

impl WorksheetRegistry {
    pub fn new(assumptions: &AssumptionSet) -> Self {
        let worksheets = StrategyId::ALL
            .into_iter()
            .map(|strategy| (strategy, worksheet_for(strategy, assumptions)))
            .collect();
        Self { worksheets }
    }

    pub fn get(&self, strategy: StrategyId) -> Option<&dyn DynWorksheet> {
        self.worksheets.get(&strategy).map(|w| w.as_ref())
    }

    pub fn strategies(&self) -> impl Iterator<Item = StrategyId> + '_ {
        self.worksheets.keys().copied()
    }
}

impl Default for WorksheetRegistry {
    fn default() -> Self {
        Self::new(&AssumptionSet::default())
    }
}
