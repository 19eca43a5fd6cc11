//! Worksheet preview snapshots

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{StrategyId, StrategyResult};

/// Preview snapshots older than this are ignored
pub const PREVIEW_FRESHNESS_SECS: i64 = 60 * 60;

/// Last worksheet state for a property, kept so reopening a worksheet can
/// show numbers before the first calculation round-trip completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSnapshot {
    pub property_id: Option<Uuid>,
    pub strategy: StrategyId,
    pub inputs: serde_json::Value,
    pub result: Option<StrategyResult>,
    pub saved_at: DateTime<Utc>,
}

impl PreviewSnapshot {
    pub fn new(
        property_id: Option<Uuid>,
        strategy: StrategyId,
        inputs: serde_json::Value,
        result: Option<StrategyResult>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            property_id,
            strategy,
            inputs,
            result,
            saved_at,
        }
    }

    /// Whether the snapshot is younger than `ttl` at `now`.
    ///
    /// A snapshot stamped in the future is treated as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now - self.saved_at;
        age >= Duration::zero() && age < ttl
    }

    pub fn is_fresh_default(&self, now: DateTime<Utc>) -> bool {
        self.is_fresh(now, Duration::seconds(PREVIEW_FRESHNESS_SECS))
    }
}
