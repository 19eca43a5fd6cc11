//! Worksheet preview snapshots
//!
//! The last inputs and result per (property, strategy) are kept so a
//! reopened worksheet can show numbers before its first round-trip.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::{PreviewSnapshot, StrategyId};
use tokio::sync::RwLock;
use uuid::Uuid;

type PreviewKey = (Option<Uuid>, StrategyId);

#[async_trait]
pub trait PreviewStore: Send + Sync {
    async fn load(&self, property_id: Option<Uuid>, strategy: StrategyId) -> Option<PreviewSnapshot>;

    async fn save(&self, snapshot: PreviewSnapshot);

    async fn remove(&self, property_id: Option<Uuid>, strategy: StrategyId);
}

/// Snapshot for the key when it is younger than `ttl`
pub async fn load_fresh<S>(
    store: &S,
    property_id: Option<Uuid>,
    strategy: StrategyId,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Option<PreviewSnapshot>
where
    S: PreviewStore + ?Sized,
{
    store
        .load(property_id, strategy)
        .await
        .filter(|snapshot| snapshot.is_fresh(now, ttl))
}

#[derive(Default)]
pub struct InMemoryPreviewStore {
    entries: RwLock<HashMap<PreviewKey, PreviewSnapshot>>,
}

impl InMemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop every snapshot older than `ttl`
    pub async fn purge_expired(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, snapshot| snapshot.is_fresh(now, ttl));
        before - entries.len()
    }
}

#[async_trait]
impl PreviewStore for InMemoryPreviewStore {
    async fn load(&self, property_id: Option<Uuid>, strategy: StrategyId) -> Option<PreviewSnapshot> {
        self.entries.read().await.get(&(property_id, strategy)).cloned()
    }

    async fn save(&self, snapshot: PreviewSnapshot) {
        let key = (snapshot.property_id, snapshot.strategy);
        self.entries.write().await.insert(key, snapshot);
    }

    async fn remove(&self, property_id: Option<Uuid>, strategy: StrategyId) {
        self.entries.write().await.remove(&(property_id, strategy));
    }
}
