//! Worksheet controller tests
//!
//! Covers the debounce and cancellation discipline of the worksheet actor:
//! - Rapid edits produce exactly one request built from the final inputs
//! - A superseded in-flight response never reaches the state
//! - Failed calculations keep the last good result
//! - Seeding, preview restore, and unmount

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dealgap_worksheet::{
    CalculationEndpoint, InMemoryPreviewStore, PreviewStore, WorksheetBuilder, WorksheetError, WorksheetHandle,
    WorksheetResult, WorksheetSettings, WorksheetStatus,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use shared::worksheets::{InputError, LtrInputs, LtrWorksheet, StrategyConfig};
use shared::{PreviewSnapshot, SavedProperty, StrategyId, StrategyResult};
use tokio_test::assert_ok;
use uuid::Uuid;

// ============================================================================
// Test Helpers
// ============================================================================

struct Scripted {
    delay: Duration,
    error: Option<WorksheetError>,
}

/// Calculation endpoint that records every request and echoes the purchase price
#[derive(Default)]
struct MockEndpoint {
    calls: Mutex<Vec<(String, Value)>>,
    script: Mutex<VecDeque<Scripted>>,
    completed: AtomicUsize,
}

impl MockEndpoint {
    fn then(self, delay_ms: u64, error: Option<WorksheetError>) -> Self {
        self.script.lock().unwrap().push_back(Scripted {
            delay: Duration::from_millis(delay_ms),
            error,
        });
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn payload(&self, index: usize) -> Value {
        self.calls.lock().unwrap()[index].1.clone()
    }
}

#[async_trait]
impl CalculationEndpoint for MockEndpoint {
    async fn calculate(&self, path: &str, payload: &Value) -> WorksheetResult<StrategyResult> {
        self.calls.lock().unwrap().push((path.to_string(), payload.clone()));
        let scripted = self.script.lock().unwrap().pop_front();

        if let Some(Scripted { delay, error }) = scripted {
            tokio::time::sleep(delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = error {
                return Err(error);
            }
        } else {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        Ok(StrategyResult::new()
            .with("purchase_price", payload["purchase_price"].clone())
            .with("monthly_cash_flow", 250))
    }
}

fn settings(calculate_on_seed: bool) -> WorksheetSettings {
    WorksheetSettings {
        debounce_ms: 500,
        calculate_on_seed,
        ..WorksheetSettings::default()
    }
}

fn spawn(endpoint: &Arc<MockEndpoint>, calculate_on_seed: bool) -> WorksheetHandle<LtrInputs> {
    WorksheetBuilder::new(LtrWorksheet::default(), endpoint.clone() as Arc<dyn CalculationEndpoint>)
        .settings(settings(calculate_on_seed))
        .spawn()
}

fn property(id: Option<Uuid>) -> SavedProperty {
    SavedProperty {
        id,
        list_price: Some(300_000.0),
        monthly_rent: Some(2_000.0),
        property_taxes: Some(4_500.0),
        insurance: Some(1_200.0),
        ..Default::default()
    }
}

fn purchase_price(data: &Option<StrategyResult>) -> f64 {
    data.as_ref().map(|d| d.number("purchase_price")).unwrap_or(-1.0)
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_issue_one_request_with_final_inputs() {
        let endpoint = Arc::new(MockEndpoint::default());
        let handle = spawn(&endpoint, false);

        assert_ok!(handle.update("purchase_price", 250_000).await);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_ok!(handle.update("purchase_price", 260_000).await);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_ok!(handle.update("purchase_price", 270_000).await);
        assert_eq!(endpoint.call_count(), 0);

        let state = handle.settled().await.unwrap();
        assert_eq!(state.status, WorksheetStatus::Settled);
        assert_eq!(endpoint.call_count(), 1);
        assert_eq!(endpoint.payload(0)["purchase_price"], json!(270_000.0));
        assert_eq!(purchase_price(&state.data), 270_000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn request_goes_to_strategy_endpoint() {
        let endpoint = Arc::new(MockEndpoint::default());
        let handle = spawn(&endpoint, false);

        handle.update("monthly_rent", 2_100).await.unwrap();
        handle.settled().await.unwrap();

        let (path, _) = endpoint.calls.lock().unwrap()[0].clone();
        assert_eq!(path, "/api/v1/worksheet/ltr/calculate");
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_response_is_discarded() {
        let endpoint = Arc::new(MockEndpoint::default().then(1_000, None).then(0, None));
        let handle = spawn(&endpoint, false);

        handle.update("purchase_price", 100_000).await.unwrap();
        // First request starts at 500ms and would finish at 1500ms
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(handle.state().status, WorksheetStatus::Calculating);
        handle.update("purchase_price", 200_000).await.unwrap();

        let state = handle.settled().await.unwrap();
        assert_eq!(purchase_price(&state.data), 200_000.0);
        assert_eq!(endpoint.call_count(), 2);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(purchase_price(&handle.state().data), 200_000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_last_result() {
        let unavailable = WorksheetError::Status {
            status: 503,
            body: "maintenance".into(),
        };
        let endpoint = Arc::new(MockEndpoint::default().then(0, None).then(0, Some(unavailable)));
        let handle = spawn(&endpoint, false);

        handle.update("purchase_price", 180_000).await.unwrap();
        handle.settled().await.unwrap();

        handle.update("purchase_price", 190_000).await.unwrap();
        let state = handle.settled().await.unwrap();
        assert_eq!(state.status, WorksheetStatus::Error);
        assert_eq!(purchase_price(&state.data), 180_000.0);
        assert_eq!(state.error.as_ref().map(|e| e.code()), Some("CALCULATION_FAILED"));
        assert_eq!(state.inputs.purchase_price, 190_000.0);

        handle.dismiss_error().await.unwrap();
        let state = handle.state();
        assert!(state.error.is_none());
        assert_eq!(state.status, WorksheetStatus::Settled);
        assert!(handle.metrics().is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_field_is_rejected_without_request() {
        let endpoint = Arc::new(MockEndpoint::default());
        let handle = spawn(&endpoint, false);

        let err = handle.update("asking_price", 1).await.unwrap_err();
        assert_eq!(
            err,
            WorksheetError::InvalidInput(InputError::UnknownField("asking_price".into()))
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(endpoint.call_count(), 0);
        assert_eq!(handle.state().status, WorksheetStatus::Uninitialized);
    }

    #[tokio::test(start_paused = true)]
    async fn seed_calculates_immediately_when_enabled() {
        let endpoint = Arc::new(MockEndpoint::default());
        let handle = spawn(&endpoint, true);

        handle.seed(property(None)).await.unwrap();
        let state = handle.settled().await.unwrap();

        assert_eq!(endpoint.call_count(), 1);
        assert_eq!(endpoint.payload(0)["list_price"], json!(300_000.0));
        assert_eq!(endpoint.payload(0)["monthly_rent"], json!(2_000.0));
        assert_eq!(purchase_price(&state.data), state.inputs.purchase_price);
    }

    #[tokio::test(start_paused = true)]
    async fn seed_without_auto_calculate_waits_for_edit() {
        let endpoint = Arc::new(MockEndpoint::default());
        let handle = spawn(&endpoint, false);

        handle.seed(property(None)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let state = handle.state();
        assert_eq!(state.status, WorksheetStatus::Seeded);
        assert_eq!(state.inputs.list_price, 300_000.0);
        assert_eq!(endpoint.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn seed_restores_fresh_preview() {
        let endpoint = Arc::new(MockEndpoint::default());
        let store = Arc::new(InMemoryPreviewStore::new());
        let id = Uuid::new_v4();

        let inputs = LtrInputs {
            purchase_price: 123_456.0,
            ..LtrWorksheet::default().default_inputs()
        };
        let result = StrategyResult::new().with("monthly_cash_flow", 310);
        store
            .save(PreviewSnapshot::new(
                Some(id),
                StrategyId::Ltr,
                serde_json::to_value(&inputs).unwrap(),
                Some(result.clone()),
                Utc::now(),
            ))
            .await;

        let handle = WorksheetBuilder::new(LtrWorksheet::default(), endpoint.clone() as Arc<dyn CalculationEndpoint>)
            .settings(settings(false))
            .previews(store.clone())
            .spawn();
        handle.seed(property(Some(id))).await.unwrap();

        let state = handle.state();
        assert_eq!(state.inputs, inputs);
        assert_eq!(state.data, Some(result));
        assert_eq!(endpoint.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_result_is_saved_as_preview() {
        let endpoint = Arc::new(MockEndpoint::default());
        let store = Arc::new(InMemoryPreviewStore::new());
        let id = Uuid::new_v4();

        let handle = WorksheetBuilder::new(LtrWorksheet::default(), endpoint.clone() as Arc<dyn CalculationEndpoint>)
            .settings(settings(true))
            .previews(store.clone())
            .spawn();
        handle.seed(property(Some(id))).await.unwrap();
        let state = handle.settled().await.unwrap();

        let snapshot = store.load(Some(id), StrategyId::Ltr).await.unwrap();
        assert_eq!(snapshot.result, state.data);
        assert_eq!(snapshot.inputs, serde_json::to_value(&state.inputs).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn recalculate_skips_debounce() {
        let endpoint = Arc::new(MockEndpoint::default());
        let handle = spawn(&endpoint, true);

        handle.seed(property(None)).await.unwrap();
        handle.settled().await.unwrap();

        handle.recalculate().await.unwrap();
        handle.settled().await.unwrap();
        assert_eq!(endpoint.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels_pending_calculation() {
        let endpoint = Arc::new(MockEndpoint::default());
        let handle = spawn(&endpoint, false);

        handle.update("purchase_price", 150_000).await.unwrap();
        drop(handle);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(endpoint.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels_in_flight_request() {
        let endpoint = Arc::new(MockEndpoint::default().then(1_000, None));
        let handle = spawn(&endpoint, false);

        handle.update("purchase_price", 150_000).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(handle.state().status, WorksheetStatus::Calculating);
        assert_eq!(endpoint.call_count(), 1);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(endpoint.call_count(), 1);
        assert_eq!(endpoint.completed(), 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Edits closer together than the debounce window settle into a
        /// single request for the last price
        #[test]
        fn prop_edit_bursts_settle_once(
            edits in prop::collection::vec((10_000u32..900_000, 0u64..450), 1..8)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            let (calls, sent, settled) = runtime.block_on(async {
                let endpoint = Arc::new(MockEndpoint::default());
                let handle = spawn(&endpoint, false);

                for (price, gap_ms) in &edits {
                    handle.update("purchase_price", *price).await.unwrap();
                    tokio::time::sleep(Duration::from_millis(*gap_ms)).await;
                }
                let state = handle.settled().await.unwrap();
                (endpoint.call_count(), endpoint.payload(0), purchase_price(&state.data))
            });

            let last = edits.last().map(|(price, _)| *price as f64).unwrap();
            prop_assert_eq!(calls, 1);
            prop_assert_eq!(sent["purchase_price"].as_f64(), Some(last));
            prop_assert_eq!(settled, last);
        }
    }
}
