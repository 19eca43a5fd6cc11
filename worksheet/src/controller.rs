//! Worksheet controller
//!
//! One actor task owns each worksheet. The handle sends it commands and
//! reads the published [`WorksheetState`]. Edits are debounced, and an edit
//! that arrives while a calculation is in flight drops that request, so only
//! the newest inputs can ever settle.

use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use shared::worksheets::{inputs_from_value, seed_inputs, update_input, StrategyConfig};
use shared::{build_metrics, PreviewSnapshot, SavedProperty, StrategyId, StrategyMetrics, StrategyResult};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::CalculationEndpoint;
use crate::config::WorksheetSettings;
use crate::error::{WorksheetError, WorksheetResult};
use crate::preview::{load_fresh, PreviewStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorksheetStatus {
    /// No property has been seeded yet
    Uninitialized,
    Seeded,
    /// Edited, waiting for the debounce window to pass
    Dirty,
    Calculating,
    Settled,
    /// Last calculation failed; `data` still holds the previous result
    Error,
}

impl WorksheetStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, WorksheetStatus::Settled | WorksheetStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetState<I> {
    pub status: WorksheetStatus,
    pub inputs: I,
    pub data: Option<StrategyResult>,
    pub error: Option<WorksheetError>,
    /// Bumped on every change that invalidates pending results
    pub generation: u64,
}

enum Command {
    Seed {
        property: SavedProperty,
        reply: oneshot::Sender<WorksheetResult<()>>,
    },
    Update {
        key: String,
        value: Value,
        reply: oneshot::Sender<WorksheetResult<()>>,
    },
    Recalculate {
        reply: oneshot::Sender<()>,
    },
    DismissError {
        reply: oneshot::Sender<()>,
    },
}

/// Scheduling change after a command
enum Next {
    Debounce,
    CalculateNow,
}

enum Event {
    Command(Option<Command>),
    DebounceElapsed,
    Finished(u64, WorksheetResult<StrategyResult>),
}

type CalculationFuture = Pin<Box<dyn Future<Output = WorksheetResult<StrategyResult>> + Send>>;

struct InFlight {
    generation: u64,
    future: CalculationFuture,
}

struct WorksheetActor<C: StrategyConfig> {
    config: C,
    endpoint: Arc<dyn CalculationEndpoint>,
    previews: Option<Arc<dyn PreviewStore>>,
    settings: WorksheetSettings,
    state: watch::Sender<WorksheetState<C::Inputs>>,
    property_id: Option<Uuid>,
    debounce: Option<Pin<Box<Sleep>>>,
    in_flight: Option<InFlight>,
}

async fn debounce_elapsed(timer: Option<&mut Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

async fn next_result(in_flight: Option<&mut InFlight>) -> (u64, WorksheetResult<StrategyResult>) {
    match in_flight {
        Some(request) => (request.generation, request.future.as_mut().await),
        None => pending().await,
    }
}

impl<C: StrategyConfig> WorksheetActor<C> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let event = tokio::select! {
                command = commands.recv() => Event::Command(command),
                _ = debounce_elapsed(self.debounce.as_mut()) => Event::DebounceElapsed,
                (generation, result) = next_result(self.in_flight.as_mut()) => {
                    Event::Finished(generation, result)
                }
            };

            match event {
                Event::Command(None) => break,
                Event::Command(Some(command)) => self.handle_command(command).await,
                Event::DebounceElapsed => self.apply(Next::CalculateNow),
                Event::Finished(generation, result) => {
                    self.in_flight = None;
                    self.finish(generation, result).await;
                }
            }
        }
        debug!(strategy = self.config.strategy().as_str(), "Worksheet closed");
    }

    /// Apply a command, then reply once the resulting state is published
    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Seed { property, reply } => {
                let outcome = self.seed(&property).await;
                if outcome.is_ok() && self.settings.calculate_on_seed {
                    self.apply(Next::CalculateNow);
                }
                let _ = reply.send(outcome);
            }
            Command::Update { key, value, reply } => {
                let previous = self.state.borrow().inputs.clone();
                match update_input(&self.config, &previous, &key, value) {
                    Ok(inputs) => {
                        self.state.send_modify(|state| {
                            state.inputs = inputs;
                            state.status = WorksheetStatus::Dirty;
                            state.generation += 1;
                        });
                        self.apply(Next::Debounce);
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        debug!(key = %key, error = %e, "Rejected worksheet edit");
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }
            Command::Recalculate { reply } => {
                self.state.send_modify(|state| state.generation += 1);
                self.apply(Next::CalculateNow);
                let _ = reply.send(());
            }
            Command::DismissError { reply } => {
                self.state.send_modify(|state| {
                    state.error = None;
                    if state.status == WorksheetStatus::Error {
                        state.status = if state.data.is_some() {
                            WorksheetStatus::Settled
                        } else {
                            WorksheetStatus::Seeded
                        };
                    }
                });
                let _ = reply.send(());
            }
        }
    }

    async fn seed(&mut self, property: &SavedProperty) -> WorksheetResult<()> {
        let strategy = self.config.strategy();
        let mut inputs = seed_inputs(&self.config, property)?;
        let mut data = None;

        if let Some(store) = &self.previews {
            let ttl = self.settings.preview_ttl();
            if let Some(snapshot) = load_fresh(store.as_ref(), property.id, strategy, Utc::now(), ttl).await {
                match inputs_from_value::<C::Inputs>(&snapshot.inputs) {
                    Ok(restored) => {
                        debug!(strategy = strategy.as_str(), "Restored worksheet preview");
                        inputs = restored;
                        data = snapshot.result;
                    }
                    Err(e) => warn!(strategy = strategy.as_str(), error = %e, "Ignoring unreadable preview"),
                }
            }
        }

        self.property_id = property.id;
        self.debounce = None;
        self.in_flight = None;
        self.state.send_modify(|state| {
            state.inputs = inputs;
            state.data = data;
            state.error = None;
            state.status = WorksheetStatus::Seeded;
            state.generation += 1;
        });
        Ok(())
    }

    fn apply(&mut self, next: Next) {
        match next {
            Next::Debounce => {
                // A newer edit supersedes whatever is in flight
                self.in_flight = None;
                self.debounce = Some(Box::pin(sleep(self.settings.debounce())));
            }
            Next::CalculateNow => {
                self.debounce = None;
                self.in_flight = Some(self.start_calculation());
            }
        }
    }

    fn start_calculation(&mut self) -> InFlight {
        let (generation, payload) = {
            let state = self.state.borrow();
            (state.generation, self.config.build_payload(&state.inputs))
        };
        let path = self.config.api_path();
        debug!(
            strategy = self.config.strategy().as_str(),
            generation, "Calculating worksheet"
        );

        self.state.send_modify(|state| state.status = WorksheetStatus::Calculating);

        let endpoint = Arc::clone(&self.endpoint);
        InFlight {
            generation,
            future: Box::pin(async move { endpoint.calculate(&path, &payload).await }),
        }
    }

    async fn finish(&mut self, generation: u64, result: WorksheetResult<StrategyResult>) {
        let strategy = self.config.strategy();
        if generation != self.state.borrow().generation {
            debug!(strategy = strategy.as_str(), generation, "Discarding superseded result");
            return;
        }

        match result {
            Ok(data) => {
                self.save_preview(&data).await;
                self.state.send_modify(|state| {
                    state.data = Some(data);
                    state.error = None;
                    state.status = WorksheetStatus::Settled;
                });
            }
            Err(e) => {
                warn!(strategy = strategy.as_str(), error = %e, "Worksheet calculation failed");
                self.state.send_modify(|state| {
                    state.error = Some(e);
                    state.status = WorksheetStatus::Error;
                });
            }
        }
    }

    async fn save_preview(&mut self, data: &StrategyResult) {
        let Some(store) = &self.previews else {
            return;
        };
        let snapshot = {
            let state = self.state.borrow();
            match serde_json::to_value(&state.inputs) {
                Ok(inputs) => PreviewSnapshot::new(
                    self.property_id,
                    self.config.strategy(),
                    inputs,
                    Some(data.clone()),
                    Utc::now(),
                ),
                Err(e) => {
                    warn!(error = %e, "Could not serialize worksheet inputs for preview");
                    return;
                }
            }
        };
        store.save(snapshot).await;
    }
}

/// Configures and spawns a worksheet actor
pub struct WorksheetBuilder<C: StrategyConfig> {
    config: C,
    endpoint: Arc<dyn CalculationEndpoint>,
    settings: WorksheetSettings,
    previews: Option<Arc<dyn PreviewStore>>,
}

impl<C: StrategyConfig> WorksheetBuilder<C> {
    pub fn new(config: C, endpoint: Arc<dyn CalculationEndpoint>) -> Self {
        Self {
            config,
            endpoint,
            settings: WorksheetSettings::default(),
            previews: None,
        }
    }

    pub fn settings(mut self, settings: WorksheetSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn previews(mut self, store: Arc<dyn PreviewStore>) -> Self {
        self.previews = Some(store);
        self
    }

    /// Start the actor on the current tokio runtime
    pub fn spawn(self) -> WorksheetHandle<C::Inputs> {
        let strategy = self.config.strategy();
        let (state_tx, state_rx) = watch::channel(WorksheetState {
            status: WorksheetStatus::Uninitialized,
            inputs: self.config.default_inputs(),
            data: None,
            error: None,
            generation: 0,
        });
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let actor = WorksheetActor {
            config: self.config,
            endpoint: self.endpoint,
            previews: self.previews,
            settings: self.settings,
            state: state_tx,
            property_id: None,
            debounce: None,
            in_flight: None,
        };
        let task = tokio::spawn(actor.run(command_rx));

        WorksheetHandle {
            strategy,
            commands: command_tx,
            state: state_rx,
            task,
        }
    }
}

/// Client side of a running worksheet. Dropping it stops the worksheet and
/// cancels any pending calculation.
pub struct WorksheetHandle<I> {
    strategy: StrategyId,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<WorksheetState<I>>,
    task: JoinHandle<()>,
}

impl<I> WorksheetHandle<I>
where
    I: Clone + Send + Sync + 'static,
{
    pub fn strategy(&self) -> StrategyId {
        self.strategy
    }

    fn send(&self, command: Command) -> WorksheetResult<()> {
        self.commands.send(command).map_err(|_| WorksheetError::Closed)
    }

    /// Seed inputs from a saved property
    pub async fn seed(&self, property: SavedProperty) -> WorksheetResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Seed { property, reply })?;
        response.await.map_err(|_| WorksheetError::Closed)?
    }

    /// Edit one input field. Resolves once the edit is applied, not once it
    /// has been calculated.
    pub async fn update(&self, key: &str, value: impl Into<Value>) -> WorksheetResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Update {
            key: key.to_string(),
            value: value.into(),
            reply,
        })?;
        response.await.map_err(|_| WorksheetError::Closed)?
    }

    /// Calculate now, skipping the debounce window
    pub async fn recalculate(&self) -> WorksheetResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Recalculate { reply })?;
        response.await.map_err(|_| WorksheetError::Closed)
    }

    pub async fn dismiss_error(&self) -> WorksheetResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::DismissError { reply })?;
        response.await.map_err(|_| WorksheetError::Closed)
    }

    pub fn state(&self) -> WorksheetState<I> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorksheetState<I>> {
        self.state.clone()
    }

    /// Wait until the worksheet is settled or in error
    pub async fn settled(&self) -> WorksheetResult<WorksheetState<I>> {
        let mut receiver = self.state.clone();
        let state = receiver
            .wait_for(|state| state.status.is_idle())
            .await
            .map_err(|_| WorksheetError::Closed)?;
        Ok((*state).clone())
    }

    /// Display metrics for the current result
    pub fn metrics(&self) -> StrategyMetrics {
        build_metrics(self.strategy, self.state.borrow().data.as_ref())
    }
}

impl<I> Drop for WorksheetHandle<I> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
