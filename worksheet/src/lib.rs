//! Deal Gap worksheet client
//!
//! Async side of the strategy worksheets: an actor per open worksheet that
//! debounces edits, posts them to the calculation service, and publishes the
//! latest result without letting a superseded response overwrite it.

pub mod cache;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod preview;

pub use cache::{Clock, DefaultsCache, SystemClock};
pub use client::{CalculationEndpoint, DefaultsSource, HttpCalculationClient};
pub use config::{ApiConfig, Config, WorksheetSettings};
pub use controller::{WorksheetBuilder, WorksheetHandle, WorksheetState, WorksheetStatus};
pub use error::{ErrorBanner, WorksheetError, WorksheetResult};
pub use preview::{InMemoryPreviewStore, PreviewStore};
