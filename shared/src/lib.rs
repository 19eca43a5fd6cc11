//! Deal analysis core shared by the worksheet service and the web/mobile
//! clients (via WASM).
//!
//! Everything in this crate is pure: breakeven solving, metric formatting,
//! opportunity scoring and the per-strategy worksheet configurations. No
//! I/O, no async.

pub mod amortization;
pub mod breakeven;
pub mod format;
pub mod metrics;
pub mod models;
pub mod scoring;
pub mod types;
pub mod validation;
pub mod worksheets;

pub use amortization::*;
pub use breakeven::*;
pub use format::*;
pub use metrics::*;
pub use models::*;
pub use scoring::*;
pub use types::*;
pub use validation::*;
