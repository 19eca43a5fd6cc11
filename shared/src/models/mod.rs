//! Domain models for the deal analysis engine

mod assumptions;
mod property;
mod snapshot;

pub use assumptions::*;
pub use property::*;
pub use snapshot::*;
