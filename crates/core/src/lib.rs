//! Revalue Core - Portfolio valuation and revaluation engine.
//!
//! This crate contains the valuation domain: price and FX rate fetching with
//! rollforward, the pure pricing calculator, and the revaluation workflow
//! that rebuilds a holding snapshot set for a date. It is storage- and
//! provider-agnostic; the traits here are implemented by the storage and
//! market-data layers.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod holdings;
pub mod instruments;
pub mod market_data;
pub mod pricing;
pub mod revaluation;
pub mod settings;

// Re-export the operation surface and its result types
pub use revaluation::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
