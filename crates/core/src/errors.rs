//! Core error types for the revaluation engine.
//!
//! This module defines storage-agnostic error types. Storage-specific errors
//! (from whatever backs the holding and price stores) are converted to these
//! types by the storage layer.

use thiserror::Error;

use crate::fx::FxError;
use crate::market_data::MarketDataError;
use crate::revaluation::RevaluationError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the revaluation engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Revaluation failed: {0}")]
    Revaluation(#[from] RevaluationError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
