use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fx::RateFetchSummary;
use crate::market_data::PriceFetchSummary;

/// One holding that could not be revalued. Returned in the operation result,
/// never persisted; the holding is excluded from the new snapshot set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRevaluation {
    pub symbol: String,
    pub name: String,
    pub error_code: String,
    pub error_message: String,
}

/// Outcome of one revaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevaluationResult {
    /// The snapshot date the run revalued from.
    pub source_date: NaiveDate,
    pub target_date: NaiveDate,
    pub total_holdings: usize,
    pub successful_revaluations: usize,
    pub failed_revaluations: usize,
    /// Holdings already stored for the target date that were deleted before
    /// the rebuild (replace semantics).
    pub replaced_holdings: usize,
    pub failures: Vec<FailedRevaluation>,
    pub duration_ms: u64,
}

/// Outcome of one price-and-rate fetch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFetchResult {
    pub valuation_date: NaiveDate,
    pub prices: PriceFetchSummary,
    pub rates: RateFetchSummary,
    pub duration_ms: u64,
}

/// Outcome of the combined fetch-then-revalue operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedRevaluationResult {
    pub fetch: PriceFetchResult,
    pub revaluation: RevaluationResult,
}
