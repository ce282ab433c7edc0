use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RevaluationError {
    /// No holding snapshot set exists before the target date, so there is
    /// nothing to revalue from.
    #[error("No holding snapshots exist before {0}; nothing to revalue from")]
    EmptyUniverse(NaiveDate),

    /// A single holding could not be computed. Collected per holding, never
    /// aborts the batch.
    #[error("Holding calculation failed: {0}")]
    Calculation(String),

    /// The persist step failed; the whole batch was rolled back.
    #[error("Snapshot persistence failed: {0}")]
    Transaction(String),
}
