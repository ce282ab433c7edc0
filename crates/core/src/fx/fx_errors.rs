use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    /// Neither a direct nor an inverse rate existed for the pair on or
    /// before the requested date.
    #[error("No exchange rate available for {from}/{to} on or before {date}")]
    NoRateAvailable {
        from: String,
        to: String,
        date: NaiveDate,
    },

    #[error("FX provider error: {0}")]
    Provider(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),
}
