use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider had no data for the date and no prior snapshot existed
    /// to roll forward.
    #[error("No price data available for {symbol} on {date}")]
    NoData { symbol: String, date: String },

    #[error("Market data provider error: {0}")]
    Provider(String),
}
