use async_trait::async_trait;
use chrono::NaiveDate;

use super::market_data_errors::MarketDataError;
use super::market_data_model::{EndOfDayPrice, PriceSnapshot};
use crate::errors::Result;

/// External end-of-day price provider.
#[async_trait]
pub trait MarketDataProviderTrait: Send + Sync {
    /// Provider name, for logging and failure reports.
    fn name(&self) -> &str;

    /// End-of-day price for a ticker on a date. `Ok(None)` means the provider
    /// has no data for the date (non-trading day); errors are
    /// provider/transport failures.
    async fn get_end_of_day_price(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> std::result::Result<Option<EndOfDayPrice>, MarketDataError>;
}

/// Persistence seam for price snapshots. Implemented by the storage layer.
#[async_trait]
pub trait PriceRepositoryTrait: Send + Sync {
    /// Snapshot stored for the exact (instrument, date) key, if any.
    fn get_by_symbol_and_date(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<PriceSnapshot>>;

    /// Most recent snapshot for the instrument strictly before `date`.
    fn get_latest_price_before(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<PriceSnapshot>>;

    /// All snapshots stored for a valuation date.
    fn get_prices_for_date(&self, date: NaiveDate) -> Result<Vec<PriceSnapshot>>;

    /// Insert-or-replace keyed by (instrument, date). Returns the affected
    /// count. Each row is upserted independently of any transaction, so
    /// partial results survive a later failure.
    async fn bulk_upsert(&self, prices: Vec<PriceSnapshot>) -> Result<usize>;
}
