use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::fx_errors::FxError;
use super::fx_model::ExchangeRate;
use crate::errors::Result;

/// External end-of-day FX rate provider.
#[async_trait]
pub trait FxProviderTrait: Send + Sync {
    /// Provider name recorded as the rate source.
    fn name(&self) -> &str;

    /// End-of-day rate for one unit of `base` expressed in `target`.
    /// `Ok(None)` means the provider has no data for the date (non-trading
    /// day); errors are provider/transport failures.
    async fn get_end_of_day_rate(
        &self,
        base: &str,
        target: &str,
        date: NaiveDate,
    ) -> std::result::Result<Option<Decimal>, FxError>;
}

/// Persistence seam for exchange rates. Implemented by the storage layer.
#[async_trait]
pub trait FxRepositoryTrait: Send + Sync {
    /// Rate stored for the exact (pair, date) key, if any.
    fn get_rate(&self, base: &str, target: &str, date: NaiveDate) -> Result<Option<ExchangeRate>>;

    /// Most recent stored rate for the pair strictly before `date`.
    fn get_latest_rate_before(
        &self,
        base: &str,
        target: &str,
        date: NaiveDate,
    ) -> Result<Option<ExchangeRate>>;

    /// All rates dated on or before `date`, across every pair.
    fn get_rates_on_or_before(&self, date: NaiveDate) -> Result<Vec<ExchangeRate>>;

    /// Insert-or-replace keyed by (pair, date). Returns the affected count.
    async fn bulk_upsert(&self, rates: Vec<ExchangeRate>) -> Result<usize>;
}
