use async_trait::async_trait;
use chrono::NaiveDate;

use super::holdings_model::HoldingSnapshot;
use crate::errors::Result;
use crate::instruments::Instrument;

/// Persistence seam for holding snapshots. Implemented by the storage layer.
#[async_trait]
pub trait HoldingRepositoryTrait: Send + Sync {
    /// Latest valuation date with stored holdings strictly before `date`.
    fn get_latest_valuation_date_before(&self, date: NaiveDate) -> Result<Option<NaiveDate>>;

    /// All holding snapshots stored for a valuation date.
    fn get_holdings_by_date(&self, date: NaiveDate) -> Result<Vec<HoldingSnapshot>>;

    /// Deletes every holding snapshot for a valuation date, returning the
    /// count removed.
    async fn delete_holdings_by_date(&self, date: NaiveDate) -> Result<usize>;

    /// Inserts new holding snapshots. Callers wrap this in a unit of work;
    /// a failure here must leave nothing of the batch behind.
    async fn add_holdings(&self, holdings: &[HoldingSnapshot]) -> Result<usize>;

    /// Distinct instruments referenced by holdings on `date`, or across all
    /// dates when `date` is `None`.
    fn get_distinct_instruments(&self, date: Option<NaiveDate>) -> Result<Vec<Instrument>>;
}

/// Transaction boundary around the persist step. One begin/commit pair wraps
/// the whole batch; rollback undoes everything written since begin.
#[async_trait]
pub trait UnitOfWorkTrait: Send + Sync {
    async fn begin_transaction(&self) -> Result<()>;
    async fn commit(&self) -> Result<()>;
    async fn rollback(&self) -> Result<()>;
}
