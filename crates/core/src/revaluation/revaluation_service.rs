use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::revaluation_errors::RevaluationError;
use super::revaluation_model::{
    CombinedRevaluationResult, FailedRevaluation, PriceFetchResult, RevaluationResult,
};
use crate::constants::{ERROR_CODE_FETCH_ERROR, ERROR_CODE_NO_PRICE};
use crate::errors::{Error, Result};
use crate::fx::{CurrencyConverter, FxRepositoryTrait, RateFetchService};
use crate::holdings::{HoldingRepositoryTrait, HoldingSnapshot, UnitOfWorkTrait};
use crate::instruments::InstrumentService;
use crate::market_data::{PriceFetchService, PriceRepositoryTrait, PriceSnapshot};
use crate::pricing::calculate_current_value;
use crate::settings::ValuationSettings;

/// Surface the engine exposes to its caller (a thin API layer).
#[async_trait]
pub trait RevaluationServiceTrait: Send + Sync {
    /// Builds a new holding snapshot set for `date` from the most recent
    /// prior set, using whatever prices and rates are already stored.
    async fn revalue_holdings(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<RevaluationResult>;

    /// Fetches and persists prices and FX rates for `date`.
    async fn fetch_and_persist_prices(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<PriceFetchResult>;

    /// Chains the fetch phase and the revaluation phase. Per-instrument
    /// fetch failures degrade gracefully; a systemic fetch error aborts
    /// before any revaluation happens.
    async fn fetch_prices_and_revalue(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<CombinedRevaluationResult>;
}

/// Orchestrates the revaluation workflow:
/// resolve source -> load prices -> apply per holding -> replace and persist.
///
/// The per-holding loop is strictly sequential and every outcome is a
/// brand-new snapshot value; one bad holding is recorded and skipped, never
/// aborting the batch. The persist step is the only transactional boundary:
/// everything commits or nothing does.
pub struct RevaluationService {
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    price_repository: Arc<dyn PriceRepositoryTrait>,
    fx_repository: Arc<dyn FxRepositoryTrait>,
    unit_of_work: Arc<dyn UnitOfWorkTrait>,
    instrument_service: Arc<InstrumentService>,
    price_fetch_service: Arc<PriceFetchService>,
    rate_fetch_service: Arc<RateFetchService>,
    settings: Arc<ValuationSettings>,
    /// Shared with the fetchers; holding-level rollforward lookups go
    /// through the same gate as fetch-phase lookbacks.
    lookback_gate: Arc<Mutex<()>>,
}

impl RevaluationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        price_repository: Arc<dyn PriceRepositoryTrait>,
        fx_repository: Arc<dyn FxRepositoryTrait>,
        unit_of_work: Arc<dyn UnitOfWorkTrait>,
        instrument_service: Arc<InstrumentService>,
        price_fetch_service: Arc<PriceFetchService>,
        rate_fetch_service: Arc<RateFetchService>,
        settings: Arc<ValuationSettings>,
        lookback_gate: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            holding_repository,
            price_repository,
            fx_repository,
            unit_of_work,
            instrument_service,
            price_fetch_service,
            rate_fetch_service,
            settings,
            lookback_gate,
        }
    }

    /// Computes one holding's target-date snapshot. Failures are per-holding
    /// and collected by the caller.
    async fn apply_holding(
        &self,
        source: &HoldingSnapshot,
        prices: &HashMap<String, PriceSnapshot>,
        rates: &CurrencyConverter,
        date: NaiveDate,
    ) -> std::result::Result<HoldingSnapshot, FailedRevaluation> {
        // Cash is never priced: its value is its unit amount, and measuring
        // the change against the stored previous value self-heals any drift.
        if source.symbol == self.settings.cash_symbol {
            return Ok(source.revalued(date, source.unit_amount));
        }

        if let Some(price) = prices.get(&source.symbol) {
            let current_value = calculate_current_value(
                source.unit_amount,
                price.price,
                &source.symbol,
                &price.currency,
                date,
                rates,
                &self.settings,
            );
            return Ok(source.revalued(date, current_value));
        }

        // No price made it into the map for this date, not even a
        // rolled-forward one. If the instrument has any prior price at all,
        // the position itself rolls forward unchanged; an instrument with no
        // price history anywhere is a data fault.
        let prior = {
            let _gate = self.lookback_gate.lock().await;
            self.price_repository
                .get_latest_price_before(&source.symbol, date)
        };

        match prior {
            Ok(Some(_)) => {
                debug!(
                    "No price for {} on {}; rolling the holding forward",
                    source.symbol, date
                );
                Ok(source.rolled_forward(date))
            }
            Ok(None) => Err(FailedRevaluation {
                symbol: source.symbol.clone(),
                name: source.instrument_name.clone(),
                error_code: ERROR_CODE_NO_PRICE.to_string(),
                error_message: format!(
                    "no price for {} and no prior price to roll forward",
                    date
                ),
            }),
            Err(e) => Err(FailedRevaluation {
                symbol: source.symbol.clone(),
                name: source.instrument_name.clone(),
                error_code: ERROR_CODE_FETCH_ERROR.to_string(),
                error_message: format!("price lookup failed: {}", e),
            }),
        }
    }

    /// Replaces the target date's snapshot set inside one unit-of-work:
    /// delete whatever is stored for the date, insert the new set, commit.
    /// Any failure rolls the entire batch back, pre-existing rows included.
    /// Returns the number of rows the new set replaced.
    async fn persist(&self, date: NaiveDate, holdings: &[HoldingSnapshot]) -> Result<usize> {
        self.unit_of_work.begin_transaction().await?;

        let replaced = match self.holding_repository.delete_holdings_by_date(date).await {
            Ok(replaced) => replaced,
            Err(e) => {
                if let Err(rollback_err) = self.unit_of_work.rollback().await {
                    error!("Rollback after failed delete also failed: {}", rollback_err);
                }
                return Err(RevaluationError::Transaction(e.to_string()).into());
            }
        };

        if let Err(e) = self.holding_repository.add_holdings(holdings).await {
            if let Err(rollback_err) = self.unit_of_work.rollback().await {
                error!("Rollback after failed insert also failed: {}", rollback_err);
            }
            return Err(RevaluationError::Transaction(e.to_string()).into());
        }

        if let Err(e) = self.unit_of_work.commit().await {
            if let Err(rollback_err) = self.unit_of_work.rollback().await {
                error!("Rollback after failed commit also failed: {}", rollback_err);
            }
            return Err(RevaluationError::Transaction(e.to_string()).into());
        }

        Ok(replaced)
    }
}

#[async_trait]
impl RevaluationServiceTrait for RevaluationService {
    async fn revalue_holdings(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<RevaluationResult> {
        let started = Instant::now();

        // ResolveSource: the most recent snapshot set strictly before the
        // target date is what we revalue from.
        let source_date = self
            .holding_repository
            .get_latest_valuation_date_before(date)?
            .ok_or(RevaluationError::EmptyUniverse(date))?;
        let source_holdings = self.holding_repository.get_holdings_by_date(source_date)?;

        info!(
            "Revaluing {} holdings from {} to {}",
            source_holdings.len(),
            source_date,
            date
        );

        // LoadPrices: everything the per-holding loop needs, up front.
        let prices: HashMap<String, PriceSnapshot> = self
            .price_repository
            .get_prices_for_date(date)?
            .into_iter()
            .map(|price| (price.symbol.clone(), price))
            .collect();
        let rates = CurrencyConverter::new(self.fx_repository.get_rates_on_or_before(date)?);

        // ApplyPerHolding: strictly sequential; all results share the one
        // unit-of-work below, so no concurrent mutation is permitted here.
        let mut new_holdings = Vec::with_capacity(source_holdings.len());
        let mut failures = Vec::new();

        for source in &source_holdings {
            match self.apply_holding(source, &prices, &rates, date).await {
                Ok(holding) => new_holdings.push(holding),
                Err(failure) => {
                    warn!(
                        "Skipping {} ({}): {}",
                        failure.symbol, failure.error_code, failure.error_message
                    );
                    failures.push(failure);
                }
            }
        }

        // Nothing has been written yet, so honoring cancellation here leaves
        // no partially-committed state.
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Persist: replace the target date's set, all-or-nothing at the
        // storage boundary.
        let replaced_holdings = self.persist(date, &new_holdings).await?;
        if replaced_holdings > 0 {
            debug!(
                "Replaced {} existing holdings for {}",
                replaced_holdings, date
            );
        }

        let result = RevaluationResult {
            source_date,
            target_date: date,
            total_holdings: source_holdings.len(),
            successful_revaluations: new_holdings.len(),
            failed_revaluations: failures.len(),
            replaced_holdings,
            failures,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Revaluation for {} done: {}/{} holdings in {}ms ({} failed, {} replaced)",
            date,
            result.successful_revaluations,
            result.total_holdings,
            result.duration_ms,
            result.failed_revaluations,
            result.replaced_holdings
        );

        Ok(result)
    }

    async fn fetch_and_persist_prices(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<PriceFetchResult> {
        let started = Instant::now();

        // The universe is what the current snapshot set references, not every
        // instrument ever held; the most recent set on or before the fetch
        // date decides what needs a fresh price.
        let universe_date = self
            .holding_repository
            .get_latest_valuation_date_before(date + Duration::days(1))?;
        let instruments = self.instrument_service.distinct_instruments(universe_date)?;

        let (prices, rates) = tokio::join!(
            self.price_fetch_service
                .fetch_daily_prices(&instruments, date, cancel),
            self.rate_fetch_service.fetch_daily_rates(date, cancel),
        );

        Ok(PriceFetchResult {
            valuation_date: date,
            prices: prices?,
            rates: rates?,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn fetch_prices_and_revalue(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<CombinedRevaluationResult> {
        // Phase 1 failures per instrument are already degraded to
        // rollforwards or failure-list entries inside the result; only a
        // systemic error (provider misconfiguration, store failure,
        // cancellation) propagates and stops phase 2 from running.
        let fetch = self.fetch_and_persist_prices(date, cancel).await?;
        let revaluation = self.revalue_holdings(date, cancel).await?;

        Ok(CombinedRevaluationResult { fetch, revaluation })
    }
}
