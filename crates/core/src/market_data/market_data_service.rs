use chrono::{Duration, NaiveDate, Utc};
use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

use super::market_data_model::{
    EndOfDayPrice, FailedFetch, PriceFetchSummary, PriceSnapshot, PriceStatus,
};
use super::market_data_traits::{MarketDataProviderTrait, PriceRepositoryTrait};
use crate::constants::{ERROR_CODE_FETCH_ERROR, ERROR_CODE_NO_DATA};
use crate::errors::{Error, Result};
use crate::instruments::Instrument;
use crate::settings::ValuationSettings;

/// Outcome of a single instrument's fetch task.
enum FetchOutcome {
    Snapshot(PriceSnapshot),
    Failed(FailedFetch),
    Cancelled,
}

/// Fetches one end-of-day price per instrument for a target date.
///
/// Every instrument gets its own task, fanned out under a bounded semaphore
/// and joined. A provider miss (non-trading day) or provider error rolls the
/// prior period's price forward; only an instrument with nothing to roll
/// forward ends up in the failure list. Successful snapshots are bulk-upserted
/// keyed by (instrument, date), so re-running a date overwrites it.
pub struct PriceFetchService {
    provider: Arc<dyn MarketDataProviderTrait>,
    repository: Arc<dyn PriceRepositoryTrait>,
    settings: Arc<ValuationSettings>,
    /// Serializes rollforward lookback reads against the price store.
    /// Shared with the rate fetcher; see the wiring in `RevaluationService`.
    lookback_gate: Arc<Mutex<()>>,
}

impl PriceFetchService {
    pub fn new(
        provider: Arc<dyn MarketDataProviderTrait>,
        repository: Arc<dyn PriceRepositoryTrait>,
        settings: Arc<ValuationSettings>,
        lookback_gate: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            provider,
            repository,
            settings,
            lookback_gate,
        }
    }

    /// Fetches and persists prices for every instrument, returning the run
    /// summary. Per-instrument failures are collected, never propagated; the
    /// only hard errors are cancellation and a failed bulk upsert.
    pub async fn fetch_daily_prices(
        &self,
        instruments: &[Instrument],
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<PriceFetchSummary> {
        debug!(
            "Fetching prices for {} instruments on {} via {}",
            instruments.len(),
            date,
            self.provider.name()
        );

        // A misconfigured concurrency of 0 would park every task forever.
        let semaphore = Semaphore::new(self.settings.fetch_concurrency.max(1));
        let outcomes = join_all(
            instruments
                .iter()
                .map(|instrument| self.fetch_one(instrument, date, &semaphore, cancel)),
        )
        .await;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut snapshots = Vec::new();
        let mut failures = Vec::new();
        let mut fetched = 0;
        let mut rolled_forward = 0;

        for outcome in outcomes {
            match outcome {
                FetchOutcome::Snapshot(snapshot) => {
                    match snapshot.status {
                        PriceStatus::Fetched => fetched += 1,
                        PriceStatus::RolledForward => rolled_forward += 1,
                    }
                    snapshots.push(snapshot);
                }
                FetchOutcome::Failed(failure) => failures.push(failure),
                FetchOutcome::Cancelled => return Err(Error::Cancelled),
            }
        }

        if !snapshots.is_empty() {
            let saved = self.repository.bulk_upsert(snapshots).await?;
            debug!("Upserted {} price snapshots for {}", saved, date);
        }

        if !failures.is_empty() {
            warn!(
                "{} of {} instruments had no price for {}",
                failures.len(),
                instruments.len(),
                date
            );
        }

        Ok(PriceFetchSummary {
            total_instruments: instruments.len(),
            fetched,
            rolled_forward,
            failures,
        })
    }

    async fn fetch_one(
        &self,
        instrument: &Instrument,
        date: NaiveDate,
        semaphore: &Semaphore,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return FetchOutcome::Cancelled,
        };

        let fetched = tokio::select! {
            _ = cancel.cancelled() => return FetchOutcome::Cancelled,
            result = self
                .provider
                .get_end_of_day_price(&instrument.symbol, date) => result,
        };

        match fetched {
            Ok(Some(eod)) => FetchOutcome::Snapshot(self.build_snapshot(instrument, date, eod)),
            Ok(None) => {
                debug!(
                    "No provider data for {} on {}; attempting rollforward",
                    instrument.symbol, date
                );
                self.roll_forward(instrument, date, ERROR_CODE_NO_DATA, "no end-of-day data")
                    .await
            }
            Err(e) => {
                warn!(
                    "Provider error for {} on {}: {}; attempting rollforward",
                    instrument.symbol, date, e
                );
                self.roll_forward(instrument, date, ERROR_CODE_FETCH_ERROR, &e.to_string())
                    .await
            }
        }
    }

    fn build_snapshot(
        &self,
        instrument: &Instrument,
        date: NaiveDate,
        eod: EndOfDayPrice,
    ) -> PriceSnapshot {
        let daily_change = eod
            .previous_close
            .map(|prev| eod.close - prev)
            .unwrap_or(Decimal::ZERO);
        let daily_change_percent = match eod.previous_close {
            Some(prev) if !prev.is_zero() => daily_change / prev * Decimal::ONE_HUNDRED,
            _ => Decimal::ZERO,
        };

        PriceSnapshot {
            id: PriceSnapshot::make_id(&instrument.symbol, date),
            instrument_id: instrument.id.clone(),
            symbol: instrument.symbol.clone(),
            valuation_date: date,
            price: eod.close,
            currency: instrument.currency.clone(),
            open: eod.open,
            high: eod.high,
            low: eod.low,
            volume: eod.volume,
            daily_change,
            daily_change_percent,
            status: PriceStatus::Fetched,
            created_at: Utc::now(),
        }
    }

    /// Looks up the most recent snapshot strictly before `date` within the
    /// configured lookback window and carries it forward. Lookback reads are
    /// serialized behind the shared gate to avoid read storms on the store.
    async fn roll_forward(
        &self,
        instrument: &Instrument,
        date: NaiveDate,
        error_code: &str,
        error_message: &str,
    ) -> FetchOutcome {
        let prior = {
            let _gate = self.lookback_gate.lock().await;
            self.repository
                .get_latest_price_before(&instrument.symbol, date)
        };

        let earliest = date - Duration::days(self.settings.rollforward_lookback_days);
        match prior {
            Ok(Some(prior)) if prior.valuation_date >= earliest => {
                debug!(
                    "Rolled {} forward from {} to {}",
                    instrument.symbol, prior.valuation_date, date
                );
                FetchOutcome::Snapshot(PriceSnapshot::rolled_forward_from(&prior, date))
            }
            Ok(_) => FetchOutcome::Failed(FailedFetch {
                symbol: instrument.symbol.clone(),
                error_code: error_code.to_string(),
                error_message: format!(
                    "{}; no snapshot within {} day(s) before {} to roll forward",
                    error_message, self.settings.rollforward_lookback_days, date
                ),
            }),
            Err(e) => FetchOutcome::Failed(FailedFetch {
                symbol: instrument.symbol.clone(),
                error_code: ERROR_CODE_FETCH_ERROR.to_string(),
                error_message: format!("rollforward lookup failed: {}", e),
            }),
        }
    }
}
