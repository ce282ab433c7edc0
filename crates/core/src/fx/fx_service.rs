use chrono::{Duration, NaiveDate, Utc};
use futures::future::join_all;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

use super::fx_model::{ExchangeRate, RateFetchSummary};
use super::fx_traits::{FxProviderTrait, FxRepositoryTrait};
use crate::constants::{ERROR_CODE_FETCH_ERROR, ERROR_CODE_NO_DATA, SOURCE_ROLLED_FORWARD};
use crate::errors::{Error, Result};
use crate::market_data::FailedFetch;
use crate::settings::ValuationSettings;

enum RateOutcome {
    Rate(ExchangeRate),
    Failed(FailedFetch),
    Cancelled,
}

/// Fetches one end-of-day rate per required currency pair for a target date.
///
/// Same fan-out/rollforward pattern as the price fetcher: a provider miss
/// carries the prior period's rate forward tagged `ROLLED_FORWARD`; results
/// are bulk-upserted keyed by (pair, date). Quote-unit pairs of the same
/// currency (pence/pounds) are a calculator concern and never appear here.
pub struct RateFetchService {
    provider: Arc<dyn FxProviderTrait>,
    repository: Arc<dyn FxRepositoryTrait>,
    settings: Arc<ValuationSettings>,
    /// Serializes rollforward lookback reads; shared with the price fetcher.
    lookback_gate: Arc<Mutex<()>>,
}

impl RateFetchService {
    pub fn new(
        provider: Arc<dyn FxProviderTrait>,
        repository: Arc<dyn FxRepositoryTrait>,
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

    /// Fetches and persists rates for every required pair, returning the run
    /// summary. Per-pair failures are collected, never propagated.
    pub async fn fetch_daily_rates(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<RateFetchSummary> {
        let pairs = self.settings.required_pairs();
        debug!(
            "Fetching {} exchange rates for {} via {}",
            pairs.len(),
            date,
            self.provider.name()
        );

        // A misconfigured concurrency of 0 would park every task forever.
        let semaphore = Semaphore::new(self.settings.fetch_concurrency.max(1));
        let outcomes = join_all(
            pairs
                .iter()
                .map(|(base, target)| self.fetch_one(base, target, date, &semaphore, cancel)),
        )
        .await;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut rates = Vec::new();
        let mut failures = Vec::new();
        let mut fetched = 0;
        let mut rolled_forward = 0;

        for outcome in outcomes {
            match outcome {
                RateOutcome::Rate(rate) => {
                    if rate.source == SOURCE_ROLLED_FORWARD {
                        rolled_forward += 1;
                    } else {
                        fetched += 1;
                    }
                    rates.push(rate);
                }
                RateOutcome::Failed(failure) => failures.push(failure),
                RateOutcome::Cancelled => return Err(Error::Cancelled),
            }
        }

        if !rates.is_empty() {
            let saved = self.repository.bulk_upsert(rates).await?;
            debug!("Upserted {} exchange rates for {}", saved, date);
        }

        if !failures.is_empty() {
            warn!(
                "{} of {} currency pairs had no rate for {}",
                failures.len(),
                pairs.len(),
                date
            );
        }

        Ok(RateFetchSummary {
            total_pairs: pairs.len(),
            fetched,
            rolled_forward,
            failures,
        })
    }

    async fn fetch_one(
        &self,
        base: &str,
        target: &str,
        date: NaiveDate,
        semaphore: &Semaphore,
        cancel: &CancellationToken,
    ) -> RateOutcome {
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return RateOutcome::Cancelled,
        };

        let fetched = tokio::select! {
            _ = cancel.cancelled() => return RateOutcome::Cancelled,
            result = self.provider.get_end_of_day_rate(base, target, date) => result,
        };

        match fetched {
            Ok(Some(rate)) => RateOutcome::Rate(ExchangeRate {
                id: ExchangeRate::make_id(base, target, date),
                base_currency: base.to_string(),
                target_currency: target.to_string(),
                rate_date: date,
                rate,
                source: self.provider.name().to_string(),
                created_at: Utc::now(),
            }),
            Ok(None) => {
                debug!(
                    "No provider rate for {}/{} on {}; attempting rollforward",
                    base, target, date
                );
                self.roll_forward(base, target, date, ERROR_CODE_NO_DATA, "no end-of-day rate")
                    .await
            }
            Err(e) => {
                warn!(
                    "FX provider error for {}/{} on {}: {}; attempting rollforward",
                    base, target, date, e
                );
                self.roll_forward(base, target, date, ERROR_CODE_FETCH_ERROR, &e.to_string())
                    .await
            }
        }
    }

    async fn roll_forward(
        &self,
        base: &str,
        target: &str,
        date: NaiveDate,
        error_code: &str,
        error_message: &str,
    ) -> RateOutcome {
        let prior = {
            let _gate = self.lookback_gate.lock().await;
            self.repository.get_latest_rate_before(base, target, date)
        };

        let earliest = date - Duration::days(self.settings.rollforward_lookback_days);
        match prior {
            Ok(Some(prior)) if prior.rate_date >= earliest => {
                debug!(
                    "Rolled {}/{} forward from {} to {}",
                    base, target, prior.rate_date, date
                );
                RateOutcome::Rate(ExchangeRate {
                    id: ExchangeRate::make_id(base, target, date),
                    base_currency: base.to_string(),
                    target_currency: target.to_string(),
                    rate_date: date,
                    rate: prior.rate,
                    source: SOURCE_ROLLED_FORWARD.to_string(),
                    created_at: Utc::now(),
                })
            }
            Ok(_) => RateOutcome::Failed(FailedFetch {
                symbol: ExchangeRate::pair_symbol(base, target),
                error_code: error_code.to_string(),
                error_message: format!(
                    "{}; no rate within {} day(s) before {} to roll forward",
                    error_message, self.settings.rollforward_lookback_days, date
                ),
            }),
            Err(e) => RateOutcome::Failed(FailedFetch {
                symbol: ExchangeRate::pair_symbol(base, target),
                error_code: ERROR_CODE_FETCH_ERROR.to_string(),
                error_message: format!("rollforward lookup failed: {}", e),
            }),
        }
    }
}
