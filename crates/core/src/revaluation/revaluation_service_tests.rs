use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::revaluation_service::{RevaluationService, RevaluationServiceTrait};
use crate::constants::{ERROR_CODE_NO_PRICE, SOURCE_ROLLED_FORWARD};
use crate::errors::{Error, Result};
use crate::fx::{ExchangeRate, FxError, FxProviderTrait, FxRepositoryTrait, RateFetchService};
use crate::holdings::{HoldingRepositoryTrait, HoldingSnapshot, UnitOfWorkTrait};
use crate::instruments::{Instrument, InstrumentService};
use crate::market_data::{
    EndOfDayPrice, MarketDataError, MarketDataProviderTrait, PriceFetchService,
    PriceRepositoryTrait, PriceSnapshot, PriceStatus,
};
use crate::settings::ValuationSettings;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn holding(symbol: &str, units: Decimal, current_value: Decimal, date: NaiveDate) -> HoldingSnapshot {
    let instrument_id = format!("ins-{}", symbol);
    HoldingSnapshot {
        id: HoldingSnapshot::make_id("p1", &instrument_id, "pl1", date),
        portfolio_id: "p1".to_string(),
        instrument_id,
        platform_id: "pl1".to_string(),
        symbol: symbol.to_string(),
        instrument_name: format!("{} Test Instrument", symbol),
        valuation_date: date,
        unit_amount: units,
        bought_value: dec!(900),
        current_value,
        daily_change: Decimal::ZERO,
        daily_change_percent: Decimal::ZERO,
    }
}

fn price(symbol: &str, date: NaiveDate, value: Decimal, currency: &str) -> PriceSnapshot {
    PriceSnapshot {
        id: PriceSnapshot::make_id(symbol, date),
        instrument_id: format!("ins-{}", symbol),
        symbol: symbol.to_string(),
        valuation_date: date,
        price: value,
        currency: currency.to_string(),
        open: None,
        high: None,
        low: None,
        volume: Decimal::ZERO,
        daily_change: Decimal::ZERO,
        daily_change_percent: Decimal::ZERO,
        status: PriceStatus::Fetched,
        created_at: Utc::now(),
    }
}

fn rate(base: &str, target: &str, date: NaiveDate, value: Decimal) -> ExchangeRate {
    ExchangeRate {
        id: ExchangeRate::make_id(base, target, date),
        base_currency: base.to_string(),
        target_currency: target.to_string(),
        rate_date: date,
        rate: value,
        source: "FAKE_FX".to_string(),
        created_at: Utc::now(),
    }
}

fn instrument(symbol: &str, currency: &str) -> Instrument {
    Instrument {
        id: format!("ins-{}", symbol),
        symbol: symbol.to_string(),
        name: format!("{} Test Instrument", symbol),
        currency: currency.to_string(),
        instrument_type: "ETF".to_string(),
    }
}

#[derive(Default)]
struct InMemoryHoldingRepository {
    rows: StdMutex<HashMap<String, HoldingSnapshot>>,
    instruments: StdMutex<Vec<(NaiveDate, Instrument)>>,
    fail_add: AtomicBool,
}

impl InMemoryHoldingRepository {
    fn seed(&self, snapshot: HoldingSnapshot) {
        self.rows
            .lock()
            .unwrap()
            .insert(snapshot.id.clone(), snapshot);
    }

    fn seed_instrument(&self, date: NaiveDate, instrument: Instrument) {
        self.instruments.lock().unwrap().push((date, instrument));
    }

    fn holdings_for(&self, date: NaiveDate) -> Vec<HoldingSnapshot> {
        let mut holdings: Vec<HoldingSnapshot> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|h| h.valuation_date == date)
            .cloned()
            .collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        holdings
    }
}

#[async_trait]
impl HoldingRepositoryTrait for InMemoryHoldingRepository {
    fn get_latest_valuation_date_before(&self, date: NaiveDate) -> Result<Option<NaiveDate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|h| h.valuation_date < date)
            .map(|h| h.valuation_date)
            .max())
    }

    fn get_holdings_by_date(&self, date: NaiveDate) -> Result<Vec<HoldingSnapshot>> {
        Ok(self.holdings_for(date))
    }

    async fn delete_holdings_by_date(&self, date: NaiveDate) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, h| h.valuation_date != date);
        Ok(before - rows.len())
    }

    async fn add_holdings(&self, holdings: &[HoldingSnapshot]) -> Result<usize> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(Error::Repository("insert rejected".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        for holding in holdings {
            rows.insert(holding.id.clone(), holding.clone());
        }
        Ok(holdings.len())
    }

    fn get_distinct_instruments(&self, date: Option<NaiveDate>) -> Result<Vec<Instrument>> {
        Ok(self
            .instruments
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _)| date.is_none() || date == Some(*d))
            .map(|(_, instrument)| instrument.clone())
            .collect())
    }
}

#[derive(Default)]
struct InMemoryPriceRepository {
    rows: StdMutex<HashMap<String, PriceSnapshot>>,
}

impl InMemoryPriceRepository {
    fn seed(&self, snapshot: PriceSnapshot) {
        self.rows
            .lock()
            .unwrap()
            .insert(snapshot.id.clone(), snapshot);
    }
}

#[async_trait]
impl PriceRepositoryTrait for InMemoryPriceRepository {
    fn get_by_symbol_and_date(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<PriceSnapshot>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&PriceSnapshot::make_id(symbol, date))
            .cloned())
    }

    fn get_latest_price_before(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<PriceSnapshot>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.symbol == symbol && p.valuation_date < date)
            .max_by_key(|p| p.valuation_date)
            .cloned())
    }

    fn get_prices_for_date(&self, date: NaiveDate) -> Result<Vec<PriceSnapshot>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.valuation_date == date)
            .cloned()
            .collect())
    }

    async fn bulk_upsert(&self, prices: Vec<PriceSnapshot>) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let count = prices.len();
        for price in prices {
            rows.insert(price.id.clone(), price);
        }
        Ok(count)
    }
}

#[derive(Default)]
struct InMemoryFxRepository {
    rows: StdMutex<HashMap<String, ExchangeRate>>,
}

impl InMemoryFxRepository {
    fn seed(&self, rate: ExchangeRate) {
        self.rows.lock().unwrap().insert(rate.id.clone(), rate);
    }
}

#[async_trait]
impl FxRepositoryTrait for InMemoryFxRepository {
    fn get_rate(&self, base: &str, target: &str, date: NaiveDate) -> Result<Option<ExchangeRate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&ExchangeRate::make_id(base, target, date))
            .cloned())
    }

    fn get_latest_rate_before(
        &self,
        base: &str,
        target: &str,
        date: NaiveDate,
    ) -> Result<Option<ExchangeRate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                r.base_currency == base && r.target_currency == target && r.rate_date < date
            })
            .max_by_key(|r| r.rate_date)
            .cloned())
    }

    fn get_rates_on_or_before(&self, date: NaiveDate) -> Result<Vec<ExchangeRate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.rate_date <= date)
            .cloned()
            .collect())
    }

    async fn bulk_upsert(&self, rates: Vec<ExchangeRate>) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let count = rates.len();
        for rate in rates {
            rows.insert(rate.id.clone(), rate);
        }
        Ok(count)
    }
}

/// Unit of work over the in-memory holding store: begin takes a copy of the
/// rows, rollback restores it, so transactional behavior is observable.
struct RecordingUnitOfWork {
    repository: Arc<InMemoryHoldingRepository>,
    checkpoint: StdMutex<Option<HashMap<String, HoldingSnapshot>>>,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    fail_commit: AtomicBool,
}

impl RecordingUnitOfWork {
    fn new(repository: Arc<InMemoryHoldingRepository>) -> Self {
        Self {
            repository,
            checkpoint: StdMutex::new(None),
            begun: AtomicUsize::new(0),
            committed: AtomicUsize::new(0),
            rolled_back: AtomicUsize::new(0),
            fail_commit: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl UnitOfWorkTrait for RecordingUnitOfWork {
    async fn begin_transaction(&self) -> Result<()> {
        let rows = self.repository.rows.lock().unwrap().clone();
        *self.checkpoint.lock().unwrap() = Some(rows);
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(Error::Repository("commit rejected".to_string()));
        }
        *self.checkpoint.lock().unwrap() = None;
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        if let Some(rows) = self.checkpoint.lock().unwrap().take() {
            *self.repository.rows.lock().unwrap() = rows;
        }
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct StubPriceProvider {
    prices: StdMutex<HashMap<(String, NaiveDate), EndOfDayPrice>>,
}

impl StubPriceProvider {
    fn empty() -> Self {
        Self {
            prices: StdMutex::new(HashMap::new()),
        }
    }

    fn set(&self, symbol: &str, date: NaiveDate, close: Decimal) {
        self.prices.lock().unwrap().insert(
            (symbol.to_string(), date),
            EndOfDayPrice {
                close,
                open: None,
                high: None,
                low: None,
                volume: Decimal::ZERO,
                previous_close: None,
            },
        );
    }
}

#[async_trait]
impl MarketDataProviderTrait for StubPriceProvider {
    fn name(&self) -> &str {
        "STUB"
    }

    async fn get_end_of_day_price(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> std::result::Result<Option<EndOfDayPrice>, MarketDataError> {
        Ok(self
            .prices
            .lock()
            .unwrap()
            .get(&(symbol.to_string(), date))
            .cloned())
    }
}

struct StubFxProvider {
    rates: StdMutex<HashMap<(String, String, NaiveDate), Decimal>>,
}

impl StubFxProvider {
    fn empty() -> Self {
        Self {
            rates: StdMutex::new(HashMap::new()),
        }
    }

    fn set(&self, base: &str, target: &str, date: NaiveDate, rate: Decimal) {
        self.rates
            .lock()
            .unwrap()
            .insert((base.to_string(), target.to_string(), date), rate);
    }
}

#[async_trait]
impl FxProviderTrait for StubFxProvider {
    fn name(&self) -> &str {
        "STUB_FX"
    }

    async fn get_end_of_day_rate(
        &self,
        base: &str,
        target: &str,
        date: NaiveDate,
    ) -> std::result::Result<Option<Decimal>, FxError> {
        Ok(self
            .rates
            .lock()
            .unwrap()
            .get(&(base.to_string(), target.to_string(), date))
            .copied())
    }
}

struct Harness {
    holding_repository: Arc<InMemoryHoldingRepository>,
    price_repository: Arc<InMemoryPriceRepository>,
    fx_repository: Arc<InMemoryFxRepository>,
    unit_of_work: Arc<RecordingUnitOfWork>,
    price_provider: Arc<StubPriceProvider>,
    fx_provider: Arc<StubFxProvider>,
    service: RevaluationService,
}

impl Harness {
    fn new() -> Self {
        let settings = Arc::new(ValuationSettings::default());
        let lookback_gate = Arc::new(Mutex::new(()));

        let holding_repository = Arc::new(InMemoryHoldingRepository::default());
        let price_repository = Arc::new(InMemoryPriceRepository::default());
        let fx_repository = Arc::new(InMemoryFxRepository::default());
        let unit_of_work = Arc::new(RecordingUnitOfWork::new(holding_repository.clone()));
        let price_provider = Arc::new(StubPriceProvider::empty());
        let fx_provider = Arc::new(StubFxProvider::empty());

        let instrument_service = Arc::new(InstrumentService::new(
            holding_repository.clone(),
            settings.clone(),
        ));
        let price_fetch_service = Arc::new(PriceFetchService::new(
            price_provider.clone(),
            price_repository.clone(),
            settings.clone(),
            lookback_gate.clone(),
        ));
        let rate_fetch_service = Arc::new(RateFetchService::new(
            fx_provider.clone(),
            fx_repository.clone(),
            settings.clone(),
            lookback_gate.clone(),
        ));

        let service = RevaluationService::new(
            holding_repository.clone(),
            price_repository.clone(),
            fx_repository.clone(),
            unit_of_work.clone(),
            instrument_service,
            price_fetch_service,
            rate_fetch_service,
            settings,
            lookback_gate,
        );

        Self {
            holding_repository,
            price_repository,
            fx_repository,
            unit_of_work,
            price_provider,
            fx_provider,
            service,
        }
    }
}

#[tokio::test]
async fn cash_holding_is_valued_at_its_unit_amount() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("CASH", dec!(5000), dec!(4990), day(14)));

    let result = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.successful_revaluations, 1);
    let stored = h.holding_repository.holdings_for(day(15));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].current_value, dec!(5000));
    assert_eq!(stored[0].daily_change, dec!(10));
}

#[tokio::test]
async fn pence_quoted_holding_converts_to_pounds() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("VWRL", dec!(10), dec!(24.50), day(14)));
    h.price_repository
        .seed(price("VWRL", day(15), dec!(250.00), "GBp"));

    h.service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await
        .unwrap();

    let stored = h.holding_repository.holdings_for(day(15));
    // 10 units at 250.00 pence = 25.00 pounds
    assert_eq!(stored[0].current_value, dec!(25.000));
    assert_eq!(stored[0].bought_value, dec!(900));
}

#[tokio::test]
async fn foreign_currency_holding_converts_at_stored_rate() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("AAPL", dec!(1), dec!(300), day(14)));
    h.price_repository
        .seed(price("AAPL", day(15), dec!(395), "USD"));
    h.fx_repository.seed(rate("USD", "GBP", day(15), dec!(0.79)));

    h.service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await
        .unwrap();

    let stored = h.holding_repository.holdings_for(day(15));
    assert_eq!(stored[0].current_value, dec!(312.05));
}

#[tokio::test]
async fn missing_price_with_history_rolls_the_holding_forward() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("VWRL", dec!(10), dec!(24.50), day(14)));
    // No price for the target date, but the instrument has history.
    h.price_repository
        .seed(price("VWRL", day(10), dec!(245.00), "GBp"));

    let result = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.successful_revaluations, 1);
    assert_eq!(result.failed_revaluations, 0);
    let stored = h.holding_repository.holdings_for(day(15));
    assert_eq!(stored[0].current_value, dec!(24.50));
    assert_eq!(stored[0].daily_change, Decimal::ZERO);
}

#[tokio::test]
async fn holding_with_no_price_history_fails_without_stopping_the_rest() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("VWRL", dec!(10), dec!(24.50), day(14)));
    h.holding_repository
        .seed(holding("GHOST", dec!(5), dec!(100), day(14)));
    h.price_repository
        .seed(price("VWRL", day(15), dec!(250.00), "GBp"));

    let result = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.total_holdings, 2);
    assert_eq!(result.successful_revaluations, 1);
    assert_eq!(result.failed_revaluations, 1);
    assert_eq!(result.failures[0].symbol, "GHOST");
    assert_eq!(result.failures[0].error_code, ERROR_CODE_NO_PRICE);

    let stored = h.holding_repository.holdings_for(day(15));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].symbol, "VWRL");
}

#[tokio::test]
async fn rerunning_a_date_replaces_its_snapshot_set() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("VWRL", dec!(10), dec!(24.50), day(14)));
    h.price_repository
        .seed(price("VWRL", day(15), dec!(250.00), "GBp"));

    let first = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await
        .unwrap();
    let second = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.replaced_holdings, 0);
    assert_eq!(second.replaced_holdings, 1);
    assert_eq!(second.source_date, day(14));

    let stored = h.holding_repository.holdings_for(day(15));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].current_value, dec!(25.000));
}

#[tokio::test]
async fn empty_universe_aborts_before_touching_the_target_date() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("VWRL", dec!(10), dec!(25), day(15)));

    // Nothing exists before the 15th; the pre-seeded target set must survive.
    let result = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Revaluation(_))));
    assert_eq!(h.holding_repository.holdings_for(day(15)).len(), 1);
    assert_eq!(h.unit_of_work.begun.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_insert_rolls_the_transaction_back() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("CASH", dec!(5000), dec!(5000), day(14)));
    h.holding_repository.fail_add.store(true, Ordering::SeqCst);

    let result = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Revaluation(_))));
    assert_eq!(h.unit_of_work.rolled_back.load(Ordering::SeqCst), 1);
    assert_eq!(h.unit_of_work.committed.load(Ordering::SeqCst), 0);
    assert!(h.holding_repository.holdings_for(day(15)).is_empty());
}

#[tokio::test]
async fn failed_commit_rolls_the_transaction_back() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("CASH", dec!(5000), dec!(5000), day(14)));
    h.unit_of_work.fail_commit.store(true, Ordering::SeqCst);

    let result = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Revaluation(_))));
    assert_eq!(h.unit_of_work.rolled_back.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_before_persist_writes_nothing() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("CASH", dec!(5000), dec!(5000), day(14)));

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = h.service.revalue_holdings(day(15), &cancel).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(h.holding_repository.holdings_for(day(15)).is_empty());
    assert_eq!(h.unit_of_work.begun.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fetch_and_persist_covers_prices_and_rates() {
    let h = Harness::new();
    h.holding_repository
        .seed_instrument(day(14), instrument("VWRL", "GBp"));
    h.price_provider.set("VWRL", day(15), dec!(250.00));
    h.fx_provider.set("USD", "GBP", day(15), dec!(0.79));
    h.fx_provider.set("EUR", "GBP", day(15), dec!(0.85));

    let result = h
        .service
        .fetch_and_persist_prices(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.prices.fetched, 1);
    assert_eq!(result.rates.fetched, 2);
    assert!(h
        .price_repository
        .get_by_symbol_and_date("VWRL", day(15))
        .unwrap()
        .is_some());
    assert!(h.fx_repository.get_rate("USD", "GBP", day(15)).unwrap().is_some());
}

#[tokio::test]
async fn failed_commit_restores_a_pre_existing_target_date_set() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("CASH", dec!(5000), dec!(5000), day(14)));
    // A previous run already wrote the 15th; the failed rerun must not
    // leave the date emptied.
    h.holding_repository
        .seed(holding("CASH", dec!(5000), dec!(5000), day(15)));
    h.unit_of_work.fail_commit.store(true, Ordering::SeqCst);

    let result = h
        .service
        .revalue_holdings(day(15), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Revaluation(_))));
    assert_eq!(h.unit_of_work.rolled_back.load(Ordering::SeqCst), 1);
    assert_eq!(h.holding_repository.holdings_for(day(15)).len(), 1);
}

#[tokio::test]
async fn fetch_universe_is_limited_to_the_current_snapshot_set() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("VWRL", dec!(10), dec!(24.50), day(14)));
    h.holding_repository
        .seed_instrument(day(14), instrument("VWRL", "GBp"));
    // Sold long ago; only ever referenced by an older snapshot set.
    h.holding_repository
        .seed_instrument(day(10), instrument("SOLD", "GBp"));
    h.price_provider.set("VWRL", day(15), dec!(250.00));
    h.price_provider.set("SOLD", day(15), dec!(99.00));

    let result = h
        .service
        .fetch_and_persist_prices(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.prices.total_instruments, 1);
    assert_eq!(result.prices.fetched, 1);
    assert!(h
        .price_repository
        .get_by_symbol_and_date("SOLD", day(15))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn combined_operation_fetches_then_revalues() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("VWRL", dec!(10), dec!(24.50), day(14)));
    h.holding_repository
        .seed(holding("CASH", dec!(500), dec!(500), day(14)));
    h.holding_repository
        .seed_instrument(day(14), instrument("VWRL", "GBp"));
    h.price_provider.set("VWRL", day(15), dec!(250.00));
    h.fx_provider.set("USD", "GBP", day(15), dec!(0.79));
    h.fx_provider.set("EUR", "GBP", day(15), dec!(0.85));

    let result = h
        .service
        .fetch_prices_and_revalue(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.fetch.prices.fetched, 1);
    assert_eq!(result.revaluation.successful_revaluations, 2);

    let stored = h.holding_repository.holdings_for(day(15));
    let vwrl = stored.iter().find(|s| s.symbol == "VWRL").unwrap();
    assert_eq!(vwrl.current_value, dec!(25.000));
}

#[tokio::test]
async fn combined_operation_degrades_per_pair_fetch_misses() {
    let h = Harness::new();
    h.holding_repository
        .seed(holding("CASH", dec!(500), dec!(500), day(14)));
    // Yesterday's USD rate exists, so the missing provider rate rolls forward.
    h.fx_repository.seed(rate("USD", "GBP", day(14), dec!(0.78)));
    h.fx_provider.set("EUR", "GBP", day(15), dec!(0.85));

    let result = h
        .service
        .fetch_prices_and_revalue(day(15), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.fetch.rates.rolled_forward, 1);
    assert_eq!(
        h.fx_repository
            .get_rate("USD", "GBP", day(15))
            .unwrap()
            .unwrap()
            .source,
        SOURCE_ROLLED_FORWARD
    );
    assert_eq!(result.revaluation.successful_revaluations, 1);
}
