use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a price snapshot came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceStatus {
    /// Fresh end-of-day data from the provider.
    Fetched,
    /// Prior period's price carried forward over a non-trading day.
    RolledForward,
}

impl PriceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceStatus::Fetched => "FETCHED",
            PriceStatus::RolledForward => "ROLLED_FORWARD",
        }
    }
}

/// End-of-day payload as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfDayPrice {
    pub close: Decimal,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub volume: Decimal,
    /// Previous session's close, when the provider reports it. Used to
    /// compute the daily change on the snapshot.
    pub previous_close: Option<Decimal>,
}

/// One instrument price for one valuation date, unique per (instrument, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub id: String,
    pub instrument_id: String,
    pub symbol: String,
    pub valuation_date: NaiveDate,
    pub price: Decimal,
    /// Quote unit the price is expressed in (e.g. "GBp", "USD", "GBP").
    pub currency: String,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub volume: Decimal,
    pub daily_change: Decimal,
    pub daily_change_percent: Decimal,
    pub status: PriceStatus,
    pub created_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Storage key, e.g. "VWRL_2024-03-15".
    pub fn make_id(symbol: &str, date: NaiveDate) -> String {
        format!("{}_{}", symbol, date)
    }

    /// Synthesizes a snapshot for `date` carrying `prior`'s price forward
    /// with zero change and volume.
    pub fn rolled_forward_from(prior: &PriceSnapshot, date: NaiveDate) -> PriceSnapshot {
        PriceSnapshot {
            id: Self::make_id(&prior.symbol, date),
            instrument_id: prior.instrument_id.clone(),
            symbol: prior.symbol.clone(),
            valuation_date: date,
            price: prior.price,
            currency: prior.currency.clone(),
            open: None,
            high: None,
            low: None,
            volume: Decimal::ZERO,
            daily_change: Decimal::ZERO,
            daily_change_percent: Decimal::ZERO,
            status: PriceStatus::RolledForward,
            created_at: Utc::now(),
        }
    }
}

/// One per-instrument or per-pair fetch failure. Returned in the operation
/// result, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFetch {
    pub symbol: String,
    pub error_code: String,
    pub error_message: String,
}

/// Outcome of one daily price fetch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFetchSummary {
    pub total_instruments: usize,
    pub fetched: usize,
    pub rolled_forward: usize,
    pub failures: Vec<FailedFetch>,
}
