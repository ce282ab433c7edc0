use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market_data::FailedFetch;

/// One end-of-day exchange rate, unique per (base, target, date).
///
/// `base_currency` is the foreign currency being quoted, `target_currency`
/// the settlement currency, so USD/GBP at 0.79 means 1 USD = 0.79 GBP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub base_currency: String,
    pub target_currency: String,
    pub rate_date: NaiveDate,
    pub rate: Decimal,
    /// Provider name, or `ROLLED_FORWARD` for synthesized rates.
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Storage key, e.g. "USDGBP_2024-03-15".
    pub fn make_id(base: &str, target: &str, date: NaiveDate) -> String {
        format!("{}{}_{}", base, target, date)
    }

    /// Pair symbol used in failure reports, e.g. "USDGBP".
    pub fn pair_symbol(base: &str, target: &str) -> String {
        format!("{}{}", base, target)
    }
}

/// How a conversion result was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionSource {
    /// Same currency on both sides.
    Identity,
    /// Minor/major unit rescale of the same currency, no FX involved.
    QuoteUnitConversion,
    /// A stored rate for the requested pair.
    Direct,
    /// The inverse pair's rate, inverted.
    Inverse,
}

/// Result of converting an amount between two currencies on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub amount: Decimal,
    pub rate: Decimal,
    pub source: ConversionSource,
}

/// Outcome of one daily rate fetch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateFetchSummary {
    pub total_pairs: usize,
    pub fetched: usize,
    pub rolled_forward: usize,
    pub failures: Vec<FailedFetch>,
}
