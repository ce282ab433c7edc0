use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{
    DEFAULT_BASE_CURRENCY, DEFAULT_CASH_SYMBOL, DEFAULT_FETCH_CONCURRENCY,
    DEFAULT_REQUIRED_CURRENCIES, DEFAULT_ROLLFORWARD_LOOKBACK_DAYS,
};

/// Explicit configuration for the valuation engine.
///
/// Everything that used to be an ambient constant (the proxy-instrument
/// scaling table, the required FX pairs, the cash symbol) is carried here so
/// the calculator and fetchers can be tested with alternate tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSettings {
    /// Settlement currency all holding values are normalized to.
    pub base_currency: String,
    /// Symbol whose holdings are valued 1:1 with their unit amount.
    pub cash_symbol: String,
    /// Foreign currencies that need a daily rate against the base currency.
    pub required_currencies: Vec<String>,
    /// Symbol -> multiplier corrections for proxy instruments whose provider
    /// price is known to be off by a fixed factor. Symbols not in the table
    /// pass through unchanged.
    pub price_scaling: HashMap<String, Decimal>,
    /// Upper bound on concurrent provider calls during a fetch phase.
    pub fetch_concurrency: usize,
    /// How many days a price/rate rollforward may look back before giving up.
    pub rollforward_lookback_days: i64,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            cash_symbol: DEFAULT_CASH_SYMBOL.to_string(),
            required_currencies: DEFAULT_REQUIRED_CURRENCIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            price_scaling: HashMap::new(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            rollforward_lookback_days: DEFAULT_ROLLFORWARD_LOOKBACK_DAYS,
        }
    }
}

impl ValuationSettings {
    /// The (foreign, base) pairs the rate fetcher must cover.
    pub fn required_pairs(&self) -> Vec<(String, String)> {
        self.required_currencies
            .iter()
            .filter(|c| *c != &self.base_currency)
            .map(|c| (c.clone(), self.base_currency.clone()))
            .collect()
    }

    /// Scaling factor for a symbol, if the table has one.
    pub fn scaling_factor(&self, symbol: &str) -> Option<Decimal> {
        self.price_scaling.get(symbol).copied()
    }
}
