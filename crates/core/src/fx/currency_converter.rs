use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use super::currency::{is_minor_major_pair, is_minor_unit, minor_unit_scale};
use super::fx_errors::FxError;
use super::fx_model::{Conversion, ConversionSource, ExchangeRate};

/// Looks up exchange rates as independent time-series per pair.
///
/// Stored pairs resolve to the most recent rate on or before the requested
/// date; when the requested pair is absent the inverse pair is tried and
/// inverted. Minor/major unit pairs of the same currency never touch the
/// rate tables.
pub struct CurrencyConverter {
    /// (base, target) -> date-ordered rate history.
    rates: HashMap<(String, String), BTreeMap<NaiveDate, Decimal>>,
}

impl CurrencyConverter {
    pub fn new(exchange_rates: Vec<ExchangeRate>) -> Self {
        let mut rates: HashMap<(String, String), BTreeMap<NaiveDate, Decimal>> = HashMap::new();
        for rate in exchange_rates {
            if rate.base_currency == rate.target_currency {
                continue;
            }
            rates
                .entry((rate.base_currency, rate.target_currency))
                .or_default()
                .insert(rate.rate_date, rate.rate);
        }
        Self { rates }
    }

    /// Converts `amount` from one currency (or quote unit) to another for a
    /// valuation date.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Conversion, FxError> {
        if from == to {
            return Ok(Conversion {
                amount,
                rate: Decimal::ONE,
                source: ConversionSource::Identity,
            });
        }

        if is_minor_major_pair(from, to) {
            let rate = quote_unit_rate(from, to);
            return Ok(Conversion {
                amount: amount * rate,
                rate,
                source: ConversionSource::QuoteUnitConversion,
            });
        }

        if let Some(rate) = self.rate_on_or_before(from, to, date) {
            return Ok(Conversion {
                amount: amount * rate,
                rate,
                source: ConversionSource::Direct,
            });
        }

        if let Some(inverse) = self.rate_on_or_before(to, from, date) {
            if !inverse.is_zero() {
                let rate = Decimal::ONE / inverse;
                return Ok(Conversion {
                    amount: amount * rate,
                    rate,
                    source: ConversionSource::Inverse,
                });
            }
        }

        Err(FxError::NoRateAvailable {
            from: from.to_string(),
            to: to.to_string(),
            date,
        })
    }

    /// Rate for one unit of `from` in `to` on the given date.
    pub fn get_rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<Conversion, FxError> {
        self.convert(Decimal::ONE, from, to, date)
    }

    fn rate_on_or_before(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal> {
        let key = (from.to_string(), to.to_string());
        self.rates
            .get(&key)
            .and_then(|history| history.range(..=date).next_back())
            .map(|(_, rate)| *rate)
    }
}

/// Scale factor between two quote units of the same currency.
/// Pence to pounds divides by 100, pounds to pence multiplies; two minor
/// units of the same currency (GBp vs GBX) are equivalent.
fn quote_unit_rate(from: &str, to: &str) -> Decimal {
    match (is_minor_unit(from), is_minor_unit(to)) {
        (true, false) => Decimal::ONE / minor_unit_scale(),
        (false, true) => minor_unit_scale(),
        _ => Decimal::ONE,
    }
}
