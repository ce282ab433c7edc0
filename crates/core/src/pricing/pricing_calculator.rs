use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

use crate::fx::currency::normalize_amount;
use crate::fx::CurrencyConverter;
use crate::settings::ValuationSettings;

/// Converts (units, raw provider price, quote unit) into a base-currency
/// holding value.
///
/// Order matters: the proxy-instrument scaling factor applies to the raw
/// provider price before any unit or currency adjustment, then minor-unit
/// quotes (pence-style) are rescaled into their major unit, and finally any
/// remaining foreign-currency amount is converted to base via `rates`.
///
/// A missing FX rate degrades rather than fails: the unconverted gross value
/// is returned and a warning logged, so one stale pair does not blank out a
/// holding's valuation.
pub fn calculate_current_value(
    units: Decimal,
    price: Decimal,
    symbol: &str,
    quote_unit: &str,
    date: NaiveDate,
    rates: &CurrencyConverter,
    settings: &ValuationSettings,
) -> Decimal {
    let scaled_price = match settings.scaling_factor(symbol) {
        Some(factor) => price * factor,
        None => price,
    };

    // Pence-style quotes rescale to the major unit; the returned code is the
    // real settlement currency of the price.
    let (adjusted_price, canonical_currency) = normalize_amount(scaled_price, quote_unit);

    let gross = units * adjusted_price;
    if canonical_currency == settings.base_currency {
        return gross;
    }

    match rates.convert(gross, canonical_currency, &settings.base_currency, date) {
        Ok(conversion) => conversion.amount,
        Err(e) => {
            warn!(
                "Could not convert {} {} for {} on {}: {}; keeping unconverted value",
                gross, canonical_currency, symbol, date, e
            );
            gross
        }
    }
}
