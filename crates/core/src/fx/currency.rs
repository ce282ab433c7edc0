//! Quote-unit rules for currencies priced in their minor unit.
//!
//! Some providers quote London-listed instruments in pence (GBp/GBX) rather
//! than pounds. These codes are a scale marker, not a real settlement
//! currency: conversions between a minor and major unit of the same currency
//! are a pure division or multiplication and must never go through FX lookup.

use rust_decimal::Decimal;

/// Minor units per major unit for every supported minor-unit code.
pub fn minor_unit_scale() -> Decimal {
    Decimal::ONE_HUNDRED
}

/// True when `code` is a minor-unit quote marker (pence-style).
pub fn is_minor_unit(code: &str) -> bool {
    matches!(code, "GBp" | "GBX" | "ZAc")
}

/// Maps a quote-unit code to its canonical settlement currency.
/// Minor-unit markers map to their major currency; everything else is
/// already a real currency code and maps to itself.
pub fn normalize_currency_code(code: &str) -> &str {
    match code {
        "GBp" | "GBX" => "GBP",
        "ZAc" => "ZAR",
        other => other,
    }
}

/// Rescales an amount quoted in a minor unit into its major unit.
/// Returns the adjusted amount together with the canonical currency code.
pub fn normalize_amount(amount: Decimal, code: &str) -> (Decimal, &str) {
    if is_minor_unit(code) {
        (amount / minor_unit_scale(), normalize_currency_code(code))
    } else {
        (amount, code)
    }
}

/// True when `from` and `to` are the minor and major unit of the same
/// currency, in either direction.
pub fn is_minor_major_pair(from: &str, to: &str) -> bool {
    from != to && normalize_currency_code(from) == normalize_currency_code(to)
}
