//! Shared constants for the revaluation engine.

/// Settlement currency all holding values are normalized to.
pub const DEFAULT_BASE_CURRENCY: &str = "GBP";

/// Business-key symbol for cash holdings. Cash is never priced; its current
/// value always equals its unit amount.
pub const DEFAULT_CASH_SYMBOL: &str = "CASH";

/// Foreign currencies quoted against the base currency by default.
pub const DEFAULT_REQUIRED_CURRENCIES: [&str; 2] = ["USD", "EUR"];

/// Upper bound on concurrent provider calls during a fetch phase.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// How far back a price/rate rollforward may reach. The provider publishes
/// end-of-day data, so a one-day window covers the common non-trading-day gap.
pub const DEFAULT_ROLLFORWARD_LOOKBACK_DAYS: i64 = 1;

/// Error code recorded when the provider had no data and no prior snapshot
/// existed to roll forward.
pub const ERROR_CODE_NO_DATA: &str = "NO_DATA";

/// Error code recorded when the provider call itself failed.
pub const ERROR_CODE_FETCH_ERROR: &str = "FETCH_ERROR";

/// Error code recorded when a holding had no price for the target date and no
/// prior price at all.
pub const ERROR_CODE_NO_PRICE: &str = "NO_PRICE";

/// Source tag for rolled-forward prices and rates.
pub const SOURCE_ROLLED_FORWARD: &str = "ROLLED_FORWARD";
