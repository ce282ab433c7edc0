use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One position's valuation for one date, unique per
/// (portfolio, instrument, platform, date).
///
/// Snapshots are immutable values: revaluation always builds a brand-new
/// snapshot for the target date from the source one, never mutates it.
/// `bought_value` is the cost basis and is carried forward unchanged across
/// every revaluation of the same position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSnapshot {
    pub id: String,
    pub portfolio_id: String,
    pub instrument_id: String,
    pub platform_id: String,
    pub symbol: String,
    pub instrument_name: String,
    pub valuation_date: NaiveDate,
    pub unit_amount: Decimal,
    pub bought_value: Decimal,
    pub current_value: Decimal,
    pub daily_change: Decimal,
    pub daily_change_percent: Decimal,
}

impl HoldingSnapshot {
    /// Storage key, e.g. "p1_VWRL_plat2_2024-03-15".
    pub fn make_id(
        portfolio_id: &str,
        instrument_id: &str,
        platform_id: &str,
        date: NaiveDate,
    ) -> String {
        format!("{}_{}_{}_{}", portfolio_id, instrument_id, platform_id, date)
    }

    /// Builds the target-date snapshot for this position with a newly
    /// computed value. Identity fields, unit amount and cost basis carry
    /// over; the daily change is measured against this (source) snapshot's
    /// current value.
    pub fn revalued(&self, date: NaiveDate, current_value: Decimal) -> HoldingSnapshot {
        let daily_change = current_value - self.current_value;
        let daily_change_percent = if self.current_value.is_zero() {
            Decimal::ZERO
        } else {
            daily_change / self.current_value * Decimal::ONE_HUNDRED
        };

        HoldingSnapshot {
            id: Self::make_id(&self.portfolio_id, &self.instrument_id, &self.platform_id, date),
            portfolio_id: self.portfolio_id.clone(),
            instrument_id: self.instrument_id.clone(),
            platform_id: self.platform_id.clone(),
            symbol: self.symbol.clone(),
            instrument_name: self.instrument_name.clone(),
            valuation_date: date,
            unit_amount: self.unit_amount,
            bought_value: self.bought_value,
            current_value,
            daily_change,
            daily_change_percent,
        }
    }

    /// Builds the target-date snapshot carrying this position's value forward
    /// unchanged, with zero daily change.
    pub fn rolled_forward(&self, date: NaiveDate) -> HoldingSnapshot {
        HoldingSnapshot {
            id: Self::make_id(&self.portfolio_id, &self.instrument_id, &self.platform_id, date),
            valuation_date: date,
            daily_change: Decimal::ZERO,
            daily_change_percent: Decimal::ZERO,
            ..self.clone()
        }
    }
}
