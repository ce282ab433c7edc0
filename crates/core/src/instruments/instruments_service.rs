use chrono::NaiveDate;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

use super::instruments_model::Instrument;
use crate::errors::Result;
use crate::holdings::HoldingRepositoryTrait;
use crate::settings::ValuationSettings;

/// Resolves the instrument universe the fetch phase must cover: every
/// distinct instrument referenced by current holdings, cash excluded.
pub struct InstrumentService {
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    settings: Arc<ValuationSettings>,
}

impl InstrumentService {
    pub fn new(
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        settings: Arc<ValuationSettings>,
    ) -> Self {
        Self {
            holding_repository,
            settings,
        }
    }

    /// Distinct priceable instruments held on `date`, or across all dates
    /// when `date` is `None`. De-duplicated by symbol; cash holdings are
    /// never priced and are filtered out.
    pub fn distinct_instruments(&self, date: Option<NaiveDate>) -> Result<Vec<Instrument>> {
        let mut seen: HashSet<String> = HashSet::new();
        let instruments: Vec<Instrument> = self
            .holding_repository
            .get_distinct_instruments(date)?
            .into_iter()
            .filter(|instrument| instrument.symbol != self.settings.cash_symbol)
            .filter(|instrument| seen.insert(instrument.symbol.clone()))
            .collect();

        debug!(
            "Resolved {} distinct instruments for {:?}",
            instruments.len(),
            date
        );
        Ok(instruments)
    }
}
