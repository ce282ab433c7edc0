//! Market data module - end-of-day price snapshots and the concurrent price
//! fetcher with rollforward for non-trading days.

mod market_data_errors;
mod market_data_model;
mod market_data_service;
mod market_data_traits;


pub use market_data_errors::MarketDataError;
pub use market_data_model::{
    EndOfDayPrice, FailedFetch, PriceFetchSummary, PriceSnapshot, PriceStatus,
};
pub use market_data_service::PriceFetchService;
pub use market_data_traits::{MarketDataProviderTrait, PriceRepositoryTrait};
