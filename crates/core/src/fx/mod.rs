//! FX (Foreign Exchange) module - exchange rates, quote-unit rules, and the
//! daily rate fetcher.

pub mod currency;
pub mod currency_converter;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;


pub use currency::{is_minor_unit, minor_unit_scale, normalize_amount, normalize_currency_code};
pub use currency_converter::CurrencyConverter;
pub use fx_errors::FxError;
pub use fx_model::{Conversion, ConversionSource, ExchangeRate, RateFetchSummary};
pub use fx_service::RateFetchService;
pub use fx_traits::{FxProviderTrait, FxRepositoryTrait};
