//! Engine configuration - declarative tables the calculator and fetchers run on.

mod settings_model;

pub use settings_model::ValuationSettings;
