//! Instrument domain model and the universe resolver.

mod instruments_model;
mod instruments_service;

pub use instruments_model::Instrument;
pub use instruments_service::InstrumentService;
