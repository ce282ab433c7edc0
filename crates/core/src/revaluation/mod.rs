//! Revaluation orchestrator - builds a new holding snapshot set for a target
//! date from the most recent prior set.

mod revaluation_errors;
mod revaluation_model;
mod revaluation_service;

#[cfg(test)]
mod revaluation_service_tests;

pub use revaluation_errors::RevaluationError;
pub use revaluation_model::{
    CombinedRevaluationResult, FailedRevaluation, PriceFetchResult, RevaluationResult,
};
pub use revaluation_service::{RevaluationService, RevaluationServiceTrait};
