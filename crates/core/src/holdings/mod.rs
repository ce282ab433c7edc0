//! Holding snapshots and the storage seams the orchestrator persists through.

mod holdings_model;
mod holdings_traits;

pub use holdings_model::HoldingSnapshot;
pub use holdings_traits::{HoldingRepositoryTrait, UnitOfWorkTrait};
