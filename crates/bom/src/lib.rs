//! Bill-of-materials analytics and manufacturing pre-flight checks.
//!
//! A finished good's BOM maps it to the raw materials one unit consumes.
//! This crate derives consumption analytics from sales and validates that a
//! manufacturing run has enough raw material — both read-only with respect
//! to the inventory ledger: raw-material stock is decremented at
//! manufacturing time, not here.

pub mod component;
pub mod consumption;
pub mod sufficiency;

pub use component::{BomLine, BomSource, InMemoryBom};
pub use consumption::{
    ConsumptionLog, ConsumptionRecord, ConsumptionRecorder, InMemoryConsumptionLog,
};
pub use sufficiency::{Shortfall, SufficiencyChecker};
