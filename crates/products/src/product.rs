use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dulceria_core::{DomainError, ProductId};

/// Product classification.
///
/// Raw materials are consumed at manufacturing time; finished goods are what
/// sales decrement; miscellaneous products participate in the ledger without
/// a bill of materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    RawMaterial,
    Finished,
    Misc,
}

/// Catalog entry consumed by the inventory and BOM layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub kind: ProductKind,
    /// Acquisition/production cost per unit, used by cost reporting.
    pub unit_cost: Decimal,
}

impl Product {
    /// Build a new catalog entry. The name must be non-blank.
    pub fn new(name: impl Into<String>, kind: ProductKind) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            id: ProductId::new(),
            name,
            kind,
            unit_cost: Decimal::ZERO,
        })
    }

    pub fn is_raw_material(&self) -> bool {
        self.kind == ProductKind::RawMaterial
    }

    pub fn is_finished(&self) -> bool {
        self.kind == ProductKind::Finished
    }
}
