use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dulceria_core::{DomainError, DomainResult, ProductId};

/// One bill-of-materials line: a finished good needs `quantity_per_unit` of
/// one raw material per unit produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    pub finished_product_id: ProductId,
    pub raw_material_id: ProductId,
    pub quantity_per_unit: Decimal,
    pub unit: String,
}

/// Read seam over bill-of-materials data.
///
/// An empty result means the product is not a composite good — missing BOM
/// data is "no components", never an error.
pub trait BomSource: Send + Sync {
    /// Lines for one finished good, in registration order.
    fn components_of(&self, finished_product_id: ProductId) -> Vec<BomLine>;
}

impl<B> BomSource for Arc<B>
where
    B: BomSource + ?Sized,
{
    fn components_of(&self, finished_product_id: ProductId) -> Vec<BomLine> {
        (**self).components_of(finished_product_id)
    }
}

/// In-memory bill of materials for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBom {
    lines: RwLock<Vec<BomLine>>,
}

impl InMemoryBom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a line. A finished good cannot be its own component, and the
    /// per-unit quantity must be positive.
    pub fn add_line(&self, line: BomLine) -> DomainResult<()> {
        if line.finished_product_id == line.raw_material_id {
            return Err(DomainError::invariant(
                "a product cannot be a component of itself",
            ));
        }
        if line.quantity_per_unit <= Decimal::ZERO {
            return Err(DomainError::validation(
                "quantity_per_unit must be positive",
            ));
        }

        let mut lines = self
            .lines
            .write()
            .map_err(|_| DomainError::conflict("bill of materials lock poisoned"))?;
        lines.push(line);
        Ok(())
    }
}

impl BomSource for InMemoryBom {
    fn components_of(&self, finished_product_id: ProductId) -> Vec<BomLine> {
        let lines = match self.lines.read() {
            Ok(l) => l,
            Err(_) => return vec![],
        };
        lines
            .iter()
            .filter(|l| l.finished_product_id == finished_product_id)
            .cloned()
            .collect()
    }
}
