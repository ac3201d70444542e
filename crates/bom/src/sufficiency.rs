use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dulceria_core::ProductId;
use dulceria_inventory::{InventoryLedger, LedgerStore};
use dulceria_products::ProductCatalog;

use crate::component::BomSource;

/// One missing or insufficient raw material for a manufacturing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub raw_material_id: ProductId,
    pub material_name: String,
    pub available: Decimal,
    pub required: Decimal,
    pub unit: String,
}

impl core::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.available.is_zero() {
            write!(
                f,
                "no stock of raw material \"{}\": need {} {}, have none",
                self.material_name, self.required, self.unit
            )
        } else {
            write!(
                f,
                "insufficient raw material \"{}\": need {} {}, have {}",
                self.material_name, self.required, self.unit, self.available
            )
        }
    }
}

/// Read-only pre-flight check that a manufacturing run has enough raw
/// material.
///
/// Issues no mutations and no queue registrations; each raw material is read
/// as a guarded snapshot, so the answer is consistent per material at check
/// time but is not a reservation.
#[derive(Debug)]
pub struct SufficiencyChecker<S, B, C>
where
    S: LedgerStore,
    B: BomSource,
    C: ProductCatalog,
{
    ledger: Arc<InventoryLedger<S>>,
    bom: B,
    catalog: C,
}

impl<S, B, C> SufficiencyChecker<S, B, C>
where
    S: LedgerStore,
    B: BomSource,
    C: ProductCatalog,
{
    pub fn new(ledger: Arc<InventoryLedger<S>>, bom: B, catalog: C) -> Self {
        Self { ledger, bom, catalog }
    }

    /// Shortfalls preventing `requested_quantity` units of the finished good
    /// from being manufactured. Empty means sufficient — including the
    /// trivial case of a product with no bill of materials.
    pub fn check_sufficiency(
        &self,
        finished_product_id: ProductId,
        requested_quantity: Decimal,
    ) -> Vec<Shortfall> {
        let mut shortfalls = Vec::new();

        for line in self.bom.components_of(finished_product_id) {
            let required = line.quantity_per_unit * requested_quantity;
            let material_name = self
                .catalog
                .get(line.raw_material_id)
                .map(|p| p.name)
                .unwrap_or_else(|| line.raw_material_id.to_string());

            match self.ledger.stock_record(line.raw_material_id) {
                None => shortfalls.push(Shortfall {
                    raw_material_id: line.raw_material_id,
                    material_name,
                    available: Decimal::ZERO,
                    required,
                    unit: line.unit.clone(),
                }),
                Some(record) if record.quantity < required => shortfalls.push(Shortfall {
                    raw_material_id: line.raw_material_id,
                    material_name,
                    available: record.quantity,
                    required,
                    unit: line.unit.clone(),
                }),
                Some(_) => {}
            }
        }

        shortfalls
    }
}
