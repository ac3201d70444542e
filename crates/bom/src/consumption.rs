use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dulceria_core::{ProductId, SaleId, SaleLineId, UserId};

use crate::component::BomSource;

/// Write-once analytics row: how much raw material one sale line consumed
/// indirectly through its finished good.
///
/// Purely informational — consumption records never feed back into stock
/// quantities (those were decremented at manufacturing time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub sale_id: SaleId,
    pub sale_line_id: SaleLineId,
    pub finished_product_id: ProductId,
    pub raw_material_id: ProductId,
    pub quantity: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Append-only store for consumption analytics.
pub trait ConsumptionLog: Send + Sync {
    fn append(&self, record: ConsumptionRecord);
    fn for_sale(&self, sale_id: SaleId) -> Vec<ConsumptionRecord>;
    fn for_material(&self, raw_material_id: ProductId) -> Vec<ConsumptionRecord>;
}

impl<L> ConsumptionLog for Arc<L>
where
    L: ConsumptionLog + ?Sized,
{
    fn append(&self, record: ConsumptionRecord) {
        (**self).append(record)
    }

    fn for_sale(&self, sale_id: SaleId) -> Vec<ConsumptionRecord> {
        (**self).for_sale(sale_id)
    }

    fn for_material(&self, raw_material_id: ProductId) -> Vec<ConsumptionRecord> {
        (**self).for_material(raw_material_id)
    }
}

/// In-memory consumption log for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryConsumptionLog {
    records: RwLock<Vec<ConsumptionRecord>>,
}

impl InMemoryConsumptionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConsumptionLog for InMemoryConsumptionLog {
    fn append(&self, record: ConsumptionRecord) {
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
    }

    fn for_sale(&self, sale_id: SaleId) -> Vec<ConsumptionRecord> {
        let records = match self.records.read() {
            Ok(r) => r,
            Err(_) => return vec![],
        };
        records.iter().filter(|r| r.sale_id == sale_id).cloned().collect()
    }

    fn for_material(&self, raw_material_id: ProductId) -> Vec<ConsumptionRecord> {
        let records = match self.records.read() {
            Ok(r) => r,
            Err(_) => return vec![],
        };
        records
            .iter()
            .filter(|r| r.raw_material_id == raw_material_id)
            .cloned()
            .collect()
    }
}

/// Expands a finished-good sale into per-material consumption rows.
#[derive(Debug)]
pub struct ConsumptionRecorder<B: BomSource, L: ConsumptionLog> {
    bom: B,
    log: L,
}

impl<B: BomSource, L: ConsumptionLog> ConsumptionRecorder<B, L> {
    pub fn new(bom: B, log: L) -> Self {
        Self { bom, log }
    }

    /// Write one consumption record per BOM line of the sold product, with
    /// `quantity = quantity_per_unit × sold_quantity`. A product without
    /// components records nothing. Never enqueues a ledger mutation.
    pub fn record_consumption(
        &self,
        sale_id: SaleId,
        sale_line_id: SaleLineId,
        finished_product_id: ProductId,
        sold_quantity: Decimal,
        actor_id: Option<UserId>,
    ) {
        let components = self.bom.components_of(finished_product_id);
        if components.is_empty() {
            return;
        }

        let occurred_at = Utc::now();
        for line in components {
            let quantity = line.quantity_per_unit * sold_quantity;
            tracing::debug!(
                finished_product_id = %finished_product_id,
                raw_material_id = %line.raw_material_id,
                quantity = %quantity,
                actor_id = ?actor_id,
                "recording raw-material consumption for sale line"
            );
            self.log.append(ConsumptionRecord {
                sale_id,
                sale_line_id,
                finished_product_id,
                raw_material_id: line.raw_material_id,
                quantity,
                occurred_at,
            });
        }
    }
}
