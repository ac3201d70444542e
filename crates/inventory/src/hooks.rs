use std::sync::Arc;

use rust_decimal::Decimal;

use dulceria_core::{ExpenseId, ProductId, SaleId, SaleLineId, UserId};

use crate::ledger::InventoryLedger;
use crate::queue::PendingOperation;
use crate::stock::MovementKind;
use crate::store::LedgerStore;

/// A sale line was durably committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineRecorded {
    pub sale_id: SaleId,
    pub line_id: SaleLineId,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub actor_id: Option<UserId>,
}

/// A single sale line was deleted while its sale survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineDeleted {
    pub sale_id: SaleId,
    pub line_id: SaleLineId,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub actor_id: Option<UserId>,
}

/// A sale line's quantity was edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineQuantityChanged {
    pub sale_id: SaleId,
    pub line_id: SaleLineId,
    pub product_id: ProductId,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub actor_id: Option<UserId>,
}

/// A raw-material purchase expense was durably committed.
///
/// Category routing stays with the expense write path: only expenses that
/// actually acquire raw material reach this hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialPurchaseRecorded {
    pub expense_id: ExpenseId,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub description: String,
    pub actor_id: Option<UserId>,
}

/// Post-commit adapters between the business write paths and the ledger.
///
/// The transaction boundary code of the sale/expense handlers invokes these
/// strictly after its own commit succeeded, which is what makes registration
/// rollback-safe: an aborted transaction never reaches a hook, so nothing
/// stale can sit in the queue waiting for a drain. Every method is
/// infallible — it only builds pending operations and registers them.
///
/// Raw materials are consumed when a batch is manufactured, not when the
/// finished good sells, and manufacturing is irreversible: cancelling a sale
/// line therefore returns only the finished good to stock, never its
/// components.
#[derive(Debug)]
pub struct InventoryHooks<S: LedgerStore> {
    ledger: Arc<InventoryLedger<S>>,
}

impl<S: LedgerStore> InventoryHooks<S> {
    pub fn new(ledger: Arc<InventoryLedger<S>>) -> Self {
        Self { ledger }
    }

    /// Sale line committed: one outbound operation for the sold quantity.
    pub fn on_sale_line_recorded(&self, event: &SaleLineRecorded) {
        self.ledger.register_movement(
            PendingOperation::new(MovementKind::Out, event.product_id, event.quantity, "sale")
                .with_actor(event.actor_id)
                .with_sale(event.sale_id),
        );
    }

    /// Sale line removed: the finished good comes back.
    pub fn on_sale_line_deleted(&self, event: &SaleLineDeleted) {
        self.ledger.register_movement(
            PendingOperation::new(
                MovementKind::In,
                event.product_id,
                event.quantity,
                "sale line cancelled",
            )
            .with_actor(event.actor_id)
            .with_sale(event.sale_id),
        );
    }

    /// Sale line quantity edited: the signed difference becomes one
    /// operation; an unchanged quantity registers nothing.
    pub fn on_sale_line_quantity_changed(&self, event: &SaleLineQuantityChanged) {
        let difference = event.new_quantity - event.previous_quantity;
        if difference.is_zero() {
            return;
        }

        let op = if difference > Decimal::ZERO {
            PendingOperation::new(
                MovementKind::Out,
                event.product_id,
                difference,
                "sale adjustment (increase)",
            )
        } else {
            PendingOperation::new(
                MovementKind::In,
                event.product_id,
                -difference,
                "sale adjustment (decrease)",
            )
        };

        self.ledger
            .register_movement(op.with_actor(event.actor_id).with_sale(event.sale_id));
    }

    /// Raw-material purchase committed: one inbound operation.
    pub fn on_material_purchase_recorded(&self, event: &MaterialPurchaseRecorded) {
        self.ledger.register_movement(
            PendingOperation::new(
                MovementKind::In,
                event.product_id,
                event.quantity,
                format!("raw material purchase: {}", event.description),
            )
            .with_actor(event.actor_id)
            .with_expense(event.expense_id),
        );
    }
}
