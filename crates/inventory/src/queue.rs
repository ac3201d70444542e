use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rust_decimal::Decimal;

use dulceria_core::{ExpenseId, ProductId, SaleId, UserId};

use crate::stock::MovementKind;

/// A queued intent to mutate the ledger, applied later in a batch.
///
/// Pending operations are transient: they live in memory only, are consumed
/// exactly once by a drain, and are re-enqueued verbatim when a drain's
/// commit fails. Not serializable: a pending operation never outlives the
/// process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: MovementKind,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub reason: String,
    pub actor_id: Option<UserId>,
    pub origin_sale_id: Option<SaleId>,
    pub origin_expense_id: Option<ExpenseId>,
}

impl PendingOperation {
    pub fn new(
        kind: MovementKind,
        product_id: ProductId,
        quantity: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            product_id,
            quantity,
            reason: reason.into(),
            actor_id: None,
            origin_sale_id: None,
            origin_expense_id: None,
        }
    }

    pub fn with_actor(mut self, actor_id: Option<UserId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn with_sale(mut self, sale_id: SaleId) -> Self {
        self.origin_sale_id = Some(sale_id);
        self
    }

    pub fn with_expense(mut self, expense_id: ExpenseId) -> Self {
        self.origin_expense_id = Some(expense_id);
        self
    }
}

/// Buffer of pending ledger mutations, owned by one ledger instance.
///
/// `register` and the swap step of a drain are mutually exclusive through the
/// internal lock; operations registered while a drain is in flight land on
/// the fresh list and are picked up by the next drain.
#[derive(Debug, Default)]
pub struct DeferredOperationQueue {
    pending: Mutex<VecDeque<PendingOperation>>,
}

impl DeferredOperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation. Never fails: registration is fired from
    /// post-commit hooks whose own transaction already succeeded, so a
    /// poisoned lock is recovered instead of aborting the caller.
    pub fn register(&self, op: PendingOperation) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(
            kind = ?op.kind,
            product_id = %op.product_id,
            quantity = %op.quantity,
            reason = %op.reason,
            "registered deferred inventory operation"
        );
        pending.push_back(op);
    }

    /// Atomically take the whole pending list, leaving an empty one behind.
    pub fn swap(&self) -> Vec<PendingOperation> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.drain(..).collect()
    }

    /// Re-insert a failed batch at the front so registration order is
    /// preserved across the retry boundary.
    pub fn requeue_front(&self, ops: Vec<PendingOperation>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        for op in ops.into_iter().rev() {
            pending.push_front(op);
        }
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
