use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;

use dulceria_core::{MovementId, ProductId};

use crate::guard::ConcurrencyGuard;
use crate::queue::{DeferredOperationQueue, PendingOperation};
use crate::stock::{resulting_quantity, Movement, StockRecord, StockView};
use crate::store::{LedgerStore, MovementFilter};

/// Snapshot result of an availability check.
///
/// Valid at check time only: the guard is released on return, so this is a
/// consistent read, not a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub ok: bool,
    pub available: Decimal,
}

/// The inventory ledger service.
///
/// Owns the deferred-operation queue and the concurrency guard alongside the
/// store, so independent instances (one per application context, one per
/// test) share nothing. Business write paths register mutations and later —
/// strictly after their own commit — a drain applies them in one atomic
/// batch, producing one [`Movement`] per operation.
#[derive(Debug)]
pub struct InventoryLedger<S: LedgerStore> {
    store: S,
    queue: DeferredOperationQueue,
    guard: ConcurrencyGuard,
}

impl<S: LedgerStore> InventoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            queue: DeferredOperationQueue::new(),
            guard: ConcurrencyGuard::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queue a ledger mutation. Fire-and-forget: never fails, never touches
    /// the store.
    pub fn register_movement(&self, op: PendingOperation) {
        self.queue.register(op);
    }

    /// Number of operations currently waiting for a drain.
    pub fn pending_operations(&self) -> usize {
        self.queue.len()
    }

    /// Consume every queued operation and apply the batch to the store.
    ///
    /// The guard is held for the whole drain: only one drain runs at a time,
    /// and no availability check can read a half-applied batch. Operations
    /// registered while the drain runs land on the fresh list and wait for
    /// the next drain. If the batch commit fails the original batch is
    /// re-enqueued at the front, so per-product registration order survives
    /// the retry boundary and nothing is lost.
    pub fn drain_and_apply(&self) {
        let _held = self.guard.enter();

        let batch = self.queue.swap();
        if batch.is_empty() {
            return;
        }

        // Group by product, preserving intra-product registration order.
        // Cross-product order is not guaranteed (§ordering: per-product only).
        let mut product_order: Vec<ProductId> = Vec::new();
        let mut groups: HashMap<ProductId, Vec<&PendingOperation>> = HashMap::new();
        for op in &batch {
            groups
                .entry(op.product_id)
                .or_insert_with(|| {
                    product_order.push(op.product_id);
                    Vec::new()
                })
                .push(op);
        }

        let mut records = self.store.fetch_batch(&product_order);
        let mut updated: Vec<StockRecord> = Vec::with_capacity(product_order.len());
        let mut movements: Vec<Movement> = Vec::with_capacity(batch.len());

        for product_id in &product_order {
            let mut record = records
                .remove(product_id)
                .unwrap_or_else(|| StockRecord::new(*product_id));

            for op in groups[product_id].iter().copied() {
                movements.push(Self::apply(&mut record, op));
            }

            updated.push(record);
        }

        match self.store.commit_batch(updated, movements) {
            Ok(()) => {
                tracing::info!(
                    operations = batch.len(),
                    products = product_order.len(),
                    "applied deferred inventory batch"
                );
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    operations = batch.len(),
                    "inventory batch commit failed; re-queueing for retry"
                );
                self.queue.requeue_front(batch);
            }
        }
    }

    /// The only mutator of stock quantities: fold one pending operation into
    /// the record and return the single movement that documents it.
    fn apply(record: &mut StockRecord, op: &PendingOperation) -> Movement {
        let now = Utc::now();
        let quantity_before = record.quantity;
        let quantity_after = resulting_quantity(op.kind, quantity_before, op.quantity);

        record.quantity = quantity_after;
        record.last_updated_at = now;
        record.last_updated_by = op.actor_id;

        Movement {
            id: MovementId::new(),
            product_id: record.product_id,
            kind: op.kind,
            delta_quantity: op.quantity,
            quantity_before,
            quantity_after,
            occurred_at: now,
            reason: op.reason.clone(),
            actor_id: op.actor_id,
            origin_sale_id: op.origin_sale_id,
            origin_expense_id: op.origin_expense_id,
        }
    }

    /// Current stock projection for one product.
    pub fn get_stock(&self, product_id: ProductId) -> Option<StockView> {
        self.store.fetch(product_id).map(|record| record.view())
    }

    /// Guarded snapshot of a product's stock record.
    ///
    /// Used by read paths that need more than the view (sufficiency checks
    /// want unit and raw quantity together).
    pub fn stock_record(&self, product_id: ProductId) -> Option<StockRecord> {
        let _held = self.guard.enter();
        self.store.fetch(product_id)
    }

    /// Movement history for one product, ordered by application order,
    /// most-recent-last.
    pub fn movement_history(
        &self,
        product_id: ProductId,
        filter: MovementFilter,
    ) -> Vec<Movement> {
        self.store.movements_for(product_id, &filter)
    }

    /// Check whether `required` units are available right now.
    ///
    /// Reads under the guard for a consistent snapshot; callers must not
    /// assume the quantity still holds after return.
    pub fn validate_availability(&self, product_id: ProductId, required: Decimal) -> Availability {
        let _held = self.guard.enter();

        let Some(record) = self.store.fetch(product_id) else {
            return Availability {
                ok: false,
                available: Decimal::ZERO,
            };
        };

        if record.quantity <= Decimal::ZERO {
            return Availability {
                ok: false,
                available: Decimal::ZERO,
            };
        }

        Availability {
            ok: record.quantity >= required,
            available: record.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{MovementKind, StockStatus};
    use crate::store::InMemoryLedgerStore;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn ledger() -> InventoryLedger<InMemoryLedgerStore> {
        InventoryLedger::new(InMemoryLedgerStore::new())
    }

    fn register(
        ledger: &InventoryLedger<InMemoryLedgerStore>,
        kind: MovementKind,
        product_id: ProductId,
        quantity: Decimal,
        reason: &str,
    ) {
        ledger.register_movement(PendingOperation::new(kind, product_id, quantity, reason));
    }

    #[test]
    fn over_withdrawal_clamps_but_audits_requested_delta() {
        let ledger = ledger();
        let product_id = ProductId::new();

        register(&ledger, MovementKind::In, product_id, dec!(10), "sale return");
        register(&ledger, MovementKind::Out, product_id, dec!(3), "sale");
        register(&ledger, MovementKind::Out, product_id, dec!(20), "sale");
        ledger.drain_and_apply();

        let view = ledger.get_stock(product_id).unwrap();
        assert_eq!(view.quantity, dec!(0));
        assert_eq!(view.status, StockStatus::OutOfStock);

        let history = ledger.movement_history(product_id, MovementFilter::default());
        assert_eq!(history.len(), 3);

        let pairs: Vec<_> = history
            .iter()
            .map(|m| (m.quantity_before, m.quantity_after))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (dec!(0), dec!(10)),
                (dec!(10), dec!(7)),
                (dec!(7), dec!(0)),
            ]
        );

        // The clamped movement still records the requested delta.
        assert_eq!(history[2].delta_quantity, dec!(20));
        assert_eq!(history[2].kind, MovementKind::Out);
    }

    #[test]
    fn adjust_is_absolute_regardless_of_history() {
        let ledger = ledger();
        let product_id = ProductId::new();

        register(&ledger, MovementKind::In, product_id, dec!(100), "purchase");
        register(&ledger, MovementKind::Out, product_id, dec!(33), "sale");
        register(&ledger, MovementKind::Adjust, product_id, dec!(12.5), "stocktake");
        ledger.drain_and_apply();

        assert_eq!(ledger.get_stock(product_id).unwrap().quantity, dec!(12.5));
    }

    #[test]
    fn second_drain_is_a_no_op() {
        let ledger = ledger();
        let product_id = ProductId::new();

        register(&ledger, MovementKind::In, product_id, dec!(5), "purchase");
        ledger.drain_and_apply();
        let after_first = ledger.get_stock(product_id).unwrap();
        let movements_after_first = ledger.store().movement_count();

        ledger.drain_and_apply();

        assert_eq!(ledger.get_stock(product_id).unwrap(), after_first);
        assert_eq!(ledger.store().movement_count(), movements_after_first);
    }

    #[test]
    fn failed_commit_requeues_and_retry_converges() {
        let ledger = ledger();
        let product_id = ProductId::new();

        register(&ledger, MovementKind::In, product_id, dec!(10), "purchase");
        register(&ledger, MovementKind::Out, product_id, dec!(4), "sale");

        ledger.store().fail_next_commits(1);
        ledger.drain_and_apply();

        // Nothing applied, everything re-queued.
        assert_eq!(ledger.get_stock(product_id), None);
        assert_eq!(ledger.store().movement_count(), 0);
        assert_eq!(ledger.pending_operations(), 2);

        // Retry after the failure cause clears yields the state a clean
        // first drain would have produced.
        ledger.drain_and_apply();
        assert_eq!(ledger.get_stock(product_id).unwrap().quantity, dec!(6));
        assert_eq!(ledger.store().movement_count(), 2);
        assert_eq!(ledger.pending_operations(), 0);
    }

    #[test]
    fn operations_registered_between_failure_and_retry_apply_in_order() {
        let ledger = ledger();
        let product_id = ProductId::new();

        register(&ledger, MovementKind::In, product_id, dec!(10), "purchase");
        ledger.store().fail_next_commits(1);
        ledger.drain_and_apply();

        // Arrives after the failed batch was re-queued at the front.
        register(&ledger, MovementKind::Out, product_id, dec!(3), "sale");
        ledger.drain_and_apply();

        let history = ledger.movement_history(product_id, MovementFilter::default());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, MovementKind::In);
        assert_eq!(history[1].kind, MovementKind::Out);
        assert_eq!(ledger.get_stock(product_id).unwrap().quantity, dec!(7));
    }

    #[test]
    fn per_product_order_holds_in_mixed_batches() {
        let ledger = ledger();
        let candy = ProductId::new();
        let sugar = ProductId::new();

        register(&ledger, MovementKind::In, candy, dec!(4), "purchase");
        register(&ledger, MovementKind::In, sugar, dec!(100), "purchase");
        register(&ledger, MovementKind::Out, candy, dec!(1), "sale");
        register(&ledger, MovementKind::Out, sugar, dec!(25), "manufacturing");
        ledger.drain_and_apply();

        let candy_history = ledger.movement_history(candy, MovementFilter::default());
        assert_eq!(
            candy_history
                .iter()
                .map(|m| (m.quantity_before, m.quantity_after))
                .collect::<Vec<_>>(),
            vec![(dec!(0), dec!(4)), (dec!(4), dec!(3))]
        );

        let sugar_history = ledger.movement_history(sugar, MovementFilter::default());
        assert_eq!(
            sugar_history
                .iter()
                .map(|m| (m.quantity_before, m.quantity_after))
                .collect::<Vec<_>>(),
            vec![(dec!(0), dec!(100)), (dec!(100), dec!(75))]
        );
    }

    #[test]
    fn validate_availability_cases() {
        let ledger = ledger();
        let product_id = ProductId::new();

        // No record at all.
        let availability = ledger.validate_availability(product_id, dec!(1));
        assert!(!availability.ok);
        assert_eq!(availability.available, dec!(0));

        register(&ledger, MovementKind::In, product_id, dec!(5), "purchase");
        ledger.drain_and_apply();

        let enough = ledger.validate_availability(product_id, dec!(5));
        assert!(enough.ok);
        assert_eq!(enough.available, dec!(5));

        let short = ledger.validate_availability(product_id, dec!(6));
        assert!(!short.ok);
        assert_eq!(short.available, dec!(5));

        // Drained to zero: reported as unavailable with zero on hand.
        register(&ledger, MovementKind::Out, product_id, dec!(5), "sale");
        ledger.drain_and_apply();
        let empty = ledger.validate_availability(product_id, dec!(1));
        assert!(!empty.ok);
        assert_eq!(empty.available, dec!(0));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: without ADJUST, the final quantity is
        /// max(0, sum(IN) - sum(OUT)) only when no intermediate clamp fires;
        /// in general it equals a left fold of the clamp rule. Movement count
        /// always equals operation count and the before/after chain is
        /// gapless.
        #[test]
        fn in_out_sequences_fold_with_clamp(
            ops in prop::collection::vec((any::<bool>(), 0u32..1_000u32), 1..40)
        ) {
            let ledger = ledger();
            let product_id = ProductId::new();

            let mut expected = Decimal::ZERO;
            for (inbound, raw_quantity) in &ops {
                let quantity = Decimal::from(*raw_quantity);
                let kind = if *inbound { MovementKind::In } else { MovementKind::Out };
                expected = resulting_quantity(kind, expected, quantity);
                register(&ledger, kind, product_id, quantity, "prop");
            }
            ledger.drain_and_apply();

            prop_assert_eq!(ledger.get_stock(product_id).unwrap().quantity, expected);

            let history = ledger.movement_history(product_id, MovementFilter::default());
            prop_assert_eq!(history.len(), ops.len());
            for window in history.windows(2) {
                prop_assert_eq!(window[0].quantity_after, window[1].quantity_before);
            }
        }

        /// Property: when the running balance never dips below zero, the
        /// final quantity is exactly sum(IN) - sum(OUT).
        #[test]
        fn unclamped_sequences_are_pure_sums(
            quantities in prop::collection::vec(0u32..500u32, 1..20)
        ) {
            let ledger = ledger();
            let product_id = ProductId::new();

            // Seed enough stock that no OUT ever clamps.
            let seed: u32 = quantities.iter().sum();
            register(&ledger, MovementKind::In, product_id, Decimal::from(seed), "seed");
            for quantity in &quantities {
                register(&ledger, MovementKind::Out, product_id, Decimal::from(*quantity), "prop");
            }
            ledger.drain_and_apply();

            prop_assert_eq!(
                ledger.get_stock(product_id).unwrap().quantity,
                Decimal::ZERO
            );
        }
    }
}
