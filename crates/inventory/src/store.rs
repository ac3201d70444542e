use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use dulceria_core::ProductId;

use crate::stock::{Movement, StockRecord};

/// Persistence-layer failure during a drain commit.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("batch commit failed: {0}")]
    CommitFailed(String),
}

/// Time window for movement-history queries. Both bounds are inclusive;
/// `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if at > to {
                return false;
            }
        }
        true
    }
}

/// Storage seam for stock records and the movement log.
///
/// The only writer is the drain step of the deferred-operation queue, and it
/// writes through `commit_batch`: every record update and movement append in
/// a batch lands atomically or not at all.
pub trait LedgerStore: Send + Sync {
    fn fetch(&self, product_id: ProductId) -> Option<StockRecord>;

    /// Fetch all listed products in one call (drain amortization).
    fn fetch_batch(&self, product_ids: &[ProductId]) -> HashMap<ProductId, StockRecord>;

    /// Atomically persist a drained batch: upserted stock records plus their
    /// movement rows.
    fn commit_batch(
        &self,
        records: Vec<StockRecord>,
        movements: Vec<Movement>,
    ) -> Result<(), StoreError>;

    /// Movements for one product, ordered by application order,
    /// most-recent-last.
    fn movements_for(&self, product_id: ProductId, filter: &MovementFilter) -> Vec<Movement>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn fetch(&self, product_id: ProductId) -> Option<StockRecord> {
        (**self).fetch(product_id)
    }

    fn fetch_batch(&self, product_ids: &[ProductId]) -> HashMap<ProductId, StockRecord> {
        (**self).fetch_batch(product_ids)
    }

    fn commit_batch(
        &self,
        records: Vec<StockRecord>,
        movements: Vec<Movement>,
    ) -> Result<(), StoreError> {
        (**self).commit_batch(records, movements)
    }

    fn movements_for(&self, product_id: ProductId, filter: &MovementFilter) -> Vec<Movement> {
        (**self).movements_for(product_id, filter)
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Commit failures can be injected with
/// [`InMemoryLedgerStore::fail_next_commits`] to exercise the drain's
/// requeue-and-retry path; an injected failure rejects the batch before any
/// mutation, like a rolled-back transaction.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    records: RwLock<HashMap<ProductId, StockRecord>>,
    movements: RwLock<Vec<Movement>>,
    fail_commits: AtomicUsize,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls to `commit_batch` fail without applying.
    pub fn fail_next_commits(&self, n: usize) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    /// Total movement rows across all products.
    pub fn movement_count(&self) -> usize {
        self.movements.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn fetch(&self, product_id: ProductId) -> Option<StockRecord> {
        let map = self.records.read().ok()?;
        map.get(&product_id).cloned()
    }

    fn fetch_batch(&self, product_ids: &[ProductId]) -> HashMap<ProductId, StockRecord> {
        let map = match self.records.read() {
            Ok(m) => m,
            Err(_) => return HashMap::new(),
        };
        product_ids
            .iter()
            .filter_map(|id| map.get(id).map(|r| (*id, r.clone())))
            .collect()
    }

    fn commit_batch(
        &self,
        records: Vec<StockRecord>,
        movements: Vec<Movement>,
    ) -> Result<(), StoreError> {
        // Injected failure: reject before touching anything.
        if self
            .fail_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::CommitFailed("injected commit failure".to_string()));
        }

        let mut record_map = self
            .records
            .write()
            .map_err(|_| StoreError::CommitFailed("record lock poisoned".to_string()))?;
        let mut movement_log = self
            .movements
            .write()
            .map_err(|_| StoreError::CommitFailed("movement lock poisoned".to_string()))?;

        for record in records {
            record_map.insert(record.product_id, record);
        }
        movement_log.extend(movements);

        Ok(())
    }

    fn movements_for(&self, product_id: ProductId, filter: &MovementFilter) -> Vec<Movement> {
        let log = match self.movements.read() {
            Ok(l) => l,
            Err(_) => return vec![],
        };
        log.iter()
            .filter(|m| m.product_id == product_id && filter.contains(m.occurred_at))
            .cloned()
            .collect()
    }
}
