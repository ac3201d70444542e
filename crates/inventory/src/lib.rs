//! Inventory ledger and deferred-mutation engine.
//!
//! Authoritative stock quantities live in a [`store::LedgerStore`]; every
//! change to them flows through a [`queue::DeferredOperationQueue`] and is
//! applied by [`ledger::InventoryLedger::drain_and_apply`] after the business
//! transaction that triggered it has committed. One immutable
//! [`stock::Movement`] is recorded per applied operation.
//!
//! Business write paths (sales, purchases) never touch the store directly;
//! they call the post-commit adapters in [`hooks`].

pub mod guard;
pub mod hooks;
pub mod ledger;
pub mod queue;
pub mod stock;
pub mod store;

pub use guard::ConcurrencyGuard;
pub use hooks::{
    InventoryHooks, MaterialPurchaseRecorded, SaleLineDeleted, SaleLineQuantityChanged,
    SaleLineRecorded,
};
pub use ledger::{Availability, InventoryLedger};
pub use queue::{DeferredOperationQueue, PendingOperation};
pub use stock::{Movement, MovementKind, StockRecord, StockStatus, StockView};
pub use store::{InMemoryLedgerStore, LedgerStore, MovementFilter, StoreError};
