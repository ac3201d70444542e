//! `dulceria-core` — shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure
//! concerns): strongly-typed identifiers and the domain error model the rest
//! of the workspace builds on.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ExpenseId, MovementId, ProductId, SaleId, SaleLineId, UserId};
