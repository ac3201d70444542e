use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dulceria_core::{ExpenseId, MovementId, ProductId, SaleId, UserId};

/// Default unit of measure for lazily created stock records.
pub const DEFAULT_UNIT: &str = "units";

/// Default low-stock alert threshold for lazily created stock records.
pub fn default_alert_threshold() -> Decimal {
    Decimal::from(10)
}

/// Derived stock level classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    Normal,
}

/// Kind of quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Relative increase (purchase, cancelled sale line).
    In,
    /// Relative decrease, clamped at zero (sale).
    Out,
    /// Absolute set (stocktake correction).
    Adjust,
}

/// Authoritative per-product stock record.
///
/// `quantity` is only ever changed by applying a movement; see
/// [`resulting_quantity`] for the arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit: String,
    pub alert_threshold: Decimal,
    pub location: Option<String>,
    pub last_updated_at: DateTime<Utc>,
    pub last_updated_by: Option<UserId>,
}

impl StockRecord {
    /// Zero-quantity record used when a product is first moved without ever
    /// having been stocked.
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity: Decimal::ZERO,
            unit: DEFAULT_UNIT.to_string(),
            alert_threshold: default_alert_threshold(),
            location: None,
            last_updated_at: Utc::now(),
            last_updated_by: None,
        }
    }

    /// Status is a pure function of quantity vs the alert threshold.
    pub fn status(&self) -> StockStatus {
        if self.quantity <= Decimal::ZERO {
            StockStatus::OutOfStock
        } else if self.quantity <= self.alert_threshold {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }

    /// Read-side projection exposed to collaborators.
    pub fn view(&self) -> StockView {
        StockView {
            quantity: self.quantity,
            unit: self.unit.clone(),
            status: self.status(),
            last_updated_at: self.last_updated_at,
        }
    }
}

/// Projection returned by stock queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockView {
    pub quantity: Decimal,
    pub unit: String,
    pub status: StockStatus,
    pub last_updated_at: DateTime<Utc>,
}

/// Immutable audit record of one applied quantity change.
///
/// `delta_quantity` always records the *requested* change; when an `Out`
/// overdraws the stock, `quantity_after` is clamped at zero while the
/// requested delta stays visible for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub delta_quantity: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    pub occurred_at: DateTime<Utc>,
    pub reason: String,
    pub actor_id: Option<UserId>,
    pub origin_sale_id: Option<SaleId>,
    pub origin_expense_id: Option<ExpenseId>,
}

/// The single clamp rule: quantities never go negative.
///
/// - `In`: `before + delta`
/// - `Out`: `before - delta`, floored at zero
/// - `Adjust`: absolute set to `delta`, floored at zero
pub fn resulting_quantity(kind: MovementKind, before: Decimal, delta: Decimal) -> Decimal {
    let after = match kind {
        MovementKind::In => before + delta,
        MovementKind::Out => before - delta,
        MovementKind::Adjust => delta,
    };
    after.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record_with(quantity: Decimal, threshold: Decimal) -> StockRecord {
        let mut record = StockRecord::new(ProductId::new());
        record.quantity = quantity;
        record.alert_threshold = threshold;
        record
    }

    #[test]
    fn status_boundaries() {
        assert_eq!(record_with(dec!(0), dec!(10)).status(), StockStatus::OutOfStock);
        assert_eq!(record_with(dec!(-1), dec!(10)).status(), StockStatus::OutOfStock);
        assert_eq!(record_with(dec!(0.5), dec!(10)).status(), StockStatus::Low);
        assert_eq!(record_with(dec!(10), dec!(10)).status(), StockStatus::Low);
        assert_eq!(record_with(dec!(10.01), dec!(10)).status(), StockStatus::Normal);
    }

    #[test]
    fn inbound_adds() {
        assert_eq!(
            resulting_quantity(MovementKind::In, dec!(2.5), dec!(1.5)),
            dec!(4.0)
        );
    }

    #[test]
    fn outbound_clamps_at_zero() {
        assert_eq!(
            resulting_quantity(MovementKind::Out, dec!(7), dec!(20)),
            dec!(0)
        );
        assert_eq!(
            resulting_quantity(MovementKind::Out, dec!(7), dec!(3)),
            dec!(4)
        );
    }

    #[test]
    fn adjust_sets_absolute_and_clamps() {
        assert_eq!(
            resulting_quantity(MovementKind::Adjust, dec!(99), dec!(12.25)),
            dec!(12.25)
        );
        assert_eq!(
            resulting_quantity(MovementKind::Adjust, dec!(99), dec!(-3)),
            dec!(0)
        );
    }

    #[test]
    fn view_projects_status() {
        let record = record_with(dec!(3), dec!(10));
        let view = record.view();
        assert_eq!(view.quantity, dec!(3));
        assert_eq!(view.status, StockStatus::Low);
        assert_eq!(view.unit, DEFAULT_UNIT);
    }
}
