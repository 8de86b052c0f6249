//! # Order Totals Calculator
//!
//! Derives the four persisted header amounts (subtotal, discount, tax,
//! total) from an order's current lines.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    recompute totals                                     │
//! │                                                                         │
//! │  lines ──► Σ extended_amount()      (6 decimal places, unrounded sum)   │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  discount ── purchase: derive_discount_from_percentage(subtotal, pct)   │
//! │          └── sale:     accept_discount_amount_as_given(header amount)   │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  base  = max(0, subtotal − discount)                                    │
//! │  tax   = round(base × rate)      if a rate was supplied                 │
//! │        = existing tax amount     otherwise                              │
//! │  total = round(base + tax)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is deterministic over its inputs, so running the
//! calculator twice over an unchanged order yields identical amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{discount_factor, percent_of, round_currency, round_intermediate, sum};
use crate::types::{Purchase, PurchaseLine, Sale, SaleLine, TaxRate};

// =============================================================================
// Line Amounts
// =============================================================================

/// Line total of a purchase line: `quantity × unit_price`, rounded.
///
/// Call this before every insert or update of a purchase line.
pub fn compute_line_total(quantity: i64, unit_price: Decimal) -> Decimal {
    round_currency(Decimal::from(quantity) * unit_price)
}

/// Line total of a sale line: `quantity × unit_price × (1 − discount / 100)`,
/// rounded.
pub fn compute_sale_line_total(
    quantity: i64,
    unit_price: Decimal,
    discount_percentage: Decimal,
) -> Decimal {
    round_currency(Decimal::from(quantity) * unit_price * discount_factor(discount_percentage))
}

/// A line whose extended amount contributes to an order subtotal.
pub trait PricedLine {
    /// Extended amount at intermediate precision (not currency-rounded).
    fn extended_amount(&self) -> Decimal;
}

impl PricedLine for PurchaseLine {
    fn extended_amount(&self) -> Decimal {
        round_intermediate(Decimal::from(self.quantity) * self.unit_price)
    }
}

impl PricedLine for SaleLine {
    fn extended_amount(&self) -> Decimal {
        round_intermediate(
            Decimal::from(self.quantity)
                * self.unit_price
                * discount_factor(self.discount_percentage),
        )
    }
}

/// Unrounded subtotal over a line set.
pub fn raw_subtotal<L: PricedLine>(lines: &[L]) -> Decimal {
    sum(lines.iter().map(PricedLine::extended_amount))
}

// =============================================================================
// Discounts
// =============================================================================

/// Purchase discount: `round(subtotal × percentage / 100)`.
///
/// Whatever discount amount the header carried before is ignored.
pub fn derive_discount_from_percentage(subtotal: Decimal, percentage: i64) -> Decimal {
    round_currency(percent_of(subtotal, Decimal::from(percentage)))
}

/// Sale discount: the absolute amount on the header, unchanged.
pub fn accept_discount_amount_as_given(amount: Decimal) -> Decimal {
    amount
}

// =============================================================================
// Totals
// =============================================================================

/// The four amounts the calculator persists on an order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Totals of a freshly created, still empty order.
    pub fn zero() -> Self {
        OrderTotals {
            subtotal: round_currency(Decimal::ZERO),
            discount_amount: round_currency(Decimal::ZERO),
            tax_amount: round_currency(Decimal::ZERO),
            total: round_currency(Decimal::ZERO),
        }
    }
}

/// Shared tail of both calculator variants.
///
/// ## Arguments
/// * `raw_subtotal` - unrounded sum of line extended amounts
/// * `discount_amount` - already resolved discount (derived or given)
/// * `tax_rate` - `Some` overwrites the tax amount, `None` keeps `existing_tax`
/// * `existing_tax` - tax amount currently on the header
///
/// ## Returns
/// Rounded subtotal, the discount as passed, the tax and the total.
pub fn compute_totals(
    raw_subtotal: Decimal,
    discount_amount: Decimal,
    tax_rate: Option<TaxRate>,
    existing_tax: Decimal,
) -> OrderTotals {
    let base = (raw_subtotal - discount_amount).max(Decimal::ZERO);

    let tax_amount = match tax_rate {
        Some(rate) => round_currency(base * rate.fraction()),
        None => existing_tax,
    };

    OrderTotals {
        subtotal: round_currency(raw_subtotal),
        discount_amount,
        tax_amount,
        total: round_currency(base + tax_amount),
    }
}

/// Totals of a purchase over its current lines.
pub fn purchase_totals(
    purchase: &Purchase,
    lines: &[PurchaseLine],
    tax_rate: Option<TaxRate>,
) -> OrderTotals {
    let subtotal = raw_subtotal(lines);
    let discount = derive_discount_from_percentage(subtotal, purchase.discount_percentage);
    compute_totals(subtotal, discount, tax_rate, purchase.tax_amount)
}

/// Totals of a sale over its current lines.
pub fn sale_totals(sale: &Sale, lines: &[SaleLine], tax_rate: Option<TaxRate>) -> OrderTotals {
    let subtotal = raw_subtotal(lines);
    let discount = accept_discount_amount_as_given(sale.discount_amount);
    compute_totals(subtotal, discount, tax_rate, sale.tax_amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn purchase(discount_percentage: i64, tax_amount: Decimal) -> Purchase {
        Purchase {
            id: 1,
            supplier_id: 1,
            occurred_at: Utc::now(),
            subtotal: Decimal::ZERO,
            discount_percentage,
            discount_amount: dec!(99.99),
            tax_amount,
            total: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn purchase_line(id: i64, quantity: i64, unit_price: Decimal) -> PurchaseLine {
        PurchaseLine {
            id,
            purchase_id: 1,
            product_id: 1,
            quantity,
            unit_price,
            line_total: compute_line_total(quantity, unit_price),
        }
    }

    fn sale(discount_amount: Decimal, tax_amount: Decimal) -> Sale {
        Sale {
            id: 1,
            customer_id: 1,
            occurred_at: Utc::now(),
            subtotal: Decimal::ZERO,
            discount_percentage: 0,
            discount_amount,
            tax_percentage: Decimal::ZERO,
            tax_amount,
            total: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sale_line(quantity: i64, unit_price: Decimal, discount: Decimal) -> SaleLine {
        SaleLine {
            id: 1,
            sale_id: 1,
            product_id: 1,
            quantity,
            unit_price,
            discount_percentage: discount,
            line_total: compute_sale_line_total(quantity, unit_price, discount),
        }
    }

    #[test]
    fn test_purchase_scenario() {
        let order = purchase(10, Decimal::ZERO);
        let lines = vec![purchase_line(1, 10, dec!(2.50))];

        let totals = purchase_totals(&order, &lines, TaxRate::from_fraction(dec!(0.23)));

        assert_eq!(totals.subtotal, dec!(25.00));
        assert_eq!(totals.discount_amount, dec!(2.50));
        assert_eq!(totals.tax_amount, dec!(5.18));
        assert_eq!(totals.total, dec!(27.68));
    }

    #[test]
    fn test_purchase_discount_overwrites_header_amount() {
        // Header carries 99.99; the calculator derives 0 from 0%.
        let order = purchase(0, Decimal::ZERO);
        let lines = vec![purchase_line(1, 2, dec!(5.00))];

        let totals = purchase_totals(&order, &lines, None);
        assert_eq!(totals.discount_amount, dec!(0.00));
        assert_eq!(totals.total, dec!(10.00));
    }

    #[test]
    fn test_missing_rate_preserves_existing_tax() {
        let order = purchase(0, dec!(1.23));
        let lines = vec![purchase_line(1, 1, dec!(10.00))];

        let totals = purchase_totals(&order, &lines, None);
        assert_eq!(totals.tax_amount, dec!(1.23));
        assert_eq!(totals.total, dec!(11.23));
    }

    #[test]
    fn test_zero_rate_clears_tax() {
        let order = purchase(0, dec!(1.23));
        let lines = vec![purchase_line(1, 1, dec!(10.00))];

        let totals = purchase_totals(&order, &lines, Some(TaxRate::zero()));
        assert_eq!(totals.tax_amount, dec!(0.00));
        assert_eq!(totals.total, dec!(10.00));
    }

    #[test]
    fn test_empty_order_is_all_zero() {
        let totals = purchase_totals(
            &purchase(10, Decimal::ZERO),
            &[],
            TaxRate::parse_percentage("23"),
        );
        assert_eq!(totals, OrderTotals::zero());
    }

    #[test]
    fn test_sale_line_discount() {
        // 3 × 9.99 × 0.85 = 25.4745 → 25.47
        assert_eq!(compute_sale_line_total(3, dec!(9.99), dec!(15)), dec!(25.47));
        assert_eq!(compute_sale_line_total(3, dec!(9.99), dec!(0)), dec!(29.97));
        assert_eq!(compute_sale_line_total(3, dec!(9.99), dec!(100)), dec!(0.00));
    }

    #[test]
    fn test_sale_subtotal_uses_extended_precision() {
        // Each line is 0.3333 × 1 × 1 = 0.3333; three lines sum to 0.9999,
        // which rounds to 1.00 rather than 3 × 0.33 = 0.99.
        let lines = vec![
            sale_line(1, dec!(0.3333), dec!(0)),
            sale_line(1, dec!(0.3333), dec!(0)),
            sale_line(1, dec!(0.3333), dec!(0)),
        ];
        let totals = sale_totals(&sale(Decimal::ZERO, Decimal::ZERO), &lines, None);
        assert_eq!(totals.subtotal, dec!(1.00));
    }

    #[test]
    fn test_sale_discount_taken_as_given() {
        let order = sale(dec!(5.00), Decimal::ZERO);
        let lines = vec![sale_line(2, dec!(10.00), dec!(0))];

        let totals = sale_totals(&order, &lines, TaxRate::parse_percentage("10"));
        assert_eq!(totals.discount_amount, dec!(5.00));
        assert_eq!(totals.tax_amount, dec!(1.50));
        assert_eq!(totals.total, dec!(16.50));
    }

    #[test]
    fn test_discount_larger_than_subtotal_clamps_base() {
        let order = sale(dec!(50.00), Decimal::ZERO);
        let lines = vec![sale_line(1, dec!(10.00), dec!(0))];

        let totals = sale_totals(&order, &lines, TaxRate::parse_percentage("20"));
        assert_eq!(totals.tax_amount, dec!(0.00));
        assert_eq!(totals.total, dec!(0.00));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut order = purchase(7, Decimal::ZERO);
        let lines = vec![purchase_line(1, 3, dec!(1.99)), purchase_line(2, 7, dec!(0.15))];
        let rate = TaxRate::parse_percentage("19");

        let first = purchase_totals(&order, &lines, rate);
        order.subtotal = first.subtotal;
        order.discount_amount = first.discount_amount;
        order.tax_amount = first.tax_amount;
        order.total = first.total;

        assert_eq!(purchase_totals(&order, &lines, rate), first);
        assert_eq!(purchase_totals(&order, &lines, None), first);
    }
}
