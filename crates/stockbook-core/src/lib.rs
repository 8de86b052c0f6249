//! # stockbook-core: Pure Business Logic for Stockbook
//!
//! This crate holds the arithmetic and decision rules behind purchase
//! orders, sales orders and product stock. Everything here is a pure
//! function over plain values; the database layer (`stockbook-db`) feeds
//! it rows and persists what it returns.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Order entry (forms, admin, API)                 │   │
//! │  │    header + line items ──► PurchaseInput / SaleInput            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockbook-db (services, one tx each)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockbook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌───────────┐        │   │
//! │  │   │  money  │  │ totals  │  │  stock  │  │ reconcile │        │   │
//! │  │   │ rounding│  │ subtotal│  │ policy  │  │ line diff │        │   │
//! │  │   │ percent │  │ discount│  │ minimum │  │  deltas   │        │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └───────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO GLOBAL STATE • PURE FUNCTIONS      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Purchase, Sale, TaxRate, ...)
//! - [`money`] - Currency rounding over exact decimals
//! - [`totals`] - Order totals calculator (purchase and sale variants)
//! - [`stock`] - Stock change decision and minimum-stock policy
//! - [`reconcile`] - Line-set diffing into stock deltas
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use stockbook_core::money::round_currency;
//! use stockbook_core::totals::compute_totals;
//! use stockbook_core::types::TaxRate;
//!
//! let subtotal = Decimal::new(2500, 2); // 25.00
//! let discount = Decimal::new(250, 2); //  2.50
//! let rate = TaxRate::parse_percentage("23");
//!
//! let totals = compute_totals(subtotal, discount, rate, Decimal::ZERO);
//! assert_eq!(totals.tax_amount, Decimal::new(518, 2));
//! assert_eq!(totals.total, Decimal::new(2768, 2));
//! assert_eq!(round_currency(Decimal::new(10005, 3)), Decimal::new(1001, 2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reconcile;
pub mod stock;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use reconcile::{LineSet, LineSnapshot, StockDelta, StockDirection};
pub use stock::{MinStockPolicy, StockChange, StockRule};
pub use totals::OrderTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

use rust_decimal::Decimal;

/// Maximum number of line items accepted on a single order.
pub const MAX_ORDER_LINES: usize = 500;

/// Maximum quantity on a single order line.
///
/// ## Business Reason
/// Catches a mistyped quantity (an extra zero or two) before it moves stock.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest unit price, discount amount or line total accepted:
/// 9 999 999 999.99 (ten integer digits, two decimals).
pub const MAX_MONEY_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Largest stock level a product may hold.
pub const MAX_STOCK: i64 = 2_147_483_647;
