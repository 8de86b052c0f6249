//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                 Orders (header ──< lines)                      │
//! │  ─────────────────       ─────────────────────────────────────────      │
//! │  Category                Purchase ──< PurchaseLine ──► Product         │
//! │  Supplier  ◄──────────── Purchase                                      │
//! │  Customer  ◄──────────── Sale     ──< SaleLine     ──► Product         │
//! │  Product                                                                │
//! │    stock / stock_minimum  (written only by the stock primitive)        │
//! │                                                                         │
//! │  Inputs                                                                 │
//! │  ─────────────────                                                      │
//! │  PurchaseInput / SaleInput  - what an order form submits               │
//! │  TaxRate                    - fraction handed to the totals calculator │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are SQLite `INTEGER PRIMARY KEY` values. Monetary fields are
//! [`Decimal`] and serialize as strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{percent_of, round_currency};

// =============================================================================
// Tax Rate
// =============================================================================

/// A tax rate expressed as a fraction (`0.23` for 23%).
///
/// ## Where It Comes From
/// ```text
/// Order form: tax "23"
///      │
///      ▼
/// TaxRate::parse_percentage("23") → Some(TaxRate(0.23))
/// TaxRate::parse_percentage("abc") → None  (keep existing tax amount)
/// TaxRate::parse_percentage("150") → None
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a rate from a fraction in `[0, 1]`.
    pub fn from_fraction(fraction: Decimal) -> Option<Self> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return None;
        }
        Some(TaxRate(fraction))
    }

    /// Creates a rate from a percentage in `[0, 100]`.
    pub fn from_percentage(percentage: Decimal) -> Option<Self> {
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return None;
        }
        Some(TaxRate(percentage / Decimal::ONE_HUNDRED))
    }

    /// Parses a percentage as typed into an order form.
    ///
    /// Non-numeric, negative and above-100 input all mean "no rate
    /// supplied" and return `None`; this never fails.
    pub fn parse_percentage(raw: &str) -> Option<Self> {
        crate::money::parse_amount(raw).and_then(Self::from_percentage)
    }

    /// Like [`parse_percentage`](Self::parse_percentage), also returning
    /// the percentage exactly as typed (`"23.50"` keeps its two decimals).
    pub fn parse_entered(raw: &str) -> Option<(Self, Decimal)> {
        let entered = crate::money::parse_amount(raw)?;
        Self::from_percentage(entered).map(|rate| (rate, entered))
    }

    /// Zero tax rate. Distinct from "no rate supplied".
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// The rate as a fraction.
    pub fn fraction(&self) -> Decimal {
        self.0
    }

    /// The rate as a percentage (`23` for 0.23), normalized.
    pub fn percentage(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Whether a supplier is a company or a private individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SupplierKind {
    #[default]
    Company,
    Individual,
}

/// A supplier (counterparty of purchases).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub kind: SupplierKind,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a supplier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub kind: SupplierKind,
}

/// A customer (counterparty of sales).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product held in stock.
///
/// `stock` and `stock_minimum` are read-only to every caller except the
/// stock adjustment primitive in `stockbook-db`. Invariants (also enforced
/// by CHECK constraints):
/// - `stock >= 0`
/// - `stock_minimum` is `None` or `0 <= stock_minimum <= stock`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,

    /// Unit cost of the most recent purchase of this product.
    #[ts(as = "String")]
    pub reference_cost: Decimal,

    /// Markup over `reference_cost`, as a percentage.
    #[ts(as = "String")]
    pub margin_percentage: Decimal,

    pub stock: i64,
    pub stock_minimum: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Suggested sale price: `reference_cost × (1 + margin / 100)`, rounded.
    pub fn sale_price(&self) -> Decimal {
        let markup = percent_of(self.reference_cost, self.margin_percentage);
        round_currency(self.reference_cost + markup)
    }

    /// True when stock is at or below a configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.stock_minimum.is_some_and(|minimum| self.stock <= minimum)
    }
}

/// Fields for creating a product.
///
/// `stock_minimum` of `None` is filled with
/// [`default_stock_minimum`](crate::stock::default_stock_minimum) on insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    #[ts(as = "String")]
    pub reference_cost: Decimal,
    #[ts(as = "String")]
    pub margin_percentage: Decimal,
    pub stock: i64,
    pub stock_minimum: Option<i64>,
}

/// Descriptive and pricing fields of a product that may be edited.
///
/// Stock is deliberately absent: it only moves through orders.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    #[ts(as = "String")]
    pub reference_cost: Decimal,
    #[ts(as = "String")]
    pub margin_percentage: Decimal,
}

// =============================================================================
// Purchases
// =============================================================================

/// A purchase order header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Purchase {
    pub id: i64,
    pub supplier_id: i64,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub subtotal: Decimal,

    /// Whole-number percentage, 0 to 100.
    pub discount_percentage: i64,

    /// Always derived from `subtotal × discount_percentage / 100`.
    #[ts(as = "String")]
    pub discount_amount: Decimal,

    #[ts(as = "String")]
    pub tax_amount: Decimal,
    #[ts(as = "String")]
    pub total: Decimal,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One product line of a purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLine {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    /// `quantity × unit_price`, recomputed on every save.
    #[ts(as = "String")]
    pub line_total: Decimal,
}

/// A purchase line as submitted by the order form.
///
/// `id` is `Some` for a line that already exists on the order being
/// edited and `None` for a new line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLineInput {
    pub id: Option<i64>,
    pub product_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub unit_price: Decimal,
}

/// A purchase order as submitted for create or edit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseInput {
    pub supplier_id: i64,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    pub discount_percentage: i64,
    /// Raw percentage text, e.g. `"23"`. See [`TaxRate::parse_percentage`].
    pub tax_percentage: String,
    pub lines: Vec<PurchaseLineInput>,
}

// =============================================================================
// Sales
// =============================================================================

/// A sales order header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub customer_id: i64,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub subtotal: Decimal,

    /// Stored as entered; sale totals do not derive from it.
    pub discount_percentage: i64,

    /// Absolute amount entered by the user, taken as given.
    #[ts(as = "String")]
    pub discount_amount: Decimal,

    /// Percentage as entered (display and audit only).
    #[ts(as = "String")]
    pub tax_percentage: Decimal,

    #[ts(as = "String")]
    pub tax_amount: Decimal,
    #[ts(as = "String")]
    pub total: Decimal,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One product line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    /// Per-line discount percentage, 0 to 100.
    #[ts(as = "String")]
    pub discount_percentage: Decimal,
    /// `quantity × unit_price × (1 − discount / 100)`, recomputed on every save.
    #[ts(as = "String")]
    pub line_total: Decimal,
}

/// A sale line as submitted by the order form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineInput {
    pub id: Option<i64>,
    pub product_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    #[ts(as = "String")]
    pub discount_percentage: Decimal,
}

/// A sales order as submitted for create or edit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleInput {
    pub customer_id: i64,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    pub discount_percentage: i64,
    #[ts(as = "String")]
    pub discount_amount: Decimal,
    pub tax_percentage: String,
    pub lines: Vec<SaleLineInput>,
}

// =============================================================================
// Queries
// =============================================================================

/// Filter for order list views. Results are newest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    /// Supplier id for purchases, customer id for sales.
    pub counterparty_id: Option<i64>,
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
    pub limit: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        OrderFilter {
            counterparty_id: None,
            from: None,
            to: None,
            limit: 50,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
