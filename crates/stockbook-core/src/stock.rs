//! # Stock Decisions
//!
//! The pure half of the stock adjustment primitive: given the locked
//! product row and a signed delta, decide the new stock and minimum or
//! reject the change. `stockbook-db` holds the lock and writes the result.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  new_stock = stock + delta                                              │
//! │                                                                         │
//! │  new_stock > MAX_STOCK                  → StockLimitExceeded            │
//! │  new_stock < 0                          → InsufficientStock             │
//! │                                                                         │
//! │  delta < 0 and new_stock < minimum:                                     │
//! │    Consume(Hard)                        → BelowMinimumStock             │
//! │    Consume(Soft)                        → minimum := new_stock          │
//! │    Replenish (purchase reversal)        → minimum := new_stock          │
//! │                                                                         │
//! │  otherwise                              → minimum unchanged             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The policy is a value handed in by the caller. Nothing here reads
//! process-wide configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::MAX_STOCK;

// =============================================================================
// Policy
// =============================================================================

/// What a sale does when it would push stock under the product minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinStockPolicy {
    /// Reject the sale.
    Hard,
    /// Accept the sale and lower the minimum to the new stock.
    #[default]
    Soft,
}

impl fmt::Display for MinStockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinStockPolicy::Hard => write!(f, "hard"),
            MinStockPolicy::Soft => write!(f, "soft"),
        }
    }
}

impl FromStr for MinStockPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hard" | "reject" => Ok(MinStockPolicy::Hard),
            "soft" | "clamp" => Ok(MinStockPolicy::Soft),
            other => Err(ValidationError::InvalidFormat {
                field: "min_stock_policy".to_string(),
                reason: format!("unknown policy '{}', expected hard or soft", other),
            }),
        }
    }
}

/// Which branch of the primitive an order side uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockRule {
    /// Purchases. No policy: increases are always safe, and reversing a
    /// purchase line lowers a minimum it would otherwise cross.
    Replenish,
    /// Sales, under the configured minimum-stock policy.
    Consume(MinStockPolicy),
}

// =============================================================================
// Decision
// =============================================================================

/// The product columns the primitive reads while holding the row lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStock {
    pub id: i64,
    pub name: String,
    pub stock: i64,
    pub stock_minimum: Option<i64>,
}

/// Outcome of an accepted stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub new_minimum: Option<i64>,
    /// True when the minimum was lowered to keep `minimum <= stock`.
    pub minimum_lowered: bool,
}

/// Decides the effect of applying `delta` to a locked product row.
///
/// ## Arguments
/// * `current` - product row as read under the lock
/// * `delta` - signed quantity (negative consumes stock)
/// * `rule` - purchase or sale branch, with the sale policy
///
/// ## Returns
/// * `Ok(StockChange)` - values to write
/// * `Err(CoreError::StockLimitExceeded)` - stock would pass [`MAX_STOCK`]
/// * `Err(CoreError::InsufficientStock)` - stock would go negative
/// * `Err(CoreError::BelowMinimumStock)` - hard policy rejected a consumption
pub fn plan_stock_change(
    current: &ProductStock,
    delta: i64,
    rule: StockRule,
) -> CoreResult<StockChange> {
    let Some(new_stock) = current
        .stock
        .checked_add(delta)
        .filter(|s| delta <= 0 || *s <= MAX_STOCK)
    else {
        return Err(CoreError::StockLimitExceeded {
            product_id: current.id,
            product: current.name.clone(),
            stock: current.stock,
            requested: delta,
            max: MAX_STOCK,
        });
    };

    if new_stock < 0 {
        return Err(CoreError::InsufficientStock {
            product_id: current.id,
            product: current.name.clone(),
            available: current.stock,
            requested: delta.saturating_neg(),
        });
    }

    let crosses_minimum = delta < 0 && current.stock_minimum.is_some_and(|min| new_stock < min);

    if !crosses_minimum {
        return Ok(StockChange {
            product_id: current.id,
            previous_stock: current.stock,
            new_stock,
            new_minimum: current.stock_minimum,
            minimum_lowered: false,
        });
    }

    match rule {
        StockRule::Consume(MinStockPolicy::Hard) => Err(CoreError::BelowMinimumStock {
            product_id: current.id,
            product: current.name.clone(),
            resulting: new_stock,
            minimum: current.stock_minimum.unwrap_or_default(),
        }),
        StockRule::Consume(MinStockPolicy::Soft) | StockRule::Replenish => Ok(StockChange {
            product_id: current.id,
            previous_stock: current.stock,
            new_stock,
            new_minimum: current.stock_minimum.map(|min| min.min(new_stock)),
            minimum_lowered: true,
        }),
    }
}

/// Default minimum for a stock level: 90% of it, rounded down.
pub fn default_stock_minimum(stock: i64) -> i64 {
    stock.max(0) * 9 / 10
}

/// Minimum after a purchase raised stock to `new_stock`.
///
/// The 90% floor replaces the current minimum only when it is higher;
/// a missing minimum counts as zero.
pub fn raised_minimum(current: Option<i64>, new_stock: i64) -> Option<i64> {
    let candidate = default_stock_minimum(new_stock);
    if candidate > current.unwrap_or(0) {
        Some(candidate)
    } else {
        current
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
