//! # Validation Module
//!
//! Input validation for catalog records and submitted orders.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Order form                                                   │
//! │  └── Field formats, required fields                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service entry (THIS MODULE)                                  │
//! │  ├── Runs before any transaction is opened                             │
//! │  └── Line errors carry the 1-based line position                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0, stock_minimum <= stock)                        │
//! │  └── Foreign keys (RESTRICT on products and counterparties)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("name", "Widget").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{NewProduct, NewSupplier, ProductUpdate, PurchaseInput, SaleInput};
use crate::money::MONEY_DP;
use crate::totals::{compute_line_total, compute_sale_line_total};
use crate::{MAX_LINE_QUANTITY, MAX_MONEY_AMOUNT, MAX_ORDER_LINES, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional email address.
///
/// Only checks the shape `local@domain.tld`; deliverability is not our
/// concern.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: format!("'{}' is not an email address", email),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount that may be zero but never negative.
pub fn validate_amount(field: &str, amount: Decimal) -> ValidationResult<()> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an amount stored as money on an order or product.
///
/// ## Rules
/// - Not negative
/// - At most [`MAX_MONEY_AMOUNT`]
/// - At most two decimal places (trailing zeros do not count)
pub fn validate_money(field: &str, amount: Decimal) -> ValidationResult<()> {
    validate_amount(field, amount)?;

    if amount > MAX_MONEY_AMOUNT {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_MONEY_AMOUNT,
        });
    }

    if amount.normalize().scale() > MONEY_DP {
        return Err(ValidationError::TooPrecise {
            field: field.to_string(),
            places: MONEY_DP,
        });
    }

    Ok(())
}

/// Validates the rounded total of one line against [`MAX_MONEY_AMOUNT`].
///
/// Inputs must already have passed [`validate_quantity`] and
/// [`validate_money`], which keeps the product itself in range.
fn validate_line_total(line_total: Decimal) -> ValidationResult<()> {
    if line_total > MAX_MONEY_AMOUNT {
        return Err(ValidationError::TooLarge {
            field: "line_total".to_string(),
            max: MAX_MONEY_AMOUNT,
        });
    }
    Ok(())
}

/// Validates a decimal percentage in `[0, 100]`.
pub fn validate_percentage(field: &str, percentage: Decimal) -> ValidationResult<()> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a whole-number percentage in `[0, 100]`.
pub fn validate_whole_percentage(field: &str, percentage: i64) -> ValidationResult<()> {
    if !(0..=100).contains(&percentage) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a stock level and its optional minimum.
///
/// ## Rules
/// - `0 <= stock <= MAX_STOCK`
/// - `minimum`, when present, is in `[0, stock]`
pub fn validate_stock_levels(stock: i64, minimum: Option<i64>) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }

    if stock > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    if let Some(minimum) = minimum {
        if minimum < 0 || minimum > stock {
            return Err(ValidationError::OutOfRange {
                field: "stock_minimum".to_string(),
                min: 0,
                max: stock,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a product before insert.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_money("reference_cost", product.reference_cost)?;
    validate_percentage("margin_percentage", product.margin_percentage)?;
    validate_stock_levels(product.stock, product.stock_minimum)
}

/// Validates a product edit.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    validate_name("name", &update.name)?;
    validate_money("reference_cost", update.reference_cost)?;
    validate_percentage("margin_percentage", update.margin_percentage)
}

/// Validates a supplier before insert.
pub fn validate_new_supplier(supplier: &NewSupplier) -> ValidationResult<()> {
    validate_name("name", &supplier.name)?;
    validate_email(supplier.email.as_deref())
}

// =============================================================================
// Order Validators
// =============================================================================

fn validate_line_ids<I>(ids: I) -> CoreResult<()>
where
    I: IntoIterator<Item = Option<i64>>,
{
    let mut seen = HashSet::new();
    for line_id in ids.into_iter().flatten() {
        if !seen.insert(line_id) {
            return Err(CoreError::DuplicateLine { line_id });
        }
    }
    Ok(())
}

fn validate_line_count(count: usize) -> CoreResult<()> {
    if count > MAX_ORDER_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_ORDER_LINES,
        });
    }
    Ok(())
}

fn line_error(index: usize) -> impl Fn(ValidationError) -> CoreError {
    move |source| CoreError::InvalidLine {
        line: index + 1,
        source,
    }
}

/// Validates a submitted purchase.
///
/// Empty orders are allowed; they produce zero totals and move no stock.
pub fn validate_purchase_input(input: &PurchaseInput) -> CoreResult<()> {
    validate_whole_percentage("discount_percentage", input.discount_percentage)?;
    validate_line_count(input.lines.len())?;
    validate_line_ids(input.lines.iter().map(|l| l.id))?;

    for (index, line) in input.lines.iter().enumerate() {
        validate_quantity(line.quantity).map_err(line_error(index))?;
        validate_money("unit_price", line.unit_price).map_err(line_error(index))?;
        validate_line_total(compute_line_total(line.quantity, line.unit_price))
            .map_err(line_error(index))?;
    }

    Ok(())
}

/// Validates a submitted sale.
pub fn validate_sale_input(input: &SaleInput) -> CoreResult<()> {
    validate_whole_percentage("discount_percentage", input.discount_percentage)?;
    validate_money("discount_amount", input.discount_amount)?;
    validate_line_count(input.lines.len())?;
    validate_line_ids(input.lines.iter().map(|l| l.id))?;

    for (index, line) in input.lines.iter().enumerate() {
        validate_quantity(line.quantity).map_err(line_error(index))?;
        validate_money("unit_price", line.unit_price).map_err(line_error(index))?;
        validate_percentage("discount_percentage", line.discount_percentage)
            .map_err(line_error(index))?;
        validate_line_total(compute_sale_line_total(
            line.quantity,
            line.unit_price,
            line.discount_percentage,
        ))
        .map_err(line_error(index))?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
