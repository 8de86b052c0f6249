//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Stock and order rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbook-db errors (separate crate)                                  │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller message          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stock error names the product (id and name) so the caller can tell
//! the user which line of the order could not be applied.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Any of these raised inside an order transaction aborts the whole
/// operation: header, lines, stock and totals roll back together.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stock adjustment targeted a product id that does not exist.
    ///
    /// ## When This Occurs
    /// - The product row was removed between form render and submit
    /// - A line references a stale product id (data-integrity problem)
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Applying the delta would drive stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: "Widget" qty 7
    ///      │
    ///      ▼
    /// Locked row: stock = 5
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Widget", available: 5, requested: 7 }
    ///      │
    ///      ▼
    /// Sale not saved, stock stays 5
    /// ```
    #[error(
        "Insufficient stock for {product} (#{product_id}): \
         available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: i64,
        product: String,
        available: i64,
        requested: i64,
    },

    /// Applying the delta would push stock past [`MAX_STOCK`](crate::MAX_STOCK).
    #[error(
        "Stock for {product} (#{product_id}) cannot exceed {max}: \
         holding {stock}, adding {requested}"
    )]
    StockLimitExceeded {
        product_id: i64,
        product: String,
        stock: i64,
        requested: i64,
        max: i64,
    },

    /// A consumption would leave stock under the product's minimum and the
    /// hard minimum-stock policy is active.
    #[error(
        "Stock for {product} (#{product_id}) would drop to {resulting}, \
         below its minimum of {minimum}"
    )]
    BelowMinimumStock {
        product_id: i64,
        product: String,
        resulting: i64,
        minimum: i64,
    },

    /// An edit referenced a line id that belongs to another order.
    #[error("Line {line_id} does not belong to {order} {order_id}")]
    LineNotInOrder {
        line_id: i64,
        order: &'static str,
        order_id: i64,
    },

    /// The same line id was submitted twice in one edit.
    #[error("Line {line_id} appears more than once")]
    DuplicateLine { line_id: i64 },

    /// Order has more lines than allowed.
    #[error("Order cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// A single line failed validation. `line` is 1-based.
    #[error("Line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: ValidationError,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any transaction is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount is above the accepted maximum.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: Decimal },

    /// Amount carries more decimal places than are stored.
    #[error("{field} must have at most {places} decimal places")]
    TooPrecise { field: String, places: u32 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 3,
            product: "Widget".to_string(),
            available: 5,
            requested: 7,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Widget (#3): available 5, requested 7"
        );

        let err = CoreError::BelowMinimumStock {
            product_id: 3,
            product: "Widget".to_string(),
            resulting: 5,
            minimum: 8,
        };
        assert_eq!(
            err.to_string(),
            "Stock for Widget (#3) would drop to 5, below its minimum of 8"
        );
    }

    #[test]
    fn test_invalid_line_names_position() {
        let err = CoreError::InvalidLine {
            line: 2,
            source: ValidationError::MustBePositive {
                field: "quantity".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Line 2: quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
