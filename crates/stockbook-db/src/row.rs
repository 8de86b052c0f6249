//! Column decoding shared by the repositories.
//!
//! Money is stored as decimal TEXT; these helpers parse it back exactly
//! and turn malformed text into `DbError::InvalidData` naming the column.

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use stockbook_core::money::parse_amount;

use crate::error::{DbError, DbResult};

/// Reads a decimal TEXT column.
pub(crate) fn decimal(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    parse_amount(&raw).ok_or_else(|| DbError::invalid_data(column, raw))
}

/// Canonical TEXT form of an amount for binding.
pub(crate) fn text(amount: Decimal) -> String {
    amount.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_text_keeps_scale() {
        assert_eq!(text(dec!(25.00)), "25.00");
        assert_eq!(text(dec!(23)), "23");
    }
}
