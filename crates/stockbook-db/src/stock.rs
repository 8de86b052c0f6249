//! # Stock Adjustment Primitive
//!
//! The only code path that writes `products.stock` after a product is
//! created. Every call runs on a connection that is inside an open
//! transaction owned by an order service.
//!
//! ## Lock, Check, Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_stock_delta(conn, product_id, delta, rule)                       │
//! │                                                                         │
//! │  1. UPDATE products SET stock = stock WHERE id = ?                      │
//! │       - takes the SQLite write lock (held until COMMIT/ROLLBACK)        │
//! │       - waits up to busy_timeout if another order holds it              │
//! │       - 0 rows → ProductNotFound                                        │
//! │  2. SELECT id, name, stock, stock_minimum   (stable under the lock)     │
//! │  3. stockbook_core::stock::plan_stock_change(row, delta, rule)          │
//! │       - InsufficientStock / BelowMinimumStock → Err, nothing written    │
//! │  4. UPDATE products SET stock = stock + ?, stock_minimum = ?            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite has no `SELECT ... FOR UPDATE`. The no-op UPDATE in step 1 gives
//! the same guarantee: no other transaction can change the row between
//! the read in step 2 and the write in step 4.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Row, SqliteConnection};
use stockbook_core::reconcile::StockDelta;
use stockbook_core::stock::{
    plan_stock_change, raised_minimum, ProductStock, StockChange, StockRule,
};
use stockbook_core::CoreError;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::row::text;

/// Locks a product row for the rest of the transaction and reads its
/// stock columns.
///
/// ## Returns
/// * `Ok(ProductStock)` - row as of the lock
/// * `Err(DbError::Domain(CoreError::ProductNotFound))` - no such product
pub async fn lock_product(conn: &mut SqliteConnection, product_id: i64) -> DbResult<ProductStock> {
    let locked = sqlx::query("UPDATE products SET stock = stock WHERE id = ?1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    if locked.rows_affected() == 0 {
        return Err(CoreError::ProductNotFound(product_id).into());
    }

    let row = sqlx::query("SELECT id, name, stock, stock_minimum FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(ProductStock {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        stock: row.try_get("stock")?,
        stock_minimum: row.try_get("stock_minimum")?,
    })
}

/// Applies a signed quantity delta to one product.
///
/// ## Arguments
/// * `conn` - connection inside an open transaction
/// * `product_id` - product to adjust
/// * `delta` - signed quantity; zero is a no-op
/// * `rule` - `Replenish` for purchases, `Consume(policy)` for sales
///
/// ## Returns
/// * `Ok(None)` - delta was zero, nothing locked or written
/// * `Ok(Some(StockChange))` - new stock (and minimum) written
/// * `Err(..)` - rejected; the caller must drop the transaction
pub async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    product_id: i64,
    delta: i64,
    rule: StockRule,
) -> DbResult<Option<StockChange>> {
    if delta == 0 {
        return Ok(None);
    }

    let current = lock_product(conn, product_id).await?;

    let change = plan_stock_change(&current, delta, rule).inspect_err(|err| {
        warn!(product_id, delta, stock = current.stock, error = %err, "Stock change rejected");
    })?;

    sqlx::query(
        r#"
        UPDATE products
        SET
            stock = stock + ?2,
            stock_minimum = ?3,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .bind(change.new_minimum)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if change.minimum_lowered {
        info!(
            product_id,
            new_stock = change.new_stock,
            new_minimum = ?change.new_minimum,
            "Stock minimum lowered to match stock"
        );
    }

    debug!(
        product_id,
        delta,
        previous = change.previous_stock,
        new_stock = change.new_stock,
        "Stock adjusted"
    );

    Ok(Some(change))
}

/// Applies planned deltas in order; the first failure stops the run and
/// is returned so the caller's transaction rolls back.
pub async fn apply_plan(
    conn: &mut SqliteConnection,
    deltas: &[StockDelta],
    rule: StockRule,
) -> DbResult<Vec<StockChange>> {
    let mut applied = Vec::with_capacity(deltas.len());
    for d in deltas {
        debug!(line_id = d.line_id, cause = ?d.cause, "Applying stock delta");
        if let Some(change) = apply_stock_delta(conn, d.product_id, d.delta, rule).await? {
            applied.push(change);
        }
    }
    Ok(applied)
}

/// Records the side effects of receiving a purchase line on its product:
/// the reference cost becomes the line's unit price and the minimum is
/// raised to 90% of the new stock when that is higher.
///
/// Must follow the `apply_stock_delta` call for the same line, in the same
/// transaction, so the row is already locked.
pub async fn record_purchase_receipt(
    conn: &mut SqliteConnection,
    product_id: i64,
    unit_price: Decimal,
    change: &StockChange,
) -> DbResult<()> {
    let minimum = raised_minimum(change.new_minimum, change.new_stock);

    sqlx::query(
        r#"
        UPDATE products
        SET
            reference_cost = ?2,
            stock_minimum = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(text(unit_price))
    .bind(minimum)
    .execute(&mut *conn)
    .await?;

    debug!(product_id, %unit_price, minimum = ?minimum, "Purchase receipt recorded");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
