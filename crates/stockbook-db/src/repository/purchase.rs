//! # Purchase Repository
//!
//! Purchase headers and lines.
//!
//! ## Transaction-Scoped Functions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PurchaseService::edit                                                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── lock_header()     UPDATE purchases SET id = id   (write lock)    │
//! │   ├── line_set()        snapshot BEFORE any line is touched            │
//! │   ├── update_header()                                                  │
//! │   ├── save_lines()      delete missing, update by id, insert new       │
//! │   ├── line_set()        AFTER snapshot → reconcile stock               │
//! │   └── write_totals()                                                   │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The free functions below take `&mut SqliteConnection` so they run on
//! the service's transaction. The [`PurchaseRepository`] methods are
//! read-only views for list and detail screens.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use stockbook_core::totals::compute_line_total;
use stockbook_core::{
    CoreError, LineSet, LineSnapshot, OrderFilter, OrderTotals, Purchase, PurchaseInput,
    PurchaseLine, PurchaseLineInput,
};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::row::{decimal, text};

const PURCHASE_COLUMNS: &str = r#"
    id, supplier_id, occurred_at, subtotal, discount_percentage,
    discount_amount, tax_amount, total, created_at, updated_at
"#;

const LINE_COLUMNS: &str = "id, purchase_id, product_id, quantity, unit_price, line_total";

fn purchase_from_row(row: &SqliteRow) -> DbResult<Purchase> {
    Ok(Purchase {
        id: row.try_get("id")?,
        supplier_id: row.try_get("supplier_id")?,
        occurred_at: row.try_get("occurred_at")?,
        subtotal: decimal(row, "subtotal")?,
        discount_percentage: row.try_get("discount_percentage")?,
        discount_amount: decimal(row, "discount_amount")?,
        tax_amount: decimal(row, "tax_amount")?,
        total: decimal(row, "total")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn line_from_row(row: &SqliteRow) -> DbResult<PurchaseLine> {
    Ok(PurchaseLine {
        id: row.try_get("id")?,
        purchase_id: row.try_get("purchase_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        unit_price: decimal(row, "unit_price")?,
        line_total: decimal(row, "line_total")?,
    })
}

// =============================================================================
// Read Views
// =============================================================================

/// Read access to purchases. Writes go through `PurchaseService`.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Gets a purchase header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        fetch_header(&mut conn, id).await
    }

    /// Lines of a purchase in id order.
    pub async fn lines(&self, purchase_id: i64) -> DbResult<Vec<PurchaseLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lines(&mut conn, purchase_id).await
    }

    /// Purchases matching `filter`, newest first.
    ///
    /// `from` is inclusive and `to` exclusive.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Purchase>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(PURCHASE_COLUMNS);
        qb.push(" FROM purchases WHERE 1 = 1");

        if let Some(supplier_id) = filter.counterparty_id {
            qb.push(" AND supplier_id = ").push_bind(supplier_id);
        }
        if let Some(from) = filter.from {
            qb.push(" AND occurred_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND occurred_at < ").push_bind(to);
        }

        qb.push(" ORDER BY occurred_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(purchase_from_row).collect()
    }

    /// Counts all purchases.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

pub(crate) async fn fetch_header(
    conn: &mut SqliteConnection,
    id: i64,
) -> DbResult<Option<Purchase>> {
    let sql = format!("SELECT {} FROM purchases WHERE id = ?1", PURCHASE_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    row.as_ref().map(purchase_from_row).transpose()
}

pub(crate) async fn fetch_lines(
    conn: &mut SqliteConnection,
    purchase_id: i64,
) -> DbResult<Vec<PurchaseLine>> {
    let sql = format!(
        "SELECT {} FROM purchase_lines WHERE purchase_id = ?1 ORDER BY id",
        LINE_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(purchase_id).fetch_all(&mut *conn).await?;
    rows.iter().map(line_from_row).collect()
}

/// Stock-relevant snapshot of a purchase's lines.
pub(crate) async fn line_set(conn: &mut SqliteConnection, purchase_id: i64) -> DbResult<LineSet> {
    let rows =
        sqlx::query("SELECT id, product_id, quantity FROM purchase_lines WHERE purchase_id = ?1")
            .bind(purchase_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|r| -> DbResult<(i64, LineSnapshot)> {
            Ok((
                r.try_get("id")?,
                LineSnapshot {
                    product_id: r.try_get("product_id")?,
                    quantity: r.try_get("quantity")?,
                },
            ))
        })
        .collect()
}

/// Inserts a header with zero totals and returns its id.
pub(crate) async fn insert_header(
    conn: &mut SqliteConnection,
    input: &PurchaseInput,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let zero = OrderTotals::zero();

    let result = sqlx::query(
        r#"
        INSERT INTO purchases (
            supplier_id, occurred_at, subtotal, discount_percentage,
            discount_amount, tax_amount, total, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        "#,
    )
    .bind(input.supplier_id)
    .bind(input.occurred_at)
    .bind(text(zero.subtotal))
    .bind(input.discount_percentage)
    .bind(text(zero.discount_amount))
    .bind(text(zero.tax_amount))
    .bind(text(zero.total))
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).missing_reference("Supplier", input.supplier_id))?;

    Ok(result.last_insert_rowid())
}

/// Takes the write lock for an existing purchase.
///
/// ## Errors
/// * `DbError::NotFound` - no purchase with this id
pub(crate) async fn lock_header(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let result = sqlx::query("UPDATE purchases SET id = id WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Purchase", id));
    }
    Ok(())
}

/// Writes the submitted header fields. Totals are left for `write_totals`.
pub(crate) async fn update_header(
    conn: &mut SqliteConnection,
    id: i64,
    input: &PurchaseInput,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE purchases
        SET
            supplier_id = ?2,
            occurred_at = ?3,
            discount_percentage = ?4,
            updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(input.supplier_id)
    .bind(input.occurred_at)
    .bind(input.discount_percentage)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).missing_reference("Supplier", input.supplier_id))?;

    Ok(())
}

/// Persists the submitted lines against the `before` snapshot.
///
/// ## What This Does
/// 1. Lines in `before` with no matching input id are deleted
/// 2. Inputs with an id update that line (it must be in `before`)
/// 3. Inputs without an id are inserted
///
/// Every written line gets its `line_total` recomputed.
///
/// ## Errors
/// * `CoreError::LineNotInOrder` - an input id is not a line of this purchase
/// * `CoreError::ProductNotFound` - a line names a missing product
pub(crate) async fn save_lines(
    conn: &mut SqliteConnection,
    purchase_id: i64,
    before: &LineSet,
    lines: &[PurchaseLineInput],
) -> DbResult<()> {
    if let Some(line_id) = lines
        .iter()
        .filter_map(|l| l.id)
        .find(|id| !before.contains_key(id))
    {
        return Err(CoreError::LineNotInOrder {
            line_id,
            order: "purchase",
            order_id: purchase_id,
        }
        .into());
    }

    for &line_id in before.keys() {
        if lines.iter().all(|l| l.id != Some(line_id)) {
            sqlx::query("DELETE FROM purchase_lines WHERE id = ?1")
                .bind(line_id)
                .execute(&mut *conn)
                .await?;
            debug!(purchase_id, line_id, "Purchase line removed");
        }
    }

    for line in lines {
        let line_total = compute_line_total(line.quantity, line.unit_price);

        match line.id {
            Some(line_id) => {
                sqlx::query(
                    r#"
                    UPDATE purchase_lines
                    SET product_id = ?2, quantity = ?3, unit_price = ?4, line_total = ?5
                    WHERE id = ?1
                    "#,
                )
                .bind(line_id)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(text(line.unit_price))
                .bind(text(line_total))
                .execute(&mut *conn)
                .await
                .map_err(|e| DbError::from(e).missing_product(line.product_id))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO purchase_lines
                        (purchase_id, product_id, quantity, unit_price, line_total)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .bind(purchase_id)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(text(line.unit_price))
                .bind(text(line_total))
                .execute(&mut *conn)
                .await
                .map_err(|e| DbError::from(e).missing_product(line.product_id))?;
            }
        }
    }

    Ok(())
}

/// Writes the four computed amounts and nothing else.
pub(crate) async fn write_totals(
    conn: &mut SqliteConnection,
    id: i64,
    totals: &OrderTotals,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE purchases
        SET subtotal = ?2, discount_amount = ?3, tax_amount = ?4, total = ?5
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(text(totals.subtotal))
    .bind(text(totals.discount_amount))
    .bind(text(totals.tax_amount))
    .bind(text(totals.total))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Deletes a purchase; its lines go with it through `ON DELETE CASCADE`.
pub(crate) async fn delete_header(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM purchases WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Purchase", id));
    }
    Ok(())
}
