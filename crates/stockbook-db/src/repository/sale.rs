//! # Sale Repository
//!
//! Sale headers and lines. Same shape as the purchase repository; the
//! differences are in the header:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  column              purchase                 sale                      │
//! │  ──────────────────  ───────────────────────  ──────────────────────── │
//! │  discount_amount     derived from percentage  entered, taken as given   │
//! │  tax_percentage      (not stored)             stored as entered         │
//! │  line discount       (none)                   per-line percentage       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use stockbook_core::totals::compute_sale_line_total;
use stockbook_core::{
    CoreError, LineSet, LineSnapshot, OrderFilter, OrderTotals, Sale, SaleInput, SaleLine,
    SaleLineInput,
};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::row::{decimal, text};

const SALE_COLUMNS: &str = r#"
    id, customer_id, occurred_at, subtotal, discount_percentage, discount_amount,
    tax_percentage, tax_amount, total, created_at, updated_at
"#;

const LINE_COLUMNS: &str =
    "id, sale_id, product_id, quantity, unit_price, discount_percentage, line_total";

fn sale_from_row(row: &SqliteRow) -> DbResult<Sale> {
    Ok(Sale {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        occurred_at: row.try_get("occurred_at")?,
        subtotal: decimal(row, "subtotal")?,
        discount_percentage: row.try_get("discount_percentage")?,
        discount_amount: decimal(row, "discount_amount")?,
        tax_percentage: decimal(row, "tax_percentage")?,
        tax_amount: decimal(row, "tax_amount")?,
        total: decimal(row, "total")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn line_from_row(row: &SqliteRow) -> DbResult<SaleLine> {
    Ok(SaleLine {
        id: row.try_get("id")?,
        sale_id: row.try_get("sale_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        unit_price: decimal(row, "unit_price")?,
        discount_percentage: decimal(row, "discount_percentage")?,
        line_total: decimal(row, "line_total")?,
    })
}

// =============================================================================
// Read Views
// =============================================================================

/// Read access to sales. Writes go through `SaleService`.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_header(&mut conn, id).await
    }

    /// Lines of a sale in id order.
    pub async fn lines(&self, sale_id: i64) -> DbResult<Vec<SaleLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lines(&mut conn, sale_id).await
    }

    /// Sales matching `filter`, newest first. `from` inclusive, `to` exclusive.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Sale>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(SALE_COLUMNS);
        qb.push(" FROM sales WHERE 1 = 1");

        if let Some(customer_id) = filter.counterparty_id {
            qb.push(" AND customer_id = ").push_bind(customer_id);
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
        rows.iter().map(sale_from_row).collect()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

pub(crate) async fn fetch_header(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    row.as_ref().map(sale_from_row).transpose()
}

pub(crate) async fn fetch_lines(
    conn: &mut SqliteConnection,
    sale_id: i64,
) -> DbResult<Vec<SaleLine>> {
    let sql = format!("SELECT {} FROM sale_lines WHERE sale_id = ?1 ORDER BY id", LINE_COLUMNS);
    let rows = sqlx::query(&sql).bind(sale_id).fetch_all(&mut *conn).await?;
    rows.iter().map(line_from_row).collect()
}

pub(crate) async fn line_set(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<LineSet> {
    let rows = sqlx::query("SELECT id, product_id, quantity FROM sale_lines WHERE sale_id = ?1")
        .bind(sale_id)
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
///
/// `tax_percentage` is the percentage as entered, or zero when the
/// submitted text was not a valid rate.
pub(crate) async fn insert_header(
    conn: &mut SqliteConnection,
    input: &SaleInput,
    tax_percentage: Decimal,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let zero = OrderTotals::zero();

    let result = sqlx::query(
        r#"
        INSERT INTO sales (
            customer_id, occurred_at, subtotal, discount_percentage, discount_amount,
            tax_percentage, tax_amount, total, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
    )
    .bind(input.customer_id)
    .bind(input.occurred_at)
    .bind(text(zero.subtotal))
    .bind(input.discount_percentage)
    .bind(text(input.discount_amount))
    .bind(text(tax_percentage))
    .bind(text(zero.tax_amount))
    .bind(text(zero.total))
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).missing_reference("Customer", input.customer_id))?;

    Ok(result.last_insert_rowid())
}

/// Takes the write lock for an existing sale.
pub(crate) async fn lock_header(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let result = sqlx::query("UPDATE sales SET id = id WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", id));
    }
    Ok(())
}

/// Writes the submitted header fields.
///
/// A `None` tax percentage keeps the stored one.
pub(crate) async fn update_header(
    conn: &mut SqliteConnection,
    id: i64,
    input: &SaleInput,
    tax_percentage: Option<Decimal>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE sales
        SET
            customer_id = ?2,
            occurred_at = ?3,
            discount_percentage = ?4,
            discount_amount = ?5,
            tax_percentage = COALESCE(?6, tax_percentage),
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(input.customer_id)
    .bind(input.occurred_at)
    .bind(input.discount_percentage)
    .bind(text(input.discount_amount))
    .bind(tax_percentage.map(text))
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).missing_reference("Customer", input.customer_id))?;

    Ok(())
}

/// Persists the submitted lines against the `before` snapshot: delete
/// missing, update by id, insert new. Line totals are recomputed.
pub(crate) async fn save_lines(
    conn: &mut SqliteConnection,
    sale_id: i64,
    before: &LineSet,
    lines: &[SaleLineInput],
) -> DbResult<()> {
    if let Some(line_id) = lines
        .iter()
        .filter_map(|l| l.id)
        .find(|id| !before.contains_key(id))
    {
        return Err(CoreError::LineNotInOrder {
            line_id,
            order: "sale",
            order_id: sale_id,
        }
        .into());
    }

    for &line_id in before.keys() {
        if lines.iter().all(|l| l.id != Some(line_id)) {
            sqlx::query("DELETE FROM sale_lines WHERE id = ?1")
                .bind(line_id)
                .execute(&mut *conn)
                .await?;
            debug!(sale_id, line_id, "Sale line removed");
        }
    }

    for line in lines {
        let line_total =
            compute_sale_line_total(line.quantity, line.unit_price, line.discount_percentage);

        let query = match line.id {
            Some(line_id) => sqlx::query(
                r#"
                UPDATE sale_lines
                SET product_id = ?2, quantity = ?3, unit_price = ?4,
                    discount_percentage = ?5, line_total = ?6
                WHERE id = ?1
                "#,
            )
            .bind(line_id),
            None => sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, product_id, quantity, unit_price, discount_percentage, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(sale_id),
        };

        query
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(text(line.unit_price))
            .bind(text(line.discount_percentage))
            .bind(text(line_total))
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::from(e).missing_product(line.product_id))?;
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
        UPDATE sales
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

/// Deletes a sale and, through the cascade, its lines.
pub(crate) async fn delete_header(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", id));
    }
    Ok(())
}
