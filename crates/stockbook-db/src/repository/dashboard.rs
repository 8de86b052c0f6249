//! # Dashboard Repository
//!
//! Read-only figures for the overview screen.
//!
//! Amounts are stored as decimal TEXT, so sums are done here in Rust over
//! exact decimals rather than with SQL `SUM()`, which would go through
//! floating point.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use stockbook_core::money::sum;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::row::decimal;

/// Headline numbers for one day and its month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub sales_today: Decimal,
    pub sales_this_month: Decimal,
    pub purchases_today: Decimal,
    pub purchases_this_month: Decimal,
    pub sale_count_today: usize,
    pub product_count: i64,
    pub low_stock_count: i64,
}

/// A product at or below its minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockItem {
    pub product_id: i64,
    pub name: String,
    pub stock: i64,
    pub stock_minimum: i64,
}

/// A product ranked by quantity sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub quantity_sold: i64,
}

fn start_of(date: NaiveDate) -> DbResult<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| DbError::Internal(format!("no midnight for {}", date)))
}

fn month_bounds(date: NaiveDate) -> DbResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1);
    let next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };

    first
        .zip(next)
        .ok_or_else(|| DbError::Internal(format!("no month bounds for {}", date)))
}

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// `(occurred_at, total)` of every order in `table` within `[from, to)`.
    async fn order_totals(
        &self,
        table: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<(DateTime<Utc>, Decimal)>> {
        let sql = format!(
            "SELECT occurred_at, total FROM {} WHERE occurred_at >= ?1 AND occurred_at < ?2",
            table
        );

        let rows = sqlx::query(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| -> DbResult<(DateTime<Utc>, Decimal)> {
                Ok((r.try_get("occurred_at")?, decimal(r, "total")?))
            })
            .collect()
    }

    /// Sales and purchase totals for `today` and its month, plus catalog counts.
    pub async fn summary(&self, today: NaiveDate) -> DbResult<DashboardSummary> {
        let (month_start, next_month) = month_bounds(today)?;
        let (from, to) = (start_of(month_start)?, start_of(next_month)?);
        let day_start = start_of(today)?;
        let day_end = start_of(today.succ_opt().unwrap_or(next_month))?;

        let sales = self.order_totals("sales", from, to).await?;
        let purchases = self.order_totals("purchases", from, to).await?;

        let is_today = |at: &DateTime<Utc>| *at >= day_start && *at < day_end;

        let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        let low_stock_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE stock_minimum IS NOT NULL AND stock <= stock_minimum
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let summary = DashboardSummary {
            date: today,
            sales_today: sum(sales.iter().filter(|(at, _)| is_today(at)).map(|(_, t)| *t)),
            sales_this_month: sum(sales.iter().map(|(_, t)| *t)),
            purchases_today: sum(purchases.iter().filter(|(at, _)| is_today(at)).map(|(_, t)| *t)),
            purchases_this_month: sum(purchases.iter().map(|(_, t)| *t)),
            sale_count_today: sales.iter().filter(|(at, _)| is_today(at)).count(),
            product_count,
            low_stock_count,
        };

        debug!(?summary, "Dashboard summary computed");
        Ok(summary)
    }

    /// Sales total per day for the `days` days ending on `today`,
    /// oldest first. Days without sales are zero.
    pub async fn daily_sales(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> DbResult<Vec<(NaiveDate, Decimal)>> {
        let first_day = today - chrono::Duration::days(i64::from(days.saturating_sub(1)));
        let until = start_of(today + chrono::Duration::days(1))?;
        let sales = self.order_totals("sales", start_of(first_day)?, until).await?;

        let mut by_day: BTreeMap<NaiveDate, Decimal> = first_day
            .iter_days()
            .take(days as usize)
            .map(|day| (day, Decimal::ZERO))
            .collect();

        for (at, total) in sales {
            if let Some(bucket) = by_day.get_mut(&at.date_naive()) {
                *bucket += total;
            }
        }

        Ok(by_day.into_iter().collect())
    }

    /// Products at or below their minimum, lowest stock first.
    pub async fn low_stock(&self, limit: u32) -> DbResult<Vec<LowStockItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, stock, stock_minimum
            FROM products
            WHERE stock_minimum IS NOT NULL AND stock <= stock_minimum
            ORDER BY stock ASC, name ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> DbResult<LowStockItem> {
                Ok(LowStockItem {
                    product_id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    stock: r.try_get("stock")?,
                    stock_minimum: r.try_get("stock_minimum")?,
                })
            })
            .collect()
    }

    /// Best-selling products by quantity across all sales.
    pub async fn top_selling(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, SUM(l.quantity) AS quantity_sold
            FROM sale_lines l
            INNER JOIN products p ON p.id = l.product_id
            GROUP BY p.id, p.name
            ORDER BY quantity_sold DESC, p.name ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> DbResult<TopProduct> {
                Ok(TopProduct {
                    product_id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    quantity_sold: r.try_get("quantity_sold")?,
                })
            })
            .collect()
    }
}
