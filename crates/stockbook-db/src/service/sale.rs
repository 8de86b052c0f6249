//! # Sale Service
//!
//! Sales take stock out. Every quantity goes through the stock primitive
//! under the configured [`MinStockPolicy`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock 10, minimum 8, sell 5                                            │
//! │                                                                         │
//! │  Soft (default)  → stock 5, minimum lowered to 5, sale saved           │
//! │  Hard            → BelowMinimumStock, nothing saved                    │
//! │                                                                         │
//! │  stock 5, sell 7 → InsufficientStock under either policy               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use stockbook_core::reconcile::{initial_effect, plan_reconciliation, ReconciliationPlan};
use stockbook_core::totals::sale_totals;
use stockbook_core::validation::validate_sale_input;
use stockbook_core::{
    LineSet, MinStockPolicy, Sale, SaleInput, StockDirection, StockRule, TaxRate,
};
use tracing::{debug, info, instrument};

use crate::error::{DbError, DbResult};
use crate::repository::sale as store;
use crate::stock::apply_plan;

/// Transactional sale operations.
///
/// ## Usage
/// ```rust,ignore
/// let sales = db.selling(MinStockPolicy::Hard);
/// let sale = sales.create(&input).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleService {
    pool: SqlitePool,
    policy: MinStockPolicy,
}

impl SaleService {
    pub fn new(pool: SqlitePool, policy: MinStockPolicy) -> Self {
        SaleService { pool, policy }
    }

    /// The minimum-stock policy this service applies.
    pub fn policy(&self) -> MinStockPolicy {
        self.policy
    }

    fn rule(&self) -> StockRule {
        StockRule::Consume(self.policy)
    }

    /// Creates a sale, takes its stock and computes its totals.
    ///
    /// The header stores `tax_percentage` as entered when it parses as a
    /// rate in 0..=100, and zero otherwise (tax then stays zero).
    ///
    /// ## Errors
    /// * `DbError::NotFound` - customer does not exist
    /// * `CoreError::ProductNotFound` - a line names a missing product
    /// * `CoreError::InsufficientStock` - a line asks for more than is held
    /// * `CoreError::BelowMinimumStock` - hard policy only
    #[instrument(
        skip(self, input),
        fields(customer_id = input.customer_id, lines = input.lines.len())
    )]
    pub async fn create(&self, input: &SaleInput) -> DbResult<Sale> {
        validate_sale_input(input)?;
        let entered = TaxRate::parse_entered(&input.tax_percentage);
        let tax_rate = entered.map(|(rate, _)| rate);
        let tax_percentage = entered.map_or(Decimal::ZERO, |(_, percentage)| percentage);

        let mut tx = self.pool.begin().await?;

        let id = store::insert_header(&mut tx, input, tax_percentage, Utc::now()).await?;
        store::save_lines(&mut tx, id, &LineSet::new(), &input.lines).await?;

        let lines = store::line_set(&mut tx, id).await?;
        apply_plan(&mut tx, &initial_effect(StockDirection::Outbound, &lines), self.rule()).await?;

        let sale = recompute_in(&mut tx, id, tax_rate).await?;

        tx.commit().await?;

        info!(sale_id = id, total = %sale.total, policy = %self.policy, "Sale created");
        Ok(sale)
    }

    /// Replaces a sale's header and lines and moves stock by the
    /// difference between the old and new lines.
    ///
    /// An unparseable `tax_percentage` keeps the stored percentage and the
    /// stored tax amount.
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn edit(&self, id: i64, input: &SaleInput) -> DbResult<Sale> {
        validate_sale_input(input)?;
        let entered = TaxRate::parse_entered(&input.tax_percentage);
        let tax_rate = entered.map(|(rate, _)| rate);

        let mut tx = self.pool.begin().await?;

        store::lock_header(&mut tx, id).await?;
        let before = store::line_set(&mut tx, id).await?;

        store::update_header(
            &mut tx,
            id,
            input,
            entered.map(|(_, percentage)| percentage),
            Utc::now(),
        )
        .await?;
        store::save_lines(&mut tx, id, &before, &input.lines).await?;
        let plan = Self::reconcile_stock(&mut tx, id, &before, self.policy).await?;
        let sale = recompute_in(&mut tx, id, tax_rate).await?;

        tx.commit().await?;

        info!(
            sale_id = id,
            removed = plan.removed,
            added = plan.added,
            persisting = plan.persisting,
            total = %sale.total,
            "Sale edited"
        );
        Ok(sale)
    }

    /// Deletes a sale and its lines. Sold stock is not returned.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        store::delete_header(&mut tx, id).await?;
        tx.commit().await?;

        info!(sale_id = id, "Sale deleted, stock left unchanged");
        Ok(())
    }

    /// Recomputes and stores the header totals from the current lines.
    pub async fn recompute_totals(&self, id: i64, tax_rate: Option<TaxRate>) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;
        store::lock_header(&mut tx, id).await?;
        let sale = recompute_in(&mut tx, id, tax_rate).await?;
        tx.commit().await?;
        Ok(sale)
    }

    /// Moves stock from the `before` lines to the lines now persisted for
    /// the sale, on the caller's transaction.
    pub async fn reconcile_stock(
        conn: &mut SqliteConnection,
        sale_id: i64,
        before: &LineSet,
        policy: MinStockPolicy,
    ) -> DbResult<ReconciliationPlan> {
        let after = store::line_set(conn, sale_id).await?;
        let plan = plan_reconciliation(StockDirection::Outbound, before, &after);

        if plan.is_empty() {
            debug!(sale_id, "Edit does not move stock");
            return Ok(plan);
        }

        apply_plan(conn, &plan.deltas, StockRule::Consume(policy)).await?;
        Ok(plan)
    }
}

async fn recompute_in(
    conn: &mut SqliteConnection,
    id: i64,
    tax_rate: Option<TaxRate>,
) -> DbResult<Sale> {
    let header = store::fetch_header(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;
    let lines = store::fetch_lines(conn, id).await?;

    let totals = sale_totals(&header, &lines, tax_rate);
    store::write_totals(conn, id, &totals).await?;

    debug!(
        sale_id = id,
        subtotal = %totals.subtotal,
        total = %totals.total,
        "Sale totals recomputed"
    );

    Ok(Sale {
        subtotal: totals.subtotal,
        discount_amount: totals.discount_amount,
        tax_amount: totals.tax_amount,
        total: totals.total,
        ..header
    })
}
