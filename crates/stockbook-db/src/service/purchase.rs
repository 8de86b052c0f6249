//! # Purchase Service
//!
//! Purchases bring stock in. Creating one also records the paid unit
//! price as each product's reference cost and raises its minimum to 90%
//! of the new stock when that is higher.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use stockbook_core::reconcile::{plan_reconciliation, ReconciliationPlan};
use stockbook_core::totals::purchase_totals;
use stockbook_core::validation::validate_purchase_input;
use stockbook_core::{LineSet, Purchase, PurchaseInput, StockDirection, StockRule, TaxRate};
use tracing::{debug, info, instrument};

use crate::error::{DbError, DbResult};
use crate::repository::purchase as store;
use crate::stock::{apply_plan, apply_stock_delta, record_purchase_receipt};

/// Transactional purchase operations.
///
/// ## Usage
/// ```rust,ignore
/// let purchase = db.purchasing().create(&input).await?;
/// let purchase = db.purchasing().edit(purchase.id, &changed).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PurchaseService {
    pool: SqlitePool,
}

impl PurchaseService {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseService { pool }
    }

    /// Creates a purchase, receives its stock and computes its totals.
    ///
    /// ## What This Does
    /// 1. Inserts the header with zero totals
    /// 2. Inserts the lines with their line totals
    /// 3. For each line in id order: adds its quantity to stock, sets the
    ///    product's reference cost to the unit price and raises the minimum
    /// 4. Recomputes the header totals, using `tax_percentage` when it
    ///    parses as a rate (otherwise tax stays zero)
    ///
    /// ## Errors
    /// * `CoreError::InvalidLine` and friends - input rejected before any write
    /// * `DbError::NotFound` - supplier does not exist
    /// * `CoreError::ProductNotFound` - a line names a missing product
    #[instrument(
        skip(self, input),
        fields(supplier_id = input.supplier_id, lines = input.lines.len())
    )]
    pub async fn create(&self, input: &PurchaseInput) -> DbResult<Purchase> {
        validate_purchase_input(input)?;
        let tax_rate = TaxRate::parse_percentage(&input.tax_percentage);

        let mut tx = self.pool.begin().await?;

        let id = store::insert_header(&mut tx, input, Utc::now()).await?;
        store::save_lines(&mut tx, id, &LineSet::new(), &input.lines).await?;
        receive_lines(&mut tx, id).await?;
        let purchase = recompute_in(&mut tx, id, tax_rate).await?;

        tx.commit().await?;

        info!(purchase_id = id, total = %purchase.total, "Purchase created");
        Ok(purchase)
    }

    /// Replaces a purchase's header and lines and moves stock by the
    /// difference between the old and new lines.
    ///
    /// Reference costs and minimums are not revisited on edit.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such purchase
    /// * `CoreError::LineNotInOrder` - a line id from another order
    /// * `CoreError::InsufficientStock` - lowering a received quantity
    ///   below what has since been sold
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn edit(&self, id: i64, input: &PurchaseInput) -> DbResult<Purchase> {
        validate_purchase_input(input)?;
        let tax_rate = TaxRate::parse_percentage(&input.tax_percentage);

        let mut tx = self.pool.begin().await?;

        store::lock_header(&mut tx, id).await?;
        let before = store::line_set(&mut tx, id).await?;

        store::update_header(&mut tx, id, input, Utc::now()).await?;
        store::save_lines(&mut tx, id, &before, &input.lines).await?;
        let plan = Self::reconcile_stock(&mut tx, id, &before).await?;
        let purchase = recompute_in(&mut tx, id, tax_rate).await?;

        tx.commit().await?;

        info!(
            purchase_id = id,
            removed = plan.removed,
            added = plan.added,
            persisting = plan.persisting,
            total = %purchase.total,
            "Purchase edited"
        );
        Ok(purchase)
    }

    /// Deletes a purchase and its lines. Received stock stays.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        store::delete_header(&mut tx, id).await?;
        tx.commit().await?;

        info!(purchase_id = id, "Purchase deleted, stock left unchanged");
        Ok(())
    }

    /// Recomputes and stores the header totals from the current lines.
    ///
    /// ## Arguments
    /// * `tax_rate` - `Some` recomputes the tax; `None` keeps the stored tax amount
    pub async fn recompute_totals(&self, id: i64, tax_rate: Option<TaxRate>) -> DbResult<Purchase> {
        let mut tx = self.pool.begin().await?;
        store::lock_header(&mut tx, id).await?;
        let purchase = recompute_in(&mut tx, id, tax_rate).await?;
        tx.commit().await?;
        Ok(purchase)
    }

    /// Moves stock from the `before` lines to the lines now persisted for
    /// the purchase.
    ///
    /// Runs on the caller's transaction; a failure must abort it.
    pub async fn reconcile_stock(
        conn: &mut SqliteConnection,
        purchase_id: i64,
        before: &LineSet,
    ) -> DbResult<ReconciliationPlan> {
        let after = store::line_set(conn, purchase_id).await?;
        let plan = plan_reconciliation(StockDirection::Inbound, before, &after);

        if plan.is_empty() {
            debug!(purchase_id, "Edit does not move stock");
            return Ok(plan);
        }

        apply_plan(conn, &plan.deltas, StockRule::Replenish).await?;
        Ok(plan)
    }
}

/// Stock effect of a new purchase: every line, in id order.
async fn receive_lines(conn: &mut SqliteConnection, purchase_id: i64) -> DbResult<()> {
    for line in store::fetch_lines(conn, purchase_id).await? {
        let delta = StockDirection::Inbound.effect(line.quantity);
        let change = apply_stock_delta(conn, line.product_id, delta, StockRule::Replenish).await?;
        if let Some(change) = change {
            record_purchase_receipt(conn, line.product_id, line.unit_price, &change).await?;
        }
    }
    Ok(())
}

async fn recompute_in(
    conn: &mut SqliteConnection,
    id: i64,
    tax_rate: Option<TaxRate>,
) -> DbResult<Purchase> {
    let header = store::fetch_header(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase", id))?;
    let lines = store::fetch_lines(conn, id).await?;

    let totals = purchase_totals(&header, &lines, tax_rate);
    store::write_totals(conn, id, &totals).await?;

    debug!(
        purchase_id = id,
        subtotal = %totals.subtotal,
        total = %totals.total,
        "Purchase totals recomputed"
    );

    Ok(Purchase {
        subtotal: totals.subtotal,
        discount_amount: totals.discount_amount,
        tax_amount: totals.tax_amount,
        total: totals.total,
        ..header
    })
}
