//! # Product Repository
//!
//! Catalog operations for products.
//!
//! ## Stock Is Not Writable Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  insert()   sets the opening stock and minimum (default: 90% floor)    │
//! │  update()   name, description, category, supplier, cost, margin       │
//! │             ── stock and stock_minimum are NOT columns it writes ──    │
//! │                                                                         │
//! │  After creation, stock only moves through crate::stock, called from    │
//! │  the purchase and sale services inside their transactions.             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use stockbook_core::stock::default_stock_minimum;
use stockbook_core::validation::{validate_new_product, validate_product_update};
use stockbook_core::{CoreError, NewProduct, Product, ProductUpdate};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::row::{decimal, text};

const PRODUCT_COLUMNS: &str = r#"
    id, name, description, category_id, supplier_id,
    reference_cost, margin_percentage, stock, stock_minimum,
    created_at, updated_at
"#;

pub(crate) fn product_from_row(row: &SqliteRow) -> DbResult<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category_id: row.try_get("category_id")?,
        supplier_id: row.try_get("supplier_id")?,
        reference_cost: decimal(row, "reference_cost")?,
        margin_percentage: decimal(row, "margin_percentage")?,
        stock: row.try_get("stock")?,
        stock_minimum: row.try_get("stock_minimum")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Describes the optional references of a product for a NotFound error.
fn references(category_id: Option<i64>, supplier_id: Option<i64>) -> String {
    let show = |id: Option<i64>| id.map_or_else(|| "none".to_string(), |id| id.to_string());
    format!("category {}, supplier {}", show(category_id), show(supplier_id))
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.insert(&new_product).await?;
/// let matches = repo.search("bolt", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product with its opening stock.
    ///
    /// A missing `stock_minimum` defaults to 90% of the opening stock,
    /// rounded down.
    ///
    /// ## Errors
    /// * `DbError::Domain(CoreError::Validation)` - bad name, amounts or stock levels
    /// * `DbError::NotFound` - category or supplier does not exist
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product).map_err(CoreError::from)?;

        let minimum = product
            .stock_minimum
            .unwrap_or_else(|| default_stock_minimum(product.stock));
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, category_id, supplier_id,
                reference_cost, margin_percentage, stock, stock_minimum,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.supplier_id)
        .bind(text(product.reference_cost))
        .bind(text(product.margin_percentage))
        .bind(product.stock)
        .bind(minimum)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from(e).missing_reference(
                "Category or supplier",
                references(product.category_id, product.supplier_id),
            )
        })?;

        let id = result.last_insert_rowid();
        info!(product_id = id, name = %product.name, stock = product.stock, "Product created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    /// Searches products by name. An empty query lists by name.
    ///
    /// ## Arguments
    /// * `query` - case-insensitive substring of the name
    /// * `limit` - maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name, id
            LIMIT ?2
            "#,
            PRODUCT_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let products = rows.iter().map(product_from_row).collect::<DbResult<Vec<_>>>()?;
        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Updates the descriptive and pricing fields of a product.
    ///
    /// Stock and minimum are untouched.
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update).map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                name = ?2,
                description = ?3,
                category_id = ?4,
                supplier_id = ?5,
                reference_cost = ?6,
                margin_percentage = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(&update.description)
        .bind(update.category_id)
        .bind(update.supplier_id)
        .bind(text(update.reference_cost))
        .bind(text(update.margin_percentage))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from(e).missing_reference(
                "Category or supplier",
                references(update.category_id, update.supplier_id),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(product_id = id, "Product updated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - an order line still references it
    /// * `DbError::NotFound` - no such product
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = id, "Product deleted");
        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
