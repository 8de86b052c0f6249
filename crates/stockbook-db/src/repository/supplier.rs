//! # Supplier Repository
//!
//! Suppliers are the counterparty of purchases. Delete is refused while a
//! purchase or a product still references the supplier.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use stockbook_core::validation::validate_new_supplier;
use stockbook_core::{CoreError, NewSupplier, Supplier};
use tracing::info;

use crate::error::{DbError, DbResult};

const SUPPLIER_COLUMNS: &str = "id, name, address, phone, email, kind, created_at";

fn supplier_from_row(row: &SqliteRow) -> DbResult<Supplier> {
    Ok(Supplier {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        kind: row.try_get("kind")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Creates a supplier.
    pub async fn insert(&self, supplier: &NewSupplier) -> DbResult<Supplier> {
        validate_new_supplier(supplier).map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (name, address, phone, email, kind, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(supplier.name.trim())
        .bind(&supplier.address)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(supplier.kind)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(supplier_id = id, name = %supplier.name, "Supplier created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {} FROM suppliers WHERE id = ?1", SUPPLIER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(supplier_from_row).transpose()
    }

    /// All suppliers by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {} FROM suppliers ORDER BY name, id", SUPPLIER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(supplier_from_row).collect()
    }

    /// Deletes a supplier.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - purchases or products still reference it
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        info!(supplier_id = id, "Supplier deleted");
        Ok(())
    }
}
