//! Customer repository. Customers are the counterparty of sales.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use stockbook_core::validation::{validate_email, validate_name};
use stockbook_core::{CoreError, Customer};
use tracing::info;

use crate::error::{DbError, DbResult};

fn customer_from_row(row: &SqliteRow) -> DbResult<Customer> {
    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn insert(&self, name: &str, email: Option<&str>) -> DbResult<Customer> {
        validate_name("name", name).map_err(CoreError::from)?;
        validate_email(email).map_err(CoreError::from)?;

        let result =
            sqlx::query("INSERT INTO customers (name, email, created_at) VALUES (?1, ?2, ?3)")
                .bind(name.trim())
                .bind(email)
                .bind(Utc::now())
                .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!(customer_id = id, "Customer created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(customer_from_row).transpose()
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows =
            sqlx::query("SELECT id, name, email, created_at FROM customers ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(customer_from_row).collect()
    }

    /// Deletes a customer; refused with `ForeignKeyViolation` while sales
    /// reference it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(customer_id = id, "Customer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_customer_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let c = repo.insert("Walk-in", None).await.unwrap();
        assert_eq!(c.name, "Walk-in");
        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.delete(c.id).await.unwrap();
        assert!(repo.get_by_id(c.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(c.id).await, Err(DbError::NotFound { .. })));
    }
}
