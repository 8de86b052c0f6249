//! Category repository. Names are unique; a category in use by any
//! product cannot be deleted.

use sqlx::{Row, SqlitePool};
use stockbook_core::validation::validate_name;
use stockbook_core::{Category, CoreError};
use tracing::info;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the name is taken
    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        validate_name("name", name).map_err(CoreError::from)?;
        let name = name.trim();

        let result = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, name),
                other => other,
            })?;

        let id = result.last_insert_rowid();
        info!(category_id = id, name = %name, "Category created");

        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> DbResult<Category> {
            Ok(Category {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
            })
        })
        .transpose()
    }

    /// All categories by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| -> DbResult<Category> {
                Ok(Category {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                })
            })
            .collect()
    }

    /// Deletes a category.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - products still use it
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(category_id = id, "Category deleted");
        Ok(())
    }
}
