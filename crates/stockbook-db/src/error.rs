//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        CoreError (stock / validation)      │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError (this module) ◄─────────────────┘                              │
//! │       │                                                                 │
//! │       │  returned by a service → transaction dropped → ROLLBACK        │
//! │       ▼                                                                 │
//! │  user_message() shown by the caller                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockbook_core::CoreError;
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and domain errors raised inside a
/// transaction, and provide context for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - Editing or deleting an order id that doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a category name that already exists
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a product, supplier, customer or category that orders
    ///   or products still reference
    /// - Inserting a line for a non-existent product
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. `stock_minimum_within_stock`).
    #[error("Check constraint failed: {constraint}")]
    CheckViolation { constraint: String },

    /// The database stayed locked by another writer for longer than the
    /// configured busy timeout.
    #[error("Timed out waiting for a database lock")]
    LockTimeout,

    /// A stored value could not be decoded (e.g. malformed decimal text).
    #[error("Invalid data in {column}: '{value}'")]
    InvalidData { column: String, value: String },

    /// A stock or order rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an InvalidData error for a column holding `value`.
    pub fn invalid_data(column: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::InvalidData {
            column: column.into(),
            value: value.into(),
        }
    }

    /// On insert, a foreign key failure means the referenced record is
    /// missing. Turns it into `NotFound`; other errors pass through.
    pub fn missing_reference(self, entity: &str, id: impl ToString) -> Self {
        match self {
            DbError::ForeignKeyViolation { .. } => DbError::not_found(entity, id),
            other => other,
        }
    }

    /// Same as [`missing_reference`](Self::missing_reference) for an order
    /// line, where the only foreign key that can fail is the product.
    pub fn missing_product(self, product_id: i64) -> Self {
        match self {
            DbError::ForeignKeyViolation { .. } => CoreError::ProductNotFound(product_id).into(),
            other => other,
        }
    }

    /// Message suitable for showing to the person who submitted the
    /// operation. Stock errors keep the product name and id; referential
    /// errors on delete become "cannot delete, still referenced".
    pub fn user_message(&self) -> String {
        match self {
            DbError::Domain(err) => err.to_string(),
            DbError::ForeignKeyViolation { .. } => {
                "Cannot delete, still referenced by other records".to_string()
            }
            DbError::NotFound { entity, id } => format!("{} {} does not exist", entity, id),
            DbError::UniqueViolation { field, .. } => format!("{} is already in use", field),
            DbError::CheckViolation { constraint } => {
                format!("Rejected by data rule '{}'", constraint)
            }
            DbError::LockTimeout => {
                "The records are busy with another operation, please retry".to_string()
            }
            _ => "The operation could not be completed".to_string(),
        }
    }

    /// True for errors worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::LockTimeout | DbError::PoolExhausted)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type / lock
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::ColumnDecode   → DbError::InvalidData
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <name>"
                //   "database is locked" (SQLITE_BUSY after busy_timeout)
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if let Some(constraint) = msg.strip_prefix("CHECK constraint failed: ") {
                    DbError::CheckViolation {
                        constraint: constraint.to_string(),
                    }
                } else if msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::LockTimeout
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { index, source } => DbError::InvalidData {
                column: index,
                value: source.to_string(),
            },

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_product() {
        let err = DbError::from(CoreError::InsufficientStock {
            product_id: 4,
            product: "Bolt M6".to_string(),
            available: 5,
            requested: 7,
        });
        let msg = err.user_message();
        assert!(msg.contains("Bolt M6"));
        assert!(msg.contains("#4"));
    }

    #[test]
    fn test_user_message_for_blocked_delete() {
        let err = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".to_string(),
        };
        assert!(err.user_message().starts_with("Cannot delete, still referenced"));
    }

    #[test]
    fn test_retryable() {
        assert!(DbError::LockTimeout.is_retryable());
        assert!(!DbError::not_found("Sale", 1).is_retryable());
    }
}
