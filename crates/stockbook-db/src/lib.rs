//! # stockbook-db: Storage and Order Services for Stockbook
//!
//! SQLite storage for the catalog and orders, plus the transactional
//! services that keep product stock and order totals consistent with
//! order lines.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  Caller (order form, import job, seed binary)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │   Database   │  │   │
//! │  │   │ (service/*)   │    │ (repository/*)│    │  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ create/edit   │───►│ header/lines  │───►│ SqlitePool   │  │   │
//! │  │   │ delete/totals │    │ catalog CRUD  │    │ migrations   │  │   │
//! │  │   │      │        │    │ dashboard     │    │              │  │   │
//! │  │   │      ▼        │    └───────────────┘    └──────────────┘  │   │
//! │  │   │  stock.rs (lock → check → update)                        │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stockbook-core (totals, reconciliation, stock rules)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Application configuration (TOML + environment)
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, order and dashboard queries
//! - [`service`] - Transactional order operations
//! - [`stock`] - The stock adjustment primitive
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_db::{AppConfig, Database};
//!
//! let config = AppConfig::load_or_default(None);
//! let db = Database::new(config.to_db_config()).await?;
//!
//! let sale = db.selling(config.inventory.min_stock_policy).create(&input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod stock;

mod row;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::dashboard::{DashboardRepository, DashboardSummary, LowStockItem, TopProduct};
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
pub use repository::supplier::SupplierRepository;

pub use service::purchase::PurchaseService;
pub use service::sale::SaleService;
