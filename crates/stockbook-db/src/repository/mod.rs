//! # Repository Module
//!
//! Database repository implementations for Stockbook.
//!
//! ## Two Kinds of Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-level (methods on XxxRepository, hold &SqlitePool)               │
//! │  ├── catalog CRUD: products, categories, suppliers, customers         │
//! │  ├── order reads: get_by_id, lines, list                               │
//! │  └── dashboard aggregates                                              │
//! │                                                                         │
//! │  Connection-level (free fns in purchase.rs / sale.rs)                  │
//! │  ├── take &mut SqliteConnection inside a service transaction           │
//! │  ├── insert/lock/update/delete header, save lines, write totals        │
//! │  └── never touch the pool (an in-memory DB has one connection)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and search
//! - [`CategoryRepository`](category::CategoryRepository) - Categories
//! - [`SupplierRepository`](supplier::SupplierRepository) - Suppliers
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchase reads
//! - [`SaleRepository`](sale::SaleRepository) - Sale reads
//! - [`DashboardRepository`](dashboard::DashboardRepository) - Summary figures

pub mod category;
pub mod customer;
pub mod dashboard;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod supplier;
