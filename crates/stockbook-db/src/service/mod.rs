//! # Order Services
//!
//! Create, edit, delete and recompute for purchases and sales. Each call
//! is one database transaction.
//!
//! ## Create / Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  validate input (no transaction yet)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────────┐  │
//! │  │ create: insert header           edit: lock header, snapshot lines │  │
//! │  │ save lines                                                        │  │
//! │  │ stock:  create → every line     edit → plan_reconciliation()      │  │
//! │  │         apply_stock_delta() per delta (row lock, check, update)   │  │
//! │  │ recompute totals from the persisted lines                         │  │
//! │  COMMIT ◄───────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Any error on the way drops the transaction: header, lines, stock     │
//! │  and totals all stay as they were.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting an order removes its lines but does not move stock back.

pub mod purchase;
pub mod sale;
