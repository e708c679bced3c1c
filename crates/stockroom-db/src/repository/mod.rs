//! # Repository Module
//!
//! SQL for the SQLite backend, grouped by table.
//!
//! ## Connections, Not Pools
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Every function takes `&mut SqliteConnection`, so the same SQL serves  │
//! │  both sides of the store:                                               │
//! │                                                                         │
//! │  Database (reads)         pool.acquire() ──► &mut *conn                 │
//! │  SqliteTx (write unit)    pool.begin()   ──► &mut *tx                   │
//! │                                                                         │
//! │  directory ── users, categories                                         │
//! │  product   ── products, cached stock                                    │
//! │  ledger    ── stock_movements (append-only)                             │
//! │  bill      ── sales_bills, sales_bill_items, report queries             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bill;
pub mod directory;
pub mod ledger;
pub mod product;
