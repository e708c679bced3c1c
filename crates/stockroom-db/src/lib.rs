//! # stockroom-db: Storage Layer for Stockroom
//!
//! This crate provides storage for the Stockroom back office: the
//! [`InventoryStore`] / [`StoreTx`] traits and two backends implementing them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Backoffice service (create_sale, daily_sales, ...)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐                                            │   │
//! │  │   │  store.rs     │  InventoryStore (reads, begin)             │   │
//! │  │   │               │  StoreTx        (one write unit)           │   │
//! │  │   └───────┬───────┘                                            │   │
//! │  │           │                                                    │   │
//! │  │     ┌─────┴──────────────┐                                     │   │
//! │  │     ▼                    ▼                                     │   │
//! │  │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐       │   │
//! │  │  │  Database    │   │ MemoryStore  │   │  Migrations  │       │   │
//! │  │  │ (sqlite.rs)  │   │ (memory.rs)  │   │  (embedded)  │       │   │
//! │  │  │ SqlitePool + │   │ collections  │   │ 001_init.sql │       │   │
//! │  │  │ repository/  │   │ + RwLock     │   │ 002_idx.sql  │       │   │
//! │  │  └──────────────┘   └──────────────┘   └──────────────┘       │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The storage traits
//! - [`pool`] - Connection pool creation and configuration
//! - [`sqlite`] - SQLite implementation of the traits
//! - [`memory`] - In-memory implementation of the traits
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//! - [`repository`] - SQL grouped by table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig, InventoryStore};
//!
//! let db = Database::new(DbConfig::new("path/to/stockroom.db")).await?;
//!
//! let mut unit = db.begin().await?;
//! let qty = unit.adjust_stock(&product_id, -2, Utc::now()).await?;
//! unit.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sqlite;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};
pub use sqlite::SqliteTx;
pub use store::{InventoryStore, SaleWindow, StoreTx};

// =============================================================================
// Store Tests (both backends)
// =============================================================================
