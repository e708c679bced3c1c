//! # Store Traits
//!
//! The storage seam the back office is written against. Both backends in
//! this crate implement it, so the sale engine exists exactly once.
//!
//! ## Units of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  store.begin().await?            ── waits for the write gate            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────── Box<dyn StoreTx> ─────────────────┐                 │
//! │  │  reads see committed data + this unit's writes     │                 │
//! │  │  writes are invisible to every other reader        │                 │
//! │  └────────────────────────────────────────────────────┘                 │
//! │       │                         │                                       │
//! │   commit().await?         rollback().await? / drop                      │
//! │       │                         │                                       │
//! │       ▼                         ▼                                       │
//! │  all writes published     no write survives                             │
//! │  gate released            gate released                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one unit is open per store at a time, so validate → price →
//! number → commit can never interleave with another sale, cancellation or
//! adjustment. Reads through [`InventoryStore`] run concurrently and only
//! ever observe committed units.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{
    BillPage, BillQuery, BillStatus, BillSummary, Category, MovementRecord, Product,
    ProductFilter, SalesBill, SalesBillItem, SoldLine, StockMovement, User,
};

use crate::error::DbResult;

/// Optional `[from, until)` window over bill sale dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleWindow {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl SaleWindow {
    pub fn between(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        SaleWindow {
            from: Some(from),
            until: Some(until),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.until.map_or(true, |until| at < until)
    }
}

// =============================================================================
// Read Side
// =============================================================================

/// A shared inventory store: committed reads plus the entry point for
/// write units.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get_user(&self, id: &str) -> DbResult<Option<User>>;

    async fn get_category(&self, id: &str) -> DbResult<Option<Category>>;

    /// All categories, by name.
    async fn list_categories(&self) -> DbResult<Vec<Category>>;

    async fn get_product(&self, id: &str) -> DbResult<Option<Product>>;

    /// Products matching `filter`, by name.
    async fn list_products(&self, filter: &ProductFilter) -> DbResult<Vec<Product>>;

    async fn get_bill(&self, id: &str) -> DbResult<Option<SalesBill>>;

    /// Items of a bill in the order they were written.
    async fn bill_items(&self, bill_id: &str) -> DbResult<Vec<SalesBillItem>>;

    /// One page of bills, newest first, with cashier names.
    async fn list_bills(&self, query: &BillQuery) -> DbResult<BillPage>;

    /// Completed bills inside `window`, newest first.
    async fn completed_bills(&self, window: SaleWindow) -> DbResult<Vec<BillSummary>>;

    /// The `limit` most recent completed bills.
    async fn recent_completed_bills(&self, limit: u32) -> DbResult<Vec<BillSummary>>;

    /// Items of completed bills inside `window`, joined with their product,
    /// optionally restricted to one category.
    async fn sold_lines(&self, window: SaleWindow, category_id: Option<&str>) -> DbResult<Vec<SoldLine>>;

    /// Ledger history of a product, newest first.
    async fn movements(&self, product_id: &str) -> DbResult<Vec<MovementRecord>>;

    /// `Σ quantity_change` over a product's ledger.
    async fn ledger_sum(&self, product_id: &str) -> DbResult<i64>;

    /// Opens a write unit. Waits while another unit is open.
    async fn begin(&self) -> DbResult<Box<dyn StoreTx>>;
}

// =============================================================================
// Write Side
// =============================================================================

/// An isolated, serialized unit of work.
///
/// Dropping a unit without calling [`StoreTx::commit`] discards its writes.
#[async_trait]
pub trait StoreTx: Send {
    async fn get_user(&mut self, id: &str) -> DbResult<Option<User>>;

    async fn insert_user(&mut self, user: &User) -> DbResult<()>;

    async fn get_category(&mut self, id: &str) -> DbResult<Option<Category>>;

    async fn find_category_by_name(&mut self, name: &str) -> DbResult<Option<Category>>;

    async fn insert_category(&mut self, category: &Category) -> DbResult<()>;

    async fn get_product(&mut self, id: &str) -> DbResult<Option<Product>>;

    /// Exact, case-sensitive SKU lookup.
    async fn find_product_by_sku(&mut self, sku: &str) -> DbResult<Option<Product>>;

    async fn insert_product(&mut self, product: &Product) -> DbResult<()>;

    /// Writes every field of `product` except `stock_qty`.
    async fn update_product_details(&mut self, product: &Product) -> DbResult<()>;

    /// Adds `delta` to the cached on-hand quantity and returns the new value.
    ///
    /// Fails with `NotFound` for an unknown product and `CheckViolation` if
    /// the result would be negative.
    async fn adjust_stock(&mut self, product_id: &str, delta: i64, at: DateTime<Utc>) -> DbResult<i64>;

    async fn insert_movement(&mut self, movement: &StockMovement) -> DbResult<()>;

    /// Bill numbers starting with `prefix`.
    async fn bill_numbers_with_prefix(&mut self, prefix: &str) -> DbResult<Vec<String>>;

    async fn insert_bill(&mut self, bill: &SalesBill) -> DbResult<()>;

    async fn insert_bill_item(&mut self, item: &SalesBillItem) -> DbResult<()>;

    async fn get_bill(&mut self, id: &str) -> DbResult<Option<SalesBill>>;

    async fn bill_items(&mut self, bill_id: &str) -> DbResult<Vec<SalesBillItem>>;

    async fn set_bill_status(&mut self, id: &str, status: BillStatus) -> DbResult<()>;

    /// Publishes every write of this unit at once.
    async fn commit(self: Box<Self>) -> DbResult<()>;

    /// Discards every write of this unit.
    async fn rollback(self: Box<Self>) -> DbResult<()>;
}
