//! # SQLite Store
//!
//! [`InventoryStore`] over the sqlx pool.
//!
//! ## Write Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  begin()                                                                │
//! │    1. write_gate.lock_owned()     ── one unit per store, in-process    │
//! │    2. pool.begin()                ── BEGIN on a dedicated connection   │
//! │                                                                         │
//! │  SqliteTx { tx, _gate }                                                 │
//! │    every read and write runs on `tx`                                    │
//! │                                                                         │
//! │  commit()   → COMMIT, then the gate is released                         │
//! │  rollback() → ROLLBACK, then the gate is released                       │
//! │  drop       → sqlx rolls back, the gate is released                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers use other pool connections and, under WAL, only ever see
//! committed transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{bill, directory, ledger, product};
use crate::store::{InventoryStore, SaleWindow, StoreTx};
use stockroom_core::{
    BillPage, BillQuery, BillStatus, BillSummary, Category, MovementRecord, Product,
    ProductFilter, SalesBill, SalesBillItem, SoldLine, StockMovement, User,
};

// =============================================================================
// Reads
// =============================================================================

#[async_trait]
impl InventoryStore for Database {
    async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool().acquire().await?;
        directory::get_user(&mut conn, id).await
    }

    async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        let mut conn = self.pool().acquire().await?;
        directory::get_category(&mut conn, id).await
    }

    async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let mut conn = self.pool().acquire().await?;
        directory::list_categories(&mut conn).await
    }

    async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool().acquire().await?;
        product::get(&mut conn, id).await
    }

    async fn list_products(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let mut conn = self.pool().acquire().await?;
        product::list(&mut conn, filter).await
    }

    async fn get_bill(&self, id: &str) -> DbResult<Option<SalesBill>> {
        let mut conn = self.pool().acquire().await?;
        bill::get(&mut conn, id).await
    }

    async fn bill_items(&self, bill_id: &str) -> DbResult<Vec<SalesBillItem>> {
        let mut conn = self.pool().acquire().await?;
        bill::items(&mut conn, bill_id).await
    }

    async fn list_bills(&self, query: &BillQuery) -> DbResult<BillPage> {
        let mut conn = self.pool().acquire().await?;
        bill::list(&mut conn, query).await
    }

    async fn completed_bills(&self, window: SaleWindow) -> DbResult<Vec<BillSummary>> {
        let mut conn = self.pool().acquire().await?;
        bill::completed(&mut conn, window, None).await
    }

    async fn recent_completed_bills(&self, limit: u32) -> DbResult<Vec<BillSummary>> {
        let mut conn = self.pool().acquire().await?;
        bill::completed(&mut conn, SaleWindow::default(), Some(limit)).await
    }

    async fn sold_lines(&self, window: SaleWindow, category_id: Option<&str>) -> DbResult<Vec<SoldLine>> {
        let mut conn = self.pool().acquire().await?;
        bill::sold_lines(&mut conn, window, category_id).await
    }

    async fn movements(&self, product_id: &str) -> DbResult<Vec<MovementRecord>> {
        let mut conn = self.pool().acquire().await?;
        ledger::history(&mut conn, product_id).await
    }

    async fn ledger_sum(&self, product_id: &str) -> DbResult<i64> {
        let mut conn = self.pool().acquire().await?;
        ledger::sum(&mut conn, product_id).await
    }

    async fn begin(&self) -> DbResult<Box<dyn StoreTx>> {
        let gate = self.write_gate().lock_owned().await;
        let tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Write unit opened");
        Ok(Box::new(SqliteTx { tx, _gate: gate }))
    }
}

// =============================================================================
// Write Unit
// =============================================================================

/// An open SQLite transaction holding the store's write gate.
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn get_user(&mut self, id: &str) -> DbResult<Option<User>> {
        directory::get_user(&mut self.tx, id).await
    }

    async fn insert_user(&mut self, user: &User) -> DbResult<()> {
        directory::insert_user(&mut self.tx, user).await
    }

    async fn get_category(&mut self, id: &str) -> DbResult<Option<Category>> {
        directory::get_category(&mut self.tx, id).await
    }

    async fn find_category_by_name(&mut self, name: &str) -> DbResult<Option<Category>> {
        directory::find_category_by_name(&mut self.tx, name).await
    }

    async fn insert_category(&mut self, category: &Category) -> DbResult<()> {
        directory::insert_category(&mut self.tx, category).await
    }

    async fn get_product(&mut self, id: &str) -> DbResult<Option<Product>> {
        product::get(&mut self.tx, id).await
    }

    async fn find_product_by_sku(&mut self, sku: &str) -> DbResult<Option<Product>> {
        product::find_by_sku(&mut self.tx, sku).await
    }

    async fn insert_product(&mut self, new: &Product) -> DbResult<()> {
        product::insert(&mut self.tx, new).await
    }

    async fn update_product_details(&mut self, changed: &Product) -> DbResult<()> {
        product::update_details(&mut self.tx, changed).await
    }

    async fn adjust_stock(&mut self, product_id: &str, delta: i64, at: DateTime<Utc>) -> DbResult<i64> {
        product::adjust_stock(&mut self.tx, product_id, delta, at).await
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> DbResult<()> {
        ledger::insert(&mut self.tx, movement).await
    }

    async fn bill_numbers_with_prefix(&mut self, prefix: &str) -> DbResult<Vec<String>> {
        bill::numbers_with_prefix(&mut self.tx, prefix).await
    }

    async fn insert_bill(&mut self, new: &SalesBill) -> DbResult<()> {
        bill::insert(&mut self.tx, new).await
    }

    async fn insert_bill_item(&mut self, item: &SalesBillItem) -> DbResult<()> {
        bill::insert_item(&mut self.tx, item).await
    }

    async fn get_bill(&mut self, id: &str) -> DbResult<Option<SalesBill>> {
        bill::get(&mut self.tx, id).await
    }

    async fn bill_items(&mut self, bill_id: &str) -> DbResult<Vec<SalesBillItem>> {
        bill::items(&mut self.tx, bill_id).await
    }

    async fn set_bill_status(&mut self, id: &str, status: BillStatus) -> DbResult<()> {
        bill::set_status(&mut self.tx, id, status).await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let SqliteTx { tx, _gate } = *self;
        tx.commit().await.map_err(|e| {
            error!(error = %e, "Commit failed");
            DbError::TransactionFailed(e.to_string())
        })?;
        debug!("Write unit committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        let SqliteTx { tx, _gate } = *self;
        tx.rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Write unit rolled back");
        Ok(())
    }
}
