//! # In-Memory Store
//!
//! [`InventoryStore`] over plain collections, for tests and demos.
//!
//! ## Isolation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  MemoryStore                                                            │
//! │  ├── state:      Arc<RwLock<MemoryState>>   committed data              │
//! │  └── write_gate: Arc<Mutex<()>>             one unit at a time          │
//! │                                                                         │
//! │  begin()   gate.lock_owned() → clone committed state into `working`     │
//! │  unit ops  read and write `working` only                                │
//! │  commit()  swap `working` into `state` under a short write lock         │
//! │  drop      `working` is discarded                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same constraints as the SQLite schema are enforced here (unique SKU,
//! email, category name and bill number; known product and user on every
//! movement; stock never below zero), so both backends fail the same way.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::store::{InventoryStore, SaleWindow, StoreTx};
use stockroom_core::{
    BillPage, BillQuery, BillStatus, BillSummary, Category, MovementRecord, Product,
    ProductFilter, SalesBill, SalesBillItem, SoldLine, StockMovement, User,
};

// =============================================================================
// State
// =============================================================================

/// Every table of the store. Append-only collections keep insertion order.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    categories: HashMap<String, Category>,
    products: HashMap<String, Product>,
    movements: Vec<StockMovement>,
    bills: Vec<SalesBill>,
    items: Vec<SalesBillItem>,
}

impl MemoryState {
    fn user_name(&self, id: &str) -> Option<String> {
        self.users.get(id).map(|u| u.name.clone())
    }

    fn summarize(&self, bill: &SalesBill) -> BillSummary {
        BillSummary {
            bill: bill.clone(),
            cashier_name: self.user_name(&bill.user_id),
        }
    }

    /// Bills matching `keep`, newest first. Ties keep the later insert first.
    fn bills_newest_first(&self, keep: impl Fn(&SalesBill) -> bool) -> Vec<&SalesBill> {
        let mut bills: Vec<&SalesBill> = self.bills.iter().rev().filter(|b| keep(b)).collect();
        bills.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
        bills
    }

    fn find_category_by_name(&self, name: &str) -> Option<Category> {
        self.categories.values().find(|c| c.name == name).cloned()
    }

    fn find_product_by_sku(&self, sku: &str) -> Option<Product> {
        self.products.values().find(|p| p.sku == sku).cloned()
    }

    fn get_bill(&self, id: &str) -> Option<SalesBill> {
        self.bills.iter().find(|b| b.id == id).cloned()
    }

    fn bill_items(&self, bill_id: &str) -> Vec<SalesBillItem> {
        self.items
            .iter()
            .filter(|i| i.bill_id == bill_id)
            .cloned()
            .collect()
    }

    fn list_products(&self, filter: &ProductFilter) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        products
    }

    fn list_bills(&self, query: &BillQuery) -> BillPage {
        let window = query
            .date_bounds()
            .map(|(from, until)| SaleWindow::between(from, until))
            .unwrap_or_default();

        let matching = self.bills_newest_first(|b| {
            window.contains(b.sale_date) && query.status.map_or(true, |s| b.status == s)
        });
        let total = matching.len() as i64;

        let bills = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .map(|b| self.summarize(b))
            .collect();

        BillPage {
            bills,
            total,
            page: query.page(),
            pages: query.pages(total),
        }
    }

    fn completed_bills(&self, window: SaleWindow) -> Vec<BillSummary> {
        self.bills_newest_first(|b| !b.is_cancelled() && window.contains(b.sale_date))
            .into_iter()
            .map(|b| self.summarize(b))
            .collect()
    }

    fn sold_lines(&self, window: SaleWindow, category_id: Option<&str>) -> Vec<SoldLine> {
        let mut bills: Vec<&SalesBill> = self
            .bills
            .iter()
            .filter(|b| !b.is_cancelled() && window.contains(b.sale_date))
            .collect();
        bills.sort_by(|a, b| a.sale_date.cmp(&b.sale_date));

        let mut lines = Vec::new();
        for bill in bills {
            for item in self.items.iter().filter(|i| i.bill_id == bill.id) {
                let Some(product) = self.products.get(&item.product_id) else {
                    continue;
                };
                if let Some(wanted) = category_id {
                    if product.category_id.as_deref() != Some(wanted) {
                        continue;
                    }
                }
                let category_name = product
                    .category_id
                    .as_ref()
                    .and_then(|id| self.categories.get(id))
                    .map(|c| c.name.clone());

                lines.push(SoldLine {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    sku: product.sku.clone(),
                    category_name,
                    quantity: item.quantity,
                    line_total_cents: item.line_total_cents,
                });
            }
        }
        lines
    }

    fn movements(&self, product_id: &str) -> Vec<MovementRecord> {
        let mut records: Vec<MovementRecord> = self
            .movements
            .iter()
            .rev()
            .filter(|m| m.product_id == product_id)
            .map(|m| MovementRecord {
                movement: m.clone(),
                user_name: self.user_name(&m.user_id),
            })
            .collect();
        records.sort_by(|a, b| b.movement.created_at.cmp(&a.movement.created_at));
        records
    }

    fn ledger_sum(&self, product_id: &str) -> i64 {
        self.movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .map(|m| m.quantity_change)
            .sum()
    }

    // -------------------------------------------------------------------------
    // Constraint checks shared with the SQLite schema
    // -------------------------------------------------------------------------

    fn require_user(&self, id: &str) -> DbResult<()> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(DbError::foreign_key(format!("unknown user {}", id)))
        }
    }

    fn require_product(&self, id: &str) -> DbResult<()> {
        if self.products.contains_key(id) {
            Ok(())
        } else {
            Err(DbError::foreign_key(format!("unknown product {}", id)))
        }
    }

    fn require_category(&self, id: Option<&str>) -> DbResult<()> {
        match id {
            Some(id) if !self.categories.contains_key(id) => {
                Err(DbError::foreign_key(format!("unknown category {}", id)))
            }
            _ => Ok(()),
        }
    }

    fn sku_taken_by_other(&self, sku: &str, product_id: &str) -> bool {
        self.products
            .values()
            .any(|p| p.sku == sku && p.id != product_id)
    }
}

// =============================================================================
// Store
// =============================================================================

/// In-memory inventory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    write_gate: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        Ok(self.state.read().await.categories.get(id).cloned())
    }

    async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        Ok(self.state.read().await.products.get(id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        Ok(self.state.read().await.list_products(filter))
    }

    async fn get_bill(&self, id: &str) -> DbResult<Option<SalesBill>> {
        Ok(self.state.read().await.get_bill(id))
    }

    async fn bill_items(&self, bill_id: &str) -> DbResult<Vec<SalesBillItem>> {
        Ok(self.state.read().await.bill_items(bill_id))
    }

    async fn list_bills(&self, query: &BillQuery) -> DbResult<BillPage> {
        Ok(self.state.read().await.list_bills(query))
    }

    async fn completed_bills(&self, window: SaleWindow) -> DbResult<Vec<BillSummary>> {
        Ok(self.state.read().await.completed_bills(window))
    }

    async fn recent_completed_bills(&self, limit: u32) -> DbResult<Vec<BillSummary>> {
        let mut bills = self.state.read().await.completed_bills(SaleWindow::default());
        bills.truncate(limit as usize);
        Ok(bills)
    }

    async fn sold_lines(&self, window: SaleWindow, category_id: Option<&str>) -> DbResult<Vec<SoldLine>> {
        Ok(self.state.read().await.sold_lines(window, category_id))
    }

    async fn movements(&self, product_id: &str) -> DbResult<Vec<MovementRecord>> {
        Ok(self.state.read().await.movements(product_id))
    }

    async fn ledger_sum(&self, product_id: &str) -> DbResult<i64> {
        Ok(self.state.read().await.ledger_sum(product_id))
    }

    async fn begin(&self) -> DbResult<Box<dyn StoreTx>> {
        let gate = Arc::clone(&self.write_gate).lock_owned().await;
        let working = self.state.read().await.clone();

        debug!("Memory write unit opened");
        Ok(Box::new(MemoryTx {
            state: Arc::clone(&self.state),
            working,
            _gate: gate,
        }))
    }
}

// =============================================================================
// Write Unit
// =============================================================================

/// A private working copy of the store, published on commit.
pub struct MemoryTx {
    state: Arc<RwLock<MemoryState>>,
    working: MemoryState,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn get_user(&mut self, id: &str) -> DbResult<Option<User>> {
        Ok(self.working.users.get(id).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> DbResult<()> {
        if self.working.users.contains_key(&user.id) {
            return Err(DbError::duplicate("users.id", &user.id));
        }
        if self.working.users.values().any(|u| u.email == user.email) {
            return Err(DbError::duplicate("users.email", &user.email));
        }
        self.working.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_category(&mut self, id: &str) -> DbResult<Option<Category>> {
        Ok(self.working.categories.get(id).cloned())
    }

    async fn find_category_by_name(&mut self, name: &str) -> DbResult<Option<Category>> {
        Ok(self.working.find_category_by_name(name))
    }

    async fn insert_category(&mut self, category: &Category) -> DbResult<()> {
        if self.working.categories.contains_key(&category.id) {
            return Err(DbError::duplicate("categories.id", &category.id));
        }
        if self.working.find_category_by_name(&category.name).is_some() {
            return Err(DbError::duplicate("categories.name", &category.name));
        }
        self.working
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn get_product(&mut self, id: &str) -> DbResult<Option<Product>> {
        Ok(self.working.products.get(id).cloned())
    }

    async fn find_product_by_sku(&mut self, sku: &str) -> DbResult<Option<Product>> {
        Ok(self.working.find_product_by_sku(sku))
    }

    async fn insert_product(&mut self, product: &Product) -> DbResult<()> {
        if self.working.products.contains_key(&product.id) {
            return Err(DbError::duplicate("products.id", &product.id));
        }
        if self.working.sku_taken_by_other(&product.sku, &product.id) {
            return Err(DbError::duplicate("products.sku", &product.sku));
        }
        self.working.require_category(product.category_id.as_deref())?;
        if product.stock_qty < 0 {
            return Err(DbError::check_violation("products.stock_qty >= 0"));
        }
        self.working
            .products
            .insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn update_product_details(&mut self, product: &Product) -> DbResult<()> {
        if self.working.sku_taken_by_other(&product.sku, &product.id) {
            return Err(DbError::duplicate("products.sku", &product.sku));
        }
        self.working.require_category(product.category_id.as_deref())?;

        let existing = self
            .working
            .products
            .get_mut(&product.id)
            .ok_or_else(|| DbError::not_found("Product", &product.id))?;

        let stock_qty = existing.stock_qty;
        let created_at = existing.created_at;
        *existing = Product {
            stock_qty,
            created_at,
            ..product.clone()
        };
        Ok(())
    }

    async fn adjust_stock(&mut self, product_id: &str, delta: i64, at: DateTime<Utc>) -> DbResult<i64> {
        let product = self
            .working
            .products
            .get_mut(product_id)
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let new_qty = product
            .stock_qty
            .checked_add(delta)
            .ok_or_else(|| DbError::check_violation("products.stock_qty out of range"))?;
        if new_qty < 0 {
            return Err(DbError::check_violation("products.stock_qty >= 0"));
        }
        product.stock_qty = new_qty;
        product.updated_at = at;
        Ok(new_qty)
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> DbResult<()> {
        self.working.require_product(&movement.product_id)?;
        self.working.require_user(&movement.user_id)?;
        self.working.movements.push(movement.clone());
        Ok(())
    }

    async fn bill_numbers_with_prefix(&mut self, prefix: &str) -> DbResult<Vec<String>> {
        Ok(self
            .working
            .bills
            .iter()
            .filter(|b| b.bill_number.starts_with(prefix))
            .map(|b| b.bill_number.clone())
            .collect())
    }

    async fn insert_bill(&mut self, bill: &SalesBill) -> DbResult<()> {
        if self.working.bills.iter().any(|b| b.id == bill.id) {
            return Err(DbError::duplicate("sales_bills.id", &bill.id));
        }
        if self
            .working
            .bills
            .iter()
            .any(|b| b.bill_number == bill.bill_number)
        {
            return Err(DbError::duplicate("sales_bills.bill_number", &bill.bill_number));
        }
        self.working.require_user(&bill.user_id)?;
        self.working.bills.push(bill.clone());
        Ok(())
    }

    async fn insert_bill_item(&mut self, item: &SalesBillItem) -> DbResult<()> {
        if !self.working.bills.iter().any(|b| b.id == item.bill_id) {
            return Err(DbError::foreign_key(format!("unknown bill {}", item.bill_id)));
        }
        self.working.require_product(&item.product_id)?;
        if item.quantity <= 0 {
            return Err(DbError::check_violation("sales_bill_items.quantity > 0"));
        }
        self.working.items.push(item.clone());
        Ok(())
    }

    async fn get_bill(&mut self, id: &str) -> DbResult<Option<SalesBill>> {
        Ok(self.working.get_bill(id))
    }

    async fn bill_items(&mut self, bill_id: &str) -> DbResult<Vec<SalesBillItem>> {
        Ok(self.working.bill_items(bill_id))
    }

    async fn set_bill_status(&mut self, id: &str, status: BillStatus) -> DbResult<()> {
        let bill = self
            .working
            .bills
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| DbError::not_found("Bill", id))?;
        bill.status = status;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let MemoryTx {
            state,
            working,
            _gate,
        } = *self;
        *state.write().await = working;
        debug!("Memory write unit committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        debug!("Memory write unit rolled back");
        Ok(())
    }
}
