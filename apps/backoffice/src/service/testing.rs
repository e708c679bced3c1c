//! Shared fixtures for service tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use stockroom_core::{
    Actor, BillPage, BillQuery, BillStatus, BillSummary, Category, MovementRecord, NewProduct,
    Product, ProductFilter, Role, SalesBill, SalesBillItem, SoldLine, StockMovement, User,
};
use stockroom_db::{
    Database, DbConfig, DbError, DbResult, InventoryStore, MemoryStore, SaleWindow, StoreTx,
};

use super::{Backoffice, NewUser};
use crate::clock::FixedClock;

/// A back office with one admin and one sales user, on a clock stopped at
/// 2025-03-14 10:00 UTC.
pub(crate) struct Fixture {
    pub office: Backoffice,
    pub admin: Actor,
    pub cashier: Actor,
    pub cashier_email: String,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub async fn memory() -> Self {
        Self::seeded(Arc::new(MemoryStore::new())).await
    }

    pub async fn sqlite() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::seeded(Arc::new(db)).await
    }

    async fn seeded(store: Arc<dyn InventoryStore>) -> Self {
        let clock = Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap()));
        let office = Backoffice::new(store).with_clock(clock.clone());

        let admin = office
            .register_user(NewUser {
                name: "Asha Admin".to_string(),
                email: "asha@shop.test".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        let cashier_email = "sam@shop.test".to_string();
        let cashier = office
            .register_user(NewUser {
                name: "Sam Sales".to_string(),
                email: cashier_email.clone(),
                role: Role::Sales,
            })
            .await
            .unwrap();

        Fixture {
            office,
            admin: Actor::new(admin.id, admin.role),
            cashier: Actor::new(cashier.id, cashier.role),
            cashier_email,
            clock,
        }
    }

    /// An untaxed product named after its SKU.
    pub async fn product(&self, sku: &str, selling_cents: i64, purchase_cents: i64, qty: i64) -> Product {
        let spec = NewProduct {
            name: sku.to_string(),
            sku: sku.to_string(),
            purchase_price_cents: purchase_cents,
            selling_price_cents: selling_cents,
            stock_qty: qty,
            ..NewProduct::default()
        };
        self.office.create_product(spec, &self.admin).await.unwrap()
    }

    pub async fn product_with_tax(&self, sku: &str, selling_cents: i64, tax_bps: u32, qty: i64) -> Product {
        let spec = NewProduct {
            name: sku.to_string(),
            sku: sku.to_string(),
            selling_price_cents: selling_cents,
            tax_rate_bps: tax_bps,
            stock_qty: qty,
            ..NewProduct::default()
        };
        self.office.create_product(spec, &self.admin).await.unwrap()
    }
}

// =============================================================================
// Fault Injection
// =============================================================================

/// Wraps a store so that, inside a write unit, recording a movement for one
/// product fails. Everything else passes through.
pub(crate) struct FaultyStore {
    inner: Arc<dyn InventoryStore>,
    fail_movement_for: String,
}

impl FaultyStore {
    pub fn failing_movements_for(inner: Arc<dyn InventoryStore>, product_id: &str) -> Self {
        FaultyStore {
            inner,
            fail_movement_for: product_id.to_string(),
        }
    }
}

#[async_trait]
impl InventoryStore for FaultyStore {
    async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        self.inner.get_category(id).await
    }

    async fn list_categories(&self) -> DbResult<Vec<Category>> {
        self.inner.list_categories().await
    }

    async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn list_products(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        self.inner.list_products(filter).await
    }

    async fn get_bill(&self, id: &str) -> DbResult<Option<SalesBill>> {
        self.inner.get_bill(id).await
    }

    async fn bill_items(&self, bill_id: &str) -> DbResult<Vec<SalesBillItem>> {
        self.inner.bill_items(bill_id).await
    }

    async fn list_bills(&self, query: &BillQuery) -> DbResult<BillPage> {
        self.inner.list_bills(query).await
    }

    async fn completed_bills(&self, window: SaleWindow) -> DbResult<Vec<BillSummary>> {
        self.inner.completed_bills(window).await
    }

    async fn recent_completed_bills(&self, limit: u32) -> DbResult<Vec<BillSummary>> {
        self.inner.recent_completed_bills(limit).await
    }

    async fn sold_lines(&self, window: SaleWindow, category_id: Option<&str>) -> DbResult<Vec<SoldLine>> {
        self.inner.sold_lines(window, category_id).await
    }

    async fn movements(&self, product_id: &str) -> DbResult<Vec<MovementRecord>> {
        self.inner.movements(product_id).await
    }

    async fn ledger_sum(&self, product_id: &str) -> DbResult<i64> {
        self.inner.ledger_sum(product_id).await
    }

    async fn begin(&self) -> DbResult<Box<dyn StoreTx>> {
        Ok(Box::new(FaultyTx {
            inner: self.inner.begin().await?,
            fail_movement_for: self.fail_movement_for.clone(),
        }))
    }
}

struct FaultyTx {
    inner: Box<dyn StoreTx>,
    fail_movement_for: String,
}

#[async_trait]
impl StoreTx for FaultyTx {
    async fn get_user(&mut self, id: &str) -> DbResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn insert_user(&mut self, user: &User) -> DbResult<()> {
        self.inner.insert_user(user).await
    }

    async fn get_category(&mut self, id: &str) -> DbResult<Option<Category>> {
        self.inner.get_category(id).await
    }

    async fn find_category_by_name(&mut self, name: &str) -> DbResult<Option<Category>> {
        self.inner.find_category_by_name(name).await
    }

    async fn insert_category(&mut self, category: &Category) -> DbResult<()> {
        self.inner.insert_category(category).await
    }

    async fn get_product(&mut self, id: &str) -> DbResult<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn find_product_by_sku(&mut self, sku: &str) -> DbResult<Option<Product>> {
        self.inner.find_product_by_sku(sku).await
    }

    async fn insert_product(&mut self, product: &Product) -> DbResult<()> {
        self.inner.insert_product(product).await
    }

    async fn update_product_details(&mut self, product: &Product) -> DbResult<()> {
        self.inner.update_product_details(product).await
    }

    async fn adjust_stock(&mut self, product_id: &str, delta: i64, at: DateTime<Utc>) -> DbResult<i64> {
        self.inner.adjust_stock(product_id, delta, at).await
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> DbResult<()> {
        if movement.product_id == self.fail_movement_for {
            return Err(DbError::QueryFailed("disk I/O error".to_string()));
        }
        self.inner.insert_movement(movement).await
    }

    async fn bill_numbers_with_prefix(&mut self, prefix: &str) -> DbResult<Vec<String>> {
        self.inner.bill_numbers_with_prefix(prefix).await
    }

    async fn insert_bill(&mut self, bill: &SalesBill) -> DbResult<()> {
        self.inner.insert_bill(bill).await
    }

    async fn insert_bill_item(&mut self, item: &SalesBillItem) -> DbResult<()> {
        self.inner.insert_bill_item(item).await
    }

    async fn get_bill(&mut self, id: &str) -> DbResult<Option<SalesBill>> {
        self.inner.get_bill(id).await
    }

    async fn bill_items(&mut self, bill_id: &str) -> DbResult<Vec<SalesBillItem>> {
        self.inner.bill_items(bill_id).await
    }

    async fn set_bill_status(&mut self, id: &str, status: BillStatus) -> DbResult<()> {
        self.inner.set_bill_status(id, status).await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.inner.rollback().await
    }
}

/// Runs each `async fn(Fixture)` scenario against the SQLite and the
/// in-memory backend.
macro_rules! both_backends {
    ($($scenario:ident),* $(,)?) => {
        mod sqlite_backend {
            $(
                #[tokio::test]
                async fn $scenario() {
                    let fx = $crate::service::testing::Fixture::sqlite().await;
                    super::$scenario(fx).await;
                }
            )*
        }

        mod memory_backend {
            $(
                #[tokio::test]
                async fn $scenario() {
                    let fx = $crate::service::testing::Fixture::memory().await;
                    super::$scenario(fx).await;
                }
            )*
        }
    };
}

pub(crate) use both_backends;
