//! # Sale Transaction Engine
//!
//! Creates and cancels bills. Each operation is one write unit: either every
//! row it touches is published, or none is.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_sale(request, actor)                                           │
//! │       │                                                                 │
//! │       ├── validate lines + discount          (no store access)         │
//! │       │                                                                 │
//! │       ▼  store.begin()  ─────────────── write gate held from here ───  │
//! │  1. Validate   product exists, active, Σ qty ≤ stock_qty               │
//! │  2. Price      pricing::price(snapshot price/tax, discount)            │
//! │  3. Number     INV-YYYYMMDD-NNNN from today's bills                    │
//! │  4. Commit     bill ─► items ─► per line: stock −qty + `sale` entry    │
//! │       │                                                                 │
//! │       ▼  unit.commit()  ─────────────── or rollback on any error ───   │
//! │  BillDetail { bill, items }                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation flips the status once and writes a `cancellation` entry of
//! `+quantity` per item, inside one unit as well.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_core::numbering::{date_prefix, next_bill_number};
use stockroom_core::pricing::{price, PricingLine, PricingPolicy};
use stockroom_core::validation::{validate_sale_lines, validate_uuid};
use stockroom_core::{
    Actor, BillDetail, BillPage, BillQuery, BillStatus, CoreError, Discount, MovementType,
    PaymentMethod, PaymentStatus, Product, SaleLine, SalesBill, SalesBillItem,
};
use stockroom_db::StoreTx;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ledger::move_stock;
use super::{discard, require_actor, Backoffice};
use crate::clock::Clock;
use crate::error::ServiceResult;

/// A cart submitted for checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub items: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub discount: Discount,
}

impl SaleRequest {
    /// A paid cash sale without discount.
    pub fn cash(items: Vec<SaleLine>) -> Self {
        SaleRequest {
            items,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Paid,
            discount: Discount::None,
        }
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = discount;
        self
    }
}

fn sale_reason(bill_number: &str) -> String {
    format!("Sale: {}", bill_number)
}

fn cancellation_reason(bill_number: &str) -> String {
    format!("Cancellation: {}", bill_number)
}

// =============================================================================
// Write Units
// =============================================================================

/// Loads every product on the cart and checks the summed quantity of each
/// against what is on hand.
async fn check_stock(
    unit: &mut dyn StoreTx,
    lines: &[SaleLine],
) -> ServiceResult<HashMap<String, Product>> {
    let mut requested: Vec<(&str, i64)> = Vec::new();
    for line in lines {
        match requested.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty = qty.saturating_add(line.quantity),
            None => requested.push((line.product_id.as_str(), line.quantity)),
        }
    }

    let mut products = HashMap::with_capacity(requested.len());
    for (product_id, quantity) in requested {
        let product = unit
            .get_product(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        if !product.is_active() {
            return Err(CoreError::ProductInactive {
                product: product.name,
                sku: product.sku,
            }
            .into());
        }
        if quantity > product.stock_qty {
            return Err(CoreError::InsufficientStock {
                product: product.name,
                sku: product.sku,
                available: product.stock_qty,
                requested: quantity,
            }
            .into());
        }

        products.insert(product.id.clone(), product);
    }

    Ok(products)
}

async fn write_sale(
    unit: &mut dyn StoreTx,
    request: SaleRequest,
    policy: PricingPolicy,
    actor: &Actor,
    now: DateTime<Utc>,
) -> ServiceResult<BillDetail> {
    require_actor(unit, actor).await?;

    // 1. Validate
    let products = check_stock(unit, &request.items).await?;

    // 2. Price, from the prices and rates on record right now
    let mut pricing_lines = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| CoreError::not_found("Product", &line.product_id))?;
        pricing_lines.push(PricingLine {
            unit_price: product.selling_price(),
            quantity: line.quantity,
            tax_rate: product.tax_rate(),
        });
    }
    let quote = price(&pricing_lines, &request.discount, policy)?;

    // 3. Number
    let today = now.date_naive();
    let taken = unit.bill_numbers_with_prefix(&date_prefix(today)).await?;
    let bill_number = next_bill_number(today, &taken)?;

    // 4. Commit
    let bill = SalesBill {
        id: Uuid::new_v4().to_string(),
        bill_number,
        sale_date: now,
        subtotal_cents: quote.subtotal.cents(),
        tax_cents: quote.tax_amount.cents(),
        discount_cents: quote.discount_amount.cents(),
        discount_type: quote.discount_type,
        total_cents: quote.total.cents(),
        payment_method: request.payment_method,
        payment_status: request.payment_status,
        status: BillStatus::Completed,
        user_id: actor.id.clone(),
        created_at: now,
    };
    unit.insert_bill(&bill).await?;

    let mut items = Vec::with_capacity(quote.lines.len());
    for (line, priced) in request.items.iter().zip(&quote.lines) {
        let item = SalesBillItem {
            id: Uuid::new_v4().to_string(),
            bill_id: bill.id.clone(),
            product_id: line.product_id.clone(),
            quantity: priced.quantity,
            unit_price_cents: priced.unit_price.cents(),
            tax_rate_bps: priced.tax_rate.bps(),
            line_total_cents: priced.line_total.cents(),
        };
        unit.insert_bill_item(&item).await?;
        items.push(item);
    }

    let reason = sale_reason(&bill.bill_number);
    for item in &items {
        move_stock(
            unit,
            &item.product_id,
            MovementType::Sale,
            -item.quantity,
            reason.clone(),
            &actor.id,
            now,
        )
        .await?;
    }

    Ok(BillDetail { bill, items })
}

async fn write_cancellation(
    unit: &mut dyn StoreTx,
    bill_id: &str,
    actor: &Actor,
    now: DateTime<Utc>,
) -> ServiceResult<BillDetail> {
    require_actor(unit, actor).await?;

    let mut bill = unit
        .get_bill(bill_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Bill", bill_id))?;

    if bill.is_cancelled() {
        return Err(CoreError::AlreadyCancelled {
            bill_number: bill.bill_number,
        }
        .into());
    }

    unit.set_bill_status(&bill.id, BillStatus::Cancelled).await?;
    bill.status = BillStatus::Cancelled;

    let items = unit.bill_items(&bill.id).await?;
    let reason = cancellation_reason(&bill.bill_number);
    for item in &items {
        move_stock(
            unit,
            &item.product_id,
            MovementType::Cancellation,
            item.quantity,
            reason.clone(),
            &actor.id,
            now,
        )
        .await?;
    }

    Ok(BillDetail { bill, items })
}

// =============================================================================
// Operations
// =============================================================================

impl Backoffice {
    /// Checks out a cart as one atomic unit and returns the committed bill.
    ///
    /// Several lines may name the same product; the stock check uses their
    /// summed quantity and each line becomes its own bill item.
    ///
    /// ## Errors
    /// - `Validation` for an empty cart, a non-positive quantity or a bad discount
    /// - `NotFound` for an unknown product or actor
    /// - `ProductInactive` for a product switched off for sale
    /// - `InsufficientStock` when the cart asks for more than is on hand
    ///
    /// On any error nothing is persisted.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 2)]);
    /// let detail = office.create_sale(request, &cashier).await?;
    /// println!("{} total {}", detail.bill.bill_number, detail.bill.total());
    /// ```
    pub async fn create_sale(&self, request: SaleRequest, actor: &Actor) -> ServiceResult<BillDetail> {
        validate_sale_lines(&request.items)?;
        request.discount.validate()?;

        let now = self.clock.now();
        let line_count = request.items.len();
        let mut unit = self.store.begin().await?;

        match write_sale(unit.as_mut(), request, self.settings.pricing, actor, now).await {
            Ok(detail) => {
                unit.commit().await?;
                info!(
                    bill_number = %detail.bill.bill_number,
                    lines = detail.items.len(),
                    subtotal = detail.bill.subtotal_cents,
                    tax = detail.bill.tax_cents,
                    discount = detail.bill.discount_cents,
                    total = detail.bill.total_cents,
                    actor = %actor.id,
                    "Sale committed"
                );
                Ok(detail)
            }
            Err(err) => {
                warn!(lines = line_count, actor = %actor.id, error = %err, "Sale rejected");
                discard(unit).await;
                Err(err)
            }
        }
    }

    /// Cancels a completed bill and puts its stock back.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown bill or actor
    /// - `AlreadyCancelled` on a second attempt; stock is not restored twice
    pub async fn cancel_sale(&self, bill_id: &str, actor: &Actor) -> ServiceResult<BillDetail> {
        validate_uuid("bill_id", bill_id)?;

        let now = self.clock.now();
        let mut unit = self.store.begin().await?;

        match write_cancellation(unit.as_mut(), bill_id, actor, now).await {
            Ok(detail) => {
                unit.commit().await?;
                info!(
                    bill_number = %detail.bill.bill_number,
                    lines = detail.items.len(),
                    total = detail.bill.total_cents,
                    actor = %actor.id,
                    "Sale cancelled"
                );
                Ok(detail)
            }
            Err(err) => {
                warn!(bill_id = %bill_id, actor = %actor.id, error = %err, "Cancellation rejected");
                discard(unit).await;
                Err(err)
            }
        }
    }

    /// A bill with its items.
    pub async fn get_bill(&self, id: &str) -> ServiceResult<BillDetail> {
        let bill = self
            .store
            .get_bill(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Bill", id))?;
        let items = self.store.bill_items(&bill.id).await?;
        Ok(BillDetail { bill, items })
    }

    /// One page of bills, newest first.
    pub async fn list_bills(&self, query: &BillQuery) -> ServiceResult<BillPage> {
        let page = self.store.list_bills(query).await?;
        debug!(page = page.page, pages = page.pages, total = page.total, "Listed bills");
        Ok(page)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::SaleRequest;
    use crate::clock::Clock;
    use crate::service::testing::{both_backends, FaultyStore, Fixture};
    use crate::service::Backoffice;
    use chrono::Duration;
    use stockroom_core::{
        BillQuery, BillStatus, CoreError, Discount, DiscountType, MovementType, PaymentMethod,
        PaymentStatus, ProductUpdate, RecordStatus, SaleLine, StockStatus, ValidationError,
    };
    use uuid::Uuid;

    async fn selling_out_then_oversell(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 5).await;

        let detail = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 5)]), &fx.cashier)
            .await
            .unwrap();
        assert_eq!(detail.bill.bill_number, "INV-20250314-0001");

        let stored = fx.office.get_product(&cola.id).await.unwrap();
        assert_eq!(stored.stock_qty, 0);
        assert_eq!(stored.stock_status(), StockStatus::OutOfStock);

        let err = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 1)]), &fx.cashier)
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::InsufficientStock { available: 0, requested: 1, .. })
        ));
        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 0);
    }

    async fn flat_discount_totals(fx: Fixture) {
        let item = fx.product_with_tax("TEA-BOX", 1000, 500, 10).await;

        let request = SaleRequest::cash(vec![SaleLine::new(&item.id, 2)])
            .with_discount(Discount::Flat { amount_cents: 100 });
        let detail = fx.office.create_sale(request, &fx.cashier).await.unwrap();

        assert_eq!(detail.bill.subtotal_cents, 2000);
        assert_eq!(detail.bill.tax_cents, 100);
        assert_eq!(detail.bill.discount_cents, 100);
        assert_eq!(detail.bill.discount_type, DiscountType::Flat);
        assert_eq!(detail.bill.total_cents, 2000);

        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].unit_price_cents, 1000);
        assert_eq!(detail.items[0].tax_rate_bps, 500);
        assert_eq!(detail.items[0].line_total_cents, 2100);
    }

    async fn percentage_discount_totals(fx: Fixture) {
        let item = fx.product("MUG", 2500, 900, 10).await;

        let request = SaleRequest::cash(vec![SaleLine::new(&item.id, 2)])
            .with_discount(Discount::Percentage { rate_bps: 1000 });
        let detail = fx.office.create_sale(request, &fx.cashier).await.unwrap();

        assert_eq!(detail.bill.subtotal_cents, 5000);
        assert_eq!(detail.bill.tax_cents, 0);
        assert_eq!(detail.bill.discount_cents, 500);
        assert_eq!(detail.bill.discount_type, DiscountType::Percentage);
        assert_eq!(detail.bill.total_cents, 4500);
    }

    async fn cancellation_restores_stock_once(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 10).await;
        let chips = fx.product("CHIPS", 250, 100, 4).await;

        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 3), SaleLine::new(&chips.id, 1)]);
        let sold = fx.office.create_sale(request, &fx.cashier).await.unwrap();
        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 7);
        assert_eq!(fx.office.get_product(&chips.id).await.unwrap().stock_qty, 3);

        let cancelled = fx.office.cancel_sale(&sold.bill.id, &fx.admin).await.unwrap();
        assert_eq!(cancelled.bill.status, BillStatus::Cancelled);
        assert_eq!(cancelled.items, sold.items);
        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 10);
        assert_eq!(fx.office.get_product(&chips.id).await.unwrap().stock_qty, 4);

        for product_id in [&cola.id, &chips.id] {
            let history = fx.office.stock_history(product_id).await.unwrap();
            assert_eq!(history[0].movement.movement_type, MovementType::Cancellation);
            assert_eq!(
                history[0].movement.reason.as_deref(),
                Some(format!("Cancellation: {}", sold.bill.bill_number).as_str())
            );
            assert_eq!(history[1].movement.movement_type, MovementType::Sale);
        }

        let err = fx.office.cancel_sale(&sold.bill.id, &fx.admin).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::AlreadyCancelled { .. })));
        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 10);
        assert_eq!(fx.office.stock_history(&cola.id).await.unwrap().len(), 3);

        // Still on record, with its items
        let stored = fx.office.get_bill(&sold.bill.id).await.unwrap();
        assert!(stored.bill.is_cancelled());
        assert_eq!(stored.items.len(), 2);
    }

    async fn cancel_unknown_bill_is_not_found(fx: Fixture) {
        let unknown = Uuid::new_v4().to_string();
        let err = fx.office.cancel_sale(&unknown, &fx.admin).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { entity, .. }) if entity == "Bill"));

        let err = fx.office.cancel_sale("INV-20250314-0001", &fx.admin).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    async fn numbering_is_sequential_per_day(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 50).await;
        let sell = || SaleRequest::cash(vec![SaleLine::new(&cola.id, 1)]);

        let mut numbers = Vec::new();
        for _ in 0..3 {
            numbers.push(fx.office.create_sale(sell(), &fx.cashier).await.unwrap().bill.bill_number);
        }
        assert_eq!(
            numbers,
            vec!["INV-20250314-0001", "INV-20250314-0002", "INV-20250314-0003"]
        );

        // Cancelled bills keep their number
        let cancelled = fx.office.create_sale(sell(), &fx.cashier).await.unwrap();
        fx.office.cancel_sale(&cancelled.bill.id, &fx.admin).await.unwrap();
        let next = fx.office.create_sale(sell(), &fx.cashier).await.unwrap();
        assert_eq!(next.bill.bill_number, "INV-20250314-0005");

        fx.clock.advance(Duration::days(1));
        let tomorrow = fx.office.create_sale(sell(), &fx.cashier).await.unwrap();
        assert_eq!(tomorrow.bill.bill_number, "INV-20250315-0001");
        assert_eq!(tomorrow.bill.sale_date, fx.clock.now());
    }

    async fn concurrent_sales_get_distinct_numbers(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 100).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let office = fx.office.clone();
            let cashier = fx.cashier.clone();
            let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 2)]);
            handles.push(tokio::spawn(async move { office.create_sale(request, &cashier).await }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap().bill.bill_number);
        }
        numbers.sort();
        let expected: Vec<String> = (1..=8).map(|n| format!("INV-20250314-{:04}", n)).collect();
        assert_eq!(numbers, expected);

        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 84);
        assert!(fx.office.verify_stock(&cola.id).await.unwrap().consistent);
    }

    async fn concurrent_sales_never_oversell(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 5).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let office = fx.office.clone();
            let cashier = fx.cashier.clone();
            let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 2)]);
            handles.push(tokio::spawn(async move { office.create_sale(request, &cashier).await }));
        }

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(err) => assert!(matches!(err.domain(), Some(CoreError::InsufficientStock { .. }))),
            }
        }
        assert_eq!(committed, 2);
        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 1);
        assert!(fx.office.verify_stock(&cola.id).await.unwrap().consistent);
    }

    async fn rejected_sale_leaves_nothing_behind(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 10).await;
        let chips = fx.product("CHIPS", 250, 100, 1).await;

        // Second line fails after the first one passed its checks
        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 2), SaleLine::new(&chips.id, 2)]);
        let err = fx.office.create_sale(request, &fx.cashier).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::InsufficientStock { .. })));

        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 2), SaleLine::new(Uuid::new_v4().to_string(), 1)]);
        let err = fx.office.create_sale(request, &fx.cashier).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));

        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 10);
        assert_eq!(fx.office.stock_history(&cola.id).await.unwrap().len(), 1);
        assert_eq!(fx.office.list_bills(&BillQuery::default()).await.unwrap().total, 0);

        // The failed attempts did not consume a number
        let ok = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 1)]), &fx.cashier)
            .await
            .unwrap();
        assert_eq!(ok.bill.bill_number, "INV-20250314-0001");
    }

    async fn failure_after_bill_insert_rolls_back_everything(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 10).await;
        let chips = fx.product("CHIPS", 250, 100, 5).await;

        // Bill, items, cola's decrement and ledger entry are written before
        // the chips movement fails
        let faulty = Backoffice::new(Arc::new(FaultyStore::failing_movements_for(
            fx.office.store().clone(),
            &chips.id,
        )))
        .with_clock(fx.clock.clone());
        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 2), SaleLine::new(&chips.id, 1)]);
        let err = faulty.create_sale(request, &fx.cashier).await.unwrap_err();
        assert!(err.domain().is_none());

        let page = fx.office.list_bills(&BillQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.bills.is_empty());
        for (product, on_hand) in [(&cola, 10), (&chips, 5)] {
            assert_eq!(fx.office.get_product(&product.id).await.unwrap().stock_qty, on_hand);
            assert_eq!(fx.office.stock_history(&product.id).await.unwrap().len(), 1);
            assert!(fx.office.verify_stock(&product.id).await.unwrap().consistent);
        }
        assert_eq!(fx.office.product_sales(None, None).await.unwrap().len(), 0);

        // The number was never published
        let ok = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&chips.id, 1)]), &fx.cashier)
            .await
            .unwrap();
        assert_eq!(ok.bill.bill_number, "INV-20250314-0001");
        assert_eq!(fx.office.get_bill(&ok.bill.id).await.unwrap().items.len(), 1);
    }

    async fn oversized_lines_are_refused_before_any_write(fx: Fixture) {
        let cola = fx.product("COLA-330", 1000, 500, 5).await;

        // Two lines whose sum leaves i64
        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, i64::MAX), SaleLine::new(&cola.id, 1)]);
        let err = fx.office.create_sale(request, &fx.cashier).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Line total past i64 cents
        let gold = fx.product("GOLD", i64::MAX / 2, 0, 10).await;
        let request = SaleRequest::cash(vec![SaleLine::new(&gold.id, 3)]);
        let err = fx.office.create_sale(request, &fx.cashier).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { field, .. })) if field == "line_subtotal"
        ));

        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 5);
        assert_eq!(fx.office.get_product(&gold.id).await.unwrap().stock_qty, 10);
        assert_eq!(fx.office.list_bills(&BillQuery::default()).await.unwrap().total, 0);
    }

    async fn inactive_product_cannot_be_sold(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 10).await;
        let update = ProductUpdate {
            status: Some(RecordStatus::Inactive),
            ..ProductUpdate::default()
        };
        fx.office.update_product(&cola.id, update, &fx.admin).await.unwrap();

        let err = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 1)]), &fx.cashier)
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::ProductInactive { sku, .. }) if sku == "COLA-330"));
    }

    async fn repeated_lines_are_checked_together(fx: Fixture) {
        let cola = fx.product("COLA-330", 1000, 500, 5).await;

        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 3), SaleLine::new(&cola.id, 3)]);
        let err = fx.office.create_sale(request, &fx.cashier).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::InsufficientStock { available: 5, requested: 6, .. })
        ));

        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 3), SaleLine::new(&cola.id, 2)]);
        let detail = fx.office.create_sale(request, &fx.cashier).await.unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.bill.subtotal_cents, 5000);
        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 0);
    }

    async fn bill_keeps_price_snapshot(fx: Fixture) {
        let cola = fx.product("COLA-330", 1000, 500, 10).await;
        let sold = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 1)]), &fx.cashier)
            .await
            .unwrap();

        let update = ProductUpdate {
            selling_price_cents: Some(1500),
            tax_rate_bps: Some(1800),
            ..ProductUpdate::default()
        };
        fx.office.update_product(&cola.id, update, &fx.admin).await.unwrap();

        let stored = fx.office.get_bill(&sold.bill.id).await.unwrap();
        assert_eq!(stored.items[0].unit_price_cents, 1000);
        assert_eq!(stored.items[0].tax_rate_bps, 0);
        assert_eq!(stored.bill.total_cents, 1000);
    }

    async fn invalid_requests_are_rejected_up_front(fx: Fixture) {
        let cola = fx.product("COLA-330", 1000, 500, 10).await;

        let err = fx.office.create_sale(SaleRequest::cash(vec![]), &fx.cashier).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(ValidationError::Required { .. }))));

        let err = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 0)]), &fx.cashier)
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(_))));

        let request = SaleRequest::cash(vec![SaleLine::new(&cola.id, 1)])
            .with_discount(Discount::Flat { amount_cents: -1 });
        let err = fx.office.create_sale(request, &fx.cashier).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(_))));

        let ghost = stockroom_core::Actor::new("ghost", stockroom_core::Role::Sales);
        let err = fx
            .office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 1)]), &ghost)
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { entity, .. }) if entity == "User"));

        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 10);
    }

    async fn ledger_replays_after_mixed_operations(fx: Fixture) {
        let cola = fx.product("COLA-330", 1000, 500, 20).await;
        let chips = fx.product("CHIPS", 250, 100, 8).await;

        let first = fx
            .office
            .create_sale(
                SaleRequest::cash(vec![SaleLine::new(&cola.id, 4), SaleLine::new(&chips.id, 2)]),
                &fx.cashier,
            )
            .await
            .unwrap();
        fx.office.adjust_stock(&cola.id, -1, "Damaged", &fx.admin).await.unwrap();
        fx.office
            .create_sale(SaleRequest::cash(vec![SaleLine::new(&cola.id, 6)]), &fx.cashier)
            .await
            .unwrap();
        fx.office.cancel_sale(&first.bill.id, &fx.admin).await.unwrap();
        fx.office.receive_stock(&chips.id, 12, "Restock", &fx.admin).await.unwrap();

        let cola_now = fx.office.get_product(&cola.id).await.unwrap();
        let chips_now = fx.office.get_product(&chips.id).await.unwrap();
        assert_eq!(cola_now.stock_qty, 13);
        assert_eq!(chips_now.stock_qty, 20);

        for id in [&cola.id, &chips.id] {
            let check = fx.office.verify_stock(id).await.unwrap();
            assert!(check.consistent);
            assert_eq!(check.ledger_sum, check.stock_qty);
        }
    }

    async fn bills_are_listed_newest_first(fx: Fixture) {
        let cola = fx.product("COLA-330", 1000, 500, 20).await;
        let card = SaleRequest {
            items: vec![SaleLine::new(&cola.id, 1)],
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Pending,
            discount: Discount::None,
        };

        let first = fx.office.create_sale(card.clone(), &fx.cashier).await.unwrap();
        fx.clock.advance(Duration::minutes(5));
        let second = fx.office.create_sale(card, &fx.cashier).await.unwrap();
        fx.office.cancel_sale(&first.bill.id, &fx.admin).await.unwrap();

        let page = fx.office.list_bills(&BillQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.pages, 1);
        assert_eq!(page.bills[0].bill.id, second.bill.id);
        assert_eq!(page.bills[0].cashier_name.as_deref(), Some("Sam Sales"));
        assert_eq!(page.bills[0].bill.payment_method, PaymentMethod::Card);

        let completed = BillQuery {
            status: Some(BillStatus::Completed),
            ..BillQuery::default()
        };
        let page = fx.office.list_bills(&completed).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.bills[0].bill.id, second.bill.id);
    }

    both_backends!(
        selling_out_then_oversell,
        flat_discount_totals,
        percentage_discount_totals,
        cancellation_restores_stock_once,
        cancel_unknown_bill_is_not_found,
        numbering_is_sequential_per_day,
        concurrent_sales_get_distinct_numbers,
        concurrent_sales_never_oversell,
        rejected_sale_leaves_nothing_behind,
        failure_after_bill_insert_rolls_back_everything,
        oversized_lines_are_refused_before_any_write,
        inactive_product_cannot_be_sold,
        repeated_lines_are_checked_together,
        bill_keeps_price_snapshot,
        invalid_requests_are_rejected_up_front,
        ledger_replays_after_mixed_operations,
        bills_are_listed_newest_first,
    );
}
