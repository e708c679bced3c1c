//! # Report Aggregation
//!
//! Read-only projections over committed bills and the current catalog.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Store (read committed)          This module (pure)                     │
//! │  ──────────────────────          ───────────────────────────────────    │
//! │  products + categories ───────►  stock_rows()       → [StockRow]        │
//! │  completed bills in window ───►  summarize()        → SalesSummary      │
//! │                                  daily_sales()      → DailySalesReport  │
//! │                                  monthly_sales()    → MonthlySalesReport│
//! │  sold lines in window ────────►  product_sales()    → [ProductSalesRow] │
//! │  all of the above ────────────►  dashboard()        → DashboardSummary  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancelled bills are skipped here even if a caller passes them in, and
//! inactive products never appear in stock figures. Currency stays in cents;
//! rendering to two decimals happens at output time.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::query::{DateRange, StockFilter};
use crate::types::{BillSummary, Category, Product, SoldLine, StockStatus};

/// Number of recent bills shown on the dashboard.
pub const DASHBOARD_RECENT_BILLS: usize = 5;

/// Number of low-stock products shown on the dashboard.
pub const DASHBOARD_LOW_STOCK_ROWS: usize = 10;

// =============================================================================
// Stock
// =============================================================================

/// One product in a stock snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockRow {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub category_name: Option<String>,
    pub stock_qty: i64,
    pub reorder_level: i64,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    pub stock_status: StockStatus,
}

impl StockRow {
    pub fn from_product(product: &Product, category_name: Option<String>) -> Self {
        StockRow {
            product_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            category_name,
            stock_qty: product.stock_qty,
            reorder_level: product.reorder_level,
            purchase_price_cents: product.purchase_price_cents,
            selling_price_cents: product.selling_price_cents,
            stock_status: product.stock_status(),
        }
    }
}

/// Active products matching `filter`, lowest stock first, then by name.
pub fn stock_rows(products: &[Product], categories: &[Category], filter: &StockFilter) -> Vec<StockRow> {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut rows: Vec<StockRow> = products
        .iter()
        .filter(|p| filter.matches(p))
        .map(|p| {
            let category_name = p
                .category_id
                .as_deref()
                .and_then(|id| names.get(id))
                .map(|name| name.to_string());
            StockRow::from_product(p, category_name)
        })
        .collect();

    rows.sort_by(|a, b| a.stock_qty.cmp(&b.stock_qty).then_with(|| a.name.cmp(&b.name)));
    rows
}

/// Active products at or below their reorder level, lowest first.
pub fn stock_alerts(products: &[Product], categories: &[Category]) -> Vec<StockRow> {
    let mut rows = stock_rows(products, categories, &StockFilter::default());
    rows.retain(|row| row.stock_status != StockStatus::InStock);
    rows
}

// =============================================================================
// Sales
// =============================================================================

/// Totals over a set of completed bills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub transaction_count: i64,
    pub total_revenue_cents: i64,
    pub total_tax_cents: i64,
    pub total_discount_cents: i64,
}

/// Sums completed bills. Cancelled bills are ignored.
pub fn summarize(bills: &[BillSummary]) -> SalesSummary {
    bills
        .iter()
        .filter(|b| !b.bill.is_cancelled())
        .fold(SalesSummary::default(), |mut acc, b| {
            acc.transaction_count += 1;
            acc.total_revenue_cents += b.bill.total_cents;
            acc.total_tax_cents += b.bill.tax_cents;
            acc.total_discount_cents += b.bill.discount_cents;
            acc
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySalesReport {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Completed bills of the day, newest first.
    pub bills: Vec<BillSummary>,
    pub summary: SalesSummary,
}

/// One day of a monthly rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyTotal {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub transactions: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlySalesReport {
    /// `YYYY-MM`
    pub month: String,
    /// Days with at least one completed bill, in date order.
    pub daily_totals: Vec<DailyTotal>,
    pub summary: SalesSummary,
}

/// Completed bills of `date`, newest first, with their totals.
pub fn daily_sales(date: NaiveDate, bills: &[BillSummary]) -> DailySalesReport {
    let day = DateRange::day(date);
    let mut bills: Vec<BillSummary> = bills
        .iter()
        .filter(|b| !b.bill.is_cancelled() && day.contains(b.bill.sale_date))
        .cloned()
        .collect();
    bills.sort_by(|a, b| b.bill.sale_date.cmp(&a.bill.sale_date));

    let summary = summarize(&bills);
    DailySalesReport {
        date,
        bills,
        summary,
    }
}

/// Per-day rollup of the completed bills inside `month`.
pub fn monthly_sales(month: DateRange, bills: &[BillSummary]) -> MonthlySalesReport {
    let in_month: Vec<BillSummary> = bills
        .iter()
        .filter(|b| !b.bill.is_cancelled() && month.contains(b.bill.sale_date))
        .cloned()
        .collect();

    let mut per_day: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
    for b in &in_month {
        let date = b.bill.sale_date.date_naive();
        let entry = per_day.entry(date).or_insert(DailyTotal {
            date,
            transactions: 0,
            revenue_cents: 0,
        });
        entry.transactions += 1;
        entry.revenue_cents += b.bill.total_cents;
    }

    MonthlySalesReport {
        month: month.month_label(),
        daily_totals: per_day.into_values().collect(),
        summary: summarize(&in_month),
    }
}

// =============================================================================
// Product Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSalesRow {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub category_name: Option<String>,
    pub units_sold: i64,
    /// Sum of line totals: tax inclusive, before the bill-level discount.
    pub revenue_cents: i64,
}

/// Groups sold lines per product, highest revenue first.
///
/// `lines` must already be restricted to completed bills in the wanted
/// window and category.
pub fn product_sales(lines: &[SoldLine]) -> Vec<ProductSalesRow> {
    let mut rows: Vec<ProductSalesRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in lines {
        match index.get(line.product_id.as_str()) {
            Some(&i) => {
                rows[i].units_sold += line.quantity;
                rows[i].revenue_cents += line.line_total_cents;
            }
            None => {
                index.insert(line.product_id.as_str(), rows.len());
                rows.push(ProductSalesRow {
                    product_id: line.product_id.clone(),
                    name: line.product_name.clone(),
                    sku: line.sku.clone(),
                    category_name: line.category_name.clone(),
                    units_sold: line.quantity,
                    revenue_cents: line.line_total_cents,
                });
            }
        }
    }

    rows.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    /// Active products.
    pub total_products: i64,
    /// Active products with `0 < stock_qty <= reorder_level`.
    pub low_stock_items: i64,
    /// Active products with nothing on hand.
    pub out_of_stock: i64,
    pub today_sales_cents: i64,
    pub monthly_sales_cents: i64,
    pub today_transactions: i64,
    /// Most recent completed bills.
    pub recent_sales: Vec<BillSummary>,
    /// Lowest-stock active products at or below their reorder level.
    pub low_stock_products: Vec<StockRow>,
}

/// Inputs of [`dashboard`], gathered by the caller from one store.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInput<'a> {
    pub today: NaiveDate,
    pub products: &'a [Product],
    pub categories: &'a [Category],
    /// Completed bills of the month containing `today`.
    pub month_bills: &'a [BillSummary],
    /// Most recent completed bills, newest first.
    pub recent_bills: &'a [BillSummary],
}

pub fn dashboard(input: DashboardInput<'_>) -> DashboardSummary {
    let active: Vec<&Product> = input.products.iter().filter(|p| p.is_active()).collect();
    let count = |status: StockStatus| active.iter().filter(|p| p.stock_status() == status).count() as i64;

    let today = DateRange::day(input.today);
    let month = summarize(input.month_bills);
    let today_bills: Vec<BillSummary> = input
        .month_bills
        .iter()
        .filter(|b| today.contains(b.bill.sale_date))
        .cloned()
        .collect();
    let today_summary = summarize(&today_bills);

    let mut low_stock_products = stock_alerts(input.products, input.categories);
    low_stock_products.truncate(DASHBOARD_LOW_STOCK_ROWS);

    DashboardSummary {
        total_products: active.len() as i64,
        low_stock_items: count(StockStatus::LowStock),
        out_of_stock: count(StockStatus::OutOfStock),
        today_sales_cents: today_summary.total_revenue_cents,
        monthly_sales_cents: month.total_revenue_cents,
        today_transactions: today_summary.transaction_count,
        recent_sales: input
            .recent_bills
            .iter()
            .filter(|b| !b.bill.is_cancelled())
            .take(DASHBOARD_RECENT_BILLS)
            .cloned()
            .collect(),
        low_stock_products,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
