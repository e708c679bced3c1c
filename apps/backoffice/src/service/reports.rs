//! # Reporting Aggregator
//!
//! Read-only projections over committed data. The store supplies rows,
//! `stockroom_core::report` does the arithmetic.
//!
//! Cancelled bills never count towards revenue, and inactive products never
//! appear in stock figures.

use chrono::{Datelike, NaiveDate};
use stockroom_core::report::{
    self, DailySalesReport, DashboardInput, DashboardSummary, MonthlySalesReport,
    ProductSalesRow, StockRow, DASHBOARD_RECENT_BILLS,
};
use stockroom_core::{DateRange, ProductFilter, StockFilter};
use stockroom_db::SaleWindow;
use tracing::debug;

use super::Backoffice;
use crate::clock::Clock;
use crate::error::ServiceResult;

fn window(range: DateRange) -> SaleWindow {
    let (from, until) = range.bounds();
    SaleWindow::between(from, until)
}

impl Backoffice {
    /// Landing-page figures for today and the current month.
    pub async fn dashboard(&self) -> ServiceResult<DashboardSummary> {
        let today = self.clock.today();
        let month = DateRange::month(today.year(), today.month())?;

        let products = self.store.list_products(&ProductFilter::default()).await?;
        let categories = self.store.list_categories().await?;
        let month_bills = self.store.completed_bills(window(month)).await?;
        let recent_bills = self
            .store
            .recent_completed_bills(DASHBOARD_RECENT_BILLS as u32)
            .await?;

        let summary = report::dashboard(DashboardInput {
            today,
            products: &products,
            categories: &categories,
            month_bills: &month_bills,
            recent_bills: &recent_bills,
        });
        debug!(
            today = %today,
            today_sales = summary.today_sales_cents,
            monthly_sales = summary.monthly_sales_cents,
            "Dashboard built"
        );
        Ok(summary)
    }

    /// Completed bills of `date` (today when `None`) with their totals.
    pub async fn daily_sales(&self, date: Option<NaiveDate>) -> ServiceResult<DailySalesReport> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let bills = self.store.completed_bills(window(DateRange::day(date))).await?;
        Ok(report::daily_sales(date, &bills))
    }

    /// Per-day rollup of a calendar month.
    ///
    /// ## Errors
    /// - `Validation` for a month outside 1-12
    pub async fn monthly_sales(&self, year: i32, month: u32) -> ServiceResult<MonthlySalesReport> {
        let range = DateRange::month(year, month)?;
        let bills = self.store.completed_bills(window(range)).await?;
        Ok(report::monthly_sales(range, &bills))
    }

    /// Units and revenue per product, highest revenue first.
    ///
    /// Both filters are optional: no range means all time, no category
    /// means every category.
    pub async fn product_sales(
        &self,
        range: Option<DateRange>,
        category_id: Option<&str>,
    ) -> ServiceResult<Vec<ProductSalesRow>> {
        let sale_window = range.map(window).unwrap_or_default();
        let lines = self.store.sold_lines(sale_window, category_id).await?;
        Ok(report::product_sales(&lines))
    }

    /// Stock snapshot of active products, lowest quantity first.
    pub async fn list_stock(&self, filter: &StockFilter) -> ServiceResult<Vec<StockRow>> {
        let products = self.store.list_products(&ProductFilter::default()).await?;
        let categories = self.store.list_categories().await?;
        Ok(report::stock_rows(&products, &categories, filter))
    }

    /// Stock snapshot, optionally for one category.
    pub async fn stock_report(&self, category_id: Option<&str>) -> ServiceResult<Vec<StockRow>> {
        let filter = category_id.map(StockFilter::for_category).unwrap_or_default();
        self.list_stock(&filter).await
    }

    /// Active products at or below their reorder level.
    pub async fn stock_alerts(&self) -> ServiceResult<Vec<StockRow>> {
        let products = self.store.list_products(&ProductFilter::default()).await?;
        let categories = self.store.list_categories().await?;
        Ok(report::stock_alerts(&products, &categories))
    }
}
