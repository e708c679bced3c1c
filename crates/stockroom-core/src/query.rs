//! # Query Types
//!
//! Filters and windows shared by every storage backend. The SQLite backend
//! turns them into `WHERE` clauses; the in-memory backend calls the
//! `matches` helpers directly, so both agree on what a filter means.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{BillStatus, Product, RecordStatus, StockStatus};

// =============================================================================
// Product Filters
// =============================================================================

/// Catalog listing filter. Every field is optional; unset fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductFilter {
    /// Substring of the name or SKU, case-insensitive.
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub status: Option<RecordStatus>,
}

impl ProductFilter {
    /// Returns the trimmed search term, or `None` when it is blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            if !product.name.to_lowercase().contains(&term)
                && !product.sku.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        if let Some(category_id) = &self.category_id {
            if product.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if product.status != status {
                return false;
            }
        }
        true
    }
}

/// Stock listing filter over active products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockFilter {
    pub category_id: Option<String>,
    pub stock_status: Option<StockStatus>,
}

impl StockFilter {
    pub fn for_category(category_id: impl Into<String>) -> Self {
        StockFilter {
            category_id: Some(category_id.into()),
            stock_status: None,
        }
    }

    /// Inactive products never match.
    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_active() {
            return false;
        }
        if let Some(category_id) = &self.category_id {
            if product.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }
        match self.stock_status {
            Some(wanted) => product.stock_status() == wanted,
            None => true,
        }
    }
}

// =============================================================================
// Bill Listing
// =============================================================================

/// Paged bill listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    /// Only bills whose sale date falls on this UTC day.
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    pub status: Option<BillStatus>,
}

impl BillQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 200;

    /// Page number clamped to at least 1.
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.limit() as i64
    }

    /// Number of pages needed for `total` rows.
    pub fn pages(&self, total: i64) -> u32 {
        let limit = self.limit() as i64;
        ((total.max(0) + limit - 1) / limit) as u32
    }

    /// `[start, end)` window of the `date` filter, if any.
    pub fn date_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.date.map(|date| DateRange::day(date).bounds())
    }
}

impl Default for BillQuery {
    fn default() -> Self {
        BillQuery {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            date: None,
            status: None,
        }
    }
}

// =============================================================================
// Date Ranges
// =============================================================================

/// Inclusive range of UTC calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: format!("start {} is after end {}", start, end),
            });
        }
        Ok(DateRange { start, end })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange {
            start: date,
            end: date,
        }
    }

    /// Every day of `month` (1-12) in `year`.
    pub fn month(year: i32, month: u32) -> Result<Self, ValidationError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        })?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "year".to_string(),
                reason: format!("{} is outside the supported calendar", year),
            })?;
        Ok(DateRange { start, end })
    }

    /// Half-open timestamp window `[start 00:00, (end + 1 day) 00:00)`.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self
            .end
            .succ_opt()
            .map(|next| next.and_time(chrono::NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds();
        at >= start && at < end
    }

    /// Month label `YYYY-MM` of the start date.
    pub fn month_label(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(name: &str, sku: &str, qty: i64, reorder: i64) -> Product {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        Product {
            id: format!("p-{}", sku),
            name: name.to_string(),
            sku: sku.to_string(),
            category_id: Some("drinks".to_string()),
            purchase_price_cents: 50,
            selling_price_cents: 100,
            tax_rate_bps: 0,
            stock_qty: qty,
            reorder_level: reorder,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_filter_search_is_case_insensitive_on_name_and_sku() {
        let cola = product("Cola 330ml", "COLA-330", 20, 5);
        let filter = ProductFilter {
            search: Some("  cola ".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&cola));

        let by_sku = ProductFilter {
            search: Some("la-3".to_string()),
            ..Default::default()
        };
        assert!(by_sku.matches(&cola));

        let miss = ProductFilter {
            search: Some("tea".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&cola));
    }

    #[test]
    fn test_product_filter_category_and_status() {
        let mut cola = product("Cola", "COLA", 20, 5);
        let filter = ProductFilter {
            category_id: Some("snacks".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&cola));

        cola.status = RecordStatus::Inactive;
        let active_only = ProductFilter {
            status: Some(RecordStatus::Active),
            ..Default::default()
        };
        assert!(!active_only.matches(&cola));
    }

    #[test]
    fn test_stock_filter_by_status_excludes_inactive() {
        let low = product("Tea", "TEA", 3, 5);
        let filter = StockFilter {
            category_id: None,
            stock_status: Some(StockStatus::LowStock),
        };
        assert!(filter.matches(&low));

        let mut inactive = low.clone();
        inactive.status = RecordStatus::Inactive;
        assert!(!filter.matches(&inactive));
        assert!(StockFilter::for_category("drinks").matches(&low));
    }

    #[test]
    fn test_bill_query_paging() {
        let query = BillQuery {
            page: 3,
            limit: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
        assert_eq!(query.pages(41), 3);
        assert_eq!(query.pages(40), 2);
        assert_eq!(query.pages(0), 0);

        let silly = BillQuery {
            page: 0,
            limit: 0,
            ..Default::default()
        };
        assert_eq!(silly.page(), 1);
        assert_eq!(silly.limit(), 1);
        assert_eq!(silly.offset(), 0);
    }

    #[test]
    fn test_date_range_bounds_are_half_open() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let range = DateRange::day(day);

        assert!(range.contains(Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_month_range() {
        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.month_label(), "2024-02");

        let dec = DateRange::month(2025, 12).unwrap();
        assert_eq!(dec.end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        assert!(DateRange::month(2025, 13).is_err());
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let a = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(DateRange::new(a, b).is_err());
        assert!(DateRange::new(b, a).is_ok());
    }
}
