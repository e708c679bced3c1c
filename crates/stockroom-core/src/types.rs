//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Model                                    │
//! │                                                                         │
//! │  Category ◄──── Product ◄──── StockMovement (append-only ledger)       │
//! │                    ▲                                                    │
//! │                    │ product_id (price/tax snapshotted)                 │
//! │                    │                                                    │
//! │  User ◄──────── SalesBill ◄──── SalesBillItem                          │
//! │   (actor)        status: Completed ──► Cancelled (one way)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closed Enumerations
//! Every "type" and "status" column is a Rust enum. With the `sqlx`
//! feature they map to lowercase TEXT columns guarded by CHECK constraints.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 825 bps = 8.25%. Used for product tax and percentage discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// 100% in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Declares `as_str`, `Display` and `FromStr` for a closed enumeration
/// using its storage spelling.
macro_rules! storage_names {
    ($ty:ident, $field:literal { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Storage and wire spelling of this value.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ValidationError::InvalidFormat {
                        field: $field.to_string(),
                        reason: format!(
                            "'{}' is not one of: {}",
                            other,
                            [$($name),+].join(", ")
                        ),
                    }),
                }
            }
        }
    };
}

/// Soft on/off flag for products, categories and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

storage_names!(RecordStatus, "status" { Active => "active", Inactive => "inactive" });

/// Role supplied by the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Sales,
}

storage_names!(Role, "role" { Admin => "admin", Sales => "sales" });

/// Why a stock quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Opening stock recorded when a product is created.
    Initial,
    /// Units leaving with a committed bill.
    Sale,
    /// Manual correction by an admin.
    Adjustment,
    /// Units received from a supplier.
    Purchase,
    /// Units returned by cancelling a bill.
    Cancellation,
}

storage_names!(MovementType, "movement_type" {
    Initial => "initial",
    Sale => "sale",
    Adjustment => "adjustment",
    Purchase => "purchase",
    Cancellation => "cancellation",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Currency amount taken off the subtotal.
    #[default]
    Flat,
    /// Percentage of the pre-tax subtotal.
    Percentage,
}

storage_names!(DiscountType, "discount_type" { Flat => "flat", Percentage => "percentage" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

storage_names!(PaymentMethod, "payment_method" { Cash => "cash", Card => "card", Online => "online" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Paid,
    Pending,
}

storage_names!(PaymentStatus, "payment_status" { Paid => "paid", Pending => "pending" });

/// Lifecycle of a bill: `Completed` → `Cancelled`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    #[default]
    Completed,
    Cancelled,
}

storage_names!(BillStatus, "status" { Completed => "completed", Cancelled => "cancelled" });

/// Derived availability of a product. Computed on read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

storage_names!(StockStatus, "stock_status" {
    InStock => "in_stock",
    LowStock => "low_stock",
    OutOfStock => "out_of_stock",
});

impl StockStatus {
    /// Classifies a quantity against its reorder level.
    ///
    /// ```rust
    /// use stockroom_core::types::StockStatus;
    ///
    /// assert_eq!(StockStatus::classify(0, 10), StockStatus::OutOfStock);
    /// assert_eq!(StockStatus::classify(10, 10), StockStatus::LowStock);
    /// assert_eq!(StockStatus::classify(11, 10), StockStatus::InStock);
    /// ```
    pub fn classify(stock_qty: i64, reorder_level: i64) -> Self {
        if stock_qty <= 0 {
            StockStatus::OutOfStock
        } else if stock_qty <= reorder_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

// =============================================================================
// Actor, User, Category
// =============================================================================

/// The authenticated identity performing an operation.
///
/// Supplied by the caller layer and trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog with its cached on-hand quantity.
///
/// `stock_qty` only ever changes together with a [`StockMovement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on bills and reports.
    pub name: String,

    /// Stock Keeping Unit - unique, case-sensitive business identifier.
    pub sku: String,

    pub category_id: Option<String>,

    /// Cost price in cents.
    pub purchase_price_cents: i64,

    /// Selling price in cents (>= 0).
    pub selling_price_cents: i64,

    /// Tax rate in basis points (0..=10000).
    pub tax_rate_bps: u32,

    /// On-hand quantity. Never negative.
    pub stock_qty: i64,

    /// At or below this quantity the product is flagged low-stock.
    pub reorder_level: i64,

    pub status: RecordStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    #[inline]
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.stock_qty, self.reorder_level)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One append-only ledger fact. Never updated or deleted.
///
/// Replaying every movement of a product from zero yields its `stock_qty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Signed change; positive = increase.
    pub quantity_change: i64,
    pub reason: Option<String>,
    /// Acting user.
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A ledger entry with the acting user's display name, for audit screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementRecord {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub movement: StockMovement,
    pub user_name: Option<String>,
}

// =============================================================================
// Sales Bill
// =============================================================================

/// A completed or cancelled sale.
///
/// ## Invariant
/// `total_cents == subtotal_cents + tax_cents - discount_cents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesBill {
    pub id: String,
    /// `INV-YYYYMMDD-NNNN`, unique.
    pub bill_number: String,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Discount amount actually taken off (already resolved from a percentage).
    pub discount_cents: i64,
    pub discount_type: DiscountType,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BillStatus,
    /// Acting user (cashier).
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SalesBill {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.status == BillStatus::Cancelled
    }
}

/// A line item. Uses snapshot pattern to freeze price and tax at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesBillItem {
    pub id: String,
    pub bill_id: String,
    pub product_id: String,
    /// Quantity sold (> 0).
    pub quantity: i64,
    /// Selling price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Tax rate at time of sale (frozen).
    pub tax_rate_bps: u32,
    /// `unit_price × quantity × (1 + tax)`, rounded to cents.
    pub line_total_cents: i64,
}

/// A bill together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillDetail {
    #[serde(flatten)]
    pub bill: SalesBill,
    pub items: Vec<SalesBillItem>,
}

/// A bill row for listings, joined with the cashier's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BillSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub bill: SalesBill,
    pub cashier_name: Option<String>,
}

/// One page of a bill listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillPage {
    pub bills: Vec<BillSummary>,
    pub total: i64,
    pub page: u32,
    pub pages: u32,
}

/// A sold line joined with its product, the input of product sales reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SoldLine {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub category_name: Option<String>,
    pub quantity: i64,
    pub line_total_cents: i64,
}

// =============================================================================
// Requests
// =============================================================================

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

impl SaleLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        SaleLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Input of a new product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub category_id: Option<String>,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    pub tax_rate_bps: u32,
    /// Opening stock; recorded as an `initial` ledger entry when positive.
    pub stock_qty: i64,
    /// Falls back to the configured default when absent.
    pub reorder_level: Option<i64>,
}

/// Partial update of a product. `None` leaves a field unchanged.
///
/// Has no stock field: stock only moves through the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category_id: Option<String>,
    pub purchase_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub tax_rate_bps: Option<u32>,
    pub reorder_level: Option<i64>,
    pub status: Option<RecordStatus>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_stock_status_boundaries() {
        assert_eq!(StockStatus::classify(0, 0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(1, 0), StockStatus::InStock);
        assert_eq!(StockStatus::classify(1, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(6, 5), StockStatus::InStock);
    }

    #[test]
    fn test_storage_names_round_trip_through_from_str() {
        assert_eq!("cancellation".parse::<MovementType>(), Ok(MovementType::Cancellation));
        assert_eq!(PaymentMethod::Online.as_str(), "online");
        assert_eq!(StockStatus::LowStock.to_string(), "low_stock");

        let err = "cheque".parse::<PaymentMethod>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "payment_method has invalid format: 'cheque' is not one of: cash, card, online"
        );
    }

    #[test]
    fn test_enum_serde_uses_snake_case() {
        let json = serde_json::to_string(&StockStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"out_of_stock\"");

        let status: BillStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, BillStatus::Cancelled);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(BillStatus::default(), BillStatus::Completed);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Paid);
        assert_eq!(DiscountType::default(), DiscountType::Flat);
        assert_eq!(RecordStatus::default(), RecordStatus::Active);
    }
}
