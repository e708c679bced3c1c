//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the rules of the shop as pure functions with zero I/O
//! dependencies. Storage lives in `stockroom-db`; orchestration of a sale as
//! one atomic unit lives in the `backoffice` app.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 backoffice (service layer)                      │   │
//! │  │   SalesEngine ── Catalog ── StockLedger ── Reports              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ pricing  │ │numbering│ │ report │  │   │
//! │  │   │ Product │ │  Money  │ │  Quote   │ │INV-date │ │Dashbrd │  │   │
//! │  │   │  Bill   │ │         │ │ Discount │ │  -NNNN  │ │ Sales  │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Storage Layer)                    │   │
//! │  │        InventoryStore / StoreTx, SQLite, in-memory              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, StockMovement, SalesBill, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Subtotal, tax, discount and total for a set of lines
//! - [`numbering`] - Date-scoped bill numbers (`INV-YYYYMMDD-NNNN`)
//! - [`query`] - Filters shared by every storage backend
//! - [`report`] - Read-only aggregations for dashboards and period reports
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::pricing::{price, Discount, PricingLine, PricingPolicy};
//! use stockroom_core::types::TaxRate;
//!
//! let lines = [PricingLine {
//!     unit_price: Money::from_cents(1000),
//!     quantity: 2,
//!     tax_rate: TaxRate::from_bps(500),
//! }];
//! let quote = price(&lines, &Discount::flat(Money::from_cents(100)), PricingPolicy::default())
//!     .unwrap();
//!
//! assert_eq!(quote.subtotal.cents(), 2000);
//! assert_eq!(quote.tax_amount.cents(), 100);
//! assert_eq!(quote.total.cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod query;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{Discount, PricingPolicy, Quote};
pub use query::{BillQuery, DateRange, ProductFilter, StockFilter};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines allowed on a single bill.
///
/// ## Business Reason
/// Prevents runaway requests and keeps a sale inside one short write unit.
pub const MAX_BILL_LINES: usize = 100;

/// Largest quantity a single line, receipt or adjustment may carry.
///
/// Keeps stock sums and `price × quantity` well inside `i64`.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Reorder level applied when a new product does not state one.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;
