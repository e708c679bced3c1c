//! # Validation Module
//!
//! Input validation for catalog, ledger and sale requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP handler, CLI)                                   │
//! │  ├── Deserialization into typed requests                               │
//! │  └── Role checks (admin-gated operations)                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service (backoffice)                                         │
//! │  └── THIS MODULE: field rules, run before any store access             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (inside the write unit)                                │
//! │  ├── Existence, active status, available stock                         │
//! │  └── UNIQUE / CHECK / foreign key constraints (SQLite)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("COLA-330").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{NewProduct, ProductUpdate, SaleLine, TaxRate};
use crate::{MAX_BILL_LINES, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_SKU_LEN: usize = 50;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_SEARCH_LEN: usize = 100;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// SKUs are matched case-sensitively, so no case folding happens here.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("COLA-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, category, user).
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_name;
///
/// assert!(validate_name("name", "Cola 330ml").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string. Empty means "no search".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

/// Validates the free-text reason of a manual stock adjustment.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::required("reason"));
    }

    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(())
}

/// Light structural check of an email address: `local@domain.tld`.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Sale: add line                                                         │
/// │                                                                         │
/// │  Cashier enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       ├── qty > MAX_QUANTITY? → Error: out of range                    │
/// │       │                                                                 │
/// │       └── OK → stock check inside the write unit                       │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }
    if qty > MAX_QUANTITY {
        return Err(quantity_out_of_range("quantity", 1));
    }

    Ok(())
}

fn quantity_out_of_range(field: &str, min: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max: MAX_QUANTITY,
    }
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("selling_price", 1099).is_ok());
/// assert!(validate_price_cents("selling_price", 0).is_ok());
/// assert!(validate_price_cents("selling_price", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::must_not_be_negative(field));
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > TaxRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_pct".to_string(),
            min: 0,
            max: TaxRate::MAX_BPS as i64,
        });
    }

    Ok(())
}

pub fn validate_reorder_level(level: i64) -> ValidationResult<()> {
    if level < 0 {
        return Err(ValidationError::must_not_be_negative("reorder_level"));
    }

    Ok(())
}

/// Opening stock of a new product. Zero means "no initial movement".
pub fn validate_opening_stock(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::must_not_be_negative("stock_qty"));
    }
    if qty > MAX_QUANTITY {
        return Err(quantity_out_of_range("stock_qty", 0));
    }

    Ok(())
}

/// A manual adjustment must change something.
pub fn validate_quantity_change(change: i64) -> ValidationResult<()> {
    if change == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "quantity_change".to_string(),
            reason: "must not be zero".to_string(),
        });
    }
    if change.unsigned_abs() > MAX_QUANTITY as u64 {
        return Err(quantity_out_of_range("quantity_change", -MAX_QUANTITY));
    }

    Ok(())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates the shape of a sale request before any store access: 1 to
/// `MAX_BILL_LINES` lines, UUID product ids, bounded positive quantities.
///
/// Existence, active status and available stock are checked later, inside
/// the write unit.
pub fn validate_sale_lines(lines: &[SaleLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::required("items"));
    }

    if lines.len() > MAX_BILL_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_BILL_LINES as i64,
        });
    }

    for line in lines {
        validate_uuid("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

pub fn validate_new_product(spec: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &spec.name)?;
    validate_sku(&spec.sku)?;
    validate_price_cents("purchase_price", spec.purchase_price_cents)?;
    validate_price_cents("selling_price", spec.selling_price_cents)?;
    validate_tax_rate_bps(spec.tax_rate_bps)?;
    validate_opening_stock(spec.stock_qty)?;
    if let Some(level) = spec.reorder_level {
        validate_reorder_level(level)?;
    }
    Ok(())
}

pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    if let Some(sku) = &update.sku {
        validate_sku(sku)?;
    }
    if let Some(cents) = update.purchase_price_cents {
        validate_price_cents("purchase_price", cents)?;
    }
    if let Some(cents) = update.selling_price_cents {
        validate_price_cents("selling_price", cents)?;
    }
    if let Some(bps) = update.tax_rate_bps {
        validate_tax_rate_bps(bps)?;
    }
    if let Some(level) = update.reorder_level {
        validate_reorder_level(level)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
