//! # Pricing Calculator
//!
//! Pure function from priced lines and a discount to bill figures.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line_subtotal = unit_price × quantity                (exact cents)     │
//! │  line_tax      = line_subtotal × tax_bps / 10000      (kept exact)      │
//! │                                                                         │
//! │  subtotal      = Σ line_subtotal                                        │
//! │  tax_amount    = round(Σ line_tax)                                      │
//! │  discount      = flat       → amount                                    │
//! │                  percentage → round(subtotal × bps / 10000)             │
//! │  total         = subtotal + tax_amount − discount                       │
//! │                                                                         │
//! │  The discount never applies to tax. Rounding happens once per figure   │
//! │  that gets persisted, so `total` reconciles to the cent.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, BPS_SCALE};
use crate::types::{DiscountType, TaxRate};

// =============================================================================
// Inputs
// =============================================================================

/// A line as seen by the calculator: snapshotted price and tax plus quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingLine {
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_rate: TaxRate,
}

/// Bill-level discount requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Currency amount in cents.
    Flat { amount_cents: i64 },
    /// Percentage of the pre-tax subtotal, in basis points.
    Percentage { rate_bps: u32 },
}

impl Discount {
    pub fn flat(amount: Money) -> Self {
        Discount::Flat {
            amount_cents: amount.cents(),
        }
    }

    pub fn percentage(rate: TaxRate) -> Self {
        Discount::Percentage {
            rate_bps: rate.bps(),
        }
    }

    /// The type recorded on the bill. No discount is recorded as a zero flat one.
    pub fn discount_type(&self) -> DiscountType {
        match self {
            Discount::None | Discount::Flat { .. } => DiscountType::Flat,
            Discount::Percentage { .. } => DiscountType::Percentage,
        }
    }

    /// Checks the discount amount is usable before any store access.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Discount::None => Ok(()),
            Discount::Flat { amount_cents } if amount_cents < 0 => {
                Err(ValidationError::must_not_be_negative("discount"))
            }
            Discount::Flat { .. } => Ok(()),
            Discount::Percentage { rate_bps } if rate_bps > TaxRate::MAX_BPS => {
                Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: TaxRate::MAX_BPS as i64,
                })
            }
            Discount::Percentage { .. } => Ok(()),
        }
    }
}

/// Product decision on totals driven below zero by a large flat discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PricingPolicy {
    /// When set, the discount is reduced so the total floors at zero.
    /// Off by default: the total may go negative.
    pub clamp_negative_total: bool,
}

// =============================================================================
// Outputs
// =============================================================================

/// One priced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_rate: TaxRate,
    /// `unit_price × quantity`
    pub line_subtotal: Money,
    /// `line_subtotal × (1 + tax)`, rounded.
    pub line_total: Money,
}

/// Figures of a bill, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub discount_type: DiscountType,
    pub total: Money,
}

// =============================================================================
// Calculator
// =============================================================================

/// Prices a set of lines.
///
/// ## Errors
/// - `Required` if there are no lines
/// - `MustBePositive` for a zero or negative quantity
/// - `MustNotBeNegative` for a negative unit price or flat discount
/// - `OutOfRange` for a tax or discount rate above 100%, or for figures
///   that do not fit in 64-bit cents
///
/// ## Example
/// ```rust
/// use stockroom_core::money::Money;
/// use stockroom_core::pricing::{price, Discount, PricingLine, PricingPolicy};
/// use stockroom_core::types::TaxRate;
///
/// let lines = [PricingLine {
///     unit_price: Money::from_cents(2500),
///     quantity: 2,
///     tax_rate: TaxRate::zero(),
/// }];
/// let quote = price(&lines, &Discount::percentage(TaxRate::from_bps(1000)), PricingPolicy::default())
///     .unwrap();
/// assert_eq!(quote.discount_amount.cents(), 500);
/// assert_eq!(quote.total.cents(), 4500);
/// ```
pub fn price(
    lines: &[PricingLine],
    discount: &Discount,
    policy: PricingPolicy,
) -> Result<Quote, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::required("items"));
    }
    discount.validate()?;

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();
    let mut exact_tax: i128 = 0;

    for line in lines {
        if line.quantity <= 0 {
            return Err(ValidationError::must_be_positive("quantity"));
        }
        if line.unit_price.is_negative() {
            return Err(ValidationError::must_not_be_negative("unit_price"));
        }
        if line.tax_rate.bps() > TaxRate::MAX_BPS {
            return Err(ValidationError::OutOfRange {
                field: "tax_pct".to_string(),
                min: 0,
                max: TaxRate::MAX_BPS as i64,
            });
        }

        let line_subtotal = line
            .unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| ValidationError::too_large("line_subtotal"))?;
        let line_tax = line_subtotal.scaled_by(line.tax_rate);
        let line_total = to_cents(line_subtotal.cents() as i128 * BPS_SCALE + line_tax, "line_total")?;

        subtotal = subtotal
            .checked_add(line_subtotal)
            .ok_or_else(|| ValidationError::too_large("subtotal"))?;
        exact_tax += line_tax;

        priced.push(PricedLine {
            unit_price: line.unit_price,
            quantity: line.quantity,
            tax_rate: line.tax_rate,
            line_subtotal,
            line_total,
        });
    }

    let tax_amount = to_cents(exact_tax, "tax_amount")?;
    let gross = subtotal
        .checked_add(tax_amount)
        .ok_or_else(|| ValidationError::too_large("total"))?;

    let mut discount_amount = match *discount {
        Discount::None => Money::zero(),
        Discount::Flat { amount_cents } => Money::from_cents(amount_cents),
        Discount::Percentage { rate_bps } => subtotal.percentage(TaxRate::from_bps(rate_bps)),
    };

    if policy.clamp_negative_total && discount_amount > gross {
        discount_amount = gross;
    }

    let total = gross
        .checked_sub(discount_amount)
        .ok_or_else(|| ValidationError::too_large("total"))?;

    Ok(Quote {
        lines: priced,
        subtotal,
        tax_amount,
        discount_amount,
        discount_type: discount.discount_type(),
        total,
    })
}

/// Rounds an exact 1/10000-cent figure, refusing values outside `i64` cents.
fn to_cents(scaled: i128, field: &str) -> Result<Money, ValidationError> {
    let bound = i64::MAX as i128 * BPS_SCALE;
    if scaled > bound || scaled < -bound {
        return Err(ValidationError::too_large(field));
    }
    Ok(Money::from_bps_scaled(scaled))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, quantity: i64, tax_bps: u32) -> PricingLine {
        PricingLine {
            unit_price: Money::from_cents(price_cents),
            quantity,
            tax_rate: TaxRate::from_bps(tax_bps),
        }
    }

    #[test]
    fn test_flat_discount_scenario() {
        // 2 × 10.00 at 5%, flat 1.00 off
        let quote = price(
            &[line(1000, 2, 500)],
            &Discount::flat(Money::from_cents(100)),
            PricingPolicy::default(),
        )
        .unwrap();

        assert_eq!(quote.subtotal.cents(), 2000);
        assert_eq!(quote.tax_amount.cents(), 100);
        assert_eq!(quote.discount_amount.cents(), 100);
        assert_eq!(quote.total.cents(), 2000);
        assert_eq!(quote.discount_type, DiscountType::Flat);
        assert_eq!(quote.lines[0].line_total.cents(), 2100);
    }

    #[test]
    fn test_percentage_discount_is_taken_from_pre_tax_subtotal() {
        let quote = price(
            &[line(2000, 1, 1000), line(3000, 1, 0)],
            &Discount::percentage(TaxRate::from_bps(1000)),
            PricingPolicy::default(),
        )
        .unwrap();

        assert_eq!(quote.subtotal.cents(), 5000);
        assert_eq!(quote.tax_amount.cents(), 200);
        // 10% of 50.00, not of 52.00
        assert_eq!(quote.discount_amount.cents(), 500);
        assert_eq!(quote.total.cents(), 4700);
        assert_eq!(quote.discount_type, DiscountType::Percentage);
    }

    #[test]
    fn test_totals_reconcile_across_awkward_rates() {
        let lines = [line(333, 3, 825), line(1999, 7, 1250), line(1, 1, 1)];
        let quote = price(&lines, &Discount::None, PricingPolicy::default()).unwrap();

        let subtotal: i64 = lines.iter().map(|l| l.unit_price.cents() * l.quantity).sum();
        assert_eq!(quote.subtotal.cents(), subtotal);
        assert_eq!(
            quote.total,
            quote.subtotal + quote.tax_amount - quote.discount_amount
        );
    }

    #[test]
    fn test_tax_is_rounded_once_not_per_line() {
        // Three lines each carrying half a cent of tax.
        let lines = [line(10, 1, 500), line(10, 1, 500), line(10, 1, 500)];
        let quote = price(&lines, &Discount::None, PricingPolicy::default()).unwrap();
        assert_eq!(quote.tax_amount.cents(), 2);
        // Each persisted line total still rounds on its own.
        assert!(quote.lines.iter().all(|l| l.line_total.cents() == 11));
    }

    #[test]
    fn test_oversized_flat_discount_goes_negative_by_default() {
        let quote = price(
            &[line(500, 1, 0)],
            &Discount::flat(Money::from_cents(800)),
            PricingPolicy::default(),
        )
        .unwrap();
        assert_eq!(quote.total.cents(), -300);
    }

    #[test]
    fn test_clamp_policy_floors_total_at_zero() {
        let policy = PricingPolicy {
            clamp_negative_total: true,
        };
        let quote = price(&[line(500, 1, 1000)], &Discount::flat(Money::from_cents(800)), policy)
            .unwrap();
        assert_eq!(quote.discount_amount.cents(), 550);
        assert_eq!(quote.total, Money::zero());
    }

    #[test]
    fn test_rejects_bad_input() {
        let none = Discount::None;
        let policy = PricingPolicy::default();

        assert_eq!(
            price(&[], &none, policy),
            Err(ValidationError::required("items"))
        );
        assert_eq!(
            price(&[line(100, 0, 0)], &none, policy),
            Err(ValidationError::must_be_positive("quantity"))
        );
        assert!(price(&[line(100, 1, 10_001)], &none, policy).is_err());
        assert!(price(
            &[line(100, 1, 0)],
            &Discount::Flat { amount_cents: -1 },
            policy
        )
        .is_err());
        assert!(price(
            &[line(100, 1, 0)],
            &Discount::Percentage { rate_bps: 10_001 },
            policy
        )
        .is_err());
    }

    #[test]
    fn test_figures_beyond_i64_cents_are_rejected() {
        let policy = PricingPolicy::default();
        let half = i64::MAX / 2 + 1;

        // A single line whose subtotal overflows
        assert_eq!(
            price(&[line(1000, i64::MAX / 200, 0)], &Discount::None, policy),
            Err(ValidationError::too_large("line_subtotal"))
        );
        // Two lines that fit alone but not together
        assert_eq!(
            price(&[line(half, 1, 0), line(half, 1, 0)], &Discount::None, policy),
            Err(ValidationError::too_large("subtotal"))
        );
        // Tax pushing the total past the limit
        assert!(price(&[line(half, 1, 10_000)], &Discount::None, policy).is_err());
        // A flat discount large enough to underflow the total
        assert_eq!(
            price(&[line(0, 1, 0)], &Discount::Flat { amount_cents: i64::MAX }, policy)
                .map(|q| q.total.cents()),
            Ok(-i64::MAX)
        );
    }

    #[test]
    fn test_discount_serde_shape() {
        let json = serde_json::to_string(&Discount::Percentage { rate_bps: 1000 }).unwrap();
        assert_eq!(json, r#"{"type":"percentage","rate_bps":1000}"#);

        let parsed: Discount = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(parsed, Discount::None);
    }
}
