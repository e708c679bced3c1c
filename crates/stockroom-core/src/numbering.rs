//! # Bill Numbering
//!
//! Human-readable, date-scoped bill identifiers.
//!
//! ## Format
//! ```text
//! INV-20250314-0007
//! ─┬─ ───┬──── ──┬─
//!  │     │       └── sequence within the day, zero padded to 4, from 0001
//!  │     └────────── business date (UTC calendar date)
//!  └──────────────── fixed prefix
//! ```
//!
//! The next number is `max(existing sequence for the date) + 1`. The caller
//! must read the existing numbers inside the same write unit that inserts the
//! bill, otherwise two concurrent sales could both compute the same value.
//! Past 9999 the sequence keeps counting with more digits.

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Fixed prefix of every bill number.
pub const BILL_PREFIX: &str = "INV";

/// Width the sequence is zero padded to.
pub const SEQUENCE_WIDTH: usize = 4;

/// Returns the prefix shared by every bill of `date`, e.g. `INV-20250314-`.
pub fn date_prefix(date: NaiveDate) -> String {
    format!("{}-{}-", BILL_PREFIX, date.format("%Y%m%d"))
}

/// Formats a bill number for `date` and `sequence`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use stockroom_core::numbering::format_bill_number;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// assert_eq!(format_bill_number(date, 7), "INV-20250314-0007");
/// ```
pub fn format_bill_number(date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}{:0width$}",
        date_prefix(date),
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Extracts the sequence from a bill number of `date`.
///
/// Returns `None` for numbers of another date or with a malformed suffix.
pub fn parse_sequence(bill_number: &str, date: NaiveDate) -> Option<u32> {
    let suffix = bill_number.strip_prefix(&date_prefix(date))?;
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Computes the next bill number for `date` from the numbers already issued.
///
/// Numbers that do not belong to `date` are ignored, so callers may pass a
/// superset.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stockroom_core::numbering::next_bill_number;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// let issued = ["INV-20250314-0001", "INV-20250314-0002"];
/// assert_eq!(next_bill_number(date, issued).unwrap(), "INV-20250314-0003");
/// ```
pub fn next_bill_number<I, S>(date: NaiveDate, existing: I) -> Result<String, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = existing
        .into_iter()
        .filter_map(|number| parse_sequence(number.as_ref(), date))
        .max()
        .unwrap_or(0);

    let next = max.checked_add(1).ok_or_else(|| ValidationError::OutOfRange {
        field: "bill sequence".to_string(),
        min: 1,
        max: u32::MAX as i64,
    })?;

    Ok(format_bill_number(date, next))
}

// =============================================================================
// Unit Tests
// =============================================================================
