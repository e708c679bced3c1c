//! # Bill Repository
//!
//! Sales bills, their items, and the read queries behind reports.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Lifecycle                                    │
//! │                                                                         │
//! │  1. NUMBER    numbers_with_prefix("INV-20250314-") → max + 1           │
//! │  2. INSERT    insert() + insert_item() × N       (same write unit)     │
//! │               status = completed                                        │
//! │  3. CANCEL    set_status(cancelled)              (once, one way)       │
//! │                                                                         │
//! │  Items are never updated. Bills are never deleted.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::store::SaleWindow;
use stockroom_core::{
    BillPage, BillQuery, BillStatus, BillSummary, SalesBill, SalesBillItem, SoldLine,
};

const BILL_COLUMNS: &str = "sb.id AS id, sb.bill_number AS bill_number, sb.sale_date AS sale_date, \
     sb.subtotal_cents AS subtotal_cents, sb.tax_cents AS tax_cents, \
     sb.discount_cents AS discount_cents, sb.discount_type AS discount_type, \
     sb.total_cents AS total_cents, sb.payment_method AS payment_method, \
     sb.payment_status AS payment_status, sb.status AS status, sb.user_id AS user_id, \
     sb.created_at AS created_at";

// =============================================================================
// Writes
// =============================================================================

/// Bill numbers starting with `prefix`, e.g. every number of one day.
pub async fn numbers_with_prefix(conn: &mut SqliteConnection, prefix: &str) -> DbResult<Vec<String>> {
    let numbers: Vec<String> = sqlx::query_scalar(
        "SELECT bill_number FROM sales_bills WHERE substr(bill_number, 1, length(?1)) = ?1",
    )
    .bind(prefix)
    .fetch_all(&mut *conn)
    .await?;

    Ok(numbers)
}

pub async fn insert(conn: &mut SqliteConnection, bill: &SalesBill) -> DbResult<()> {
    debug!(id = %bill.id, bill_number = %bill.bill_number, "Inserting bill");

    sqlx::query(
        r#"
        INSERT INTO sales_bills (
            id, bill_number, sale_date,
            subtotal_cents, tax_cents, discount_cents, discount_type, total_cents,
            payment_method, payment_status, status,
            user_id, created_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11,
            ?12, ?13
        )
        "#,
    )
    .bind(&bill.id)
    .bind(&bill.bill_number)
    .bind(bill.sale_date)
    .bind(bill.subtotal_cents)
    .bind(bill.tax_cents)
    .bind(bill.discount_cents)
    .bind(bill.discount_type)
    .bind(bill.total_cents)
    .bind(bill.payment_method)
    .bind(bill.payment_status)
    .bind(bill.status)
    .bind(&bill.user_id)
    .bind(bill.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one line item.
///
/// ## Snapshot Pattern
/// Price and tax are copied from the product at sale time, so later catalog
/// edits never change a committed bill.
pub async fn insert_item(conn: &mut SqliteConnection, item: &SalesBillItem) -> DbResult<()> {
    debug!(bill_id = %item.bill_id, product_id = %item.product_id, "Inserting bill item");

    sqlx::query(
        r#"
        INSERT INTO sales_bill_items (
            id, bill_id, product_id, quantity,
            unit_price_cents, tax_rate_bps, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.bill_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.tax_rate_bps)
    .bind(item.line_total_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn set_status(conn: &mut SqliteConnection, id: &str, status: BillStatus) -> DbResult<()> {
    debug!(id = %id, status = %status, "Setting bill status");

    let result = sqlx::query("UPDATE sales_bills SET status = ?2 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Bill", id));
    }

    Ok(())
}

// =============================================================================
// Reads
// =============================================================================

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SalesBill>> {
    let sql = format!("SELECT {} FROM sales_bills sb WHERE sb.id = ?1", BILL_COLUMNS);
    let bill = sqlx::query_as::<_, SalesBill>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(bill)
}

pub async fn items(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<Vec<SalesBillItem>> {
    let items = sqlx::query_as::<_, SalesBillItem>(
        r#"
        SELECT id, bill_id, product_id, quantity, unit_price_cents, tax_rate_bps, line_total_cents
        FROM sales_bill_items
        WHERE bill_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(bill_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// One page of bills, newest first, joined with the cashier's name.
pub async fn list(conn: &mut SqliteConnection, query: &BillQuery) -> DbResult<BillPage> {
    let (from, until) = match query.date_bounds() {
        Some((from, until)) => (Some(from), Some(until)),
        None => (None, None),
    };

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM sales_bills
        WHERE (?1 IS NULL OR sale_date >= ?1)
          AND (?2 IS NULL OR sale_date < ?2)
          AND (?3 IS NULL OR status = ?3)
        "#,
    )
    .bind(from)
    .bind(until)
    .bind(query.status)
    .fetch_one(&mut *conn)
    .await?;

    let sql = format!(
        r#"
        SELECT {}, u.name AS cashier_name
        FROM sales_bills sb
        LEFT JOIN users u ON u.id = sb.user_id
        WHERE (?1 IS NULL OR sb.sale_date >= ?1)
          AND (?2 IS NULL OR sb.sale_date < ?2)
          AND (?3 IS NULL OR sb.status = ?3)
        ORDER BY sb.sale_date DESC, sb.rowid DESC
        LIMIT ?4 OFFSET ?5
        "#,
        BILL_COLUMNS
    );

    let bills = sqlx::query_as::<_, BillSummary>(&sql)
        .bind(from)
        .bind(until)
        .bind(query.status)
        .bind(query.limit() as i64)
        .bind(query.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok(BillPage {
        bills,
        total,
        page: query.page(),
        pages: query.pages(total),
    })
}

/// Completed bills in `window`, newest first. `limit` caps the row count.
pub async fn completed(
    conn: &mut SqliteConnection,
    window: SaleWindow,
    limit: Option<u32>,
) -> DbResult<Vec<BillSummary>> {
    let sql = format!(
        r#"
        SELECT {}, u.name AS cashier_name
        FROM sales_bills sb
        LEFT JOIN users u ON u.id = sb.user_id
        WHERE sb.status = 'completed'
          AND (?1 IS NULL OR sb.sale_date >= ?1)
          AND (?2 IS NULL OR sb.sale_date < ?2)
        ORDER BY sb.sale_date DESC, sb.rowid DESC
        LIMIT ?3
        "#,
        BILL_COLUMNS
    );

    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map_or(-1, i64::from);

    let bills = sqlx::query_as::<_, BillSummary>(&sql)
        .bind(window.from)
        .bind(window.until)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

    Ok(bills)
}

/// Items of completed bills in `window`, joined with product and category.
pub async fn sold_lines(
    conn: &mut SqliteConnection,
    window: SaleWindow,
    category_id: Option<&str>,
) -> DbResult<Vec<SoldLine>> {
    let lines = sqlx::query_as::<_, SoldLine>(
        r#"
        SELECT p.id AS product_id,
               p.name AS product_name,
               p.sku AS sku,
               c.name AS category_name,
               sbi.quantity AS quantity,
               sbi.line_total_cents AS line_total_cents
        FROM sales_bill_items sbi
        JOIN sales_bills sb ON sb.id = sbi.bill_id
        JOIN products p ON p.id = sbi.product_id
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE sb.status = 'completed'
          AND (?1 IS NULL OR sb.sale_date >= ?1)
          AND (?2 IS NULL OR sb.sale_date < ?2)
          AND (?3 IS NULL OR p.category_id = ?3)
        ORDER BY sb.sale_date, sbi.rowid
        "#,
    )
    .bind(window.from)
    .bind(window.until)
    .bind(category_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}
