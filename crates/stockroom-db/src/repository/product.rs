//! # Product Repository
//!
//! Catalog rows and the cached on-hand quantity.
//!
//! ## Stock Column
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  products.stock_qty is a cache of Σ stock_movements.quantity_change.   │
//! │                                                                         │
//! │  update_details()  ── never touches stock_qty                           │
//! │  adjust_stock()    ── only called next to a ledger insert, inside the   │
//! │                       same write unit                                   │
//! │  CHECK (stock_qty >= 0) backs the service-level stock checks            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{Product, ProductFilter};

const PRODUCT_COLUMNS: &str = "id, name, sku, category_id, purchase_price_cents, selling_price_cents, \
     tax_rate_bps, stock_qty, reorder_level, status, created_at, updated_at";

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Exact SKU match. SQLite's default BINARY collation keeps it case-sensitive.
pub async fn find_by_sku(conn: &mut SqliteConnection, sku: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE sku = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(sku)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Lists products by name.
///
/// The search term is a literal substring of the name or SKU; `instr` avoids
/// LIKE wildcards in user input.
pub async fn list(conn: &mut SqliteConnection, filter: &ProductFilter) -> DbResult<Vec<Product>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM products
        WHERE (?1 IS NULL
               OR instr(lower(name), lower(?1)) > 0
               OR instr(lower(sku), lower(?1)) > 0)
          AND (?2 IS NULL OR category_id = ?2)
          AND (?3 IS NULL OR status = ?3)
        ORDER BY name, id
        "#,
        PRODUCT_COLUMNS
    );

    let products = sqlx::query_as::<_, Product>(&sql)
        .bind(filter.search_term())
        .bind(filter.category_id.as_deref())
        .bind(filter.status)
        .fetch_all(&mut *conn)
        .await?;

    debug!(count = products.len(), "Listed products");
    Ok(products)
}

pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, sku = %product.sku, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, sku, category_id,
            purchase_price_cents, selling_price_cents, tax_rate_bps,
            stock_qty, reorder_level, status,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9, ?10,
            ?11, ?12
        )
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(&product.category_id)
    .bind(product.purchase_price_cents)
    .bind(product.selling_price_cents)
    .bind(product.tax_rate_bps)
    .bind(product.stock_qty)
    .bind(product.reorder_level)
    .bind(product.status)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes every column except `stock_qty` and `created_at`.
pub async fn update_details(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, "Updating product details");

    let result = sqlx::query(
        r#"
        UPDATE products SET
            name = ?2,
            sku = ?3,
            category_id = ?4,
            purchase_price_cents = ?5,
            selling_price_cents = ?6,
            tax_rate_bps = ?7,
            reorder_level = ?8,
            status = ?9,
            updated_at = ?10
        WHERE id = ?1
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(&product.category_id)
    .bind(product.purchase_price_cents)
    .bind(product.selling_price_cents)
    .bind(product.tax_rate_bps)
    .bind(product.reorder_level)
    .bind(product.status)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", &product.id));
    }

    Ok(())
}

/// Adds `delta` to `stock_qty` and returns the new quantity.
///
/// The sum is taken in Rust: SQLite turns an overflowing integer sum into a
/// REAL, which would slip past the CHECK constraint.
pub async fn adjust_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    at: DateTime<Utc>,
) -> DbResult<i64> {
    debug!(product_id = %product_id, delta, "Adjusting cached stock");

    let current: Option<i64> = sqlx::query_scalar("SELECT stock_qty FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;
    let current = current.ok_or_else(|| DbError::not_found("Product", product_id))?;

    let new_qty = current
        .checked_add(delta)
        .ok_or_else(|| DbError::check_violation("products.stock_qty out of range"))?;

    sqlx::query("UPDATE products SET stock_qty = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(new_qty)
        .bind(at)
        .execute(&mut *conn)
        .await?;

    Ok(new_qty)
}
