//! # Ledger Repository
//!
//! The append-only `stock_movements` table. There is no update or delete.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{MovementRecord, StockMovement};

pub async fn insert(conn: &mut SqliteConnection, movement: &StockMovement) -> DbResult<()> {
    debug!(
        id = %movement.id,
        product_id = %movement.product_id,
        movement_type = %movement.movement_type,
        quantity_change = movement.quantity_change,
        "Appending stock movement"
    );

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, movement_type, quantity_change, reason, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity_change)
    .bind(&movement.reason)
    .bind(&movement.user_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// History of a product, newest first. Ties on `created_at` fall back to
/// insertion order.
pub async fn history(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Vec<MovementRecord>> {
    let records = sqlx::query_as::<_, MovementRecord>(
        r#"
        SELECT m.id AS id, m.product_id AS product_id, m.movement_type AS movement_type,
               m.quantity_change AS quantity_change, m.reason AS reason,
               m.user_id AS user_id, m.created_at AS created_at, u.name AS user_name
        FROM stock_movements m
        LEFT JOIN users u ON u.id = m.user_id
        WHERE m.product_id = ?1
        ORDER BY m.created_at DESC, m.rowid DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(records)
}

pub async fn sum(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity_change), 0) FROM stock_movements WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(total)
}
