//! # Directory Repository
//!
//! Users and categories: reference data with unique names.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Category, User};

pub async fn get_user(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, status, created_at FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

pub async fn insert_user(conn: &mut SqliteConnection, user: &User) -> DbResult<()> {
    debug!(id = %user.id, email = %user.email, "Inserting user");

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, role, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role)
    .bind(user.status)
    .bind(user.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn get_category(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, status, created_at FROM categories WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(category)
}

pub async fn find_category_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, status, created_at FROM categories WHERE name = ?1",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(category)
}

pub async fn list_categories(conn: &mut SqliteConnection) -> DbResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, status, created_at FROM categories ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(categories)
}

pub async fn insert_category(conn: &mut SqliteConnection, category: &Category) -> DbResult<()> {
    debug!(id = %category.id, name = %category.name, "Inserting category");

    sqlx::query("INSERT INTO categories (id, name, status, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.status)
        .bind(category.created_at)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
