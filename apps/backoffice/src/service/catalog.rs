//! # Catalog
//!
//! Products, categories and the users that appear in the audit trail.
//!
//! Stock never changes here except through the opening-stock ledger entry
//! of a new product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_core::validation::{
    validate_email, validate_name, validate_new_product, validate_product_update,
    validate_search_query,
};
use stockroom_core::{
    Actor, Category, CoreError, MovementType, NewProduct, Product, ProductFilter, ProductUpdate,
    RecordStatus, Role, User,
};
use stockroom_db::StoreTx;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ledger::move_stock;
use super::{discard, require_actor, Backoffice};
use crate::clock::Clock;
use crate::error::ServiceResult;

/// Reason recorded on the opening-stock ledger entry.
pub const INITIAL_STOCK_REASON: &str = "Initial stock on product creation";

/// A user to register. Credentials stay with the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// Write Units
// =============================================================================

async fn write_new_product(
    unit: &mut dyn StoreTx,
    spec: NewProduct,
    default_reorder_level: i64,
    actor: &Actor,
    now: DateTime<Utc>,
) -> ServiceResult<Product> {
    require_actor(unit, actor).await?;

    let sku = spec.sku.trim().to_string();
    if unit.find_product_by_sku(&sku).await?.is_some() {
        return Err(CoreError::conflict("sku", sku).into());
    }
    if let Some(category_id) = &spec.category_id {
        require_category(unit, category_id).await?;
    }

    let mut product = Product {
        id: Uuid::new_v4().to_string(),
        name: spec.name.trim().to_string(),
        sku,
        category_id: spec.category_id,
        purchase_price_cents: spec.purchase_price_cents,
        selling_price_cents: spec.selling_price_cents,
        tax_rate_bps: spec.tax_rate_bps,
        // Opening stock arrives through the ledger below
        stock_qty: 0,
        reorder_level: spec.reorder_level.unwrap_or(default_reorder_level),
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    unit.insert_product(&product).await?;

    if spec.stock_qty > 0 {
        product.stock_qty = move_stock(
            unit,
            &product.id,
            MovementType::Initial,
            spec.stock_qty,
            INITIAL_STOCK_REASON.to_string(),
            &actor.id,
            now,
        )
        .await?;
    }

    Ok(product)
}

async fn write_product_update(
    unit: &mut dyn StoreTx,
    id: &str,
    update: ProductUpdate,
    actor: &Actor,
    now: DateTime<Utc>,
) -> ServiceResult<Product> {
    require_actor(unit, actor).await?;

    let mut product = unit
        .get_product(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", id))?;

    if let Some(sku) = update.sku {
        let sku = sku.trim().to_string();
        if sku != product.sku {
            if let Some(owner) = unit.find_product_by_sku(&sku).await? {
                if owner.id != product.id {
                    return Err(CoreError::conflict("sku", sku).into());
                }
            }
            product.sku = sku;
        }
    }
    if let Some(category_id) = update.category_id {
        require_category(unit, &category_id).await?;
        product.category_id = Some(category_id);
    }
    if let Some(name) = update.name {
        product.name = name.trim().to_string();
    }
    if let Some(cents) = update.purchase_price_cents {
        product.purchase_price_cents = cents;
    }
    if let Some(cents) = update.selling_price_cents {
        product.selling_price_cents = cents;
    }
    if let Some(bps) = update.tax_rate_bps {
        product.tax_rate_bps = bps;
    }
    if let Some(level) = update.reorder_level {
        product.reorder_level = level;
    }
    if let Some(status) = update.status {
        product.status = status;
    }
    product.updated_at = now;

    unit.update_product_details(&product).await?;
    Ok(product)
}

async fn require_category(unit: &mut dyn StoreTx, id: &str) -> ServiceResult<Category> {
    unit.get_category(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Category", id).into())
}

// =============================================================================
// Operations
// =============================================================================

impl Backoffice {
    /// Adds a product to the catalog.
    ///
    /// A positive opening `stock_qty` is recorded as an `initial` ledger
    /// entry in the same unit.
    ///
    /// ## Errors
    /// - `Validation` for malformed fields
    /// - `Conflict` if the SKU is taken (exact, case-sensitive match)
    /// - `NotFound` for an unknown category or actor
    pub async fn create_product(&self, spec: NewProduct, actor: &Actor) -> ServiceResult<Product> {
        validate_new_product(&spec)?;

        let now = self.clock.now();
        let sku = spec.sku.clone();
        let mut unit = self.store.begin().await?;

        match write_new_product(unit.as_mut(), spec, self.settings.default_reorder_level, actor, now)
            .await
        {
            Ok(product) => {
                unit.commit().await?;
                info!(
                    product_id = %product.id,
                    sku = %product.sku,
                    stock_qty = product.stock_qty,
                    actor = %actor.id,
                    "Product created"
                );
                Ok(product)
            }
            Err(err) => {
                warn!(sku = %sku, error = %err, "Product creation rejected");
                discard(unit).await;
                Err(err)
            }
        }
    }

    /// Partially updates a product. Stock is not one of the fields.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown product, category or actor
    /// - `Conflict` if another product owns the new SKU
    pub async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
        actor: &Actor,
    ) -> ServiceResult<Product> {
        validate_product_update(&update)?;

        let now = self.clock.now();
        let mut unit = self.store.begin().await?;

        match write_product_update(unit.as_mut(), id, update, actor, now).await {
            Ok(product) => {
                unit.commit().await?;
                info!(product_id = %product.id, sku = %product.sku, actor = %actor.id, "Product updated");
                Ok(product)
            }
            Err(err) => {
                warn!(product_id = %id, error = %err, "Product update rejected");
                discard(unit).await;
                Err(err)
            }
        }
    }

    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id).into())
    }

    /// Products matching `filter`, by name.
    pub async fn list_products(&self, filter: &ProductFilter) -> ServiceResult<Vec<Product>> {
        let mut filter = filter.clone();
        if let Some(search) = &filter.search {
            filter.search = Some(validate_search_query(search)?);
        }

        let products = self.store.list_products(&filter).await?;
        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Adds a category. Fails with `Conflict` on a duplicate name.
    pub async fn create_category(&self, name: &str) -> ServiceResult<Category> {
        validate_name("name", name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            status: RecordStatus::Active,
            created_at: self.clock.now(),
        };

        let mut unit = self.store.begin().await?;
        let result: ServiceResult<()> = match unit.find_category_by_name(&category.name).await {
            Ok(Some(_)) => Err(CoreError::conflict("category", &category.name).into()),
            Ok(None) => unit.insert_category(&category).await.map_err(Into::into),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                unit.commit().await?;
                info!(category_id = %category.id, name = %category.name, "Category created");
                Ok(category)
            }
            Err(err) => {
                discard(unit).await;
                Err(err)
            }
        }
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    /// Registers a user. Fails with `Conflict` on a duplicate email.
    pub async fn register_user(&self, new: NewUser) -> ServiceResult<User> {
        validate_name("name", &new.name)?;
        validate_email(&new.email)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            email: new.email.trim().to_string(),
            role: new.role,
            status: RecordStatus::Active,
            created_at: self.clock.now(),
        };

        let mut unit = self.store.begin().await?;
        match unit.insert_user(&user).await {
            Ok(()) => {
                unit.commit().await?;
                info!(user_id = %user.id, role = %user.role, "User registered");
                Ok(user)
            }
            Err(e) => {
                discard(unit).await;
                Err(e.into())
            }
        }
    }

    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
