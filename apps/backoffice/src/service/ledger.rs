//! # Stock Ledger
//!
//! Append-only stock movements and the cached `stock_qty` they drive.
//!
//! ## The Only Way Stock Moves
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_product ──┐                                                     │
//! │  create_sale ─────┤                                                     │
//! │  cancel_sale ─────┼──► move_stock(unit, product, type, change, ...)     │
//! │  adjust_stock ────┤        │                                            │
//! │  receive_stock ───┘        ├── unit.adjust_stock(product, change)       │
//! │                            └── apply_movement(...)  one ledger row      │
//! │                                                                         │
//! │  Replay: Σ quantity_change over a product's ledger == stock_qty         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use stockroom_core::validation::{validate_quantity, validate_quantity_change, validate_reason};
use stockroom_core::{
    Actor, CoreError, MovementRecord, MovementType, Product, StockMovement, ValidationError,
};
use stockroom_db::StoreTx;
use tracing::{info, warn};
use uuid::Uuid;

use super::{discard, require_actor, Backoffice};
use crate::clock::Clock;
use crate::error::ServiceResult;

/// Result of replaying a product's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockCheck {
    pub product_id: String,
    pub sku: String,
    pub stock_qty: i64,
    pub ledger_sum: i64,
    pub consistent: bool,
}

/// Appends one immutable ledger row and returns it.
///
/// Only the row is written: the caller updates the cached quantity in the
/// same unit. Fails with `NotFound` for an unknown product.
pub async fn apply_movement(
    unit: &mut dyn StoreTx,
    product_id: &str,
    movement_type: MovementType,
    quantity_change: i64,
    reason: Option<String>,
    actor_id: &str,
    at: DateTime<Utc>,
) -> ServiceResult<StockMovement> {
    if unit.get_product(product_id).await?.is_none() {
        return Err(CoreError::not_found("Product", product_id).into());
    }

    let movement = StockMovement {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        movement_type,
        quantity_change,
        reason,
        user_id: actor_id.to_string(),
        created_at: at,
    };
    unit.insert_movement(&movement).await?;

    Ok(movement)
}

/// Changes the cached quantity and records why, inside one unit.
///
/// Returns the new on-hand quantity.
pub(crate) async fn move_stock(
    unit: &mut dyn StoreTx,
    product_id: &str,
    movement_type: MovementType,
    quantity_change: i64,
    reason: String,
    actor_id: &str,
    at: DateTime<Utc>,
) -> ServiceResult<i64> {
    let stock_qty = unit.adjust_stock(product_id, quantity_change, at).await?;
    apply_movement(
        unit,
        product_id,
        movement_type,
        quantity_change,
        Some(reason),
        actor_id,
        at,
    )
    .await?;
    Ok(stock_qty)
}

struct StockChange<'a> {
    product_id: &'a str,
    movement_type: MovementType,
    quantity_change: i64,
    reason: String,
}

async fn write_stock_change(
    unit: &mut dyn StoreTx,
    change: StockChange<'_>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> ServiceResult<Product> {
    require_actor(unit, actor).await?;

    let product = unit
        .get_product(change.product_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", change.product_id))?;

    let on_hand = product
        .stock_qty
        .checked_add(change.quantity_change)
        .ok_or_else(|| ValidationError::too_large("stock_qty"))?;
    if on_hand < 0 {
        return Err(ValidationError::NegativeStock {
            sku: product.sku,
            on_hand: product.stock_qty,
            change: change.quantity_change,
        }
        .into());
    }

    let stock_qty = move_stock(
        unit,
        change.product_id,
        change.movement_type,
        change.quantity_change,
        change.reason,
        &actor.id,
        now,
    )
    .await?;

    Ok(Product {
        stock_qty,
        updated_at: now,
        ..product
    })
}

impl Backoffice {
    /// Manual stock correction.
    ///
    /// ## Errors
    /// - `Validation` for a zero change, an empty reason, or a change that
    ///   would take stock below zero
    /// - `NotFound` for an unknown product or actor
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        quantity_change: i64,
        reason: &str,
        actor: &Actor,
    ) -> ServiceResult<Product> {
        validate_quantity_change(quantity_change)?;
        validate_reason(reason)?;

        self.record_stock_change(
            product_id,
            MovementType::Adjustment,
            quantity_change,
            reason.trim().to_string(),
            actor,
        )
        .await
    }

    /// Goods received from a supplier.
    pub async fn receive_stock(
        &self,
        product_id: &str,
        quantity: i64,
        reason: &str,
        actor: &Actor,
    ) -> ServiceResult<Product> {
        validate_quantity(quantity)?;
        validate_reason(reason)?;

        self.record_stock_change(
            product_id,
            MovementType::Purchase,
            quantity,
            reason.trim().to_string(),
            actor,
        )
        .await
    }

    async fn record_stock_change(
        &self,
        product_id: &str,
        movement_type: MovementType,
        quantity_change: i64,
        reason: String,
        actor: &Actor,
    ) -> ServiceResult<Product> {
        let now = self.clock.now();
        let mut unit = self.store.begin().await?;

        let change = StockChange {
            product_id,
            movement_type,
            quantity_change,
            reason,
        };
        match write_stock_change(unit.as_mut(), change, actor, now).await {
            Ok(product) => {
                unit.commit().await?;
                info!(
                    product_id = %product.id,
                    sku = %product.sku,
                    movement = %movement_type,
                    change = quantity_change,
                    stock_qty = product.stock_qty,
                    actor = %actor.id,
                    "Stock changed"
                );
                Ok(product)
            }
            Err(err) => {
                warn!(product_id = %product_id, error = %err, "Stock change rejected");
                discard(unit).await;
                Err(err)
            }
        }
    }

    /// Ledger of a product, newest first, with acting user names.
    pub async fn stock_history(&self, product_id: &str) -> ServiceResult<Vec<MovementRecord>> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(CoreError::not_found("Product", product_id).into());
        }
        Ok(self.store.movements(product_id).await?)
    }

    /// Replays a product's ledger against its cached quantity.
    pub async fn verify_stock(&self, product_id: &str) -> ServiceResult<StockCheck> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;
        let ledger_sum = self.store.ledger_sum(product_id).await?;

        if ledger_sum != product.stock_qty {
            warn!(
                product_id = %product.id,
                stock_qty = product.stock_qty,
                ledger_sum,
                "Stock does not match ledger"
            );
        }

        Ok(StockCheck {
            product_id: product.id,
            sku: product.sku,
            stock_qty: product.stock_qty,
            ledger_sum,
            consistent: ledger_sum == product.stock_qty,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::Clock;
    use crate::service::testing::{both_backends, Fixture};
    use stockroom_core::{CoreError, MovementType, ValidationError};

    async fn adjustment_moves_stock_and_ledger(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 20).await;

        let product = fx.office.adjust_stock(&cola.id, -3, "Broken bottles", &fx.admin).await.unwrap();
        assert_eq!(product.stock_qty, 17);

        let product = fx.office.receive_stock(&cola.id, 10, "Supplier delivery", &fx.admin).await.unwrap();
        assert_eq!(product.stock_qty, 27);

        let history = fx.office.stock_history(&cola.id).await.unwrap();
        let types: Vec<MovementType> = history.iter().map(|m| m.movement.movement_type).collect();
        assert_eq!(
            types,
            vec![MovementType::Purchase, MovementType::Adjustment, MovementType::Initial]
        );
        assert_eq!(history[1].movement.reason.as_deref(), Some("Broken bottles"));

        assert!(fx.office.verify_stock(&cola.id).await.unwrap().consistent);
    }

    async fn adjustment_below_zero_is_rejected(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 2).await;

        let err = fx.office.adjust_stock(&cola.id, -3, "Count", &fx.admin).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::NegativeStock { on_hand: 2, change: -3, .. }))
        ));

        let stored = fx.office.get_product(&cola.id).await.unwrap();
        assert_eq!(stored.stock_qty, 2);
        assert_eq!(fx.office.stock_history(&cola.id).await.unwrap().len(), 1);
    }

    async fn adjustment_needs_reason_and_change(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 2).await;

        let err = fx.office.adjust_stock(&cola.id, 1, "   ", &fx.admin).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(ValidationError::Required { .. }))));

        let err = fx.office.adjust_stock(&cola.id, 0, "Count", &fx.admin).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(_))));
    }

    async fn unknown_product_or_actor_is_not_found(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 2).await;

        let err = fx.office.adjust_stock("missing", 1, "Count", &fx.admin).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { entity, .. }) if entity == "Product"));

        let ghost = stockroom_core::Actor::new("ghost", stockroom_core::Role::Admin);
        let err = fx.office.adjust_stock(&cola.id, 1, "Count", &ghost).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { entity, .. }) if entity == "User"));

        let err = fx.office.stock_history("missing").await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));
    }

    async fn apply_movement_rejects_unknown_product(fx: Fixture) {
        let mut unit = fx.office.store().begin().await.unwrap();
        let err = super::apply_movement(
            unit.as_mut(),
            "missing",
            MovementType::Adjustment,
            1,
            None,
            &fx.admin.id,
            fx.clock.now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));
    }

    async fn oversized_changes_are_rejected(fx: Fixture) {
        let cola = fx.product("COLA-330", 1099, 500, 5).await;

        let err = fx
            .office
            .receive_stock(&cola.id, i64::MAX, "Supplier delivery", &fx.admin)
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let err = fx.office.adjust_stock(&cola.id, i64::MIN, "Count", &fx.admin).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Past the request checks, the on-hand sum is still checked
        let err = fx
            .office
            .record_stock_change(&cola.id, MovementType::Purchase, i64::MAX, "Import".to_string(), &fx.admin)
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { field, .. })) if field == "stock_qty"
        ));

        assert_eq!(fx.office.get_product(&cola.id).await.unwrap().stock_qty, 5);
        assert_eq!(fx.office.stock_history(&cola.id).await.unwrap().len(), 1);
        assert!(fx.office.verify_stock(&cola.id).await.unwrap().consistent);
    }

    both_backends!(
        oversized_changes_are_rejected,
        adjustment_moves_stock_and_ledger,
        adjustment_below_zero_is_rejected,
        adjustment_needs_reason_and_change,
        unknown_product_or_actor_is_not_found,
        apply_movement_rejects_unknown_product,
    );
}
