//! # Back-Office Service
//!
//! Every operation of the back office, written once against the
//! [`InventoryStore`] trait.
//!
//! ## Module Organization
//! ```text
//! service/
//! ├── mod.rs      ◄─── Backoffice handle, shared write-unit helpers
//! ├── sales.rs    ◄─── create_sale, cancel_sale, get_bill, list_bills
//! ├── catalog.rs  ◄─── products, categories, users
//! ├── ledger.rs   ◄─── apply_movement, adjust_stock, history, verify
//! └── reports.rs  ◄─── dashboard, daily/monthly/product sales, stock
//! ```
//!
//! ## Mutating Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. validate input            (no store access)                         │
//! │  2. store.begin()             (waits for the write gate)                │
//! │  3. checks + writes on `unit` (actor, products, stock, numbering)       │
//! │  4. Ok  → unit.commit()       info!  every write published              │
//! │     Err → unit.rollback()     warn!  nothing persisted                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod ledger;
pub mod reports;
pub mod sales;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use stockroom_core::{Actor, CoreError, PricingPolicy, User, DEFAULT_REORDER_LEVEL};
use stockroom_db::{InventoryStore, StoreTx};
use tracing::error;

use crate::clock::{Clock, SystemClock};
use crate::error::ServiceResult;
use crate::state::AppConfig;

pub use catalog::NewUser;
pub use ledger::StockCheck;
pub use sales::SaleRequest;

/// Business settings the service applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub pricing: PricingPolicy,
    pub default_reorder_level: i64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            pricing: PricingPolicy::default(),
            default_reorder_level: DEFAULT_REORDER_LEVEL,
        }
    }
}

impl From<&AppConfig> for ServiceSettings {
    fn from(config: &AppConfig) -> Self {
        ServiceSettings {
            pricing: config.pricing_policy(),
            default_reorder_level: config.default_reorder_level,
        }
    }
}

/// Handle to the back office. Cheap to clone; clones share the store.
///
/// ## Example
/// ```rust,ignore
/// let office = Backoffice::new(Arc::new(MemoryStore::new()));
/// let bill = office.create_sale(request, &actor).await?;
/// ```
#[derive(Clone)]
pub struct Backoffice {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
}

impl Backoffice {
    /// Back office on the system clock with default settings.
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Backoffice {
            store,
            clock: Arc::new(SystemClock),
            settings: ServiceSettings::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    pub fn settings(&self) -> ServiceSettings {
        self.settings
    }
}

// =============================================================================
// Write-Unit Helpers
// =============================================================================

/// The acting user, which must exist: ledger rows and bills reference it.
async fn require_actor(unit: &mut dyn StoreTx, actor: &Actor) -> ServiceResult<User> {
    unit.get_user(&actor.id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &actor.id).into())
}

/// Rolls back a failed unit. The original error is what the caller sees.
async fn discard(unit: Box<dyn StoreTx>) {
    if let Err(e) = unit.rollback().await {
        error!(error = %e, "Rollback failed");
    }
}
