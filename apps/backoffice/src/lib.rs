//! # Stockroom Back Office Library
//!
//! Service layer of the Stockroom back office: the sale transaction engine,
//! catalog, stock ledger and reports, wired to a store chosen at startup.
//!
//! ## Module Organization
//! ```text
//! stockroom_backoffice/
//! ├── lib.rs          ◄─── You are here (startup helpers)
//! ├── clock.rs        ◄─── Clock trait, system and fixed clocks
//! ├── error.rs        ◄─── ServiceError, caller-facing ApiError
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   └── config.rs   ◄─── AppConfig from STOCKROOM_* variables
//! └── service/
//!     ├── mod.rs      ◄─── Backoffice handle
//!     ├── sales.rs    ◄─── create_sale, cancel_sale, bills
//!     ├── catalog.rs  ◄─── products, categories, users
//!     ├── ledger.rs   ◄─── stock movements
//!     └── reports.rs  ◄─── dashboard, sales and stock reports
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. AppConfig::from_env()   STOCKROOM_* variables over defaults         │
//! │  2. init_tracing(filter)    RUST_LOG wins over the configured filter    │
//! │  3. open(&config)           SQLite pool, WAL, pending migrations        │
//! │  4. Backoffice              store + system clock + pricing settings     │
//! │  5. db.close()              on shutdown, after the last command         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod clock;
pub mod error;
pub mod service;
pub mod state;

use std::sync::Arc;

use stockroom_db::{Database, DbError};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use service::{Backoffice, NewUser, SaleRequest, ServiceSettings, StockCheck};
pub use state::{AppConfig, ConfigError};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom=trace` - Show trace for stockroom crates only
/// - Otherwise `default_filter` (see [`state::DEFAULT_LOG_FILTER`])
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Opens the configured SQLite database and builds the back office on it.
///
/// The returned [`Database`] shares the back office's pool; close it on
/// shutdown once the last operation has finished.
pub async fn open(config: &AppConfig) -> ServiceResult<(Backoffice, Database)> {
    let db = Database::new(config.db_config()).await?;
    if !db.health_check().await {
        return Err(DbError::ConnectionFailed(format!(
            "{} does not answer queries",
            config.database_path.display()
        ))
        .into());
    }
    info!(path = %config.database_path.display(), "Database connected and migrations applied");

    let office = Backoffice::new(Arc::new(db.clone())).with_settings(ServiceSettings::from(config));
    Ok((office, db))
}
