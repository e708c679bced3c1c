//! # State Module
//!
//! Startup state of the back office. Configuration is read once and stays
//! read-only; the store and clock handles live on
//! [`Backoffice`](crate::service::Backoffice).

mod config;

pub use config::{AppConfig, ConfigError, DEFAULT_LOG_FILTER};
