//! # Stockroom Entry Point
//!
//! Prints one report as JSON, or a short plain-text summary.
//!
//! ```text
//! stockroom [dashboard]            landing-page figures (default)
//! stockroom summary                today's and this month's takings as text
//! stockroom stock                  stock snapshot, lowest first
//! stockroom daily [YYYY-MM-DD]     one day of sales (today by default)
//! stockroom monthly [YYYY] [MM]    per-day rollup (this month by default)
//! stockroom alerts                 products at or below reorder level
//! ```
//!
//! Failures are printed as a serialized `ApiError` with a non-zero exit code.

use std::process::ExitCode;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use stockroom_backoffice::{init_tracing, open, ApiError, AppConfig, Backoffice, Clock, SystemClock};
use stockroom_core::report::DashboardSummary;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => return fail(ApiError::from(e)),
    };
    init_tracing(&config.log_filter);

    info!(store = %config.store_name, "Starting Stockroom");

    let (office, db) = match open(&config).await {
        Ok(opened) => opened,
        Err(e) => return fail(ApiError::from(e)),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = run(&office, &config, &args).await;
    db.close().await;

    match outcome {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

async fn run(office: &Backoffice, config: &AppConfig, args: &[String]) -> Result<String, ApiError> {
    let command = args.first().map(String::as_str).unwrap_or("dashboard");
    let today = SystemClock.today();

    match command {
        "dashboard" => render(&office.dashboard().await?),
        "summary" => Ok(summarize(config, &office.dashboard().await?)),
        "stock" => render(&office.stock_report(None).await?),
        "alerts" => render(&office.stock_alerts().await?),
        "daily" => {
            let date = match args.get(1) {
                Some(raw) => Some(parse_date(raw)?),
                None => None,
            };
            render(&office.daily_sales(date).await?)
        }
        "monthly" => {
            let year = match args.get(1) {
                Some(raw) => parse_number::<i32>("year", raw)?,
                None => today.year(),
            };
            let month = match args.get(2) {
                Some(raw) => parse_number::<u32>("month", raw)?,
                None => today.month(),
            };
            render(&office.monthly_sales(year, month).await?)
        }
        other => Err(ApiError::validation(format!(
            "unknown command '{}': expected dashboard, summary, stock, daily, monthly or alerts",
            other
        ))),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))
}

/// Plain-text takings in the configured currency.
fn summarize(config: &AppConfig, summary: &DashboardSummary) -> String {
    let mut out = format!("{}\n", config.store_name);
    out.push_str(&format!(
        "Today:       {} ({} bills)\n",
        config.format_currency(summary.today_sales_cents),
        summary.today_transactions
    ));
    out.push_str(&format!(
        "This month:  {}\n",
        config.format_currency(summary.monthly_sales_cents)
    ));
    out.push_str(&format!(
        "Stock:       {} products, {} low, {} out",
        summary.total_products, summary.low_stock_items, summary.out_of_stock
    ));
    for sale in &summary.recent_sales {
        out.push_str(&format!(
            "\n  {}  {}",
            sale.bill.bill_number,
            config.format_currency(sale.bill.total_cents)
        ));
    }
    out
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ApiError::validation(format!("date '{}' is not YYYY-MM-DD: {}", raw, e)))
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("{} '{}' is not a number", field, raw)))
}

fn fail(err: ApiError) -> ExitCode {
    error!(code = ?err.code, message = %err.message, "Command failed");
    match serde_json::to_string_pretty(&err) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", err),
    }
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_uses_configured_currency() {
        let config = AppConfig {
            store_name: "Corner Shop".to_string(),
            currency_symbol: "€".to_string(),
            ..AppConfig::default()
        };
        let summary = DashboardSummary {
            total_products: 12,
            low_stock_items: 2,
            out_of_stock: 1,
            today_sales_cents: 4550,
            monthly_sales_cents: 120_000,
            today_transactions: 3,
            recent_sales: Vec::new(),
            low_stock_products: Vec::new(),
        };

        let text = summarize(&config, &summary);
        assert!(text.starts_with("Corner Shop\n"));
        assert!(text.contains("€45.50 (3 bills)"));
        assert!(text.contains("€1200.00"));
        assert!(text.contains("12 products, 2 low, 1 out"));
    }
}
