//! # Reconciliation Runner
//!
//! Validates a database's partner balances against its sales, installments
//! and transactions, repairs what recomputation can repair, and prints the
//! outcome as JSON.
//!
//! ## Usage
//! ```bash
//! cargo run -p installo-db --bin reconcile -- --db ./installo_dev.db
//!
//! # Full financial report instead of the validation result
//! cargo run -p installo-db --bin reconcile -- --db ./installo_dev.db --report
//! ```
//!
//! ## Exit Codes
//! - `0` - consistent, or every inconsistency was repaired
//! - `2` - inconsistencies remain after recomputation

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use installo_db::{Database, DbConfig};
use installo_ledger::{CapitalLedger, EngineConfig, FinancialReconciler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./installo_dev.db");
    let mut config_path: Option<PathBuf> = None;
    let mut full_report = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--report" | "-r" => full_report = true,
            "--help" | "-h" => {
                println!("Installo Reconciliation Runner");
                println!();
                println!("Usage: reconcile [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./installo_dev.db)");
                println!("  -c, --config <PATH>   Engine config file (default: platform config dir)");
                println!("  -r, --report          Print the full financial report");
                println!("  -h, --help            Show this help message");
                return Ok(ExitCode::SUCCESS);
            }
            _ => {}
        }
        i += 1;
    }

    // an explicit config file that fails to load is an error, not a fallback
    let config = match config_path {
        Some(path) => EngineConfig::load(Some(path))?,
        None => EngineConfig::load_or_default(None),
    };

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let ledger = CapitalLedger::new(Arc::new(db.clone()), config);
    let reconciler = FinancialReconciler::new(ledger);

    let valid = if full_report {
        let report = reconciler.report().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        report.validation.is_valid
    } else {
        let report = reconciler.validate().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        report.is_valid
    };

    db.close().await;

    if valid {
        info!(path = %db_path, "Reconciliation passed");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(path = %db_path, "Inconsistencies remain after recomputation");
        Ok(ExitCode::from(2))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,installo=debug,sqlx=warn"));

    // stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
