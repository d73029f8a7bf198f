//! # Seed Data Generator
//!
//! Populates a database with a small partnership and a few months of
//! installment sales, for development.
//!
//! ## Usage
//! ```bash
//! # Three partners, 12 sales (default)
//! cargo run -p installo-db --bin seed
//!
//! # More sales
//! cargo run -p installo-db --bin seed -- --sales 40
//!
//! # Specify database path
//! cargo run -p installo-db --bin seed -- --db ./data/installo.db
//! ```
//!
//! ## Generated Data
//! - Partners joining at different dates, so history matters
//! - Sales cycling through all three interest policies
//! - Installments paid up to `--as-of`, the rest pending or overdue

use std::env;
use std::sync::Arc;

use chrono::NaiveDate;
use installo_core::{InterestPolicy, Money, Rate, SaleDraft};
use installo_db::{Database, DbConfig};
use installo_ledger::{CapitalLedger, EngineConfig, LedgerError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// (name, capital, join date)
const PARTNERS: &[(&str, i64, (i32, u32, u32))] = &[
    ("Reza Karimi", 200_000_000, (2024, 1, 1)),
    ("Sara Ahmadi", 120_000_000, (2024, 1, 1)),
    ("Omid Farhadi", 80_000_000, (2024, 4, 1)),
];

/// (model, purchase price)
const PHONES: &[(&str, i64)] = &[
    ("Galaxy A55", 18_500_000),
    ("iPhone 13", 41_000_000),
    ("Redmi Note 13", 11_200_000),
    ("Galaxy S23", 52_000_000),
    ("Poco X6", 14_800_000),
    ("iPhone 15", 68_000_000),
];

const TERMS: &[u32] = &[3, 6, 10, 12];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 12;
    let mut db_path = String::from("./installo_dev.db");
    let mut as_of = date(2024, 10, 15)?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--as-of" => {
                if i + 1 < args.len() {
                    as_of = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Installo Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>       Number of sales to generate (default: 12)");
                println!("  -d, --db <PATH>       Database file path (default: ./installo_dev.db)");
                println!("      --as-of <DATE>    Pay installments due up to DATE (default: 2024-10-15)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Installo Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", sales);
    println!("As of:    {}", as_of);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.partners().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} partners", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let ledger = CapitalLedger::new(Arc::new(db.clone()), EngineConfig::load_or_default(None));

    for (name, capital, (y, m, d)) in PARTNERS {
        let partner = ledger
            .admit_partner(name, Money::from_units(*capital), date(*y, *m, *d)?)
            .await?;
        println!("✓ Partner {} ({:.1}%)", partner.name, partner.share_percent);
    }

    println!();
    println!("Registering sales...");

    let start = date(2024, 1, 10)?;
    let mut registered = 0;
    let mut skipped = 0;

    for n in 0..sales {
        let draft = generate_draft(n, start)?;
        match ledger.register_sale(draft).await {
            Ok(planned) => {
                registered += 1;
                for installment in planned.installments.iter().filter(|i| i.due_date <= as_of) {
                    // every seventh installment is left unpaid
                    if (n + installment.sequence as usize) % 7 == 0 {
                        continue;
                    }
                    ledger
                        .pay_installment(&installment.id, installment.due_date)
                        .await?;
                }
            }
            Err(LedgerError::InsufficientCapital { shortfall, .. }) => {
                warn!(sale = n, %shortfall, "Not enough free capital, skipping sale");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let overdue = ledger.mark_overdue(as_of).await?;
    let summary = ledger.financial_summary().await?;

    println!();
    println!("✓ Registered {} sales ({} skipped)", registered, skipped);
    println!("  Overdue installments: {}", overdue);
    println!("  Capital:        {}", summary.total_capital);
    println!("  Available:      {}", summary.total_available);
    println!("  Initial profit: {}", summary.total_initial_profit);
    println!("  Monthly profit: {}", summary.total_monthly_profit);

    info!(registered, skipped, overdue, "Seed complete");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,installo=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, String> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("invalid date {y}-{m}-{d}"))
}

/// Builds the `n`th sale: phones, terms and policies rotate, one sale every
/// two weeks from `start`.
fn generate_draft(n: usize, start: NaiveDate) -> Result<SaleDraft, String> {
    let (_, purchase) = PHONES[n % PHONES.len()];
    let markup = 8 + (n % 5) as i64; // 8..=12 percent
    let announced = round_to(purchase + purchase * markup / 100, 100_000);
    let down_payment = round_to(announced * (n % 4) as i64 * 10 / 100, 100_000);

    let (interest_policy, custom_rate) = match n % 3 {
        0 => (InterestPolicy::DecliningBalance, None),
        1 => (InterestPolicy::FlatMonthlyOnOriginal, None),
        _ => (InterestPolicy::CustomLumpSum, Some(Rate::from_bps(1_500))),
    };

    let sale_date = start
        .checked_add_days(chrono::Days::new(14 * n as u64))
        .ok_or_else(|| format!("sale {n} falls outside the calendar"))?;

    Ok(SaleDraft {
        customer_id: Uuid::new_v4().to_string(),
        phone_id: Uuid::new_v4().to_string(),
        purchase_price: Money::from_units(purchase),
        announced_price: Money::from_units(announced),
        down_payment: Money::from_units(down_payment),
        term_months: TERMS[n % TERMS.len()],
        interest_policy,
        custom_rate,
        sale_date,
    })
}

fn round_to(amount: i64, step: i64) -> i64 {
    (amount + step / 2) / step * step
}
