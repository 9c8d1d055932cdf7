//! # Seed Data Generator
//!
//! Populates a development database with a demo operator, a small medicine
//! catalog and one supplier bill, so every screen has something to show.
//!
//! ## Usage
//! ```bash
//! cargo run -p pharmadesk-db --bin seed
//!
//! # Specify database path and operator
//! cargo run -p pharmadesk-db --bin seed -- --db ./data/pharmadesk.db --user counter1 --password secret
//! ```
//!
//! ## Generated Data
//! - Operator `admin` / `admin123` (override with `--user` / `--password`)
//! - Medicines across Tablets, Capsules, Syrup, Injection and Ointment
//! - One unpaid supplier bill whose deliveries carry batches and expiries

use chrono::{Duration, Local};
use pharmadesk_core::catalog::NewMedicine;
use pharmadesk_core::line_item::{LineCandidate, PurchaseCandidate};
use pharmadesk_core::supplier_bill::SupplierBillSubmission;
use pharmadesk_core::{DiscountInBill, Money};
use pharmadesk_db::{Database, DbConfig};
use std::env;

/// (name, type, company, MRP paise, PTR paise, opening stock)
const MEDICINES: &[(&str, &str, &str, i64, i64, i64)] = &[
    ("Dolo 650", "Tablets", "Micro Labs", 3200, 2450, 400),
    ("Crocin Advance", "Tablets", "GSK", 2600, 2000, 80),
    ("Azithral 500", "Tablets", "Alembic", 11950, 9200, 60),
    ("Pan 40", "Tablets", "Alkem", 15500, 11900, 150),
    ("Amoxicillin 500", "Capsules", "Cipla", 9800, 7500, 40),
    ("Becosules", "Capsules", "Pfizer", 4700, 3600, 8),
    ("Ascoril LS", "Syrup", "Glenmark", 12400, 9500, 25),
    ("Benadryl", "Syrup", "J&J", 11800, 9000, 6),
    ("Voveran 75", "Injection", "Novartis", 2100, 1600, 30),
    ("Betadine", "Ointment", "Win Medicare", 13300, 10200, 12),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./pharmadesk_dev.db");
    let mut username = String::from("admin");
    let mut password = String::from("admin123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    username = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("PharmaDesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./pharmadesk_dev.db)");
                println!("  -u, --user <NAME>      Demo operator username (default: admin)");
                println!("  -p, --password <PASS>  Demo operator password (default: admin123)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 PharmaDesk Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Operator
    if db.users().get(&username).await?.is_some() {
        println!("⚠ Operator '{}' already exists, leaving it alone", username);
    } else {
        db.users().create(&username, &password, "Demo Operator").await?;
        println!("✓ Created operator '{}'", username);
    }

    // Catalog
    let existing = db.medicines().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} medicines", existing);
        println!("  Skipping catalog seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Adding medicines...");
    for (name, medicine_type, company, mrp, ptr, stock) in MEDICINES {
        let medicine = NewMedicine {
            name: name.to_string(),
            mrp: Money::from_paise(*mrp),
            ptr: Money::from_paise(*ptr),
            company: Some(company.to_string()),
            medicine_type: medicine_type.to_string(),
            current_stock: *stock,
        };
        if let Err(e) = db.medicines().insert(&medicine).await {
            eprintln!("Failed to insert {}: {}", name, e);
            continue;
        }
        println!("  + {:<18} {:<10} {}", name, medicine_type, Money::from_paise(*mrp));
    }

    // One delivery so the stock report has expiries to show
    let today = Local::now().date_naive();
    let soon = (today + Duration::days(20)).format("%Y-%m-%d").to_string();
    let later = (today + Duration::days(400)).format("%Y-%m").to_string();

    let bill = SupplierBillSubmission {
        bill_no: "SEED-001".to_string(),
        bill_date: today,
        delivery_date: today,
        agency: "Sri Sai Agencies".to_string(),
        bill_amount: Money::from_paise(150000),
        tax_amount: Money::from_paise(18000),
        discount_in_bill: DiscountInBill::Yes,
        discount_amount: Money::from_paise(7500),
        lines: vec![
            PurchaseCandidate {
                line: LineCandidate::new("Dolo 650", 100, Money::from_paise(2400))
                    .with_batch("DL-2407", soon),
                catalog_mrp: Money::from_paise(3200),
            },
            PurchaseCandidate {
                line: LineCandidate::new("Ascoril LS", 10, Money::from_paise(9400))
                    .with_batch("AS-118", later),
                catalog_mrp: Money::from_paise(12400),
            },
        ],
    };
    let stored = db.supplier_bills().create(&bill).await?;

    println!();
    println!("✓ Supplier bill {} ({})", stored.bill_id, stored.bill_total());

    let report = db.reports().stock_report(Default::default(), today).await?;
    println!(
        "  Stock report: {} medicines, {} low, {} near expiry",
        report.statistics.total_medicines,
        report.statistics.low_stock_count,
        report.statistics.near_expiry_count
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
