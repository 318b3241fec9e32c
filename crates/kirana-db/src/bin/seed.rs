//! # Seed Data Generator
//!
//! Populates a store with a sample kirana catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kirana_dev.db
//! cargo run -p kirana-db --bin seed
//!
//! # Specify database path and GST
//! cargo run -p kirana-db --bin seed -- --db ./data/kirana.db --gst 5
//! ```
//!
//! ## Generated Products
//! One entry per (item, pack size) across the usual shelves: grains,
//! pulses, oils, dairy, snacks, household. Purchase price sits 10-25% under
//! the selling price; opening stock is 0-60 units.

use kirana_core::{ChangeSet, Collection, Money, Product, Settings};
use kirana_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// (category, unit, [(item, selling price in rupees)])
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Grains",
        "kg",
        &[
            ("Sona Masoori Rice", 62),
            ("Basmati Rice", 118),
            ("Wheat Atta", 48),
            ("Poha", 56),
            ("Rava", 52),
        ],
    ),
    (
        "Pulses",
        "kg",
        &[
            ("Toor Dal", 156),
            ("Moong Dal", 128),
            ("Chana Dal", 94),
            ("Urad Dal", 142),
            ("Masoor Dal", 110),
        ],
    ),
    (
        "Oils",
        "ltr",
        &[
            ("Sunflower Oil", 145),
            ("Groundnut Oil", 190),
            ("Mustard Oil", 172),
        ],
    ),
    (
        "Dairy",
        "pcs",
        &[
            ("Toned Milk 500ml", 27),
            ("Curd 400g", 35),
            ("Paneer 200g", 90),
            ("Butter 100g", 58),
        ],
    ),
    (
        "Snacks",
        "pcs",
        &[
            ("Parle-G", 10),
            ("Marie Biscuits", 30),
            ("Aloo Bhujia", 45),
            ("Potato Chips", 20),
            ("Rusk", 40),
        ],
    ),
    (
        "Household",
        "pcs",
        &[
            ("Detergent Powder 1kg", 110),
            ("Dishwash Bar", 25),
            ("Bath Soap", 38),
            ("Agarbatti", 30),
            ("Matchbox", 2),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kirana_dev.db");
    let mut gst_percent: f64 = 0.0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--gst" | "-g" => {
                if i + 1 < args.len() {
                    gst_percent = args[i + 1].parse().unwrap_or(0.0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kirana Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kirana_dev.db)");
                println!("  -g, --gst <PCT>    GST percentage stored in settings (default: 0)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kirana Ledger Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: Vec<Product> = db.documents().get(Collection::Products).await?;
    if !existing.is_empty() {
        println!("⚠ Store already has {} products", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut products = Vec::new();
    let mut seed = 0usize;
    for (category, unit, items) in CATALOG {
        for (name, price) in items.iter() {
            products.push(generate_product(category, unit, name, *price, seed));
            seed += 1;
        }
    }

    let settings = Settings {
        gst_rate_percent: gst_percent,
        ..Settings::default()
    };

    let count = products.len();
    db.documents()
        .commit(
            &ChangeSet::new()
                .with_products(products)
                .with_settings(settings),
        )
        .await?;

    println!("✓ Generated {} products", count);
    println!("✓ GST set to {}%", gst_percent);
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates a single product with deterministic pricing and stock.
fn generate_product(category: &str, unit: &str, name: &str, price: i64, seed: usize) -> Product {
    let sales_price = Money::from_major(price);

    // Cost at 75-90% of shelf price, whole paise
    let cost_pct = 75 + (seed * 7 % 16) as i64;
    let purchase_price = Money::from_minor(sales_price.minor() * cost_pct / 100);

    Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        category: category.to_string(),
        unit: unit.to_string(),
        purchase_price,
        sales_price,
        stock: (seed * 13 % 61) as i64,
    }
}
