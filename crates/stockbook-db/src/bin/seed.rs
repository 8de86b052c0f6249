//! # Seed Data Generator
//!
//! Populates a database with a small catalog and a handful of orders for
//! development, going through the same services the application uses.
//!
//! ## Usage
//! ```bash
//! # 40 products (default) into ./stockbook.db
//! cargo run -p stockbook-db --bin stockbook-seed
//!
//! # Custom amount and path
//! cargo run -p stockbook-db --bin stockbook-seed -- --products 200 --db ./data/dev.db
//!
//! # Settings from a config file (env overrides still apply)
//! cargo run -p stockbook-db --bin stockbook-seed -- --config ./stockbook.toml
//! ```
//!
//! ## Generated Data
//! - Categories: fasteners, tools, electrical, plumbing
//! - Two suppliers and three customers
//! - Products with opening stock 0 - 60 and the default minimum
//! - One purchase per supplier, then a few sales and one sale edit

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use stockbook_core::{
    NewProduct, NewSupplier, PurchaseInput, PurchaseLineInput, SaleInput, SaleLineInput,
    SupplierKind,
};
use stockbook_db::{AppConfig, Database};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Catalog names per category
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Fasteners",
        &["Bolt M6", "Bolt M8", "Nut M6", "Nut M8", "Washer 6mm", "Wood Screw 4x40"],
    ),
    (
        "Tools",
        &["Claw Hammer", "Screwdriver PH2", "Tape Measure 5m", "Utility Knife", "Hex Key Set"],
    ),
    (
        "Electrical",
        &["Cable 2.5mm", "Wall Socket", "Light Switch", "Junction Box", "LED Bulb E27"],
    ),
    (
        "Plumbing",
        &["PVC Elbow 32", "Teflon Tape", "Ball Valve 1/2", "Hose Clamp", "Pipe 20mm"],
    ),
];

/// Margin percentages cycled over products
const MARGINS: &[i64] = &[25, 30, 40, 55];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-n" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockbook Seed Data Generator");
                println!();
                println!("Usage: stockbook-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --products <N>   Number of products to generate (default: 40)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -c, --config <PATH>  Config file path");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    // RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    println!("🌱 Stockbook Seed Data Generator");
    println!("================================");
    println!("Database: {}", config.database.path.display());
    println!("Products: {}", count);
    println!("Policy:   {}", config.inventory.min_stock_policy);
    println!();

    let db = Database::new(config.to_db_config()).await?;
    println!("✓ Connected to database");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Counterparties
    let acme = db
        .suppliers()
        .insert(&NewSupplier {
            name: "Acme Hardware Ltd".to_string(),
            email: Some("orders@acme.test".to_string()),
            ..Default::default()
        })
        .await?;
    let jo = db
        .suppliers()
        .insert(&NewSupplier {
            name: "Jo Marsh".to_string(),
            phone: Some("555-0134".to_string()),
            kind: SupplierKind::Individual,
            ..Default::default()
        })
        .await?;

    let mut customers = Vec::new();
    for name in ["Walk-in", "Northside Builders", "K. Ortega"] {
        customers.push(db.customers().insert(name, None).await?);
    }
    println!("✓ Created 2 suppliers and {} customers", customers.len());

    // Catalog
    let mut products = Vec::new();
    'outer: for (category_name, names) in CATEGORIES {
        let category = db.categories().insert(category_name).await?;
        for name in names.iter() {
            for variant in ["", " (bulk)"] {
                if products.len() >= count {
                    break 'outer;
                }

                let seed = products.len();
                let supplier_id = if seed % 2 == 0 { acme.id } else { jo.id };
                let new_product = NewProduct {
                    name: format!("{}{}", name, variant),
                    description: None,
                    category_id: Some(category.id),
                    supplier_id: Some(supplier_id),
                    reference_cost: Decimal::new(99 + ((seed * 37) % 900) as i64, 2),
                    margin_percentage: Decimal::from(MARGINS[seed % MARGINS.len()]),
                    stock: (seed % 61) as i64,
                    stock_minimum: None,
                };

                match db.products().insert(&new_product).await {
                    Ok(product) => products.push(product),
                    Err(e) => {
                        warn!(name = %new_product.name, error = %e, "Failed to insert product")
                    }
                }
            }
        }
    }
    println!("✓ Generated {} products", products.len());

    if products.is_empty() {
        return Ok(());
    }

    // One purchase per supplier, restocking that supplier's products
    let now = Utc::now();
    for (offset, supplier) in [&acme, &jo].into_iter().enumerate() {
        let lines: Vec<PurchaseLineInput> = products
            .iter()
            .filter(|p| p.supplier_id == Some(supplier.id))
            .take(8)
            .map(|p| PurchaseLineInput {
                id: None,
                product_id: p.id,
                quantity: 24,
                unit_price: p.reference_cost,
            })
            .collect();

        let purchase = db
            .purchasing()
            .create(&PurchaseInput {
                supplier_id: supplier.id,
                occurred_at: now - Duration::days(3 - offset as i64),
                discount_percentage: 5,
                tax_percentage: "23".to_string(),
                lines,
            })
            .await?;
        println!("✓ Purchase #{} from {}: total {}", purchase.id, supplier.name, purchase.total);
    }

    // A few sales
    let sales = db.selling(config.inventory.min_stock_policy);
    let mut last_sale = None;
    for (n, customer) in customers.iter().enumerate() {
        let lines: Vec<SaleLineInput> = products
            .iter()
            .skip(n * 3)
            .take(3)
            .map(|p| SaleLineInput {
                id: None,
                product_id: p.id,
                quantity: 2 + n as i64,
                unit_price: p.sale_price(),
                discount_percentage: Decimal::from(if n == 1 { 10 } else { 0 }),
            })
            .collect();

        let input = SaleInput {
            customer_id: customer.id,
            occurred_at: now - Duration::hours(n as i64),
            discount_percentage: 0,
            discount_amount: Decimal::ZERO,
            tax_percentage: "23".to_string(),
            lines,
        };

        match sales.create(&input).await {
            Ok(sale) => {
                println!("✓ Sale #{} to {}: total {}", sale.id, customer.name, sale.total);
                last_sale = Some((sale, input));
            }
            Err(e) => println!("⚠ Sale to {} rejected: {}", customer.name, e.user_message()),
        }
    }

    // Edit the last sale: bump the first line by one unit
    if let Some((sale, mut input)) = last_sale {
        let lines = db.sales().lines(sale.id).await?;
        for (submitted, stored) in input.lines.iter_mut().zip(lines.iter()) {
            submitted.id = Some(stored.id);
        }
        if let Some(first) = input.lines.first_mut() {
            first.quantity += 1;
        }

        match sales.edit(sale.id, &input).await {
            Ok(edited) => println!("✓ Sale #{} edited: total {}", edited.id, edited.total),
            Err(e) => println!("⚠ Sale #{} edit rejected: {}", sale.id, e.user_message()),
        }
    }

    // Dashboard
    let summary = db.dashboard().summary(now.date_naive()).await?;
    println!();
    println!("Dashboard for {}", summary.date);
    println!("  Sales today:      {}", summary.sales_today);
    println!("  Sales this month: {}", summary.sales_this_month);
    println!("  Purchases month:  {}", summary.purchases_this_month);
    println!("  Low stock:        {} of {}", summary.low_stock_count, summary.product_count);

    for item in db.dashboard().top_selling(5).await? {
        println!("  Top seller: {} ({} sold)", item.name, item.quantity_sold);
    }

    db.close().await;
    info!("Seed complete");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
