//! # Seed Data Generator
//!
//! Populates a store with demo accounts and a demo catalog.
//!
//! ## Usage
//! ```bash
//! # Seed the default store
//! cargo run -p bazaar-db --bin seed
//!
//! # Specify database path
//! cargo run -p bazaar-db --bin seed -- --db ./data/bazaar.db
//!
//! # Repeat the catalog with numbered variants
//! cargo run -p bazaar-db --bin seed -- --count 60
//! ```
//!
//! ## Generated Data
//! - `admin@bazaar.test` (admin) and `customer@bazaar.test` (customer),
//!   both with password `Bazaar@123`
//! - Products across Electronics, Home, Fashion and Books, owned by the
//!   admin, spread over the three supported countries

use bazaar_core::validation::{validate_new_product, validate_registration};
use bazaar_core::{Country, NewProduct, NewUser, ProductDraft, UserRole};
use bazaar_db::{Database, DbConfig};
use std::env;

const DEMO_PASSWORD: &str = "Bazaar@123";

/// (category, name, base price, discount %)
const CATALOG: &[(&str, &str, f64, f64)] = &[
    ("Electronics", "Wireless Earbuds", 2499.0, 15.0),
    ("Electronics", "Mechanical Keyboard", 4599.0, 10.0),
    ("Electronics", "USB-C Charger", 899.0, 0.0),
    ("Electronics", "Smart Watch", 7999.0, 20.0),
    ("Home", "Brass Desk Lamp", 500.0, 10.0),
    ("Home", "Cotton Rug", 1200.0, 0.0),
    ("Home", "Ceramic Mug Set", 650.0, 5.0),
    ("Home", "Wall Clock", 999.0, 25.0),
    ("Fashion", "Denim Jacket", 2999.0, 30.0),
    ("Fashion", "Leather Belt", 799.0, 0.0),
    ("Fashion", "Running Shoes", 3499.0, 12.0),
    ("Books", "Rust in Practice", 1499.0, 0.0),
    ("Books", "Cooking Basics", 599.0, 5.0),
    ("Books", "World Atlas", 1899.0, 18.0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = CATALOG.len();
    let mut db_path = String::from("./bazaar_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(CATALOG.len());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  -c, --count <N>    Number of products to generate (default: {})",
                    CATALOG.len()
                );
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bazaar Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Accounts
    println!();
    println!("Creating accounts...");

    let admin = create_account(&db, "Store Admin", "admin@bazaar.test", UserRole::Admin).await?;
    create_account(&db, "Demo Customer", "customer@bazaar.test", UserRole::Customer).await?;

    println!("  admin@bazaar.test / {}", DEMO_PASSWORD);
    println!("  customer@bazaar.test / {}", DEMO_PASSWORD);

    // Catalog
    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let drafts = (0..count)
        .map(|seed| generate_product(seed, admin))
        .collect::<Result<Vec<_>, _>>()?;
    let ids = db.products().insert_many(&drafts).await?;

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", ids.len(), elapsed);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn create_account(
    db: &Database,
    name: &str,
    email: &str,
    role: UserRole,
) -> Result<i64, Box<dyn std::error::Error>> {
    let registration = NewUser {
        name: name.to_string(),
        email: email.to_string(),
        phone: "9876543210".to_string(),
        age: 30,
        password: DEMO_PASSWORD.to_string(),
        country: Country::India.to_string(),
    };
    let country = validate_registration(&registration)?;
    let user = db.users().create(&registration, country, role).await?;

    Ok(user.id)
}

/// Builds one catalog entry through the same validation the "add product"
/// form uses.
fn generate_product(
    seed: usize,
    owner_id: i64,
) -> Result<ProductDraft, bazaar_core::ValidationError> {
    let (category, name, price, discount) = CATALOG[seed % CATALOG.len()];
    let round = seed / CATALOG.len();

    let name = if round == 0 {
        name.to_string()
    } else {
        format!("{} {}", name, round + 1)
    };
    let country = Country::ALL[seed % Country::ALL.len()];

    let form = NewProduct {
        description: format!("{} from the Bazaar demo catalog.", name),
        name,
        price: format!("{:.2}", price + (round as f64) * 50.0),
        discount_percentage: discount,
        quantity: 5 + ((seed * 7) % 46) as i64,
        category: category.to_string(),
        country: country.to_string(),
        image: None,
    };

    validate_new_product(&form, Some(owner_id))
}
