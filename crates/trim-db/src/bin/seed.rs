//! # Seed Data Generator
//!
//! Populates a database with a demo barbershop for local development.
//!
//! ## Usage
//! ```bash
//! # Seed ./trim.db (default)
//! cargo run -p trim-db --bin seed
//!
//! # Specify database path
//! cargo run -p trim-db --bin seed -- --db ./data/trim.db
//! ```
//!
//! ## Generated Data
//! - One business (`owner@trim.test` / `password123`), open Monday to
//!   Saturday with a shorter Saturday
//! - A service menu
//! - Two employees (`<name>@trim.test` / `password123`), one following the
//!   shop hours and one with their own week and a lunch break
//! - Retail categories and products with stock, inventory tracking on

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use std::env;
use trim_core::schedule::{BreakInterval, OpeningHours};
use trim_core::{OwnerDetails, ScheduleSpec, TimeOfDay, Weekday};
use trim_db::{Database, DbConfig, ProductFields};

const DEMO_PASSWORD: &str = "password123";

/// (name, price in cents, minutes)
const SERVICES: &[(&str, i64, i64)] = &[
    ("Haircut", 4000, 30),
    ("Skin Fade", 4500, 45),
    ("Beard Trim", 1500, 15),
    ("Hot Towel Shave", 3500, 30),
    ("Kids Cut", 2500, 30),
    ("Cut & Beard", 5000, 60),
];

/// (category, [(product, price in cents, unit, stock)])
const PRODUCTS: &[(&str, &[(&str, i64, &str, i64)])] = &[
    (
        "Styling",
        &[
            ("Matte Pomade", 1800, "jar", 12),
            ("Shine Pomade", 1800, "jar", 8),
            ("Sea Salt Spray", 1600, "bottle", 5),
            ("Hair Clay", 2000, "jar", 3),
        ],
    ),
    (
        "Beard Care",
        &[
            ("Beard Oil", 2200, "bottle", 10),
            ("Beard Balm", 1900, "tin", 6),
        ],
    ),
    (
        "Wash",
        &[
            ("Daily Shampoo", 1500, "bottle", 14),
            ("Conditioner", 1500, "bottle", 9),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./trim.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Trim Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./trim.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Trim Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db
        .businesses()
        .credentials_by_email("owner@trim.test")
        .await?
        .is_some()
    {
        println!("⚠ Demo business already exists");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let password_hash = hash(DEMO_PASSWORD)?;

    // Business and opening hours
    let business = db
        .businesses()
        .insert("Trim Demo Barbers", "Sam Rivera", "owner@trim.test", &password_hash)
        .await?;

    let mut shop_week = ScheduleSpec {
        working_days: vec![
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
        ],
        ..Default::default()
    };
    shop_week.working_hours.insert(
        Weekday::Saturday,
        OpeningHours::new(TimeOfDay::hm(10, 0), TimeOfDay::hm(14, 0)),
    );
    db.businesses()
        .upsert_schedule(
            &business.id,
            &shop_week,
            &OwnerDetails {
                first_name: "Sam".into(),
                last_name: "Rivera".into(),
                phone: "555-0100".into(),
            },
            "America/New_York",
        )
        .await?;
    db.businesses()
        .set_inventory_enabled(&business.id, true)
        .await?;
    println!("✓ Business {} ({})", business.name, business.id);

    // Services
    let mut service_ids = Vec::new();
    for (name, price_cents, minutes) in SERVICES {
        let service = db
            .services()
            .insert(&business.id, name, *price_cents, *minutes)
            .await?;
        service_ids.push(service.id);
    }
    println!("✓ {} services", service_ids.len());

    // Employees
    db.employees()
        .insert(
            &business.id,
            "Marcus",
            "marcus@trim.test",
            Some("555-0111"),
            &password_hash,
            &service_ids,
            &ScheduleSpec::default(),
        )
        .await?;

    let mut own_week = ScheduleSpec {
        working_days: vec![Weekday::Wednesday, Weekday::Thursday, Weekday::Friday],
        ..Default::default()
    };
    for day in &own_week.working_days.clone() {
        own_week.working_hours.insert(
            *day,
            OpeningHours::new(TimeOfDay::hm(11, 0), TimeOfDay::hm(19, 0)),
        );
        own_week.breaks.insert(
            *day,
            vec![BreakInterval::new(TimeOfDay::hm(14, 0), TimeOfDay::hm(14, 30))],
        );
    }
    db.employees()
        .insert(
            &business.id,
            "Priya",
            "priya@trim.test",
            None,
            &password_hash,
            &service_ids[..3],
            &own_week,
        )
        .await?;
    println!("✓ 2 employees");

    // Catalog and stock
    let mut product_count = 0;
    for (category_name, products) in PRODUCTS {
        let category = db
            .catalog()
            .insert_category(&business.id, category_name, None)
            .await?;

        for (name, price_cents, unit, stock) in products.iter() {
            let product = db
                .catalog()
                .insert_product(
                    &business.id,
                    ProductFields {
                        category_id: Some(category.id.clone()),
                        name: name.to_string(),
                        description: None,
                        unit: Some(unit.to_string()),
                        price_per_unit_cents: *price_cents,
                    },
                )
                .await?;
            db.inventory()
                .set_quantity(&business.id, &product.id, *stock, None)
                .await?;
            product_count += 1;
        }
    }
    println!("✓ {} products with stock", product_count);

    println!();
    println!("✓ Seed complete! Log in as owner@trim.test / {}", DEMO_PASSWORD);

    Ok(())
}

fn hash(password: &str) -> Result<String, Box<dyn std::error::Error>> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?;
    Ok(hash.to_string())
}
