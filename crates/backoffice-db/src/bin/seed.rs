//! # Seed Data Generator
//!
//! Populates the database with development data.
//!
//! ## Usage
//! ```bash
//! # Defaults: 50 users, 100 products, 20 purchases
//! cargo run -p backoffice-db --bin seed
//!
//! # Custom amounts
//! cargo run -p backoffice-db --bin seed -- --users 200 --products 500 --purchases 80
//!
//! # Specify database path
//! cargo run -p backoffice-db --bin seed -- --db ./data/backoffice.db
//! ```
//!
//! ## Generated Data
//! - The standard roles (administrator, manager, editor, viewer)
//! - Users with `first.lastN@example.com` emails
//! - `test@example.com` holding the administrator role
//! - Products across six categories, about 80% active
//! - Purchases of 1-3 distinct products, quantity 1-5, written through the
//!   purchase repository so totals are computed the normal way
//!
//! Values derive from the row index, so two runs produce the same catalogue.

use std::env;

use backoffice_core::purchase::{LineInput, PurchaseInput};
use backoffice_core::{NewProduct, NewUser, PaymentMethod, PurchaseStatus};
use backoffice_db::{Database, DbConfig};
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Linus", "Margaret", "Ken", "Barbara", "Dennis", "Frances", "Edsger",
    "Radia", "Donald", "Hedy", "John", "Katherine", "Niklaus",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Torvalds", "Hamilton", "Thompson", "Liskov", "Ritchie",
    "Allen", "Dijkstra", "Perlman", "Knuth", "Lamarr", "Backus", "Johnson", "Wirth",
];

const CATEGORIES: &[&str] = &["Electronics", "Clothing", "Books", "Home", "Sports", "Toys"];

const ADJECTIVES: &[&str] = &[
    "Compact", "Deluxe", "Ergonomic", "Portable", "Rugged", "Smart", "Classic", "Wireless",
    "Premium", "Eco",
];

const NOUNS: &[&str] = &[
    "Laptop", "Jacket", "Novel", "Lamp", "Racket", "Puzzle", "Headphones", "Backpack", "Kettle",
    "Drone",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut user_count: usize = 50;
    let mut product_count: usize = 100;
    let mut purchase_count: usize = 20;
    let mut db_path = String::from("./backoffice.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--users" | "-u" => {
                if i + 1 < args.len() {
                    user_count = args[i + 1].parse().unwrap_or(user_count);
                    i += 1;
                }
            }
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    product_count = args[i + 1].parse().unwrap_or(product_count);
                    i += 1;
                }
            }
            "--purchases" | "-o" => {
                if i + 1 < args.len() {
                    purchase_count = args[i + 1].parse().unwrap_or(purchase_count);
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
                println!("Backoffice Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --users <N>       Users to generate (default: 50)");
                println!("  -p, --products <N>    Products to generate (default: 100)");
                println!("  -o, --purchases <N>   Purchases to generate (default: 20)");
                println!("  -d, --db <PATH>       Database file path (default: ./backoffice.db)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Backoffice Seed Data Generator");
    println!("=================================");
    println!("Database:  {}", db_path);
    println!("Users:     {}", user_count);
    println!("Products:  {}", product_count);
    println!("Purchases: {}", purchase_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing_users = db.users().count().await?;
    let existing_products = db.products().count().await?;
    if existing_users > 0 || existing_products > 0 {
        println!(
            "⚠ Database already has {} users and {} products",
            existing_users, existing_products
        );
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Roles
    let roles = db.roles().ensure_standard_roles().await?;
    println!("✓ {} roles", roles.len());

    // Users
    let mut user_ids = Vec::with_capacity(user_count + 1);
    for n in 0..user_count {
        let user = db.users().insert(&generate_user(n)).await?;
        user_ids.push(user.id);
    }

    let test_user = db
        .users()
        .insert(&NewUser {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
        })
        .await?;
    user_ids.push(test_user.id);

    if let Some(admin) = db.roles().get_by_slug("administrator").await? {
        db.roles().attach_user(admin.id, test_user.id).await?;
    }
    println!("✓ {} users (test@example.com is administrator)", user_ids.len());

    // Products
    let mut product_ids = Vec::with_capacity(product_count);
    for n in 0..product_count {
        let product = generate_product(n);
        match db.products().insert(&product).await {
            Ok(created) => product_ids.push(created.id),
            Err(e) => eprintln!("Failed to insert {}: {}", product.sku, e),
        }
    }
    println!("✓ {} products", product_ids.len());

    // Purchases
    let mut created = 0;
    if user_ids.is_empty() || product_ids.is_empty() {
        println!("⚠ No users or products, skipping purchases");
    } else {
        for n in 0..purchase_count {
            let input = generate_purchase(n, &user_ids, &product_ids);
            match db.purchases().create(&input).await {
                Ok(_) => created += 1,
                Err(e) => eprintln!("Failed to create purchase {}: {}", n, e),
            }
        }
    }
    println!("✓ {} purchases", created);

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}

fn generate_user(n: usize) -> NewUser {
    let first = FIRST_NAMES[n % FIRST_NAMES.len()];
    let last = LAST_NAMES[(n * 7 + 3) % LAST_NAMES.len()];

    NewUser {
        name: format!("{} {}", first, last),
        email: format!("{}.{}{}@example.com", first, last, n).to_lowercase(),
    }
}

fn generate_product(n: usize) -> NewProduct {
    let adjective = ADJECTIVES[n % ADJECTIVES.len()];
    let noun = NOUNS[(n / ADJECTIVES.len() + n * 3) % NOUNS.len()];
    let category = CATEGORIES[(n * 5 + 1) % CATEGORIES.len()];

    // 9.99 - 999.99
    let price_cents = 999 + ((n * 7919) % 99_001) as i64;

    NewProduct {
        name: format!("{} {}", adjective, noun),
        description: Some(format!(
            "{} {} from the {} range, batch {}.",
            adjective,
            noun.to_lowercase(),
            category.to_lowercase(),
            n / 10 + 1
        )),
        price_cents,
        category: category.to_string(),
        stock: (n * 37 % 101) as i64,
        sku: format!("SKU-{}-{:04}", &noun[..3].to_uppercase(), n),
        is_active: n % 5 != 0,
    }
}

fn generate_purchase(n: usize, user_ids: &[i64], product_ids: &[i64]) -> PurchaseInput {
    let line_count = 1 + n % 3;
    let mut lines: Vec<LineInput> = Vec::with_capacity(line_count);
    let mut k = 0;
    while lines.len() < line_count.min(product_ids.len()) {
        let product_id = product_ids[(n * 13 + k * 31) % product_ids.len()];
        if !lines.iter().any(|l| l.product_id == product_id) {
            lines.push(LineInput {
                product_id,
                quantity: 1 + ((n + k) % 5) as i64,
            });
        }
        k += 1;
    }

    let status = PurchaseStatus::ALL[n % PurchaseStatus::ALL.len()];
    let method = PaymentMethod::ALL[(n / 2) % PaymentMethod::ALL.len()];

    PurchaseInput {
        user_id: Some(user_ids[(n * 11) % user_ids.len()]),
        status: Some(status.as_str().to_string()),
        payment_method: Some(method.as_str().to_string()),
        transaction_id: Some(format!("TXN-{}", Uuid::new_v4().simple()).to_uppercase()),
        notes: (n % 4 == 0).then(|| "Seeded order".to_string()),
        lines: Some(lines),
    }
}
