//! Seeds the database with the demo product catalog.
//!
//! Run with `cargo run --bin seed`. Products whose SKU already exists are
//! skipped, so the binary can be re-run safely.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tokio_postgres::NoTls;
use tracing::{error, info};
use uuid::Uuid;

use app_config::AppConfig;
use model::Product;
use repository::{PgProductsRepository, ProductsRepository};

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    stock: i32,
    category: &'static str,
    sku: &'static str,
}

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Wireless Bluetooth Headphones",
        description: "High-quality wireless headphones with noise cancellation and 30-hour battery life.",
        price: "199.99",
        stock: 50,
        category: "Electronics",
        sku: "WBH-001",
    },
    DemoProduct {
        name: "Organic Cotton T-Shirt",
        description: "Comfortable 100% organic cotton t-shirt, available in multiple colors.",
        price: "29.99",
        stock: 100,
        category: "Clothing",
        sku: "OCT-001",
    },
    DemoProduct {
        name: "Stainless Steel Water Bottle",
        description: "Insulated stainless steel water bottle that keeps drinks cold for 24 hours.",
        price: "24.99",
        stock: 75,
        category: "Accessories",
        sku: "SSB-001",
    },
    DemoProduct {
        name: "Smart Fitness Tracker",
        description: "Advanced fitness tracker with heart rate monitoring and GPS tracking.",
        price: "149.99",
        stock: 30,
        category: "Electronics",
        sku: "SFT-001",
    },
    DemoProduct {
        name: "Leather Laptop Bag",
        description: "Premium leather laptop bag with multiple compartments and padded protection.",
        price: "89.99",
        stock: 25,
        category: "Accessories",
        sku: "LLB-001",
    },
    DemoProduct {
        name: "Wireless Charging Pad",
        description: "Fast wireless charging pad compatible with all Qi-enabled devices.",
        price: "39.99",
        stock: 60,
        category: "Electronics",
        sku: "WCP-001",
    },
    DemoProduct {
        name: "Yoga Mat Premium",
        description: "Non-slip yoga mat made from eco-friendly materials with carrying strap.",
        price: "49.99",
        stock: 40,
        category: "Sports",
        sku: "YMP-001",
    },
    DemoProduct {
        name: "Coffee Maker Deluxe",
        description: "Programmable coffee maker with built-in grinder and thermal carafe.",
        price: "179.99",
        stock: 15,
        category: "Home & Kitchen",
        sku: "CMD-001",
    },
    DemoProduct {
        name: "Bluetooth Speaker Portable",
        description: "Waterproof portable Bluetooth speaker with 360-degree sound.",
        price: "79.99",
        stock: 45,
        category: "Electronics",
        sku: "BSP-001",
    },
    DemoProduct {
        name: "Running Shoes Athletic",
        description: "Lightweight running shoes with advanced cushioning and breathable mesh.",
        price: "129.99",
        stock: 80,
        category: "Sports",
        sku: "RSA-001",
    },
    DemoProduct {
        name: "LED Desk Lamp",
        description: "Adjustable LED desk lamp with multiple brightness levels and USB charging port.",
        price: "34.99",
        stock: 35,
        category: "Home & Kitchen",
        sku: "LDL-001",
    },
    DemoProduct {
        name: "Phone Case Protective",
        description: "Shock-absorbing phone case with raised edges for screen protection.",
        price: "19.99",
        stock: 120,
        category: "Accessories",
        sku: "PCP-001",
    },
    DemoProduct {
        name: "Protein Powder Vanilla",
        description: "Whey protein powder with natural vanilla flavor, 2lb container.",
        price: "44.99",
        stock: 20,
        category: "Sports",
        sku: "PPV-001",
    },
    DemoProduct {
        name: "Mechanical Keyboard Gaming",
        description: "RGB backlit mechanical gaming keyboard with customizable keys.",
        price: "119.99",
        stock: 18,
        category: "Electronics",
        sku: "MKG-001",
    },
    DemoProduct {
        name: "Travel Backpack 40L",
        description: "Durable travel backpack with laptop compartment and multiple pockets.",
        price: "69.99",
        stock: 32,
        category: "Accessories",
        sku: "TB40-001",
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let (client, connection) = tokio_postgres::connect(&config.db_dsn(), NoTls)
        .await
        .context("Failed to connect to database")?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Database connection error: {}", e);
        }
    });

    // Make sure the schema exists before inserting.
    db::run_migrations(&client, "migrations").await?;

    let repo = PgProductsRepository::new(client);
    let mut inserted = 0;

    for demo in DEMO_PRODUCTS {
        if repo.sku_exists(demo.sku).await? {
            info!("Skipping existing product: {}", demo.sku);
            continue;
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: demo.name.to_string(),
            description: Some(demo.description.to_string()),
            price: demo.price.parse::<Decimal>()?,
            stock: demo.stock,
            category: Some(demo.category.to_string()),
            sku: Some(demo.sku.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        repo.insert(&product).await?;
        info!("Seeded product {} ({})", product.name, demo.sku);
        inserted += 1;
    }

    info!("Seeding finished: {} products inserted", inserted);
    Ok(())
}
