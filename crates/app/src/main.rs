/// Order-Processing Backend Application
///
/// This is the main entry point for the order-processing backend service.
/// The application provides REST API endpoints for placing orders against
/// the product catalog and reading them back with their related entities.
///
/// # Features
///
/// - Order creation with transactional stock decrement
/// - Order retrieval with items, shipping and payment attached
/// - Product catalog listing
/// - Metrics for monitoring
///
/// # Architecture
///
/// The application follows a modular architecture with:
/// - Repository layer for data access
/// - Service layer for business logic
/// - API layer for HTTP endpoints
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use app_config::AppConfig;
use repository::{
    PgOrderItemsRepository, PgOrdersRepository, PgPaymentsRepository, PgProductsRepository,
    PgShippingRepository,
};
use server::Server;
use service::{OrderServiceImpl, RandomSuffix, SystemClock};
use tokio_postgres::{Client, NoTls};

/// Initialize the tracing subscriber for logging
fn init_logger() {
    tracing_subscriber::fmt::init();
}

/// Opens a dedicated Postgres connection and spawns its driver task.
///
/// `tokio_postgres::Client` is not `Clone`, so each repository gets its own
/// connection.
async fn connect(dsn: &str, label: &'static str) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(dsn, NoTls)
        .await
        .with_context(|| format!("Failed to connect to database for {label} repository"))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("{} repository connection error: {}", label, e);
        }
    });

    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    info!("Order backend starting...");

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize database pool and apply migrations
    let db_pool = match db::init_db_pool(&config).await {
        Ok(pool) => {
            info!("Database initialized successfully");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(anyhow::anyhow!("Failed to initialize database"));
        }
    };

    let dsn = config.db_dsn();

    // Initialize repositories
    let products_repo = PgProductsRepository::new(connect(&dsn, "products").await?);
    let orders_repo = PgOrdersRepository::new(connect(&dsn, "orders").await?);
    let items_repo = PgOrderItemsRepository::new(connect(&dsn, "order items").await?);
    let shipping_repo = PgShippingRepository::new(connect(&dsn, "shipping").await?);
    let payments_repo = PgPaymentsRepository::new(connect(&dsn, "payments").await?);

    // Initialize order service
    let order_service = Arc::new(OrderServiceImpl::new(
        db_pool.clone(),
        products_repo,
        orders_repo,
        items_repo,
        shipping_repo,
        payments_repo,
        Arc::new(SystemClock),
        Arc::new(RandomSuffix),
    ));

    // A separate connection serves catalog reads over HTTP.
    let catalog_repo = Arc::new(PgProductsRepository::new(connect(&dsn, "catalog").await?));

    // Start HTTP server (blocks until shutdown signal)
    let http_server = Server::new(config.http_port.to_string(), order_service, catalog_repo);
    http_server.start().await?;

    info!("Application stopped");
    Ok(())
}
