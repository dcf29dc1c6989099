//! Server crate provides HTTP server functionality.
//!
//! This module implements an HTTP server for handling order-related requests:
//! creating orders, retrieving single or all orders, and listing the product
//! catalog. Service errors are mapped to HTTP status codes here; anything
//! unclassified becomes a 500 with a generic message while the underlying
//! cause is only logged.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use model::CreateOrderRequest;
use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use repository::{ProductsRepository, RepositoryError};
use service::{OrderService, ServiceError};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server represents an HTTP server for working with orders and products.
pub struct Server {
    port: String,
    state: AppState,
}

/// Metrics collects and exposes HTTP server metrics.
struct Metrics {
    registry: Registry,
    http_requests_total: CounterVec,
    http_request_duration_seconds: HistogramVec,
    errors_total: CounterVec,
    orders_created_total: Counter,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "endpoint", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "endpoint"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        let errors_total = CounterVec::new(
            Opts::new("errors_total", "Total number of errors"),
            &["source", "endpoint"],
        )
        .expect("Failed to create errors_total metric");

        let orders_created_total = Counter::new(
            "orders_created_total",
            "Total number of successfully created orders",
        )
        .expect("Failed to create orders_created_total metric");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total metric");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("Failed to register http_request_duration_seconds metric");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("Failed to register errors_total metric");
        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("Failed to register orders_created_total metric");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            errors_total,
            orders_created_total,
        }
    }

    fn record_request(&self, method: &str, endpoint: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration.as_secs_f64());
    }

    fn record_error(&self, source: &str, endpoint: &str) {
        self.errors_total
            .with_label_values(&[source, endpoint])
            .inc();
    }
}

/// Maps a service error to an HTTP response.
///
/// `Invalid` and `NotFound` carry messages meant for the caller; any other
/// error is logged and answered with the generic `fallback` message so that
/// internal details do not leak.
fn service_error_response(err: ServiceError, fallback: &'static str) -> Response {
    match err {
        ServiceError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
        other => {
            error!("{}: {}", fallback, other);
            (StatusCode::INTERNAL_SERVER_ERROR, fallback).into_response()
        }
    }
}

impl Server {
    /// Creates a new Server instance.
    ///
    /// # Arguments
    ///
    /// * `port` - The port on which the server will listen
    /// * `orders` - The order service handling creation and reads
    /// * `products` - The product repository for catalog reads
    pub fn new(
        port: String,
        orders: Arc<dyn OrderService>,
        products: Arc<dyn ProductsRepository>,
    ) -> Self {
        info!("Initializing HTTP server on port {}", port);

        Self {
            port,
            state: AppState {
                orders,
                products,
                metrics: Arc::new(Metrics::new()),
            },
        }
    }

    /// Starts the server and blocks until it's shut down.
    pub async fn start(&self) -> Result<()> {
        let app = self.create_router();

        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.port))
            .await
            .context("Failed to bind to port")?;

        info!("HTTP server listening on port {}", self.port);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("HTTP server shut down gracefully");
        Ok(())
    }

    fn create_router(&self) -> Router {
        let metrics = self.state.metrics.clone();

        Router::new()
            .route(
                "/orders",
                post(Self::handle_create_order).get(Self::handle_get_orders),
            )
            .route("/orders/{id}", get(Self::handle_get_order_by_id))
            .route("/products", get(Self::handle_get_products))
            .route("/products/{id}", get(Self::handle_get_product_by_id))
            .route("/health", get(Self::handle_health))
            .route("/metrics", get(Self::handle_metrics))
            .layer(axum::middleware::from_fn_with_state(
                metrics,
                Self::metrics_middleware,
            ))
            .with_state(self.state.clone())
    }

    /// Middleware for collecting metrics on HTTP requests
    async fn metrics_middleware(
        State(metrics): State<Arc<Metrics>>,
        req: axum::extract::Request,
        next: axum::middleware::Next,
    ) -> Response {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let start = std::time::Instant::now();
        let response = next.run(req).await;
        let status = response.status().as_u16();

        metrics.record_request(&method, &path, status, start.elapsed());
        if status >= 400 {
            metrics.record_error("http", &path);
        }

        response
    }

    async fn handle_create_order(
        State(state): State<AppState>,
        Json(request): Json<CreateOrderRequest>,
    ) -> Response {
        info!(
            "Received order request for customer: {}",
            request.customer_email
        );

        match state.orders.create_order(&request).await {
            Ok(order) => {
                state.metrics.orders_created_total.inc();
                info!("Created order {}", order.order_number);
                (StatusCode::CREATED, Json(order)).into_response()
            }
            Err(err) => service_error_response(err, "Failed to create order"),
        }
    }

    async fn handle_get_orders(State(state): State<AppState>) -> Response {
        info!("Received request to fetch all orders");

        match state.orders.list_orders().await {
            Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
            Err(err) => service_error_response(err, "Failed to fetch orders"),
        }
    }

    async fn handle_get_order_by_id(
        State(state): State<AppState>,
        AxumPath(order_id): AxumPath<Uuid>,
    ) -> Response {
        info!("Received order request for ID: {}", order_id);

        match state.orders.find_order(order_id).await {
            Ok(order) => (StatusCode::OK, Json(order)).into_response(),
            Err(err) => service_error_response(err, "Failed to fetch order"),
        }
    }

    async fn handle_get_products(State(state): State<AppState>) -> Response {
        info!("Received request to fetch products");

        match state.products.list_active().await {
            Ok(products) => (StatusCode::OK, Json(products)).into_response(),
            Err(err) => {
                error!("Failed to fetch products: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch products").into_response()
            }
        }
    }

    async fn handle_get_product_by_id(
        State(state): State<AppState>,
        AxumPath(product_id): AxumPath<Uuid>,
    ) -> Response {
        info!("Received product request for ID: {}", product_id);

        match state.products.get_active(product_id).await {
            Ok(product) => (StatusCode::OK, Json(product)).into_response(),
            Err(RepositoryError::NotFound) => {
                warn!("Product not found: {}", product_id);
                (StatusCode::NOT_FOUND, "Product not found").into_response()
            }
            Err(err) => {
                error!("Failed to fetch product: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch product").into_response()
            }
        }
    }

    async fn handle_health() -> &'static str {
        "OK"
    }

    async fn handle_metrics(State(state): State<AppState>) -> Response {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();

        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&state.metrics.registry.gather(), &mut buffer) {
            error!("Failed to encode metrics: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
        }

        match String::from_utf8(buffer) {
            Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
            Err(e) => {
                error!("Failed to convert metrics to UTF-8: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid metrics data").into_response()
            }
        }
    }
}

/// Application state shared between request handlers
#[derive(Clone)]
struct AppState {
    orders: Arc<dyn OrderService>,
    products: Arc<dyn ProductsRepository>,
    metrics: Arc<Metrics>,
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::{Order, Product};
    use tokio_postgres::Transaction;

    struct UnwiredOrders;

    #[async_trait]
    impl OrderService for UnwiredOrders {
        async fn create_order(
            &self,
            _request: &CreateOrderRequest,
        ) -> Result<Order, ServiceError> {
            Err(ServiceError::Unexpected("not wired".into()))
        }

        async fn find_order(&self, id: Uuid) -> Result<Order, ServiceError> {
            Err(ServiceError::NotFound(format!("Order with ID {id} not found")))
        }

        async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
            Ok(Vec::new())
        }
    }

    struct UnwiredProducts;

    #[async_trait]
    impl ProductsRepository for UnwiredProducts {
        async fn insert(&self, _product: &Product) -> Result<(), RepositoryError> {
            Ok(())
        }
        async fn get_by_id(&self, _id: Uuid) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn get_active(&self, _id: Uuid) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn sku_exists(&self, _sku: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }
        async fn get_active_tx(
            &self,
            _tx: &Transaction<'_>,
            _id: Uuid,
        ) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn decrement_stock_tx(
            &self,
            _tx: &Transaction<'_>,
            _id: Uuid,
            _quantity: i32,
        ) -> Result<u64, RepositoryError> {
            Ok(0)
        }
        async fn stock_tx(&self, _tx: &Transaction<'_>, _id: Uuid) -> Result<i32, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
    }

    fn create_test_server() -> Server {
        Server::new(
            "8080".to_string(),
            Arc::new(UnwiredOrders),
            Arc::new(UnwiredProducts),
        )
    }

    #[test]
    fn test_server_creation() {
        let server = create_test_server();
        assert_eq!(server.port, "8080");
    }

    #[test]
    fn test_router_creation() {
        let server = create_test_server();
        let _router = server.create_router();
    }

    #[test]
    fn test_invalid_request_maps_to_400_with_message() {
        let response = service_error_response(
            ServiceError::Invalid("Order must contain at least one item".into()),
            "Failed to create order",
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = service_error_response(
            ServiceError::NotFound("Order with ID x not found".into()),
            "Failed to fetch order",
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unclassified_errors_map_to_500_with_generic_message() {
        let response = service_error_response(
            ServiceError::Unexpected("connection reset".into()),
            "Failed to create order",
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = service_error_response(
            ServiceError::Db(RepositoryError::NotFound),
            "Failed to fetch orders",
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
