//! Business logic layer for order management.
//!
//! This module defines the [`OrderService`] trait and its async implementation
//! [`OrderServiceImpl`]. The service coordinates multi-table order persistence
//! and retrieval, providing transactional guarantees, business validation, and
//! repository abstraction.
//!
//! # Features
//! - Atomic creation of an [`Order`] with its items, shipping, payment and
//!   stock decrements in a single transaction.
//! - Validation and pricing of requested items before persistence.
//! - Unique, human-readable order numbers from an injected clock and RNG.
//! - Dependency injection for testability and loose coupling.
//! - Well-typed error handling via [`ServiceError`].

mod number;
mod pricing;

pub use number::{Clock, OrderNumberGenerator, RandomSuffix, SuffixSource, SystemClock};
pub use pricing::{PricedItem, PricedOrder};

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Pool, PoolError};
use model::{
    CreateOrderItemRequest, CreateOrderRequest, Order, OrderItem, OrderStatus, Payment,
    PaymentStatus, Shipping, ShippingStatus, DEFAULT_CURRENCY,
};
use repository::{
    OrderItemsRepository, OrdersRepository, PaymentsRepository, ProductsRepository,
    RepositoryError, ShippingRepository,
};
use thiserror::Error;
use tokio_postgres::Transaction;
use tracing::instrument;
use uuid::Uuid;

/// Attempts to allocate an unused order number before giving up.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// The main error type for all operations in [`OrderService`] and [`OrderServiceImpl`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request is structurally or semantically invalid
    /// (no items, bad quantity, insufficient stock).
    #[error("{0}")]
    Invalid(String),
    /// A referenced entity (product, order) does not exist.
    #[error("{0}")]
    NotFound(String),
    /// A repository (database) operation failed.
    #[error("Database error: {0}")]
    Db(#[from] RepositoryError),
    /// Failed to obtain a database connection from the pool.
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
    /// Some unexpected or unhandled error.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Trait describing business operations for order management.
///
/// Implementations are expected to guarantee atomicity and data integrity
/// when creating orders and their related entities, typically via a
/// transaction.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Validates the request, then atomically persists the order with its
    /// items, shipping, payment, and the product stock decrements.
    ///
    /// # Errors
    /// Returns [`ServiceError::Invalid`] for an empty item list or
    /// insufficient stock, [`ServiceError::NotFound`] for an unknown or
    /// inactive product, and the remaining variants for infrastructure
    /// failures. On any error nothing is persisted.
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ServiceError>;

    /// Retrieves the full order by id, including items (with their products),
    /// shipping and payment.
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] if no order matches the id.
    async fn find_order(&self, id: Uuid) -> Result<Order, ServiceError>;

    /// Retrieves all orders, newest first, each fully hydrated.
    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError>;
}

/// Async implementation of [`OrderService`] using the repository pattern.
///
/// This struct wires together concrete repository implementations and a
/// Postgres connection pool to enable atomic, transactional operations on
/// orders.
pub struct OrderServiceImpl<R1, R2, R3, R4, R5> {
    db_pool: Pool,
    products_repo: R1,
    orders_repo: R2,
    items_repo: R3,
    shipping_repo: R4,
    payments_repo: R5,
    clock: Arc<dyn Clock>,
    order_numbers: OrderNumberGenerator,
}

impl<R1, R2, R3, R4, R5> OrderServiceImpl<R1, R2, R3, R4, R5>
where
    R1: ProductsRepository + Send + Sync,
    R2: OrdersRepository + Send + Sync,
    R3: OrderItemsRepository + Send + Sync,
    R4: ShippingRepository + Send + Sync,
    R5: PaymentsRepository + Send + Sync,
{
    /// Constructs a new [`OrderServiceImpl`] from the provided dependencies.
    ///
    /// # Arguments
    /// * `db_pool` - The Postgres connection pool to use for transactions.
    /// * `products_repo` - The repository for product lookup and stock updates.
    /// * `orders_repo` - The repository for order header data.
    /// * `items_repo` - The repository for order line items.
    /// * `shipping_repo` - The repository for shipping records.
    /// * `payments_repo` - The repository for payment records.
    /// * `clock` - Time source for order numbers and entity timestamps.
    /// * `suffix` - Randomness source for the order-number suffix.
    ///
    /// This approach enables dependency injection and facilitates mocking/testing.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: Pool,
        products_repo: R1,
        orders_repo: R2,
        items_repo: R3,
        shipping_repo: R4,
        payments_repo: R5,
        clock: Arc<dyn Clock>,
        suffix: Arc<dyn SuffixSource>,
    ) -> Self {
        let order_numbers = OrderNumberGenerator::new(clock.clone(), suffix);
        Self {
            db_pool,
            products_repo,
            orders_repo,
            items_repo,
            shipping_repo,
            payments_repo,
            clock,
            order_numbers,
        }
    }

    /// Validates the requested items in input order and prices them against
    /// the current product rows, read through the caller's transaction.
    ///
    /// The first failing item aborts validation; nothing is aggregated.
    async fn validate_and_price(
        &self,
        tx: &Transaction<'_>,
        items: &[CreateOrderItemRequest],
    ) -> Result<PricedOrder, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::Invalid(pricing::EMPTY_ORDER_MESSAGE.into()));
        }

        let mut priced = PricedOrder::default();
        for item in items {
            let product = match self.products_repo.get_active_tx(tx, item.product_id).await {
                Ok(product) => product,
                Err(RepositoryError::NotFound) => {
                    return Err(ServiceError::NotFound(format!(
                        "Product with ID {} not found",
                        item.product_id
                    )));
                }
                Err(e) => return Err(e.into()),
            };
            priced.push(product, item.quantity)?;
        }
        Ok(priced)
    }

    /// Allocates an order number not yet present in the orders table,
    /// regenerating on collision. The UNIQUE constraint on `order_number`
    /// backstops the residual race between check and commit.
    async fn unique_order_number(&self, tx: &Transaction<'_>) -> Result<String, ServiceError> {
        for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
            let candidate = self.order_numbers.generate();
            if !self
                .orders_repo
                .order_number_exists_tx(tx, &candidate)
                .await?
            {
                return Ok(candidate);
            }
        }
        Err(ServiceError::Unexpected(
            "Failed to allocate a unique order number".into(),
        ))
    }

    /// Attaches items (with their products), shipping and payment to an order
    /// header.
    async fn hydrate(&self, mut order: Order) -> Result<Order, ServiceError> {
        let mut items = self.items_repo.get_by_order_id(order.id).await?;
        for item in &mut items {
            item.product = match self.products_repo.get_by_id(item.product_id).await {
                Ok(product) => Some(product),
                Err(RepositoryError::NotFound) => None,
                Err(e) => return Err(e.into()),
            };
        }
        order.order_items = items;
        order.shipping = Some(self.shipping_repo.get_by_order_id(order.id).await?);
        order.payment = Some(self.payments_repo.get_by_order_id(order.id).await?);
        Ok(order)
    }
}

#[async_trait]
impl<R1, R2, R3, R4, R5> OrderService for OrderServiceImpl<R1, R2, R3, R4, R5>
where
    R1: ProductsRepository + Send + Sync,
    R2: OrdersRepository + Send + Sync,
    R3: OrderItemsRepository + Send + Sync,
    R4: ShippingRepository + Send + Sync,
    R5: PaymentsRepository + Send + Sync,
{
    /// Creates the order and all related entities in a single DB transaction.
    ///
    /// Any error before commit returns early, which drops the open
    /// transaction and rolls everything back; the error itself propagates
    /// unchanged to the caller.
    #[instrument(skip(self, request))]
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ServiceError> {
        let mut client = self.db_pool.get().await.map_err(ServiceError::from)?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Begin transaction failed: {e}")))?;

        let priced = self.validate_and_price(&tx, &request.order_items).await?;
        let order_number = self.unique_order_number(&tx).await?;

        let now = self.clock.now();
        let order_id = Uuid::new_v4();
        let order = Order {
            id: order_id,
            order_number,
            customer_email: request.customer_email.clone(),
            customer_name: request.customer_name.clone(),
            customer_phone: request.customer_phone.clone(),
            status: OrderStatus::Pending,
            subtotal: priced.subtotal,
            tax_amount: priced.tax_amount,
            shipping_cost: priced.shipping_cost,
            total_amount: priced.total_amount(),
            currency: DEFAULT_CURRENCY.to_string(),
            notes: request.notes.clone(),
            shipped_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
            order_items: Vec::new(),
            shipping: None,
            payment: None,
        };
        self.orders_repo.insert_tx(&tx, &order).await?;

        let items: Vec<OrderItem> = priced
            .items
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                product_sku: line.product.sku.clone(),
                quantity: line.quantity,
                unit_price: line.product.price,
                total_price: line.line_total,
                created_at: now,
                updated_at: now,
                product: None,
            })
            .collect();
        self.items_repo.insert_tx(&tx, &items).await?;

        let shipping = Shipping {
            id: Uuid::new_v4(),
            order_id,
            method: request.shipping.method,
            status: ShippingStatus::Pending,
            first_name: request.shipping.first_name.clone(),
            last_name: request.shipping.last_name.clone(),
            address_line1: request.shipping.address_line1.clone(),
            address_line2: request.shipping.address_line2.clone(),
            city: request.shipping.city.clone(),
            state: request.shipping.state.clone(),
            postal_code: request.shipping.postal_code.clone(),
            country: request.shipping.country.clone(),
            phone: request.shipping.phone.clone(),
            email: request.shipping.email.clone(),
            carrier: None,
            tracking_number: None,
            estimated_delivery_date: None,
            shipped_date: None,
            delivered_date: None,
            weight: None,
            weight_unit: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.shipping_repo.insert_tx(&tx, &shipping).await?;

        let payment = Payment {
            id: Uuid::new_v4(),
            order_id,
            method: request.payment.method,
            status: PaymentStatus::Pending,
            amount: order.total_amount,
            currency: DEFAULT_CURRENCY.to_string(),
            gateway_transaction_id: None,
            gateway_reference: None,
            gateway_name: None,
            last_four_digits: request.payment.last_four_digits.clone(),
            card_brand: request.payment.card_brand.clone(),
            expiry_month: request.payment.expiry_month.clone(),
            expiry_year: request.payment.expiry_year.clone(),
            billing_first_name: request.payment.billing_first_name.clone(),
            billing_last_name: request.payment.billing_last_name.clone(),
            billing_address_line1: request.payment.billing_address_line1.clone(),
            billing_address_line2: request.payment.billing_address_line2.clone(),
            billing_city: request.payment.billing_city.clone(),
            billing_state: request.payment.billing_state.clone(),
            billing_postal_code: request.payment.billing_postal_code.clone(),
            billing_country: request.payment.billing_country.clone(),
            processed_at: None,
            failed_at: None,
            failure_reason: None,
            refunded_amount: rust_decimal::Decimal::ZERO,
            refunded_at: None,
            refund_reason: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.payments_repo.insert_tx(&tx, &payment).await?;

        for line in &priced.items {
            let affected = self
                .products_repo
                .decrement_stock_tx(&tx, line.product.id, line.quantity)
                .await?;
            if affected == 0 {
                // Stock dropped below the requested quantity between
                // validation and decrement; re-read it for the error message.
                let available = match self.products_repo.stock_tx(&tx, line.product.id).await {
                    Ok(stock) => stock,
                    Err(RepositoryError::NotFound) => 0,
                    Err(e) => return Err(e.into()),
                };
                return Err(ServiceError::Invalid(pricing::insufficient_stock_message(
                    &line.product.name,
                    available,
                    line.quantity,
                )));
            }
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Commit failed: {e}")))?;

        // Return the complete order with relations.
        self.find_order(order_id).await
    }

    /// Loads a full order with items, shipping, and payment by its id.
    #[instrument(skip(self))]
    async fn find_order(&self, id: Uuid) -> Result<Order, ServiceError> {
        let order = match self.orders_repo.get_by_id(id).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound(format!("Order with ID {id} not found")));
            }
            Err(e) => return Err(e.into()),
        };
        self.hydrate(order).await
    }

    /// Loads all orders, newest first, each with its relations attached.
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        let headers = self.orders_repo.list().await?;
        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            orders.push(self.hydrate(header).await?);
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_and_not_found_display_pass_message_through() {
        let invalid = ServiceError::Invalid("Order must contain at least one item".into());
        assert_eq!(invalid.to_string(), "Order must contain at least one item");

        let not_found = ServiceError::NotFound("Product with ID abc not found".into());
        assert_eq!(not_found.to_string(), "Product with ID abc not found");
    }

    #[test]
    fn test_repository_errors_convert_to_db_variant() {
        let err: ServiceError = RepositoryError::NotFound.into();
        assert!(matches!(err, ServiceError::Db(RepositoryError::NotFound)));
    }
}
