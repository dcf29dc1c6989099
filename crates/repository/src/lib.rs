//! # Data Repository Layer
//!
//! This module provides repository traits and PostgreSQL implementations
//! for all entities: products, orders, order items, shipping, payments.
//! Write operations used by the order workflow are transactional (`*_tx`)
//! and run against a caller-supplied transaction so that the whole order
//! either commits or rolls back as one unit.

use async_trait::async_trait;
use model::{Order, OrderItem, Payment, Product, Shipping};
use thiserror::Error;
use tokio_postgres::{Client, Row, Transaction};
use uuid::Uuid;

/// # RepositoryError
///
/// Error types that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database-related errors, wrapping the underlying PostgreSQL error
    #[error("Database error: {0}")]
    Db(#[from] tokio_postgres::Error),
    /// No result found.
    #[error("Not found")]
    NotFound,
}

fn product_from_row(row: &Row) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        stock: row.get("stock"),
        category: row.get("category"),
        sku: row.get("sku"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, category, sku, is_active, created_at, updated_at";

/// # ProductsRepository
///
/// Repository interface for the product catalog.
///
/// Order creation reads products and decrements stock through the `*_tx`
/// methods so the lookup and the decrement share one transaction; catalog
/// reads (HTTP product listing) use the plain methods.
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    /// Insert a product (used by the seed binary).
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Get a product by id regardless of active flag.
    async fn get_by_id(&self, id: Uuid) -> Result<Product, RepositoryError>;

    /// Get an active product by id.
    async fn get_active(&self, id: Uuid) -> Result<Product, RepositoryError>;

    /// All active products, newest first.
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Whether any product already carries this SKU.
    async fn sku_exists(&self, sku: &str) -> Result<bool, RepositoryError>;

    /// Get an active product by id inside a transaction.
    async fn get_active_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
    ) -> Result<Product, RepositoryError>;

    /// Atomically decrement stock by `quantity`, refusing to go negative.
    ///
    /// Returns the number of affected rows: zero means the product vanished
    /// or its stock dropped below `quantity` since validation.
    async fn decrement_stock_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        quantity: i32,
    ) -> Result<u64, RepositoryError>;

    /// Current stock level inside a transaction.
    async fn stock_tx(&self, tx: &Transaction<'_>, id: Uuid) -> Result<i32, RepositoryError>;
}

/// PostgreSQL implementation of the ProductsRepository trait.
pub struct PgProductsRepository {
    /// PostgreSQL client for database operations
    db: Client,
}

impl PgProductsRepository {
    pub fn new(db: Client) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductsRepository for PgProductsRepository {
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO products (id, name, description, price, stock, category, sku, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#;
        self.db
            .execute(
                query,
                &[
                    &product.id,
                    &product.name,
                    &product.description,
                    &product.price,
                    &product.stock,
                    &product.category,
                    &product.sku,
                    &product.is_active,
                    &product.created_at,
                    &product.updated_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Product, RepositoryError> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = self.db.query_opt(query.as_str(), &[&id]).await?;
        match row {
            Some(row) => Ok(product_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn get_active(&self, id: Uuid) -> Result<Product, RepositoryError> {
        let query =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE");
        let row = self.db.query_opt(query.as_str(), &[&id]).await?;
        match row {
            Some(row) => Ok(product_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = TRUE ORDER BY created_at DESC"
        );
        let rows = self.db.query(query.as_str(), &[]).await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn sku_exists(&self, sku: &str) -> Result<bool, RepositoryError> {
        let row = self
            .db
            .query_one("SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)", &[&sku])
            .await?;
        Ok(row.get(0))
    }

    async fn get_active_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
    ) -> Result<Product, RepositoryError> {
        let query =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE");
        let row = tx.query_opt(query.as_str(), &[&id]).await?;
        match row {
            Some(row) => Ok(product_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn decrement_stock_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        quantity: i32,
    ) -> Result<u64, RepositoryError> {
        let query = r#"
            UPDATE products
            SET stock = stock - $2, updated_at = now()
            WHERE id = $1 AND stock >= $2
        "#;
        let affected = tx.execute(query, &[&id, &quantity]).await?;
        Ok(affected)
    }

    async fn stock_tx(&self, tx: &Transaction<'_>, id: Uuid) -> Result<i32, RepositoryError> {
        let row = tx
            .query_opt("SELECT stock FROM products WHERE id = $1", &[&id])
            .await?;
        match row {
            Some(row) => Ok(row.get("stock")),
            None => Err(RepositoryError::NotFound),
        }
    }
}

fn order_from_row(row: &Row) -> Order {
    Order {
        id: row.get("id"),
        order_number: row.get("order_number"),
        customer_email: row.get("customer_email"),
        customer_name: row.get("customer_name"),
        customer_phone: row.get("customer_phone"),
        status: row.get("status"),
        subtotal: row.get("subtotal"),
        tax_amount: row.get("tax_amount"),
        shipping_cost: row.get("shipping_cost"),
        total_amount: row.get("total_amount"),
        currency: row.get("currency"),
        notes: row.get("notes"),
        shipped_at: row.get("shipped_at"),
        delivered_at: row.get("delivered_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        // Relations are filled by the service.
        order_items: Vec::new(),
        shipping: None,
        payment: None,
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_email, customer_name, customer_phone, \
     status, subtotal, tax_amount, shipping_cost, total_amount, currency, notes, \
     shipped_at, delivered_at, created_at, updated_at";

/// # OrdersRepository
///
/// Repository interface for order header rows.
///
/// Orders are the main aggregates of the system; the rows managed here hold
/// the customer and totals data, while items, shipping and payment live in
/// their own repositories keyed by order id.
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Insert the order header in a transaction.
    async fn insert_tx(&self, tx: &Transaction<'_>, order: &Order) -> Result<(), RepositoryError>;

    /// Whether an order already carries this order number.
    async fn order_number_exists_tx(
        &self,
        tx: &Transaction<'_>,
        order_number: &str,
    ) -> Result<bool, RepositoryError>;

    /// Get an order header by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Order, RepositoryError>;

    /// All order headers, newest first.
    async fn list(&self) -> Result<Vec<Order>, RepositoryError>;
}

/// PostgreSQL implementation of the OrdersRepository trait.
pub struct PgOrdersRepository {
    /// PostgreSQL client for database operations
    db: Client,
}

impl PgOrdersRepository {
    pub fn new(db: Client) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrdersRepository for PgOrdersRepository {
    async fn insert_tx(&self, tx: &Transaction<'_>, order: &Order) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO orders (
                id, order_number, customer_email, customer_name, customer_phone,
                status, subtotal, tax_amount, shipping_cost, total_amount, currency, notes,
                shipped_at, delivered_at, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)
        "#;
        tx.execute(
            query,
            &[
                &order.id,
                &order.order_number,
                &order.customer_email,
                &order.customer_name,
                &order.customer_phone,
                &order.status,
                &order.subtotal,
                &order.tax_amount,
                &order.shipping_cost,
                &order.total_amount,
                &order.currency,
                &order.notes,
                &order.shipped_at,
                &order.delivered_at,
                &order.created_at,
                &order.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn order_number_exists_tx(
        &self,
        tx: &Transaction<'_>,
        order_number: &str,
    ) -> Result<bool, RepositoryError> {
        let row = tx
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)",
                &[&order_number],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order, RepositoryError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = self.db.query_opt(query.as_str(), &[&id]).await?;
        match row {
            Some(row) => Ok(order_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let rows = self.db.query(query.as_str(), &[]).await?;
        Ok(rows.iter().map(order_from_row).collect())
    }
}

fn order_item_from_row(row: &Row) -> OrderItem {
    OrderItem {
        id: row.get("id"),
        order_id: row.get("order_id"),
        product_id: row.get("product_id"),
        product_name: row.get("product_name"),
        product_sku: row.get("product_sku"),
        quantity: row.get("quantity"),
        unit_price: row.get("unit_price"),
        total_price: row.get("total_price"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        product: None,
    }
}

/// # OrderItemsRepository
///
/// Repository interface for order line items. Items are only ever written as
/// part of order creation, so the write side is transactional only.
#[async_trait]
pub trait OrderItemsRepository: Send + Sync {
    async fn insert_tx(
        &self,
        tx: &Transaction<'_>,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError>;
    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepositoryError>;
}

/// PostgreSQL implementation of the OrderItemsRepository trait.
pub struct PgOrderItemsRepository {
    /// PostgreSQL client for database operations
    db: Client,
}

impl PgOrderItemsRepository {
    pub fn new(db: Client) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderItemsRepository for PgOrderItemsRepository {
    async fn insert_tx(
        &self,
        tx: &Transaction<'_>,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO order_items (
                id, order_id, product_id, product_name, product_sku,
                quantity, unit_price, total_price, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        "#;
        for it in items {
            tx.execute(
                query,
                &[
                    &it.id,
                    &it.order_id,
                    &it.product_id,
                    &it.product_name,
                    &it.product_sku,
                    &it.quantity,
                    &it.unit_price,
                    &it.total_price,
                    &it.created_at,
                    &it.updated_at,
                ],
            )
            .await?;
        }
        Ok(())
    }

    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepositoryError> {
        let query = r#"
            SELECT id, order_id, product_id, product_name, product_sku,
                   quantity, unit_price, total_price, created_at, updated_at
            FROM order_items WHERE order_id = $1
            ORDER BY created_at, id
        "#;
        let rows = self.db.query(query, &[&order_id]).await?;
        Ok(rows.iter().map(order_item_from_row).collect())
    }
}

fn shipping_from_row(row: &Row) -> Shipping {
    Shipping {
        id: row.get("id"),
        order_id: row.get("order_id"),
        method: row.get("method"),
        status: row.get("status"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        address_line1: row.get("address_line1"),
        address_line2: row.get("address_line2"),
        city: row.get("city"),
        state: row.get("state"),
        postal_code: row.get("postal_code"),
        country: row.get("country"),
        phone: row.get("phone"),
        email: row.get("email"),
        carrier: row.get("carrier"),
        tracking_number: row.get("tracking_number"),
        estimated_delivery_date: row.get("estimated_delivery_date"),
        shipped_date: row.get("shipped_date"),
        delivered_date: row.get("delivered_date"),
        weight: row.get("weight"),
        weight_unit: row.get("weight_unit"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// # ShippingRepository
///
/// Repository interface for shipping records. Exactly one record exists per
/// order (enforced by a UNIQUE constraint on order_id).
#[async_trait]
pub trait ShippingRepository: Send + Sync {
    async fn insert_tx(
        &self,
        tx: &Transaction<'_>,
        shipping: &Shipping,
    ) -> Result<(), RepositoryError>;
    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Shipping, RepositoryError>;
}

/// PostgreSQL implementation of the ShippingRepository trait.
pub struct PgShippingRepository {
    /// PostgreSQL client for database operations
    db: Client,
}

impl PgShippingRepository {
    pub fn new(db: Client) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShippingRepository for PgShippingRepository {
    async fn insert_tx(
        &self,
        tx: &Transaction<'_>,
        shipping: &Shipping,
    ) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO shipping (
                id, order_id, method, status,
                first_name, last_name, address_line1, address_line2,
                city, state, postal_code, country, phone, email,
                carrier, tracking_number, estimated_delivery_date,
                shipped_date, delivered_date, weight, weight_unit, notes,
                created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,
                      $15,$16,$17,$18,$19,$20,$21,$22,$23,$24)
        "#;
        tx.execute(
            query,
            &[
                &shipping.id,
                &shipping.order_id,
                &shipping.method,
                &shipping.status,
                &shipping.first_name,
                &shipping.last_name,
                &shipping.address_line1,
                &shipping.address_line2,
                &shipping.city,
                &shipping.state,
                &shipping.postal_code,
                &shipping.country,
                &shipping.phone,
                &shipping.email,
                &shipping.carrier,
                &shipping.tracking_number,
                &shipping.estimated_delivery_date,
                &shipping.shipped_date,
                &shipping.delivered_date,
                &shipping.weight,
                &shipping.weight_unit,
                &shipping.notes,
                &shipping.created_at,
                &shipping.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Shipping, RepositoryError> {
        let query = r#"
            SELECT id, order_id, method, status,
                   first_name, last_name, address_line1, address_line2,
                   city, state, postal_code, country, phone, email,
                   carrier, tracking_number, estimated_delivery_date,
                   shipped_date, delivered_date, weight, weight_unit, notes,
                   created_at, updated_at
            FROM shipping WHERE order_id = $1
        "#;
        let row = self.db.query_opt(query, &[&order_id]).await?;
        match row {
            Some(row) => Ok(shipping_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }
}

fn payment_from_row(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        order_id: row.get("order_id"),
        method: row.get("method"),
        status: row.get("status"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        gateway_transaction_id: row.get("gateway_transaction_id"),
        gateway_reference: row.get("gateway_reference"),
        gateway_name: row.get("gateway_name"),
        last_four_digits: row.get("last_four_digits"),
        card_brand: row.get("card_brand"),
        expiry_month: row.get("expiry_month"),
        expiry_year: row.get("expiry_year"),
        billing_first_name: row.get("billing_first_name"),
        billing_last_name: row.get("billing_last_name"),
        billing_address_line1: row.get("billing_address_line1"),
        billing_address_line2: row.get("billing_address_line2"),
        billing_city: row.get("billing_city"),
        billing_state: row.get("billing_state"),
        billing_postal_code: row.get("billing_postal_code"),
        billing_country: row.get("billing_country"),
        processed_at: row.get("processed_at"),
        failed_at: row.get("failed_at"),
        failure_reason: row.get("failure_reason"),
        refunded_amount: row.get("refunded_amount"),
        refunded_at: row.get("refunded_at"),
        refund_reason: row.get("refund_reason"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// # PaymentsRepository
///
/// Repository interface for payment records. Exactly one record exists per
/// order (enforced by a UNIQUE constraint on order_id); its amount always
/// equals the order total at creation time.
#[async_trait]
pub trait PaymentsRepository: Send + Sync {
    async fn insert_tx(
        &self,
        tx: &Transaction<'_>,
        payment: &Payment,
    ) -> Result<(), RepositoryError>;
    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Payment, RepositoryError>;
}

/// PostgreSQL implementation of the PaymentsRepository trait.
pub struct PgPaymentsRepository {
    /// PostgreSQL client for database operations
    db: Client,
}

impl PgPaymentsRepository {
    pub fn new(db: Client) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PaymentsRepository for PgPaymentsRepository {
    async fn insert_tx(
        &self,
        tx: &Transaction<'_>,
        payment: &Payment,
    ) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO payments (
                id, order_id, method, status, amount, currency,
                gateway_transaction_id, gateway_reference, gateway_name,
                last_four_digits, card_brand, expiry_month, expiry_year,
                billing_first_name, billing_last_name, billing_address_line1,
                billing_address_line2, billing_city, billing_state,
                billing_postal_code, billing_country,
                processed_at, failed_at, failure_reason,
                refunded_amount, refunded_at, refund_reason, notes,
                created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,
                      $16,$17,$18,$19,$20,$21,$22,$23,$24,$25,$26,$27,$28,$29,$30)
        "#;
        tx.execute(
            query,
            &[
                &payment.id,
                &payment.order_id,
                &payment.method,
                &payment.status,
                &payment.amount,
                &payment.currency,
                &payment.gateway_transaction_id,
                &payment.gateway_reference,
                &payment.gateway_name,
                &payment.last_four_digits,
                &payment.card_brand,
                &payment.expiry_month,
                &payment.expiry_year,
                &payment.billing_first_name,
                &payment.billing_last_name,
                &payment.billing_address_line1,
                &payment.billing_address_line2,
                &payment.billing_city,
                &payment.billing_state,
                &payment.billing_postal_code,
                &payment.billing_country,
                &payment.processed_at,
                &payment.failed_at,
                &payment.failure_reason,
                &payment.refunded_amount,
                &payment.refunded_at,
                &payment.refund_reason,
                &payment.notes,
                &payment.created_at,
                &payment.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Payment, RepositoryError> {
        let query = r#"
            SELECT id, order_id, method, status, amount, currency,
                   gateway_transaction_id, gateway_reference, gateway_name,
                   last_four_digits, card_brand, expiry_month, expiry_year,
                   billing_first_name, billing_last_name, billing_address_line1,
                   billing_address_line2, billing_city, billing_state,
                   billing_postal_code, billing_country,
                   processed_at, failed_at, failure_reason,
                   refunded_amount, refunded_at, refund_reason, notes,
                   created_at, updated_at
            FROM payments WHERE order_id = $1
        "#;
        let row = self.db.query_opt(query, &[&order_id]).await?;
        match row {
            Some(row) => Ok(payment_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }
}
