use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currency applied to every order and payment. Multi-currency is out of scope.
pub const DEFAULT_CURRENCY: &str = "USD";

/// OrderStatus — lifecycle state of an order. New orders always start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "snake_case")]
#[postgres(name = "order_status", rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

/// ShippingMethod — how the order is delivered to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "snake_case")]
#[postgres(name = "shipping_method", rename_all = "snake_case")]
pub enum ShippingMethod {
    Standard,
    Express,
    Overnight,
    Pickup,
}

/// ShippingStatus — delivery progress. New shipping records start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "snake_case")]
#[postgres(name = "shipping_status", rename_all = "snake_case")]
pub enum ShippingStatus {
    Pending,
    Processing,
    Shipped,
    InTransit,
    Delivered,
    Failed,
    Returned,
}

/// PaymentMethod — tender type chosen by the customer at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "snake_case")]
#[postgres(name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    Stripe,
    BankTransfer,
    Cash,
    Check,
    Cryptocurrency,
}

/// PaymentStatus — payment progress. Payments are provisional (`Pending`) until a
/// gateway integration settles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "snake_case")]
#[postgres(name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

/// Product — a catalog entry orders are placed against.
///
/// `stock` is decremented when an order is placed and never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// OrderItem — one product/quantity line within an order.
///
/// `product_name`, `product_sku` and `unit_price` are snapshots taken at order
/// time; they do not follow later product edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The current product row, attached when the order is read back.
    #[serde(default)]
    pub product: Option<Product>,
}

/// Shipping — delivery details for an order. Exactly one record per order.
///
/// Carrier and tracking fields stay unset until fulfilment, which is outside
/// the order-creation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipping {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: ShippingMethod,
    pub status: ShippingStatus,
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub weight: Option<Decimal>,
    pub weight_unit: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment — payment record for an order. Exactly one record per order.
///
/// The record is provisional: no external charge is made, so gateway and
/// processing fields stay unset at creation and `amount` always equals the
/// order total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub currency: String,
    pub gateway_transaction_id: Option<String>,
    pub gateway_reference: Option<String>,
    pub gateway_name: Option<String>,
    pub last_four_digits: Option<String>,
    pub card_brand: Option<String>,
    pub expiry_month: Option<String>,
    pub expiry_year: Option<String>,
    pub billing_first_name: Option<String>,
    pub billing_last_name: Option<String>,
    pub billing_address_line1: Option<String>,
    pub billing_address_line2: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_postal_code: Option<String>,
    pub billing_country: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub refunded_amount: Decimal,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order — the main aggregate: a customer's purchase with its line items,
/// shipping and payment.
///
/// `total_amount = subtotal + tax_amount + shipping_cost`; tax and shipping
/// cost are explicit zero placeholders until those calculations exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub notes: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping: Option<Shipping>,
    #[serde(default)]
    pub payment: Option<Payment>,
}

/// CreateOrderItemRequest — requested (product, quantity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// CreateShippingRequest — shipping block of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShippingRequest {
    pub method: ShippingMethod,
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// CreatePaymentRequest — payment block of an order request. Card fields are
/// already masked by the caller; nothing sensitive is accepted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub method: PaymentMethod,
    #[serde(default)]
    pub last_four_digits: Option<String>,
    #[serde(default)]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub expiry_month: Option<String>,
    #[serde(default)]
    pub expiry_year: Option<String>,
    #[serde(default)]
    pub billing_first_name: Option<String>,
    #[serde(default)]
    pub billing_last_name: Option<String>,
    #[serde(default)]
    pub billing_address_line1: Option<String>,
    #[serde(default)]
    pub billing_address_line2: Option<String>,
    #[serde(default)]
    pub billing_city: Option<String>,
    #[serde(default)]
    pub billing_state: Option<String>,
    #[serde(default)]
    pub billing_postal_code: Option<String>,
    #[serde(default)]
    pub billing_country: Option<String>,
}

/// CreateOrderRequest — body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub order_items: Vec<CreateOrderItemRequest>,
    pub shipping: CreateShippingRequest,
    pub payment: CreatePaymentRequest,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_create_order_request() {
        let json = r#"
        {
            "customerEmail": "a@b.com",
            "customerName": "Jane Doe",
            "orderItems": [
                { "productId": "7f2a1c2e-46d8-4ad1-b34c-5ba2f1a9c001", "quantity": 2 }
            ],
            "shipping": {
                "method": "standard",
                "firstName": "Jane",
                "lastName": "Doe",
                "addressLine1": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "postalCode": "62701",
                "country": "US"
            },
            "payment": {
                "method": "credit_card",
                "lastFourDigits": "4242"
            },
            "notes": "leave at the door"
        }
        "#;
        let req: CreateOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.customer_email, "a@b.com");
        assert_eq!(req.customer_phone, None);
        assert_eq!(req.order_items.len(), 1);
        assert_eq!(req.order_items[0].quantity, 2);
        assert_eq!(req.shipping.method, ShippingMethod::Standard);
        assert_eq!(req.shipping.address_line2, None);
        assert_eq!(req.payment.method, PaymentMethod::CreditCard);
        assert_eq!(req.payment.last_four_digits.as_deref(), Some("4242"));
    }

    #[test]
    fn test_order_items_default_to_empty_when_absent() {
        let json = r#"
        {
            "customerEmail": "a@b.com",
            "shipping": {
                "method": "pickup",
                "firstName": "Jane",
                "lastName": "Doe",
                "addressLine1": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "postalCode": "62701",
                "country": "US"
            },
            "payment": { "method": "cash" }
        }
        "#;
        let req: CreateOrderRequest = serde_json::from_str(json).unwrap();
        assert!(req.order_items.is_empty());
    }

    #[test]
    fn test_enum_wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            r#""bank_transfer""#
        );
        assert_eq!(
            serde_json::to_string(&ShippingStatus::InTransit).unwrap(),
            r#""in_transit""#
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PartiallyRefunded).unwrap(),
            r#""partially_refunded""#
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            r#""pending""#
        );
    }

    #[test]
    fn test_serialize_product_uses_camel_case_keys() {
        let product = Product {
            id: Uuid::nil(),
            name: "Organic Cotton T-Shirt".to_string(),
            description: None,
            price: "29.99".parse().unwrap(),
            stock: 100,
            category: Some("Clothing".to_string()),
            sku: Some("OCT-001".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("isActive").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["price"], serde_json::json!("29.99"));
    }
}
