//! Validation and pricing of requested order items.
//!
//! The checks and the arithmetic are kept free of I/O: the service resolves
//! each requested product through the transaction and feeds it into
//! [`PricedOrder::push`], which rejects the line or accumulates its total.

use model::Product;
use rust_decimal::Decimal;

use crate::ServiceError;

pub(crate) const EMPTY_ORDER_MESSAGE: &str = "Order must contain at least one item";

pub(crate) fn insufficient_stock_message(name: &str, available: i32, requested: i32) -> String {
    format!("Insufficient stock for product {name}. Available: {available}, Requested: {requested}")
}

/// A validated order line: the product snapshot at validation time, the
/// requested quantity and the computed line total.
#[derive(Debug, Clone)]
pub struct PricedItem {
    pub product: Product,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Accumulated result of validating and pricing the requested items.
///
/// Tax and shipping cost are explicit zero placeholders until those
/// calculations are implemented, so `total_amount()` currently equals the
/// subtotal.
#[derive(Debug, Clone, Default)]
pub struct PricedOrder {
    pub items: Vec<PricedItem>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
}

impl PricedOrder {
    /// `subtotal + tax_amount + shipping_cost`.
    pub fn total_amount(&self) -> Decimal {
        self.subtotal + self.tax_amount + self.shipping_cost
    }

    /// Validates one line against the product and accumulates its total.
    pub(crate) fn push(&mut self, product: Product, quantity: i32) -> Result<(), ServiceError> {
        let line_total = price_item(&product, quantity)?;
        self.subtotal += line_total;
        self.items.push(PricedItem {
            product,
            quantity,
            line_total,
        });
        Ok(())
    }
}

/// Checks quantity and stock for a single line and returns its total.
pub(crate) fn price_item(product: &Product, quantity: i32) -> Result<Decimal, ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::Invalid(format!(
            "Quantity must be at least 1 for product {}",
            product.name
        )));
    }
    if product.stock < quantity {
        return Err(ServiceError::Invalid(insufficient_stock_message(
            &product.name,
            product.stock,
            quantity,
        )));
    }
    Ok(product.price * Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn product(name: &str, price: &str, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            price: price.parse().unwrap(),
            stock,
            category: None,
            sku: Some(format!("{}-001", &name[..3].to_uppercase())),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_total_is_price_times_quantity() {
        let p = product("Organic Cotton T-Shirt", "29.99", 100);
        let total = price_item(&p, 2).unwrap();
        assert_eq!(total, "59.98".parse().unwrap());
    }

    #[test]
    fn test_subtotal_accumulates_across_lines() {
        let mut priced = PricedOrder::default();
        priced.push(product("Organic Cotton T-Shirt", "29.99", 100), 2).unwrap();
        priced.push(product("Stainless Steel Water Bottle", "24.99", 75), 1).unwrap();

        assert_eq!(priced.items.len(), 2);
        assert_eq!(priced.subtotal, "84.97".parse().unwrap());
        // Tax and shipping are zero placeholders, so the total equals the subtotal.
        assert_eq!(priced.tax_amount, Decimal::ZERO);
        assert_eq!(priced.shipping_cost, Decimal::ZERO);
        assert_eq!(priced.total_amount(), "84.97".parse().unwrap());
    }

    #[test]
    fn test_insufficient_stock_is_rejected_with_numbers() {
        let p = product("Coffee Maker Deluxe", "179.99", 15);
        let err = price_item(&p, 16).unwrap_err();
        match err {
            ServiceError::Invalid(msg) => {
                assert_eq!(
                    msg,
                    "Insufficient stock for product Coffee Maker Deluxe. Available: 15, Requested: 16"
                );
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_stock_is_accepted() {
        let p = product("Coffee Maker Deluxe", "179.99", 15);
        assert!(price_item(&p, 15).is_ok());
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        let p = product("Coffee Maker Deluxe", "179.99", 15);
        assert!(matches!(price_item(&p, 0), Err(ServiceError::Invalid(_))));
        assert!(matches!(price_item(&p, -3), Err(ServiceError::Invalid(_))));
    }

    #[test]
    fn test_failed_line_leaves_no_partial_result() {
        let mut priced = PricedOrder::default();
        priced.push(product("Organic Cotton T-Shirt", "29.99", 100), 2).unwrap();
        let err = priced.push(product("Coffee Maker Deluxe", "179.99", 1), 2);
        assert!(err.is_err());
        // The failing line contributed nothing.
        assert_eq!(priced.items.len(), 1);
        assert_eq!(priced.subtotal, "59.98".parse().unwrap());
    }
}
