//! Order models.
//!
//! Orders are append-only snapshots of a cart at checkout time. Line items
//! copy the product's fields; later edits or deletes of the source product
//! never change a placed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use maplecart_core::{OrderId, ProductId, UserId};

use super::Product;

/// A placed order. Never mutated or deleted after creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A snapshot line of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    /// The source product, for reference only; may no longer exist.
    pub product_id: Option<ProductId>,
    pub title: String,
    pub description: String,
    /// Unit price at checkout time.
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    /// Snapshot a live product into an order line.
    #[must_use]
    pub fn snapshot(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: Some(product.id),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            quantity,
        }
    }

    /// Quantity × unit price for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Order total, always recomputed from the snapshot lines.
///
/// No total is ever stored; this is the single source of truth for both the
/// orders page and the invoice.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::line_total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, title: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            price: price.parse().unwrap(),
            description: "a fine product".to_string(),
            image_url: "/images/p.png".to_string(),
            user_id: UserId::new(1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_copies_fields() {
        let p = product(5, "Maple Syrup", "12.50");
        let item = OrderItem::snapshot(&p, 3);

        assert_eq!(item.product_id, Some(ProductId::new(5)));
        assert_eq!(item.title, "Maple Syrup");
        assert_eq!(item.price, "12.50".parse().unwrap());
        assert_eq!(item.quantity, 3);
    }

    #[test]
    fn test_snapshot_is_isolated_from_product_edits() {
        let mut p = product(5, "Maple Syrup", "12.50");
        let item = OrderItem::snapshot(&p, 1);

        // Edit the source product after the order was placed.
        p.title = "Maple Syrup (new recipe)".to_string();
        p.price = "99.99".parse().unwrap();

        assert_eq!(item.title, "Maple Syrup");
        assert_eq!(item.price, "12.50".parse().unwrap());
    }

    #[test]
    fn test_order_total_recomputed_from_lines() {
        let a = OrderItem::snapshot(&product(1, "A", "10.00"), 1);
        let b = OrderItem::snapshot(&product(2, "B", "5.00"), 2);

        assert_eq!(order_total(&[a, b]), "20.00".parse().unwrap());
    }

    #[test]
    fn test_order_total_empty() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
