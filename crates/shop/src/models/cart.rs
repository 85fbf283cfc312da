//! Cart models.

use rust_decimal::Decimal;

use maplecart_core::ProductId;

/// One line of a user's cart, joined with the live product for display.
///
/// At most one line exists per distinct product; insertion order is preserved
/// by the repository.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub image_url: String,
    pub quantity: i32,
}

impl CartLine {
    /// Price of this line at the product's current price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Total across all cart lines at current prices.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product_id: i32, price: &str, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product_id),
            title: format!("product-{product_id}"),
            price: price.parse().unwrap(),
            image_url: String::new(),
            quantity,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line(1, "5.00", 2).line_total(), "10.00".parse().unwrap());
    }

    #[test]
    fn test_cart_total_matches_checkout_scenario() {
        // cart = [{A, qty 1, price 10}, {B, qty 2, price 5}] -> total 20
        let lines = vec![line(1, "10.00", 1), line(2, "5.00", 2)];
        assert_eq!(cart_total(&lines), "20.00".parse().unwrap());
    }

    #[test]
    fn test_cart_total_empty() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }
}
