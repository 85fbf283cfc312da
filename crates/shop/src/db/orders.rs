//! Order repository for database operations.
//!
//! Orders and their snapshot lines are written once at checkout and never
//! updated; there are no mutating queries here beyond `create`.

use rust_decimal::Decimal;
use sqlx::PgPool;

use maplecart_core::{OrderId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

/// A cart line with the full product fields needed for the snapshot.
#[derive(sqlx::FromRow)]
struct SnapshotLine {
    product_id: ProductId,
    title: String,
    description: String,
    price: Decimal,
    quantity: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the user's current cart lines.
    ///
    /// Snapshots every line's product fields into `order_item` rows, then
    /// clears the cart, all in one transaction. A concurrent product edit
    /// cannot split the snapshot across versions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart is empty.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create_from_cart(&self, user: UserId) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, SnapshotLine>(
            r"
            SELECT c.product_id, p.title, p.description, p.price, c.quantity
            FROM shop.cart_item c
            JOIN shop.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.position
            ",
        )
        .bind(user.as_i32())
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(RepositoryError::Conflict("cart is empty".to_owned()));
        }

        let order_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO shop."order" (user_id)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(user.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO shop.order_item
                    (order_id, product_id, title, description, price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(order_id)
            .bind(line.product_id.as_i32())
            .bind(&line.title)
            .bind(&line.description)
            .bind(line.price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            DELETE FROM shop.cart_item
            WHERE user_id = $1
            ",
        )
        .bind(user.as_i32())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OrderId::new(order_id))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, created_at
            FROM shop."order"
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get an order scoped to its owner.
    ///
    /// Ownership is part of the `WHERE` clause so another user's order id
    /// reports `None` rather than leaking existence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: OrderId,
        user: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, created_at
            FROM shop."order"
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_i32())
        .bind(user.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Fetch the snapshot lines of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT product_id, title, description, price, quantity
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }
}
