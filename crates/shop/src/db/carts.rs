//! Cart repository for database operations.
//!
//! One row per (user, product). Adding an already-carted product bumps its
//! quantity instead of inserting a second row; insertion order is preserved
//! via a per-user position counter.

use sqlx::PgPool;

use maplecart_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::CartLine;

/// Next quantity when a product is added to the cart.
///
/// `None` means the product is not in the cart yet.
#[must_use]
pub const fn bumped_quantity(existing: Option<i32>) -> i32 {
    match existing {
        Some(q) => q + 1,
        None => 1,
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's cart lines in insertion order, joined with live products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_user(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT c.product_id, p.title, p.price, p.image_url, c.quantity
            FROM shop.cart_item c
            JOIN shop.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.position
            ",
        )
        .bind(user.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add one unit of a product to a user's cart.
    ///
    /// Bumps the quantity if the product is already carted, otherwise appends
    /// a new line. The product must exist; the foreign key rejects dangling
    /// references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add(&self, user: UserId, product: ProductId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i32>(
            r"
            SELECT quantity
            FROM shop.cart_item
            WHERE user_id = $1 AND product_id = $2
            FOR UPDATE
            ",
        )
        .bind(user.as_i32())
        .bind(product.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let quantity = bumped_quantity(existing);

        if existing.is_some() {
            sqlx::query(
                r"
                UPDATE shop.cart_item
                SET quantity = $3
                WHERE user_id = $1 AND product_id = $2
                ",
            )
            .bind(user.as_i32())
            .bind(product.as_i32())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r"
                INSERT INTO shop.cart_item (user_id, product_id, quantity, position)
                SELECT $1, $2, $3, COALESCE(MAX(position), 0) + 1
                FROM shop.cart_item
                WHERE user_id = $1
                ",
            )
            .bind(user.as_i32())
            .bind(product.as_i32())
            .bind(quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::Database(e)
            })?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Remove a product's line from a user's cart entirely.
    ///
    /// Removing a product that is not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM shop.cart_item
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user.as_i32())
        .bind(product.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Empty a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM shop.cart_item
            WHERE user_id = $1
            ",
        )
        .bind(user.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::bumped_quantity;

    #[test]
    fn test_new_product_starts_at_one() {
        assert_eq!(bumped_quantity(None), 1);
    }

    #[test]
    fn test_existing_line_increments() {
        assert_eq!(bumped_quantity(Some(1)), 2);
        assert_eq!(bumped_quantity(Some(7)), 8);
    }
}
