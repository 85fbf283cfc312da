//! Product repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;

use maplecart_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::Product;

/// A page of products together with the total count.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
}

/// Fields for creating or updating a product.
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub title: &'a str,
    pub price: Decimal,
    pub description: &'a str,
    pub image_url: &'a str,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a page of products, newest first, with the total count.
    ///
    /// `page` is 1-based; out-of-range pages return an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_page(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<ProductPage, RepositoryError> {
        let offset = (page.max(1) - 1) * page_size;

        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, title, price, description, image_url, user_id, created_at, updated_at
            FROM shop.product
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page_size)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM shop.product
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(ProductPage { products, total })
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, title, price, description, image_url, user_id, created_at, updated_at
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// List all products owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, title, price, description, image_url, user_id, created_at, updated_at
            FROM shop.product
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(owner.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Create a product owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        owner: UserId,
        fields: &NewProduct<'_>,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO shop.product (title, price, description, image_url, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, price, description, image_url, user_id, created_at, updated_at
            ",
        )
        .bind(fields.title)
        .bind(fields.price)
        .bind(fields.description)
        .bind(fields.image_url)
        .bind(owner.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Update a product, scoped to its owner.
    ///
    /// The `WHERE` clause includes the owner so a non-owner update matches no
    /// rows and reports `NotFound` rather than leaking existence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or is
    /// not owned by `owner`.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_owned(
        &self,
        id: ProductId,
        owner: UserId,
        fields: &NewProduct<'_>,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            UPDATE shop.product
            SET title = $3, price = $4, description = $5, image_url = $6, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, price, description, image_url, user_id, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .bind(fields.title)
        .bind(fields.price)
        .bind(fields.description)
        .bind(fields.image_url)
        .fetch_optional(self.pool)
        .await?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product, scoped to its owner.
    ///
    /// Cart lines referencing the product are removed in the same transaction
    /// for every user's cart, so no cart can hold a dangling line.
    ///
    /// Returns the deleted product so the caller can clean up its image file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or is
    /// not owned by `owner`.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete_owned(
        &self,
        id: ProductId,
        owner: UserId,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM shop.cart_item
            WHERE product_id = $1
            ",
        )
        .bind(id.as_i32())
        .execute(&mut *tx)
        .await?;

        let product = sqlx::query_as::<_, Product>(
            r"
            DELETE FROM shop.product
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, price, description, image_url, user_id, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(product) = product else {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        };

        tx.commit().await?;

        Ok(product)
    }
}
