//! Database operations for the shop `PostgreSQL`.
//!
//! # Tables (schema `shop`)
//!
//! - `user` - Shop accounts
//! - `user_password` - Argon2 password hashes, one row per user
//! - `password_reset_token` - Outstanding password reset tokens
//! - `product` - Products listed by users
//! - `cart_item` - Cart lines, one row per (user, product)
//! - `order` / `order_item` - Placed orders and their snapshot lines
//!
//! # Migrations
//!
//! Migrations live in `crates/shop/migrations/` and run on startup via
//! `sqlx::migrate!`.

pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::{NewProduct, ProductPage, ProductRepository};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
