//! Integration tests for Maplecart.
//!
//! The tests in `tests/` exercise the sqlx repositories against a live
//! `PostgreSQL` database; everything here is shared setup for them.
//!
//! # Running Tests
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/maplecart_test \
//!     cargo test -p maplecart-integration-tests -- --ignored
//! ```

use rand::Rng;
use secrecy::SecretString;
use sqlx::PgPool;

use maplecart_core::Email;
use maplecart_shop::db::{self, NewProduct, ProductRepository, UserRepository};
use maplecart_shop::models::{Product, User};

/// Connect to the test database and apply the shop migrations.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");

    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("failed to connect to the test database");

    sqlx::migrate!("../shop/migrations")
        .run(&pool)
        .await
        .expect("failed to apply migrations");

    pool
}

/// Create a user with a random email so tests never collide.
///
/// The stored password hash is a placeholder; these tests never log in.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn create_test_user(pool: &PgPool) -> User {
    let suffix: u32 = rand::rng().random();
    let email = Email::parse(&format!("shopper-{suffix}@example.com")).expect("valid test email");

    UserRepository::new(pool)
        .create_with_password(&email, "$argon2id$test-only-placeholder")
        .await
        .expect("failed to create test user")
}

/// Create a product owned by `owner`.
///
/// # Panics
///
/// Panics if the price does not parse or the insert fails.
pub async fn create_test_product(pool: &PgPool, owner: &User, title: &str, price: &str) -> Product {
    let fields = NewProduct {
        title,
        price: price.parse().expect("valid test price"),
        description: "A product created by an integration test",
        image_url: "/images/test.png",
    };

    ProductRepository::new(pool)
        .create(owner.id, &fields)
        .await
        .expect("failed to create test product")
}
