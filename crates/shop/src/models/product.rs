//! Product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use maplecart_core::{ProductId, UserId};

/// A product listed in the shop.
///
/// Mutable by its owner only. Orders never reference a live product; they
/// carry a snapshot taken at checkout (see [`crate::models::OrderItem`]).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    /// Public URL path of the uploaded image (e.g. `/images/...`).
    pub image_url: String,
    /// Owning user.
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
