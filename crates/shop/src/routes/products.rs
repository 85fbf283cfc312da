//! Product browsing route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use maplecart_core::ProductId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Product;
use crate::state::AppState;

/// Products shown per page.
pub const PAGE_SIZE: i64 = 6;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub price: String,
    pub description: String,
    pub image_url: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: format_price(product.price),
            description: product.description.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

/// Format a decimal price for display.
pub fn format_price(price: Decimal) -> String {
    format!("${price:.2}")
}

/// Pagination query string.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductIndexTemplate {
    pub authenticated: bool,
    pub products: Vec<ProductView>,
    pub page: i64,
    pub total_pages: i64,
}

impl ProductIndexTemplate {
    fn has_prev(&self) -> bool {
        self.page > 1
    }

    fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub authenticated: bool,
    pub product: ProductView,
}

/// Number of pages needed for `total` products.
const fn page_count(total: i64) -> i64 {
    // `i64::div_ceil` is still unstable (`int_roundings`); this matches it for
    // the non-negative totals a COUNT(*) can return.
    let pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;
    if pages < 1 { 1 } else { pages }
}

/// Shop index, a paginated product listing.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(query): Query<PageQuery>,
) -> Result<ProductIndexTemplate> {
    let page = query.page.unwrap_or(1).max(1);

    let repo = crate::db::ProductRepository::new(state.pool());
    let page_data = repo.list_page(page, PAGE_SIZE).await?;

    Ok(ProductIndexTemplate {
        authenticated: auth.0.is_some(),
        products: page_data.products.iter().map(ProductView::from).collect(),
        page,
        total_pages: page_count(page_data.total),
    })
}

/// Product detail page.
///
/// Unknown product ids redirect to the shop index.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<ProductShowTemplate> {
    let repo = crate::db::ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductShowTemplate {
        authenticated: auth.0.is_some(),
        product: ProductView::from(&product),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_two_decimals() {
        assert_eq!(format_price("12.5".parse().unwrap()), "$12.50");
        assert_eq!(format_price("10".parse().unwrap()), "$10.00");
        assert_eq!(format_price("0.99".parse().unwrap()), "$0.99");
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(6), 1);
        assert_eq!(page_count(7), 2);
        assert_eq!(page_count(13), 3);
    }
}
