//! Cart route handlers.
//!
//! The cart is stored in `PostgreSQL`, one row per (user, product), so it
//! survives across sessions and devices. All cart routes require login.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use maplecart_core::ProductId;

use crate::db::{CartRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CartLine, cart_total};
use crate::routes::products::format_price;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: i32,
    pub price: String,
    pub line_total: String,
    pub image_url: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            title: line.title.clone(),
            quantity: line.quantity,
            price: format_price(line.price),
            line_total: format_price(line.line_total()),
            image_url: line.image_url.clone(),
        }
    }
}

/// Add/remove form data.
#[derive(Debug, Deserialize)]
pub struct CartItemForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub authenticated: bool,
    pub lines: Vec<CartLineView>,
    pub total: String,
}

/// Display the cart page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<CartShowTemplate> {
    let repo = CartRepository::new(state.pool());
    let lines = repo.lines_for_user(user.id).await?;

    Ok(CartShowTemplate {
        authenticated: true,
        lines: lines.iter().map(CartLineView::from).collect(),
        total: format_price(cart_total(&lines)),
    })
}

/// Add one unit of a product to the cart, then show the cart.
///
/// Adding a product that is already carted bumps its quantity. An unknown
/// product id redirects to the shop index like any other missing page.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CartItemForm>,
) -> Result<Redirect> {
    let repo = CartRepository::new(state.pool());
    repo.add(user.id, form.product_id).await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a product's line from the cart entirely.
///
/// Removing something that is not in the cart still lands on the cart page.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CartItemForm>,
) -> Result<Redirect> {
    let repo = CartRepository::new(state.pool());
    match repo.remove(user.id, form.product_id).await {
        Ok(()) | Err(RepositoryError::NotFound) => Ok(Redirect::to("/cart")),
        Err(e) => Err(e.into()),
    }
}
