//! Checkout route handlers.
//!
//! Checkout shows a review page whose pay button leads to Stripe's hosted
//! payment page, then turns the cart into an order when Stripe redirects back
//! to the success URL. The success redirect is trusted as-is; payment is not
//! re-verified against the Stripe API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::db::{CartRepository, OrderRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::cart_total;
use crate::routes::cart::CartLineView;
use crate::routes::products::format_price;
use crate::state::AppState;

/// Checkout review page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub authenticated: bool,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub pay_url: String,
}

/// Review the cart and create a fresh Stripe Checkout Session.
///
/// An empty cart goes back to the cart page instead of Stripe. A session is
/// created up front so the pay button can link straight to the hosted page.
#[instrument(skip(state, user))]
pub async fn start(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let repo = CartRepository::new(state.pool());
    let lines = repo.lines_for_user(user.id).await?;

    if lines.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let base = &state.config().base_url;
    let session = state
        .payments()
        .create_checkout_session(
            &lines,
            user.email.as_str(),
            &format!("{base}/checkout/success"),
            &format!("{base}/checkout/cancel"),
        )
        .await?;

    tracing::info!(user_id = %user.id, session_id = %session.id, "Checkout session created");

    Ok(CheckoutTemplate {
        authenticated: true,
        total: format_price(cart_total(&lines)),
        lines: lines.iter().map(CartLineView::from).collect(),
        pay_url: session.url,
    }
    .into_response())
}

/// Landing page after a completed payment: snapshot the cart into an order.
///
/// The snapshot and the cart clear happen in one transaction. Reloading the
/// page after the cart is cleared just lands on the orders page.
#[instrument(skip(state, user))]
pub async fn success(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let repo = OrderRepository::new(state.pool());
    match repo.create_from_cart(user.id).await {
        Ok(order_id) => {
            tracing::info!(user_id = %user.id, order_id = %order_id, "Order placed");
            Ok(Redirect::to("/orders"))
        }
        // Cart already consumed, e.g. a refresh of the success page
        Err(RepositoryError::Conflict(_)) => Ok(Redirect::to("/orders")),
        Err(e) => Err(e.into()),
    }
}

/// Landing page after an abandoned payment.
#[instrument]
pub async fn cancel() -> Redirect {
    Redirect::to("/cart")
}
