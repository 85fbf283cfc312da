//! HTTP route handlers for the shop.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Shop index (paginated product listing)
//! GET  /health                  - Health check
//!
//! # Products
//! GET  /products                - Product listing
//! GET  /products/{id}           - Product detail
//!
//! # Cart (requires auth)
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add product (bumps quantity if carted)
//! POST /cart/remove             - Remove product line
//!
//! # Checkout (requires auth)
//! GET  /checkout                - Review page linking to Stripe Checkout
//! GET  /checkout/success        - Snapshot cart into an order
//! GET  /checkout/cancel         - Back to the cart
//!
//! # Orders (requires auth)
//! GET  /orders                  - Order history
//! GET  /orders/{id}/invoice     - PDF invoice
//!
//! # Auth
//! GET  /login                   - Login page
//! POST /login                   - Login action
//! GET  /signup                  - Signup page
//! POST /signup                  - Signup action
//! POST /logout                  - Logout action
//! GET  /reset                   - Forgot password page
//! POST /reset                   - Request reset email
//! GET  /reset/{token}           - New password page (from email link)
//! POST /new-password            - Set new password
//!
//! # Admin (requires auth, own products only)
//! GET  /admin/products          - Own product listing
//! GET  /admin/products/new      - Create form
//! POST /admin/products          - Create action (multipart)
//! GET  /admin/products/{id}/edit - Edit form
//! POST /admin/products/{id}     - Update action (multipart)
//! POST /admin/products/{id}/delete - Delete action
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/reset", get(auth::reset_page).post(auth::request_reset))
        .route("/reset/{token}", get(auth::new_password_page))
        .route("/new-password", post(auth::new_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::start))
        .route("/success", get(checkout::success))
        .route("/cancel", get(checkout::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}/invoice", get(orders::invoice))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::index).post(admin::create))
        .route("/products/new", get(admin::new_form))
        .route("/products/{id}/edit", get(admin::edit_form))
        .route("/products/{id}", post(admin::update))
        .route("/products/{id}/delete", post(admin::delete))
}

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "error/404.html")]
pub struct NotFoundTemplate {
    pub authenticated: bool,
}

/// Fallback handler for unknown routes.
pub async fn not_found(auth: OptionalAuth) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            authenticated: auth.0.is_some(),
        },
    )
}

/// Create all routes for the shop.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Shop index shows the product listing
        .route("/", get(products::index))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        // Auth routes sit at the root
        .merge(auth_routes())
        .fallback(not_found)
}
