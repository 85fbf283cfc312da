//! Order route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Response},
};
use tracing::instrument;

use maplecart_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::order_total;
use crate::routes::products::format_price;
use crate::services::invoice as invoice_pdf;
use crate::state::AppState;

/// Order line display data for templates.
#[derive(Clone)]
pub struct OrderItemView {
    pub title: String,
    pub quantity: i32,
    pub price: String,
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub placed_at: String,
    pub items: Vec<OrderItemView>,
    pub total: String,
}

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrderIndexTemplate {
    pub authenticated: bool,
    pub orders: Vec<OrderView>,
}

/// Display the user's orders, newest first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<OrderIndexTemplate> {
    let repo = OrderRepository::new(state.pool());

    let mut orders = Vec::new();
    for order in repo.list_for_user(user.id).await? {
        let items = repo.items(order.id).await?;

        orders.push(OrderView {
            id: order.id,
            placed_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            total: format_price(order_total(&items)),
            items: items
                .iter()
                .map(|item| OrderItemView {
                    title: item.title.clone(),
                    quantity: item.quantity,
                    price: format_price(item.price),
                })
                .collect(),
        });
    }

    Ok(OrderIndexTemplate {
        authenticated: true,
        orders,
    })
}

/// Serve the PDF invoice for one of the user's own orders.
///
/// The document is rendered fresh from the order's snapshot lines on every
/// request. A copy is written to the invoice directory in the background;
/// the response never waits on, or fails because of, that write.
#[instrument(skip(state, user))]
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_owned(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let items = repo.items(order.id).await?;
    let pdf = invoice_pdf::render(&order, &items);

    let filename = invoice_pdf::filename(order.id);
    let path = state.config().invoice_dir.join(&filename);
    let archive_copy = pdf.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::fs::write(&path, &archive_copy).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to archive invoice");
        }
    });

    let headers = AppendHeaders([
        (header::CONTENT_TYPE, "application/pdf".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{filename}\""),
        ),
    ]);

    Ok((headers, pdf).into_response())
}
