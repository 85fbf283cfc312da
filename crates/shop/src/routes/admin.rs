//! Admin route handlers for managing a user's own products.
//!
//! Every logged-in user administers the products they created. Forms are
//! multipart because products carry an image upload; validation failures
//! re-render the form with a 422 and the submitted values kept. Ownership is
//! enforced in the repository queries, so another user's product id behaves
//! exactly like a missing one.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use tracing::instrument;

use maplecart_core::ProductId;

use crate::db::{NewProduct, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::products::ProductView;
use crate::services::uploads;
use crate::state::AppState;

const TITLE_MIN_LENGTH: usize = 3;
const DESCRIPTION_MIN_LENGTH: usize = 5;
const DESCRIPTION_MAX_LENGTH: usize = 400;

// =============================================================================
// Form Handling
// =============================================================================

/// An uploaded image file from the multipart form.
struct ImageUpload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Raw multipart form fields, before validation.
#[derive(Default)]
struct ProductFormData {
    title: String,
    price: String,
    description: String,
    image: Option<ImageUpload>,
}

/// Validated product fields.
struct ValidProduct {
    title: String,
    price: Decimal,
    description: String,
}

/// Read the product form out of a multipart request.
///
/// Unknown fields are ignored; an image part without a filename counts as no
/// upload, which is how browsers submit an untouched file input.
async fn read_form(mut multipart: Multipart) -> Result<ProductFormData> {
    let mut form = ProductFormData::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match name.as_str() {
            "title" => {
                form.title = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "price" => {
                form.price = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "description" => {
                form.description = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                if filename.is_empty() {
                    continue;
                }
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                form.image = Some(ImageUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Validate the text fields of the product form.
fn validate_fields(form: &ProductFormData) -> std::result::Result<ValidProduct, String> {
    let title = form.title.trim();
    if title.len() < TITLE_MIN_LENGTH {
        return Err(format!(
            "Title must be at least {TITLE_MIN_LENGTH} characters."
        ));
    }

    let price = parse_price(&form.price)?;

    let description = form.description.trim();
    if description.len() < DESCRIPTION_MIN_LENGTH || description.len() > DESCRIPTION_MAX_LENGTH {
        return Err(format!(
            "Description must be between {DESCRIPTION_MIN_LENGTH} and {DESCRIPTION_MAX_LENGTH} characters."
        ));
    }

    Ok(ValidProduct {
        title: title.to_owned(),
        price,
        description: description.to_owned(),
    })
}

/// Parse a submitted price into a positive decimal with at most cents.
fn parse_price(raw: &str) -> std::result::Result<Decimal, String> {
    let price: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| "Price must be a number.".to_owned())?;

    if price <= Decimal::ZERO {
        return Err("Price must be greater than zero.".to_owned());
    }
    if price.scale() > 2 {
        return Err("Price cannot have fractions of a cent.".to_owned());
    }

    Ok(price)
}

// =============================================================================
// Templates
// =============================================================================

/// Admin product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub authenticated: bool,
    pub products: Vec<ProductView>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub authenticated: bool,
    pub editing: bool,
    pub error: Option<String>,
    pub product_id: Option<ProductId>,
    pub title: String,
    pub price: String,
    pub description: String,
}

impl ProductFormTemplate {
    fn rerender(form: &ProductFormData, product_id: Option<ProductId>, error: String) -> Response {
        let template = Self {
            authenticated: true,
            editing: product_id.is_some(),
            error: Some(error),
            product_id,
            title: form.title.clone(),
            price: form.price.clone(),
            description: form.description.clone(),
        };
        (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List the logged-in user's own products.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<AdminProductsTemplate> {
    let repo = ProductRepository::new(state.pool());
    let products = repo.list_by_owner(user.id).await?;

    Ok(AdminProductsTemplate {
        authenticated: true,
        products: products.iter().map(ProductView::from).collect(),
    })
}

/// Display the empty product form.
#[instrument(skip(_user))]
pub async fn new_form(RequireAuth(_user): RequireAuth) -> ProductFormTemplate {
    ProductFormTemplate {
        authenticated: true,
        editing: false,
        error: None,
        product_id: None,
        title: String::new(),
        price: String::new(),
        description: String::new(),
    }
}

/// Create a product from the multipart form.
#[instrument(skip(state, user, multipart))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_form(multipart).await?;

    let valid = match validate_fields(&form) {
        Ok(valid) => valid,
        Err(msg) => return Ok(ProductFormTemplate::rerender(&form, None, msg)),
    };

    let Some(image) = &form.image else {
        return Ok(ProductFormTemplate::rerender(
            &form,
            None,
            "Please choose a product image.".to_owned(),
        ));
    };
    if !uploads::is_supported_image(&image.content_type) {
        return Ok(ProductFormTemplate::rerender(
            &form,
            None,
            "Images must be PNG or JPEG.".to_owned(),
        ));
    }

    let image_url = uploads::save_image(
        &state.config().image_dir,
        &image.filename,
        &image.content_type,
        &image.bytes,
    )
    .await?;

    let repo = ProductRepository::new(state.pool());
    let fields = NewProduct {
        title: &valid.title,
        price: valid.price,
        description: &valid.description,
        image_url: &image_url,
    };

    match repo.create(user.id, &fields).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, user_id = %user.id, "Product created");
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(e) => {
            // The image is already on disk; do not leave it orphaned
            uploads::delete_image(&state.config().image_dir, &image_url).await;
            Err(e.into())
        }
    }
}

/// Display the edit form for one of the user's products.
#[instrument(skip(state, user))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .filter(|p| p.user_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate {
        authenticated: true,
        editing: true,
        error: None,
        product_id: Some(product.id),
        title: product.title,
        price: product.price.to_string(),
        description: product.description,
    })
}

/// Update one of the user's products from the multipart form.
///
/// The image is optional on edit; when a new one is uploaded, the old file
/// is deleted best effort after the database row is updated.
#[instrument(skip(state, user, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_form(multipart).await?;

    let valid = match validate_fields(&form) {
        Ok(valid) => valid,
        Err(msg) => return Ok(ProductFormTemplate::rerender(&form, Some(id), msg)),
    };

    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await?
        .filter(|p| p.user_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let new_image_url = match &form.image {
        Some(image) => {
            if !uploads::is_supported_image(&image.content_type) {
                return Ok(ProductFormTemplate::rerender(
                    &form,
                    Some(id),
                    "Images must be PNG or JPEG.".to_owned(),
                ));
            }
            Some(
                uploads::save_image(
                    &state.config().image_dir,
                    &image.filename,
                    &image.content_type,
                    &image.bytes,
                )
                .await?,
            )
        }
        None => None,
    };

    let image_url = new_image_url.as_deref().unwrap_or(&existing.image_url);
    let fields = NewProduct {
        title: &valid.title,
        price: valid.price,
        description: &valid.description,
        image_url,
    };

    match repo.update_owned(id, user.id, &fields).await {
        Ok(_) => {
            if new_image_url.is_some() {
                uploads::delete_image(&state.config().image_dir, &existing.image_url).await;
            }
            tracing::info!(product_id = %id, user_id = %user.id, "Product updated");
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(e) => {
            if let Some(url) = &new_image_url {
                uploads::delete_image(&state.config().image_dir, url).await;
            }
            Err(e.into())
        }
    }
}

/// Delete one of the user's products.
///
/// The repository removes the product from every cart in the same
/// transaction; the image file is deleted best effort afterwards.
#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let repo = ProductRepository::new(state.pool());

    match repo.delete_owned(id, user.id).await {
        Ok(product) => {
            uploads::delete_image(&state.config().image_dir, &product.image_url).await;
            tracing::info!(product_id = %id, user_id = %user.id, "Product deleted");
            Ok(Redirect::to("/admin/products"))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_valid() {
        assert_eq!(parse_price("12.50").unwrap(), "12.50".parse().unwrap());
        assert_eq!(parse_price(" 10 ").unwrap(), "10".parse().unwrap());
    }

    #[test]
    fn test_parse_price_rejects_bad_input() {
        assert!(parse_price("abc").is_err());
        assert!(parse_price("0").is_err());
        assert!(parse_price("-5").is_err());
        assert!(parse_price("1.999").is_err());
    }

    #[test]
    fn test_validate_fields_boundaries() {
        let form = |title: &str, price: &str, description: &str| ProductFormData {
            title: title.to_owned(),
            price: price.to_owned(),
            description: description.to_owned(),
            image: None,
        };

        assert!(validate_fields(&form("Book", "9.99", "A lovely read")).is_ok());
        assert!(validate_fields(&form("ab", "9.99", "A lovely read")).is_err());
        assert!(validate_fields(&form("Book", "9.99", "tiny")).is_err());
        assert!(validate_fields(&form("Book", "9.99", &"x".repeat(401))).is_err());
        assert!(validate_fields(&form("Book", "free", "A lovely read")).is_err());
    }

    #[test]
    fn test_validate_fields_trims_whitespace() {
        let form = ProductFormData {
            title: "  Book  ".to_owned(),
            price: "9.99".to_owned(),
            description: "  A lovely read  ".to_owned(),
            image: None,
        };

        let valid = validate_fields(&form).unwrap();
        assert_eq!(valid.title, "Book");
        assert_eq!(valid.description, "A lovely read");
    }
}
