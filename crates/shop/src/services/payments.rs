//! Stripe Checkout client.
//!
//! Creates hosted Checkout Sessions via Stripe's form-encoded REST API. The
//! shop redirects the buyer to the returned session URL; Stripe sends them
//! back to the success or cancel URL afterwards.

use std::sync::Arc;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;
use crate::models::CartLine;

const BASE_URL: &str = "https://api.stripe.com/v1";

/// Errors from the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe rejected the request.
    #[error("Stripe API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// A price could not be expressed in cents.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(Decimal),
}

/// A created Checkout Session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Stripe session id (`cs_...`).
    pub id: String,
    /// Hosted payment page URL to redirect the buyer to.
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

/// Stripe API client.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<PaymentClientInner>,
}

struct PaymentClientInner {
    client: reqwest::Client,
    secret_key: secrecy::SecretString,
}

impl PaymentClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(PaymentClientInner {
                client,
                secret_key: config.secret_key.clone(),
            }),
        })
    }

    /// Create a Checkout Session for the given cart lines.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::AmountOutOfRange` if a line total cannot be
    /// expressed in cents, `PaymentError::Api` if Stripe rejects the request.
    pub async fn create_checkout_session(
        &self,
        lines: &[CartLine],
        customer_email: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("payment_method_types[0]".to_owned(), "card".to_owned()),
            ("customer_email".to_owned(), customer_email.to_owned()),
            ("success_url".to_owned(), success_url.to_owned()),
            ("cancel_url".to_owned(), cancel_url.to_owned()),
        ];

        for (i, line) in lines.iter().enumerate() {
            params.extend(line_item_params(i, line)?);
        }

        let response = self
            .inner
            .client
            .post(format!("{BASE_URL}/checkout/sessions"))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<StripeErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => "unreadable error response".to_owned(),
            };
            return Err(PaymentError::Api { status, message });
        }

        Ok(response.json::<CheckoutSession>().await?)
    }
}

/// Form parameters for one Checkout line item.
fn line_item_params(index: usize, line: &CartLine) -> Result<Vec<(String, String)>, PaymentError> {
    let unit_amount =
        to_subunits(line.price).ok_or(PaymentError::AmountOutOfRange(line.price))?;

    let key = |field: &str| format!("line_items[{index}][{field}]");

    Ok(vec![
        (key("price_data][currency"), "usd".to_owned()),
        (key("price_data][product_data][name"), line.title.clone()),
        (key("price_data][unit_amount"), unit_amount.to_string()),
        (key("quantity"), line.quantity.to_string()),
    ])
}

/// Convert a decimal price to integer cents.
///
/// Returns `None` for amounts that lose precision or overflow.
fn to_subunits(price: Decimal) -> Option<i64> {
    let cents = price.checked_mul(Decimal::from(100))?;
    if cents.fract() != Decimal::ZERO {
        return None;
    }
    cents.to_i64()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maplecart_core::ProductId;

    use super::*;

    fn line(price: &str, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            title: "Maple Syrup".to_owned(),
            price: price.parse().unwrap(),
            image_url: String::new(),
            quantity,
        }
    }

    #[test]
    fn test_to_subunits() {
        assert_eq!(to_subunits("12.50".parse().unwrap()), Some(1250));
        assert_eq!(to_subunits("0.01".parse().unwrap()), Some(1));
        assert_eq!(to_subunits("10".parse().unwrap()), Some(1000));
    }

    #[test]
    fn test_to_subunits_rejects_sub_cent_precision() {
        assert_eq!(to_subunits("0.001".parse().unwrap()), None);
    }

    #[test]
    fn test_line_item_params_shape() {
        let params = line_item_params(0, &line("12.50", 2)).unwrap();

        assert!(params.contains(&(
            "line_items[0][price_data][unit_amount]".to_owned(),
            "1250".to_owned()
        )));
        assert!(params.contains(&("line_items[0][quantity]".to_owned(), "2".to_owned())));
        assert!(params.contains(&(
            "line_items[0][price_data][product_data][name]".to_owned(),
            "Maple Syrup".to_owned()
        )));
    }

    #[test]
    fn test_line_item_params_indexed_per_line() {
        let params = line_item_params(3, &line("5.00", 1)).unwrap();
        assert!(params.iter().all(|(k, _)| k.starts_with("line_items[3]")));
    }
}
