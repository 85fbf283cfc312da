//! Business logic services.

pub mod auth;
pub mod email;
pub mod invoice;
pub mod payments;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use payments::{PaymentClient, PaymentError};
