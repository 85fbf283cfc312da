//! HTTP middleware and extractors.

pub mod auth;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth};
