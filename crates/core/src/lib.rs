//! Maplecart Core - Shared types library.
//!
//! This crate provides the common domain types used by the `shop` server
//! binary: type-safe entity IDs and the validated [`Email`] address type.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
