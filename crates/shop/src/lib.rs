//! Maplecart - a small server-rendered web shop.
//!
//! This crate provides the shop as a library so the binary stays thin and
//! the repositories and services can be exercised by integration tests.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates for server-side rendering
//! - `PostgreSQL` for users, products, carts and orders
//! - Stripe Checkout for payment
//! - SMTP (lettre) for transactional email
//! - PDF invoices rendered in-process per request
//!
//! Every page is a full server-rendered document; there is no JSON API.
//! Anyone with an account can list products and administer their own.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
