//! # Marketplace Backend
//!
//! Catalogue and analytics backend for a software marketplace.
//!
//! ## Architecture
//!
//! - [`models`]: domain records (taxonomy items, products, promocodes, analytics events)
//! - [`db`]: repository traits and the in-memory backend
//! - [`services`]: validation and business rules on top of the repository
//! - [`config`]: TOML file plus environment overrides for the server
//! - [`http`]: Axum REST API with the uniform response envelope
//! - [`client`]: typed REST client and the `handle_error` taxonomy
//! - [`analytics`]: consent-gated client event queue with batched delivery
//!
//! The `http` module needs the `http-server` feature and `client` the
//! `client` feature; both are on by default.

// RepositoryError carries context for debugging
#![allow(clippy::result_large_err)]

pub mod analytics;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

#[cfg(feature = "client")]
pub mod client;
