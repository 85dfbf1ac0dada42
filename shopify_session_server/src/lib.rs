//! # Shopify session gateway server
//!
//! The thin HTTP surface over the session engine. It is responsible for:
//! * Exchanging inbound session tokens for durable access tokens (`POST /auth/token`).
//! * Validating session tokens on `/api` routes and injecting trusted identity headers for
//!   downstream services.
//! * Session lookup and logout for authenticated callers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.

pub mod auth;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
