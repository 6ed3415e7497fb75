//! REST API server for delivery price quotes
//!
//! Wraps the [`delivery_core`] pipeline in an HTTP service: each
//! `POST /calculate-price` call gets a fresh ticket, runs the eight pricing
//! stages, persists the result through [`infra_store`], and hands any quote
//! email to a detached mail task.

pub mod config;
pub mod error;
pub mod mailer;
pub mod routes;
pub mod server;
pub mod tickets;

pub use delivery_core;
pub use infra_store;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
