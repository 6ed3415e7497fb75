//! Request and state types for the delivery pricing pipeline.
//!
//! This module provides:
//! - `inputs`: The frozen request attributes a quote is computed from
//! - `state`: The per-request [`PricingState`] threaded through every stage
//!
//! # Re-exports
//!
//! - [`DeliveryInputs`] from `inputs`
//! - [`PricingState`], [`QuoteStatus`], [`PriceBreakdown`] from `state`

pub mod inputs;
pub mod state;

pub use inputs::DeliveryInputs;
pub use state::{PriceBreakdown, PricingState, QuoteStatus};
