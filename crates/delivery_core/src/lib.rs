//! # delivery_core: Delivery Quote Pricing Pipeline
//!
//! ## Layer role
//!
//! delivery_core is the kernel of the workspace. It turns request attributes
//! (distance, material, urgency, weight, location) into a price by threading a
//! per-request [`PricingState`](types::PricingState) through a fixed chain of
//! stages, each contributing one component and one action-log entry:
//!
//! 1. Initialize: status `processing`
//! 2. Distance: `base = distance * 5.0`
//! 3. Material multiplier
//! 4. Urgency multiplier
//! 5. Weight surcharge: `max(0, (weight - 5) * 10)`
//! 6. Location multiplier
//! 7. Final price: `round2(base * material * urgency * location + surcharge)`
//! 8. Notification: fire-and-forget email hand-off
//!
//! Persistence, HTTP and mail transport live in other crates and reach the
//! kernel only through [`PricingPipeline`](pipeline::PricingPipeline) and the
//! [`Notifier`](notify::Notifier) seam.
//!
//! ## Usage Examples
//!
//! ```rust
//! use delivery_core::pipeline::PricingPipeline;
//! use delivery_core::types::DeliveryInputs;
//!
//! let state = PricingPipeline::offline().run(
//!     "D-0001",
//!     "user-1",
//!     DeliveryInputs::new("standard", 10.0, "standard", 3.0, "urban"),
//! );
//! assert_eq!(state.total_price(), 50.0);
//! assert_eq!(
//!     state.action_log().last().map(String::as_str),
//!     Some("No email provided, skipping notification.")
//! );
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod notify;
pub mod pipeline;
pub mod rates;
pub mod stages;
pub mod types;

pub use error::InputError;
pub use notify::{EmailMessage, NoopNotifier, Notifier};
pub use pipeline::PricingPipeline;
pub use types::{DeliveryInputs, PriceBreakdown, PricingState, QuoteStatus};
