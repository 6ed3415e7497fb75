//! Request validation errors.

use thiserror::Error;

/// Reasons a request cannot be priced.
///
/// Stages themselves never fail; these are raised by
/// [`DeliveryInputs::validate`](crate::types::DeliveryInputs::validate)
/// before a pipeline run so that a quote is always a finite amount.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A numeric input is NaN or infinite
    #[error("{field} must be a finite number, got {value}")]
    NonFinite {
        /// Name of the offending input
        field: &'static str,
        /// Value as received
        value: f64,
    },

    /// Inputs are finite but the total they price to is not
    #[error("distance {distance} and weight {weight} price beyond the representable range")]
    PriceOverflow {
        /// Distance as received
        distance: f64,
        /// Weight as received
        weight: f64,
    },
}
