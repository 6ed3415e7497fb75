//! Delivery request attributes.

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::stages::projected_total;

/// Frozen request attributes read by the pricing stages.
///
/// Stages only ever borrow this record immutably. Categorical fields are kept
/// as raw strings so that unrecognised values can be priced fail-open and
/// reported back verbatim.
///
/// # Examples
/// ```
/// use delivery_core::types::DeliveryInputs;
///
/// let inputs = DeliveryInputs::new("fragile", 20.0, "express", 8.0, "rural");
/// assert_eq!(inputs.material_type, "fragile");
/// assert!(inputs.email.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInputs {
    /// Material category (`standard`, `fragile`, `perishable`, `heavy`)
    #[serde(alias = "material_type")]
    pub material_type: String,
    /// Distance in kilometres
    pub distance: f64,
    /// Urgency tier (`standard`, `express`, `same-day`)
    pub urgency: String,
    /// Weight in kilograms
    pub weight: f64,
    /// Location category (`urban`, `rural`)
    #[serde(alias = "location_type")]
    pub location_type: String,
    /// Address to notify with the final quote, if any
    #[serde(default)]
    pub email: Option<String>,
}

impl DeliveryInputs {
    /// Create inputs without a notification address.
    pub fn new(
        material_type: impl Into<String>,
        distance: f64,
        urgency: impl Into<String>,
        weight: f64,
        location_type: impl Into<String>,
    ) -> Self {
        Self {
            material_type: material_type.into(),
            distance,
            urgency: urgency.into(),
            weight,
            location_type: location_type.into(),
            email: None,
        }
    }

    /// Attach a notification address.
    ///
    /// Blank addresses are treated as absent.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.email = if email.trim().is_empty() {
            None
        } else {
            Some(email)
        };
        self
    }

    /// Check that these inputs price to a finite amount.
    ///
    /// Negative and zero values are accepted; only NaN, infinities and
    /// magnitudes whose total overflows are refused.
    ///
    /// # Examples
    /// ```
    /// use delivery_core::{DeliveryInputs, InputError};
    ///
    /// assert!(DeliveryInputs::new("standard", -4.0, "standard", 0.0, "urban")
    ///     .validate()
    ///     .is_ok());
    ///
    /// let err = DeliveryInputs::new("standard", f64::NAN, "standard", 1.0, "urban")
    ///     .validate()
    ///     .unwrap_err();
    /// assert!(matches!(err, InputError::NonFinite { field: "distance", .. }));
    /// ```
    pub fn validate(&self) -> Result<(), InputError> {
        for (field, value) in [("distance", self.distance), ("weight", self.weight)] {
            if !value.is_finite() {
                return Err(InputError::NonFinite { field, value });
            }
        }

        if !projected_total(self).is_finite() {
            return Err(InputError::PriceOverflow {
                distance: self.distance,
                weight: self.weight,
            });
        }
        Ok(())
    }
}
