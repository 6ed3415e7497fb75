//! Per-request pricing state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::inputs::DeliveryInputs;

/// Lifecycle of a quote as it moves through the pipeline.
///
/// Variants are ordered; a state's status only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    /// Constructed, no stage has run yet
    #[default]
    Pending,
    /// Initialised and accumulating price components
    Processing,
    /// Final price computed
    Completed,
}

impl QuoteStatus {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Processing => "processing",
            QuoteStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuoteStatus::Pending),
            "processing" => Ok(QuoteStatus::Processing),
            "completed" => Ok(QuoteStatus::Completed),
            other => Err(format!("unknown quote status: {}", other)),
        }
    }
}

/// The five price components contributed by the pricing stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    /// Distance-derived base price
    pub base_price: f64,
    /// Material multiplier
    pub material_modifier: f64,
    /// Urgency multiplier
    pub urgency_multiplier: f64,
    /// Flat weight surcharge, never scaled by the multipliers
    pub weight_surcharge: f64,
    /// Location multiplier
    pub location_modifier: f64,
}

/// Record threaded through every pipeline stage for a single request.
///
/// Each derived field is owned by exactly one stage and starts at a neutral
/// value (0 for prices, 1 for multipliers). Fields are only writable inside
/// this crate so that `total_price` can never be set independently of its
/// components.
///
/// # Examples
/// ```
/// use delivery_core::types::{DeliveryInputs, PricingState, QuoteStatus};
///
/// let inputs = DeliveryInputs::new("standard", 10.0, "standard", 3.0, "urban");
/// let state = PricingState::new("D-0001", "user-1", inputs);
/// assert_eq!(state.status(), QuoteStatus::Pending);
/// assert_eq!(state.urgency_multiplier(), 1.0);
/// assert!(state.action_log().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingState {
    pub(crate) ticket_id: String,
    pub(crate) user_id: String,
    pub(crate) inputs: DeliveryInputs,
    pub(crate) base_price: f64,
    pub(crate) material_modifier: f64,
    pub(crate) urgency_multiplier: f64,
    pub(crate) weight_surcharge: f64,
    pub(crate) location_modifier: f64,
    pub(crate) total_price: f64,
    pub(crate) action_log: Vec<String>,
    pub(crate) status: QuoteStatus,
    pub(crate) error: Option<String>,
    pub(crate) warnings: Vec<String>,
}

impl PricingState {
    /// Create a pending state with every derived field at its neutral value.
    pub fn new(
        ticket_id: impl Into<String>,
        user_id: impl Into<String>,
        inputs: DeliveryInputs,
    ) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            user_id: user_id.into(),
            inputs,
            base_price: 0.0,
            material_modifier: 1.0,
            urgency_multiplier: 1.0,
            weight_surcharge: 0.0,
            location_modifier: 1.0,
            total_price: 0.0,
            action_log: Vec::with_capacity(8),
            status: QuoteStatus::Pending,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Caller-supplied ticket identifier.
    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    /// Requesting user.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Frozen request attributes.
    pub fn inputs(&self) -> &DeliveryInputs {
        &self.inputs
    }

    /// Distance-derived base price.
    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Material multiplier.
    pub fn material_modifier(&self) -> f64 {
        self.material_modifier
    }

    /// Urgency multiplier.
    pub fn urgency_multiplier(&self) -> f64 {
        self.urgency_multiplier
    }

    /// Flat weight surcharge.
    pub fn weight_surcharge(&self) -> f64 {
        self.weight_surcharge
    }

    /// Location multiplier.
    pub fn location_modifier(&self) -> f64 {
        self.location_modifier
    }

    /// Final rounded price; zero until the final-price stage has run.
    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    /// Ordered trace of stage decisions.
    pub fn action_log(&self) -> &[String] {
        &self.action_log
    }

    /// Current lifecycle status.
    pub fn status(&self) -> QuoteStatus {
        self.status
    }

    /// Reserved failure slot. No stage populates it.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Lookup misses that were priced fail-open.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Snapshot of the five price components.
    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            base_price: self.base_price,
            material_modifier: self.material_modifier,
            urgency_multiplier: self.urgency_multiplier,
            weight_surcharge: self.weight_surcharge,
            location_modifier: self.location_modifier,
        }
    }

    pub(crate) fn log(&mut self, entry: String) {
        self.action_log.push(entry);
    }

    pub(crate) fn warn(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Move the status forward. Regressions are ignored.
    pub(crate) fn advance(&mut self, next: QuoteStatus) {
        debug_assert!(next >= self.status, "status regression {} -> {}", self.status, next);
        if next > self.status {
            self.status = next;
        }
    }
}
