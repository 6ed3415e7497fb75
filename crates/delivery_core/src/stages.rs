//! Pipeline stages.
//!
//! Each stage reads one facet of the request, writes the single field it owns
//! and appends exactly one entry to the action log. Stages never fail: bad
//! numbers pass through unchecked and unknown categories price at the neutral
//! multiplier.

use crate::notify::{EmailMessage, Notifier};
use crate::rates::{
    RateTable, FREE_WEIGHT_ALLOWANCE, LOCATION_RATES, MATERIAL_RATES, RATE_PER_KM,
    SURCHARGE_PER_KG, URGENCY_RATES,
};
use crate::types::{DeliveryInputs, PricingState, QuoteStatus};

/// Log entry written when the request carries no notification address.
pub const NO_EMAIL_ENTRY: &str = "No email provided, skipping notification.";

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Mark the request as processing
    Initialize,
    /// Distance-based base price
    Distance,
    /// Material multiplier
    Material,
    /// Urgency multiplier
    Urgency,
    /// Flat weight surcharge
    Weight,
    /// Location multiplier
    Location,
    /// Combine components into the rounded total
    FinalPrice,
    /// Fire-and-forget quote email
    Notification,
}

impl Stage {
    /// Every stage, in the only order the runner executes them.
    pub const ORDER: [Stage; 8] = [
        Stage::Initialize,
        Stage::Distance,
        Stage::Material,
        Stage::Urgency,
        Stage::Weight,
        Stage::Location,
        Stage::FinalPrice,
        Stage::Notification,
    ];

    /// Stage name for logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Distance => "distance",
            Self::Material => "material",
            Self::Urgency => "urgency",
            Self::Weight => "weight",
            Self::Location => "location",
            Self::FinalPrice => "final_price",
            Self::Notification => "notification",
        }
    }

    /// Apply this stage to `state`.
    ///
    /// Only [`Stage::Notification`] touches `notifier`.
    pub fn apply(&self, state: &mut PricingState, notifier: &dyn Notifier) {
        match self {
            Self::Initialize => initialize(state),
            Self::Distance => price_distance(state),
            Self::Material => apply_material(state),
            Self::Urgency => apply_urgency(state),
            Self::Weight => apply_weight_surcharge(state),
            Self::Location => apply_location(state),
            Self::FinalPrice => finalize_price(state),
            Self::Notification => notify(state, notifier),
        }
    }
}

/// Round half away from zero to two decimal places.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `(weight - allowance) * rate`, floored at zero.
pub fn weight_surcharge_for(weight: f64) -> f64 {
    ((weight - FREE_WEIGHT_ALLOWANCE) * SURCHARGE_PER_KG).max(0.0)
}

/// Combine components into the unrounded total.
///
/// The surcharge is added after the multipliers and is never scaled by them.
pub fn combine(
    base_price: f64,
    material: f64,
    urgency: f64,
    location: f64,
    surcharge: f64,
) -> f64 {
    base_price * material * urgency * location + surcharge
}

/// Rounded total a full run would produce for `inputs`.
///
/// Reads the same tables as the stages but records nothing, so it can be used
/// to screen a request before a ticket is issued.
pub fn projected_total(inputs: &DeliveryInputs) -> f64 {
    let total = combine(
        inputs.distance * RATE_PER_KM,
        MATERIAL_RATES.lookup(&inputs.material_type).multiplier,
        URGENCY_RATES.lookup(&inputs.urgency).multiplier,
        LOCATION_RATES.lookup(&inputs.location_type).multiplier,
        weight_surcharge_for(inputs.weight),
    );
    round_to_cents(total)
}

/// Mark the request as processing.
pub fn initialize(state: &mut PricingState) {
    state.advance(QuoteStatus::Processing);
    let entry = format!("Request started: {}", state.ticket_id);
    state.log(entry);
}

/// Base price from distance at [`RATE_PER_KM`].
pub fn price_distance(state: &mut PricingState) {
    let distance = state.inputs.distance;
    state.base_price = distance * RATE_PER_KM;
    let entry = format!(
        "Distance: {:?}km -> Base price: ${:.2}",
        distance, state.base_price
    );
    state.log(entry);
}

/// Material multiplier from [`MATERIAL_RATES`].
pub fn apply_material(state: &mut PricingState) {
    let material = state.inputs.material_type.clone();
    state.material_modifier = resolve(state, &MATERIAL_RATES, &material);
    let entry = format!("Material: {} (x{:?})", material, state.material_modifier);
    state.log(entry);
}

/// Urgency multiplier from [`URGENCY_RATES`].
pub fn apply_urgency(state: &mut PricingState) {
    let urgency = state.inputs.urgency.clone();
    state.urgency_multiplier = resolve(state, &URGENCY_RATES, &urgency);
    let entry = format!("Urgency: {} (x{:?})", urgency, state.urgency_multiplier);
    state.log(entry);
}

/// Flat surcharge above the free weight allowance.
pub fn apply_weight_surcharge(state: &mut PricingState) {
    let weight = state.inputs.weight;
    state.weight_surcharge = weight_surcharge_for(weight);
    let entry = format!(
        "Weight: {:?}kg -> Surcharge: ${:.2}",
        weight, state.weight_surcharge
    );
    state.log(entry);
}

/// Location multiplier from [`LOCATION_RATES`].
pub fn apply_location(state: &mut PricingState) {
    let location = state.inputs.location_type.clone();
    state.location_modifier = resolve(state, &LOCATION_RATES, &location);
    let entry = format!("Location: {} (x{:?})", location, state.location_modifier);
    state.log(entry);
}

/// Rounded total from the five components; completes the quote.
pub fn finalize_price(state: &mut PricingState) {
    let total = combine(
        state.base_price,
        state.material_modifier,
        state.urgency_multiplier,
        state.location_modifier,
        state.weight_surcharge,
    );
    state.total_price = round_to_cents(total);
    state.advance(QuoteStatus::Completed);
    let entry = format!("TOTAL PRICE: ${:.2}", state.total_price);
    state.log(entry);
}

/// Dispatch the quote email, if an address was given, and log the hand-off.
///
/// The entry is written as soon as the message is handed to `notifier`; it
/// says nothing about whether delivery succeeds.
pub fn notify(state: &mut PricingState, notifier: &dyn Notifier) {
    let entry = match state.inputs.email.as_deref() {
        Some(email) => {
            let message =
                EmailMessage::quote(email, &state.ticket_id, &state.user_id, state.total_price);
            notifier.dispatch(message);
            format!(
                "Email queued for {} with total ${:.2}",
                email, state.total_price
            )
        }
        None => NO_EMAIL_ENTRY.to_string(),
    };
    state.log(entry);
}

fn resolve(state: &mut PricingState, table: &RateTable, key: &str) -> f64 {
    let lookup = table.lookup(key);
    if !lookup.recognised {
        tracing::warn!(
            ticket_id = %state.ticket_id,
            input = table.label(),
            value = key,
            "unrecognised value priced at neutral multiplier"
        );
        state.warn(format!(
            "Unrecognised {} '{}', priced at x{:?}",
            table.label(),
            key,
            lookup.multiplier
        ));
    }
    lookup.multiplier
}
