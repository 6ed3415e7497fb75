//! Quote command implementation
//!
//! Runs the pricing pipeline in-process. No email is sent and nothing is
//! stored.

use std::fmt::Write as _;

use chrono::Utc;
use delivery_core::{DeliveryInputs, PricingPipeline, PricingState};
use tracing::info;

use crate::{CliError, OutputFormat, Result};

/// Request attributes taken from the command line
#[derive(Debug, Clone)]
pub struct QuoteArgs {
    pub distance: f64,
    pub material: String,
    pub urgency: String,
    pub weight: f64,
    pub location: String,
    pub user: String,
}

/// Run the quote command
pub fn run(args: QuoteArgs, format: OutputFormat, verbose: bool) -> Result<String> {
    let inputs = DeliveryInputs::new(
        args.material,
        args.distance,
        args.urgency,
        args.weight,
        args.location,
    );
    inputs
        .validate()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    let ticket_id = format!("CLI-{}", Utc::now().format("%Y%m%d%H%M%S"));

    let state = PricingPipeline::offline().run(ticket_id, args.user, inputs);
    info!(
        ticket_id = %state.ticket_id(),
        total_price = state.total_price(),
        "quote computed"
    );

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&state)?),
        OutputFormat::Table => Ok(render_table(&state, verbose)),
    }
}

/// Breakdown table followed by warnings and, when `with_log` is set, the
/// action log
pub fn render_table(state: &PricingState, with_log: bool) -> String {
    let b = state.breakdown();
    let rows = [
        ("Base price", format!("${:.2}", b.base_price)),
        ("Material", format!("x{}", b.material_modifier)),
        ("Urgency", format!("x{}", b.urgency_multiplier)),
        ("Weight surcharge", format!("${:.2}", b.weight_surcharge)),
        ("Location", format!("x{}", b.location_modifier)),
        ("Total", format!("${:.2}", state.total_price())),
    ];

    let mut out = String::new();
    let _ = writeln!(out, "Ticket {} ({})", state.ticket_id(), state.status());
    let _ = writeln!(out, "┌──────────────────┬────────────┐");
    for (i, (label, value)) in rows.iter().enumerate() {
        if i == rows.len() - 1 {
            let _ = writeln!(out, "├──────────────────┼────────────┤");
        }
        let _ = writeln!(out, "│ {:<16} │ {:>10} │", label, value);
    }
    let _ = write!(out, "└──────────────────┴────────────┘");

    for warning in state.warnings() {
        let _ = write!(out, "\nwarning: {}", warning);
    }
    if with_log {
        let _ = write!(out, "\n\nAction log:");
        for (i, entry) in state.action_log().iter().enumerate() {
            let _ = write!(out, "\n  {}. {}", i + 1, entry);
        }
    }
    out
}
