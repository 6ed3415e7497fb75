//! History command implementation
//!
//! Reads quotes persisted by the server. The database is opened read-only.

use std::fmt::Write as _;
use std::path::Path;

use infra_store::{DeliveryRecord, DeliveryStore};
use tracing::info;

use crate::{CliError, OutputFormat, Result};

/// Run the history command
pub fn run(database: &Path, ticket: Option<&str>, format: OutputFormat) -> Result<String> {
    if !database.exists() {
        return Err(CliError::DatabaseNotFound(database.display().to_string()));
    }
    let store = DeliveryStore::open_read_only(database)?;

    match ticket {
        Some(ticket_id) => {
            let record = store.get(ticket_id)?;
            match format {
                OutputFormat::Json => Ok(serde_json::to_string_pretty(&record)?),
                OutputFormat::Table => Ok(render_record(&record)),
            }
        }
        None => {
            let records = store.list_recent()?;
            info!(count = records.len(), "quotes loaded");
            match format {
                OutputFormat::Json => Ok(serde_json::to_string_pretty(&records)?),
                OutputFormat::Table => Ok(render_list(&records)),
            }
        }
    }
}

fn render_record(record: &DeliveryRecord) -> String {
    let fields = [
        ("Ticket", record.ticket_id.clone()),
        ("User", record.user_id.clone()),
        ("Material", record.material_type.clone()),
        ("Distance", format!("{} km", record.distance)),
        ("Urgency", record.urgency.clone()),
        ("Weight", format!("{} kg", record.weight)),
        ("Location", record.location_type.clone()),
        ("Total", format!("${:.2}", record.total_price)),
        ("Status", record.status.to_string()),
        ("Created", record.created_at.to_rfc3339()),
    ];

    fields
        .iter()
        .map(|(label, value)| format!("{:<10} {}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_list(records: &[DeliveryRecord]) -> String {
    if records.is_empty() {
        return "No quotes stored.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<12} {:<11} {:<9} {:>10}  {}",
        "TICKET", "USER", "MATERIAL", "URGENCY", "TOTAL", "CREATED"
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<12} {:<12} {:<11} {:<9} {:>10}  {}",
            r.ticket_id,
            r.user_id,
            r.material_type,
            r.urgency,
            format!("${:.2}", r.total_price),
            r.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    let _ = write!(out, "{} quote(s)", records.len());
    out
}
