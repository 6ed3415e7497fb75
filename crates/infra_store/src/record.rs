//! Flat snapshot of a completed quote.

use chrono::{DateTime, SecondsFormat, Utc};
use delivery_core::{PricingState, QuoteStatus};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const TABLE: &str = "delivery_requests";

/// Row stored for each priced request.
///
/// Holds copies of the fields the caller needs to answer lookups later; no
/// reference to the live pipeline state is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub ticket_id: String,
    pub user_id: String,
    pub material_type: String,
    pub distance: f64,
    pub urgency: String,
    pub weight: f64,
    pub location_type: String,
    pub total_price: f64,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

impl DeliveryRecord {
    /// Snapshot a finished pipeline state.
    pub fn from_state(state: &PricingState, created_at: DateTime<Utc>) -> Self {
        let inputs = state.inputs();
        Self {
            ticket_id: state.ticket_id().to_string(),
            user_id: state.user_id().to_string(),
            material_type: inputs.material_type.clone(),
            distance: inputs.distance,
            urgency: inputs.urgency.clone(),
            weight: inputs.weight,
            location_type: inputs.location_type.clone(),
            total_price: state.total_price(),
            status: state.status(),
            created_at,
        }
    }

    /// Fixed-width RFC 3339 form used for storage, so that text ordering
    /// matches chronological ordering.
    pub(crate) fn created_at_column(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        let status: String = get(row, 8, "status")?;
        let created_at: String = get(row, 9, "created_at")?;

        Ok(Self {
            ticket_id: get(row, 0, "ticket_id")?,
            user_id: get(row, 1, "user_id")?,
            material_type: get(row, 2, "material_type")?,
            distance: get(row, 3, "distance")?,
            urgency: get(row, 4, "urgency")?,
            weight: get(row, 5, "weight")?,
            location_type: get(row, 6, "location_type")?,
            total_price: get(row, 7, "total_price")?,
            status: status.parse().map_err(|detail| StoreError::CorruptRow {
                table: TABLE,
                column: "status",
                detail,
            })?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| StoreError::CorruptRow {
                    table: TABLE,
                    column: "created_at",
                    detail: e.to_string(),
                })?,
        })
    }
}

fn get<T: rusqlite::types::FromSql>(
    row: &Row<'_>,
    idx: usize,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table: TABLE,
        column,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use delivery_core::{DeliveryInputs, PricingPipeline};

    #[test]
    fn test_from_state_copies_inputs_and_result() {
        let state = PricingPipeline::offline().run(
            "D-0001",
            "user-1",
            DeliveryInputs::new("fragile", 20.0, "express", 8.0, "rural"),
        );
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let record = DeliveryRecord::from_state(&state, ts);

        assert_eq!(record.ticket_id, "D-0001");
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.material_type, "fragile");
        assert_eq!(record.distance, 20.0);
        assert_eq!(record.urgency, "express");
        assert_eq!(record.weight, 8.0);
        assert_eq!(record.location_type, "rural");
        assert_eq!(record.total_price, 300.0);
        assert_eq!(record.status, QuoteStatus::Completed);
        assert_eq!(record.created_at, ts);
    }

    #[test]
    fn test_created_at_column_is_fixed_width() {
        let state = PricingPipeline::offline().run(
            "D-0002",
            "user-1",
            DeliveryInputs::new("standard", 1.0, "standard", 1.0, "urban"),
        );
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let record = DeliveryRecord::from_state(&state, ts);
        assert_eq!(record.created_at_column(), "2026-03-01T12:00:00.000000Z");
    }

    #[test]
    fn test_record_serialises_camel_case() {
        let state = PricingPipeline::offline().run(
            "D-0003",
            "user-1",
            DeliveryInputs::new("standard", 1.0, "standard", 1.0, "urban"),
        );
        let record = DeliveryRecord::from_state(&state, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ticketId"], "D-0003");
        assert_eq!(json["status"], "completed");
        assert!(json.get("createdAt").is_some());
    }
}
