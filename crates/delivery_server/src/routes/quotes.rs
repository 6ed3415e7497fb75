//! Quote endpoints
//!
//! `POST /calculate-price` prices a request and stores the snapshot;
//! the GET routes read stored snapshots back.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use delivery_core::{DeliveryInputs, PriceBreakdown, QuoteStatus};
use infra_store::DeliveryRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AppState;
use crate::error::ApiError;
use crate::tickets;

/// Inbound quote request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(alias = "material_type")]
    pub material_type: String,
    pub distance: f64,
    pub urgency: String,
    pub weight: f64,
    #[serde(alias = "location_type")]
    pub location_type: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl DeliveryRequest {
    fn into_parts(self) -> (String, DeliveryInputs) {
        let mut inputs = DeliveryInputs::new(
            self.material_type,
            self.distance,
            self.urgency,
            self.weight,
            self.location_type,
        );
        if let Some(email) = self.email {
            inputs = inputs.with_email(email);
        }
        (self.user_id, inputs)
    }
}

/// Outbound quote response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub success: bool,
    pub ticket_id: String,
    pub total_price: f64,
    pub breakdown: PriceBreakdown,
    pub action_log: Vec<String>,
    pub status: QuoteStatus,
    /// Unrecognised category values that were priced as neutral
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Stored quotes, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveriesResponse {
    pub total_count: usize,
    pub deliveries: Vec<DeliveryRecord>,
}

/// Build the quote routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calculate-price", post(calculate_price))
        .route("/delivery/{ticket_id}", get(get_delivery))
        .route("/deliveries", get(list_deliveries))
}

/// POST /calculate-price - Price a delivery request
async fn calculate_price(
    State(state): State<AppState>,
    Json(request): Json<DeliveryRequest>,
) -> Result<Json<DeliveryResponse>, ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("userId must not be empty".to_string()));
    }

    let (user_id, inputs) = request.into_parts();
    inputs.validate()?;

    let ticket_id = tickets::issue_ticket_id();
    info!(ticket_id = %ticket_id, user_id = %user_id, "new delivery request");

    let quote = state.pipeline.run(ticket_id, user_id, inputs);
    for entry in quote.action_log() {
        debug!(ticket_id = %quote.ticket_id(), "{}", entry);
    }

    let record = DeliveryRecord::from_state(&quote, Utc::now());
    state.with_store(move |store| store.save(&record)).await?;
    info!(
        ticket_id = %quote.ticket_id(),
        total_price = quote.total_price(),
        "quote stored"
    );

    Ok(Json(DeliveryResponse {
        success: true,
        ticket_id: quote.ticket_id().to_string(),
        total_price: quote.total_price(),
        breakdown: quote.breakdown(),
        action_log: quote.action_log().to_vec(),
        status: quote.status(),
        warnings: quote.warnings().to_vec(),
    }))
}

/// GET /delivery/{ticket_id} - Fetch one stored quote
async fn get_delivery(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<DeliveryRecord>, ApiError> {
    let record = state.with_store(move |store| store.get(&ticket_id)).await?;
    Ok(Json(record))
}

/// GET /deliveries - All stored quotes, newest first
async fn list_deliveries(
    State(state): State<AppState>,
) -> Result<Json<DeliveriesResponse>, ApiError> {
    let deliveries = state.with_store(|store| store.list_recent()).await?;
    Ok(Json(DeliveriesResponse {
        total_count: deliveries.len(),
        deliveries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::routes::test_support::{
        state_with_mailer, state_with_transport, test_state, FailingMailer, StalledMailer,
    };
    use std::sync::Arc;
    use approx::assert_relative_eq;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn send<T: DeserializeOwned>(
        state: &AppState,
        request: Request<Body>,
    ) -> (StatusCode, T) {
        let response = routes()
            .with_state(state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_quote(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/calculate-price")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_standard_urban_quote() {
        let state = test_state();
        let (status, quote): (_, DeliveryResponse) = send(
            &state,
            post_quote(json!({
                "userId": "alice",
                "materialType": "standard",
                "distance": 10.0,
                "urgency": "standard",
                "weight": 3.0,
                "locationType": "urban"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(quote.success);
        assert!(quote.ticket_id.starts_with("D-"));
        assert_eq!(quote.total_price, 50.0);
        assert_eq!(quote.status, QuoteStatus::Completed);
        assert_eq!(quote.action_log.len(), 8);
        assert_eq!(
            quote.action_log.last().unwrap(),
            "No email provided, skipping notification."
        );
        assert!(quote.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_fragile_express_rural_breakdown() {
        let state = test_state();
        let (_, quote): (_, DeliveryResponse) = send(
            &state,
            post_quote(json!({
                "userId": "bob",
                "materialType": "fragile",
                "distance": 20.0,
                "urgency": "express",
                "weight": 8.0,
                "locationType": "rural"
            })),
        )
        .await;

        assert_relative_eq!(quote.breakdown.base_price, 100.0);
        assert_relative_eq!(quote.breakdown.material_modifier, 1.5);
        assert_relative_eq!(quote.breakdown.urgency_multiplier, 1.5);
        assert_relative_eq!(quote.breakdown.weight_surcharge, 30.0);
        assert_relative_eq!(quote.breakdown.location_modifier, 1.2);
        assert_eq!(quote.total_price, 300.0);
    }

    #[tokio::test]
    async fn test_snake_case_fields_are_accepted() {
        let state = test_state();
        let (status, quote): (_, DeliveryResponse) = send(
            &state,
            post_quote(json!({
                "user_id": "carol",
                "material_type": "heavy",
                "distance": 4.0,
                "urgency": "standard",
                "weight": 5.0,
                "location_type": "urban"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        // 20 * 1.8
        assert_eq!(quote.total_price, 36.0);
    }

    #[tokio::test]
    async fn test_response_uses_camel_case() {
        let state = test_state();
        let (_, body): (_, serde_json::Value) = send(
            &state,
            post_quote(json!({
                "userId": "dave",
                "materialType": "standard",
                "distance": 1.0,
                "urgency": "standard",
                "weight": 1.0,
                "locationType": "urban"
            })),
        )
        .await;

        assert!(body.get("ticketId").is_some());
        assert!(body.get("totalPrice").is_some());
        assert!(body.get("actionLog").is_some());
        assert!(body["breakdown"].get("basePrice").is_some());
        assert!(body.get("warnings").is_none());
    }

    #[tokio::test]
    async fn test_unknown_categories_warn_but_price() {
        let state = test_state();
        let (status, quote): (_, DeliveryResponse) = send(
            &state,
            post_quote(json!({
                "userId": "erin",
                "materialType": "glass",
                "distance": 10.0,
                "urgency": "standard",
                "weight": 0.0,
                "locationType": "moon"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote.total_price, 50.0);
        assert_eq!(quote.warnings.len(), 2);
        assert!(quote.warnings[0].contains("glass"));
    }

    #[tokio::test]
    async fn test_quote_is_persisted_and_retrievable() {
        let state = test_state();
        let (_, quote): (_, DeliveryResponse) = send(
            &state,
            post_quote(json!({
                "userId": "frank",
                "materialType": "perishable",
                "distance": 10.0,
                "urgency": "same-day",
                "weight": 5.0,
                "locationType": "urban"
            })),
        )
        .await;

        let (status, record): (_, DeliveryRecord) =
            send(&state, get(&format!("/delivery/{}", quote.ticket_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record.ticket_id, quote.ticket_id);
        assert_eq!(record.user_id, "frank");
        assert_eq!(record.material_type, "perishable");
        assert_eq!(record.urgency, "same-day");
        assert_eq!(record.total_price, 140.0);
        assert_eq!(record.status, QuoteStatus::Completed);
    }

    #[tokio::test]
    async fn test_missing_ticket_is_404() {
        let state = test_state();
        let (status, err): (_, ErrorResponse) = send(&state, get("/delivery/D-NOPE0000")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err.error, "not_found");
        assert!(err.message.contains("D-NOPE0000"));
    }

    #[tokio::test]
    async fn test_deliveries_lists_newest_first() {
        let state = test_state();
        let mut issued = Vec::new();
        for distance in [1.0, 2.0, 3.0] {
            let (_, quote): (_, DeliveryResponse) = send(
                &state,
                post_quote(json!({
                    "userId": "grace",
                    "materialType": "standard",
                    "distance": distance,
                    "urgency": "standard",
                    "weight": 0.0,
                    "locationType": "urban"
                })),
            )
            .await;
            issued.push(quote.ticket_id);
        }

        let (status, listing): (_, DeliveriesResponse) = send(&state, get("/deliveries")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing.total_count, 3);

        let listed: Vec<_> = listing
            .deliveries
            .into_iter()
            .map(|d| d.ticket_id)
            .collect();
        issued.reverse();
        assert_eq!(listed, issued);
    }

    #[tokio::test]
    async fn test_empty_user_id_is_rejected() {
        let state = test_state();
        let (status, err): (_, ErrorResponse) = send(
            &state,
            post_quote(json!({
                "userId": "  ",
                "materialType": "standard",
                "distance": 1.0,
                "urgency": "standard",
                "weight": 1.0,
                "locationType": "urban"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "bad_request");
        assert_eq!(state.store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_field_is_client_error() {
        let state = test_state();
        let response = routes()
            .with_state(state.clone())
            .oneshot(post_quote(json!({ "userId": "heidi", "distance": 1.0 })))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert_eq!(state.store.count().unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_email_is_sent_after_response() {
        let (state, mailer) = state_with_mailer();
        let (status, quote): (_, DeliveryResponse) = send(
            &state,
            post_quote(json!({
                "userId": "ivan",
                "materialType": "perishable",
                "distance": 10.0,
                "urgency": "same-day",
                "weight": 5.0,
                "locationType": "urban",
                "email": "ivan@example.com"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            quote.action_log.last().unwrap(),
            "Email queued for ivan@example.com with total $140.00"
        );

        for _ in 0..100 {
            if mailer.email_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let sent = mailer.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["ivan@example.com"]);
        assert!(sent[0].subject.contains(&quote.ticket_id));
    }

    #[tokio::test]
    async fn test_overflowing_total_is_rejected_before_pricing() {
        let state = test_state();
        let (status, err): (_, ErrorResponse) = send(
            &state,
            post_quote(json!({
                "userId": "mallory",
                "materialType": "standard",
                "distance": 1e308,
                "urgency": "standard",
                "weight": 1.0,
                "locationType": "urban"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "bad_request");
        assert!(err.message.contains("distance"));
        assert_eq!(state.store.count().unwrap(), 0);
    }

    fn quote_with_email() -> Request<Body> {
        post_quote(json!({
            "userId": "judy",
            "materialType": "standard",
            "distance": 10.0,
            "urgency": "standard",
            "weight": 3.0,
            "locationType": "urban",
            "email": "judy@example.com"
        }))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stalled_mail_does_not_delay_response() {
        let state = state_with_transport(Arc::new(StalledMailer));

        let (status, quote): (_, DeliveryResponse) =
            tokio::time::timeout(Duration::from_secs(2), send(&state, quote_with_email()))
                .await
                .expect("response waited on mail delivery");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote.total_price, 50.0);
        assert_eq!(
            quote.action_log.last().unwrap(),
            "Email queued for judy@example.com with total $50.00"
        );
        assert_eq!(state.store.count().unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_mail_still_returns_quote() {
        let state = state_with_transport(Arc::new(FailingMailer));

        let (status, quote): (_, DeliveryResponse) = send(&state, quote_with_email()).await;

        assert_eq!(status, StatusCode::OK);
        assert!(quote.success);
        assert_eq!(quote.status, QuoteStatus::Completed);
        assert!(quote.warnings.is_empty());
        assert_eq!(
            quote.action_log.last().unwrap(),
            "Email queued for judy@example.com with total $50.00"
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stored = state.store.get(&quote.ticket_id).unwrap();
        assert_eq!(stored.total_price, 50.0);
    }
}
