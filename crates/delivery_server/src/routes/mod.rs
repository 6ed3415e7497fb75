//! Route modules for the delivery server
//!
//! - health: service banner, health check and readiness
//! - quotes: price calculation and stored quote lookups

pub mod health;
pub mod quotes;

use std::sync::Arc;

use axum::Router;
use delivery_core::PricingPipeline;
use infra_store::{DeliveryStore, StoreError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ApiError, ServerError};
use crate::mailer::{self, DetachedNotifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
    /// Completed quotes
    pub store: DeliveryStore,
    /// Shared stage runner
    pub pipeline: PricingPipeline,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<ServerConfig>, store: DeliveryStore, pipeline: PricingPipeline) -> Self {
        Self {
            config,
            start_time: std::time::Instant::now(),
            store,
            pipeline,
        }
    }

    /// Open the configured database and mail transport
    pub fn from_config(config: Arc<ServerConfig>) -> Result<Self, ServerError> {
        let store = DeliveryStore::open(&config.database_path)?;
        let transport = mailer::build_transport(&config.mail)?;
        tracing::info!(transport = transport.name(), "mail transport ready");

        let pipeline = PricingPipeline::new(Arc::new(DetachedNotifier::new(transport)));
        Ok(Self::new(config, store, pipeline))
    }

    /// Run a blocking store call off the async executor
    pub async fn with_store<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&DeliveryStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || f(&store)).await?;
        result.map_err(ApiError::from)
    }
}

/// Build the main application router by merging all route modules
pub fn build_router(state: AppState) -> Router {
    let cors_permissive = state.config.cors_permissive;

    let router = Router::new()
        .merge(health::routes())
        .merge(quotes::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::test_state;
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_build_router_creates_valid_router() {
        let router = build_router(test_state());

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_merges_all_route_groups() {
        let router = build_router(test_state());

        for uri in ["/", "/health", "/ready", "/deliveries"] {
            let response = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        }

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate-price")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"userId":"u","materialType":"standard","distance":1,
                            "urgency":"standard","weight":1,"locationType":"urban"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let router = build_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/unknown/path")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_headers_when_permissive() {
        let router = build_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_no_cors_headers_when_disabled() {
        let mut state = test_state();
        state.config = Arc::new(ServerConfig {
            cors_permissive: false,
            ..ServerConfig::default()
        });
        let router = build_router(state);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(!response
            .headers()
            .contains_key("access-control-allow-origin"));
    }

    #[test]
    fn test_from_config_opens_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            database_path: dir.path().join("quotes.db"),
            ..ServerConfig::default()
        };

        let state = AppState::from_config(Arc::new(config)).unwrap();
        assert_eq!(state.store.count().unwrap(), 0);
        assert!(dir.path().join("quotes.db").exists());
    }

    #[tokio::test]
    async fn test_app_state_uptime() {
        let state = test_state();

        std::thread::sleep(std::time::Duration::from_millis(10));

        let elapsed = state.start_time.elapsed();
        assert!(elapsed.as_millis() >= 10);
    }
}
