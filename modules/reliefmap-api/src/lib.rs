use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

use reliefmap_core::{DeduplicationEngine, EventStore, HelpMatcher, HelpOfferStore};

pub mod rest;

/// Reports carry images inline as base64, so bodies run large.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub engine: DeduplicationEngine,
    pub help: HelpMatcher,
    pub events: Arc<dyn EventStore>,
    pub offers: Arc<dyn HelpOfferStore>,
}

/// Build the HTTP router. An empty origin list allows any origin; a list whose
/// entries are all unparseable allows none.
pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        // Health check
        .route("/health", get(|| async { "ok" }))
        // Disaster events
        .route(
            "/api/disasters",
            get(rest::disasters::api_list_disasters).post(rest::disasters::api_report_disaster),
        )
        // Help offers
        .route(
            "/api/help",
            get(rest::help::api_list_offers).post(rest::help::api_create_offer),
        )
        .route("/api/help/search", post(rest::help::api_search_help))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(allowed_origins))
        // Logging layer: method + path only, never bodies
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring unparseable allowed origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        warn!("No allowed origin could be parsed; cross-origin requests will be refused");
    }
    layer.allow_origin(AllowOrigin::list(origins))
}
